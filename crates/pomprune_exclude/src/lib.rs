//! Project exclusion for multi-project builds.
//!
//! This crate drops selected projects from a build and rewrites the
//! descriptors of the remaining projects so their module lists and dependency
//! lists no longer mention what was dropped. Rewritten descriptors keep the
//! original text of everything they retain, comments and indentation included,
//! and are written next to the original rather than over it.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use pomprune_exclude::{Config, run_exclusion};
//! use std::io::BufWriter;
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config {
//!     root: Some(std::path::PathBuf::from("/path/to/reactor")),
//!     ..Default::default()
//! };
//!
//! let outcome = run_exclusion(cfg.clone())?;
//!
//! let mut stdout = BufWriter::new(std::io::stdout());
//! pomprune_exclude::print_outcome_tree(&mut stdout, &outcome, &cfg)?;
//! # Ok(())
//! # }
//! ```

mod config;
mod constants;
mod filter;
mod index;
mod matcher;
mod planner;
mod reporter;
mod rewrite;
mod selector;
mod staging;
mod types;

// Re-export public API
pub use config::{Config, read_selectors};
pub use constants::{DEFAULT_OUTPUT_NAME, EXCLUDES_FILE_NAME};
pub use filter::{ExclusionFilter, SectionOutcome, Unlocated, filter_section};
pub use index::ProjectIndex;
pub use matcher::{LogObserver, MatchObserver, Matcher};
pub use planner::{RemovalPlan, SectionKey, plan_removals};
pub use reporter::{print_json, print_no_exclusions_message, print_outcome_tree};
pub use rewrite::{PendingRewrite, exclude_from_reactor, rewrite_descriptor, run_exclusion};
pub use selector::{Selector, SelectorSet};
pub use staging::StagedWrite;
pub use types::{ExcludedProject, ExclusionOutcome, FailedProject, RewrittenProject};
