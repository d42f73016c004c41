use pomprune_core::{Coordinate, Reactor};
use serde::Serialize;
use std::{collections::BTreeMap, path::PathBuf};

use crate::planner::SectionKey;

/// A project dropped from the build together with everything it aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct ExcludedProject {
    pub coordinate: Coordinate,
    pub file: PathBuf,
    /// The selector that named it, or `None` when it went with its aggregator
    pub selector: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewrittenProject {
    pub coordinate: Coordinate,
    pub original: PathBuf,
    pub output: PathBuf,
    /// Encoding shared by the original and the rewritten descriptor
    pub encoding: &'static str,
    pub removed: BTreeMap<SectionKey, Vec<String>>,
    /// Planned entries the document did not contain and that were kept
    pub unlocated: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedProject {
    pub coordinate: Coordinate,
    pub file: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExclusionOutcome {
    pub selectors: Vec<String>,
    pub excluded: Vec<ExcludedProject>,
    pub rewritten: Vec<RewrittenProject>,
    pub failed: Vec<FailedProject>,
    pub dry_run: bool,
    /// The build after exclusion, with rewritten projects pointing at their new descriptor
    #[serde(skip)]
    pub reactor: Reactor,
}
