use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{debug, info, trace};
use pomprune_core::{CONFIG_DIR_NAME, DESCRIPTOR_FILE_NAME};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{DEFAULT_OUTPUT_NAME, EXCLUDES_FILE_NAME};

#[derive(Debug, Clone, Parser)]
#[command(name = "exclude")]
#[command(about = "Exclude projects and their dependency references from a multi-project build")]
pub struct Config {
    /// Reactor root directory (defaults to the nearest directory holding .mvn)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Selector list, one selector per line (defaults to <root>/.mvn/excludes.txt)
    #[arg(long)]
    pub excludes: Option<PathBuf>,

    /// Root project descriptor (defaults to <root>/pom.xml)
    #[arg(long)]
    pub pom: Option<PathBuf>,

    /// File name of the rewritten descriptor written next to each original
    #[arg(long, default_value = DEFAULT_OUTPUT_NAME)]
    pub output_name: String,

    /// Plan and filter without writing any descriptor
    #[arg(long)]
    pub dry_run: bool,

    /// Skip projects whose descriptor fails to rewrite instead of aborting the run
    #[arg(long)]
    pub isolate_failures: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            excludes: None,
            pom: None,
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            dry_run: false,
            isolate_failures: false,
            json: false,
        }
    }
}

impl Config {
    /// Initialize the config by resolving the reactor root and the paths derived from it
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for reactor root");
            pomprune_core::find_reactor_root()?
        };
        info!("Using root directory: {}", root.display());

        let excludes = match self.excludes.take() {
            Some(p) => p.canonicalize().unwrap_or(p),
            None => root.join(CONFIG_DIR_NAME).join(EXCLUDES_FILE_NAME),
        };
        let pom = match self.pom.take() {
            Some(p) => p.canonicalize().unwrap_or(p),
            None => root.join(DESCRIPTOR_FILE_NAME),
        };
        debug!("Selector source: {}, root descriptor: {}", excludes.display(), pom.display());

        self.root = Some(root);
        self.excludes = Some(excludes);
        self.pom = Some(pom);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    pub fn excludes(&self) -> Result<&PathBuf> {
        self.excludes
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    pub fn pom(&self) -> Result<&PathBuf> {
        self.pom.as_ref().ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }
}

/// Reads the selector list at `path`.
///
/// Returns `Ok(None)` when there is no such file. Lines are trimmed and blank
/// lines dropped.
pub fn read_selectors(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        debug!("No selector list at {}", path.display());
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Unable to read exclusions from {}", path.display()))?;
    let selectors: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    trace!("Read selectors {:?} from {}", selectors, path.display());
    Ok(Some(selectors))
}
