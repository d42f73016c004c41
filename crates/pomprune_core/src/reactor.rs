use anyhow::{Context, Result, bail};
use log::{debug, info, trace, warn};
use path_clean::clean;
use serde::Serialize;
use std::{
    collections::{HashSet, VecDeque},
    path::{MAIN_SEPARATOR_STR, Path, PathBuf},
};

use crate::{DESCRIPTOR_FILE_NAME, parser::read_project, types::Project};

/// The set of projects taking part in one multi-project build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reactor {
    pub projects: Vec<Project>,
}

impl Reactor {
    /// Discovers the build starting from the root descriptor, following each
    /// project's module list breadth-first.
    ///
    /// The root descriptor must exist. Module entries whose descriptor does
    /// not exist are skipped with a warning. A descriptor that exists but cannot be read or parsed fails the
    /// whole load.
    pub fn load(root_descriptor: &Path) -> Result<Self> {
        info!("Loading reactor from {}", root_descriptor.display());
        let mut projects: Vec<Project> = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<(PathBuf, Option<usize>)> = VecDeque::new();
        queue.push_back((clean(root_descriptor), None));

        while let Some((path, aggregator)) = queue.pop_front() {
            if !seen.insert(path.clone()) {
                trace!("Already loaded: {}", path.display());
                continue;
            }
            if !path.is_file() {
                if aggregator.is_none() {
                    bail!("Root descriptor {} does not exist", path.display());
                }
                warn!("Module descriptor {} does not exist, skipping", path.display());
                continue;
            }

            let mut project = read_project(&path)
                .with_context(|| format!("Unable to load project from {}", path.display()))?;
            project.aggregator = aggregator;
            let index = projects.len();
            for module in &project.modules {
                let child = module_descriptor(&project.basedir, module);
                trace!("{} declares module {} -> {}", project, module, child.display());
                queue.push_back((child, Some(index)));
            }
            debug!("Loaded project {} from {}", project, path.display());
            projects.push(project);
        }

        info!("Loaded {} projects", projects.len());
        Ok(Self { projects })
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Resolves a module entry to the descriptor it refers to.
///
/// Separators are normalized, the entry is resolved against `basedir`, and the
/// descriptor file name is appended when the result is a directory.
pub fn module_descriptor(basedir: &Path, module: &str) -> PathBuf {
    let module = module.replace(['\\', '/'], MAIN_SEPARATOR_STR);
    let resolved = clean(basedir.join(module));
    if resolved.is_dir() { resolved.join(DESCRIPTOR_FILE_NAME) } else { resolved }
}
