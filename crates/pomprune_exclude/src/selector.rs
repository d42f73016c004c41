use log::{debug, trace};
use path_clean::clean;
use pomprune_core::{Coordinate, Project};
use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

/// One classified selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `[groupId]:artifactId`; an empty group matches the artifact under any group
    Coordinate { group_id: String, artifact_id: String },
    File(PathBuf),
    Directory(PathBuf),
    /// A path selector that named nothing on disk when it was classified
    Dead(PathBuf),
}

impl Selector {
    /// Classifies a trimmed selector string.
    ///
    /// Anything containing `:` is a coordinate split at the first colon. Anything
    /// else is a path resolved against `reactor_root` and probed on disk.
    pub fn classify(reactor_root: &Path, raw: &str) -> Self {
        if let Some((group_id, artifact_id)) = raw.split_once(':') {
            return Selector::Coordinate {
                group_id: group_id.to_string(),
                artifact_id: artifact_id.to_string(),
            };
        }
        let path = clean(reactor_root.join(raw));
        if path.is_file() {
            Selector::File(path)
        } else if path.is_dir() {
            Selector::Directory(path)
        } else {
            Selector::Dead(path)
        }
    }
}

/// Every selector of a run, split by kind up front so matching is plain lookups.
#[derive(Debug, Clone, Default)]
pub struct SelectorSet {
    raw: Vec<String>,
    any_group: HashMap<String, String>,
    coordinates: HashMap<Coordinate, String>,
    files: HashMap<PathBuf, String>,
    directories: HashMap<PathBuf, String>,
}

impl SelectorSet {
    pub fn new(reactor_root: &Path, selectors: &[String]) -> Self {
        let mut set = SelectorSet { raw: selectors.to_vec(), ..Default::default() };
        for raw in selectors {
            let selector = Selector::classify(reactor_root, raw);
            trace!("Selector '{}' classified as {:?}", raw, selector);
            match selector {
                Selector::Coordinate { group_id, artifact_id } if group_id.is_empty() => {
                    set.any_group.insert(artifact_id, raw.clone());
                }
                Selector::Coordinate { group_id, artifact_id } => {
                    set.coordinates.insert(Coordinate::new(group_id, artifact_id), raw.clone());
                }
                Selector::File(path) => {
                    set.files.insert(path, raw.clone());
                }
                Selector::Directory(path) => {
                    set.directories.insert(path, raw.clone());
                }
                Selector::Dead(path) => {
                    debug!("Selector '{}' names nothing at {}, ignoring", raw, path.display());
                }
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.any_group.is_empty()
            && self.coordinates.is_empty()
            && self.files.is_empty()
            && self.directories.is_empty()
    }

    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// Returns the selector matching `group_id:artifact_id` by coordinate.
    pub fn match_coordinate(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        if let Some(raw) = self.any_group.get(artifact_id) {
            return Some(raw);
        }
        self.coordinates
            .get(&Coordinate::new(group_id, artifact_id))
            .map(String::as_str)
    }

    /// Returns the selector matching the project by coordinate, descriptor or base directory.
    pub fn match_project(&self, project: &Project) -> Option<&str> {
        self.match_coordinate(&project.group_id, &project.artifact_id)
            .or_else(|| self.files.get(&project.file).map(String::as_str))
            .or_else(|| self.directories.get(&project.basedir).map(String::as_str))
    }
}

impl fmt::Display for SelectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.raw.join(", "))
    }
}
