use serde::Serialize;
use std::{fmt, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
}

impl Coordinate {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self { group_id: group_id.into(), artifact_id: artifact_id.into() }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// A dependency entry as declared in a descriptor, after placeholder interpolation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
}

impl Dependency {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.group_id.clone(), self.artifact_id.clone())
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// In-memory model of one build unit.
///
/// The three lists keep the order in which their entries appear in the
/// descriptor text, so a position in a list is also the position of the
/// matching child element in that section.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub group_id: String,
    pub artifact_id: String,
    /// Descriptor the build reads this project from
    pub file: PathBuf,
    pub basedir: PathBuf,
    pub parent: Option<Coordinate>,
    pub modules: Vec<String>,
    pub dependency_management: Vec<Dependency>,
    pub dependencies: Vec<Dependency>,
    /// Index of the project whose module list introduced this one
    pub aggregator: Option<usize>,
}

impl Project {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.group_id.clone(), self.artifact_id.clone())
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}
