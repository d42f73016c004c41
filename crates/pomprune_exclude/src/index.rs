use log::{debug, warn};
use pomprune_core::{Coordinate, Project};
use std::{
    collections::{HashMap, hash_map::Entry},
    path::Path,
};

/// Read-only reverse lookups over every project of the build.
#[derive(Debug)]
pub struct ProjectIndex<'a> {
    projects: &'a [Project],
    by_file: HashMap<&'a Path, usize>,
    by_coordinate: HashMap<Coordinate, usize>,
}

impl<'a> ProjectIndex<'a> {
    /// Indexes `projects`. When two projects share a coordinate the first one wins.
    pub fn new(projects: &'a [Project]) -> Self {
        let mut by_file = HashMap::with_capacity(projects.len());
        let mut by_coordinate = HashMap::with_capacity(projects.len());
        for (i, project) in projects.iter().enumerate() {
            by_file.insert(project.file.as_path(), i);
            match by_coordinate.entry(project.coordinate()) {
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
                Entry::Occupied(slot) => warn!(
                    "Duplicate project {} at {}, keeping {}",
                    project,
                    project.file.display(),
                    projects[*slot.get()].file.display()
                ),
            }
        }
        debug!("Indexed {} projects", projects.len());
        Self { projects, by_file, by_coordinate }
    }

    pub fn by_file(&self, file: &Path) -> Option<&'a Project> {
        self.by_file.get(file).map(|&i| &self.projects[i])
    }

    pub fn by_coordinate(&self, coordinate: &Coordinate) -> Option<&'a Project> {
        self.by_coordinate.get(coordinate).map(|&i| &self.projects[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn project(artifact: &str, file: &str) -> Project {
        let file = PathBuf::from(file);
        Project {
            group_id: "g".to_string(),
            artifact_id: artifact.to_string(),
            basedir: file.parent().unwrap().to_path_buf(),
            file,
            parent: None,
            modules: vec![],
            dependency_management: vec![],
            dependencies: vec![],
            aggregator: None,
        }
    }

    #[test]
    fn test_lookups() {
        let projects = vec![project("a", "/r/a/pom.xml"), project("b", "/r/b/pom.xml")];
        let index = ProjectIndex::new(&projects);
        assert_eq!(index.by_file(Path::new("/r/b/pom.xml")).unwrap().artifact_id, "b");
        assert_eq!(index.by_coordinate(&Coordinate::new("g", "a")).unwrap().artifact_id, "a");
        assert!(index.by_file(Path::new("/r/c/pom.xml")).is_none());
        assert!(index.by_coordinate(&Coordinate::new("h", "a")).is_none());
    }

    #[test]
    fn test_duplicate_coordinate_keeps_first() {
        let projects = vec![project("a", "/r/one/pom.xml"), project("a", "/r/two/pom.xml")];
        let index = ProjectIndex::new(&projects);
        let found = index.by_coordinate(&Coordinate::new("g", "a")).unwrap();
        assert_eq!(found.file, PathBuf::from("/r/one/pom.xml"));
        assert!(index.by_file(Path::new("/r/two/pom.xml")).is_some());
    }
}
