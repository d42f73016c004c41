use log::{debug, trace};
use pomprune_core::{Dependency, Project, module_descriptor};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::matcher::Matcher;

/// A list location inside a descriptor whose children can be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SectionKey {
    #[serde(rename = "modules")]
    Modules,
    #[serde(rename = "dependencyManagement/dependencies")]
    DependencyManagement,
    #[serde(rename = "dependencies")]
    Dependencies,
}

impl SectionKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::Modules => "modules",
            SectionKey::DependencyManagement => "dependencyManagement/dependencies",
            SectionKey::Dependencies => "dependencies",
        }
    }

    /// Element name of the section's children.
    pub fn child_name(self) -> &'static str {
        match self {
            SectionKey::Modules => "module",
            SectionKey::DependencyManagement | SectionKey::Dependencies => "dependency",
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-section child positions to delete from one descriptor.
///
/// Positions are zero-based and refer to the section's order before anything
/// is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalPlan {
    sections: BTreeMap<SectionKey, BTreeSet<usize>>,
}

impl RemovalPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, section: SectionKey, position: usize) {
        self.sections.entry(section).or_default().insert(position);
    }

    pub fn positions(&self, section: SectionKey) -> Option<&BTreeSet<usize>> {
        self.sections.get(&section)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(BTreeSet::is_empty)
    }

    /// Total number of positions across all sections.
    pub fn len(&self) -> usize {
        self.sections.values().map(BTreeSet::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionKey, &BTreeSet<usize>)> {
        self.sections.iter().map(|(k, v)| (*k, v))
    }

    /// Names the entries the plan removes from `project`, per section.
    pub fn describe(&self, project: &Project) -> BTreeMap<SectionKey, Vec<String>> {
        self.iter()
            .map(|(section, positions)| {
                let entries = positions
                    .iter()
                    .filter_map(|&i| match section {
                        SectionKey::Modules => project.modules.get(i).cloned(),
                        SectionKey::DependencyManagement => {
                            project.dependency_management.get(i).map(Dependency::to_string)
                        }
                        SectionKey::Dependencies => {
                            project.dependencies.get(i).map(Dependency::to_string)
                        }
                    })
                    .collect();
                (section, entries)
            })
            .collect()
    }

    /// Removes the planned entries from the in-memory model.
    ///
    /// Positions are removed highest first so the remaining ones stay valid.
    pub fn apply(&self, project: &mut Project) {
        for (section, positions) in self.iter() {
            match section {
                SectionKey::Modules => remove_positions(&mut project.modules, positions),
                SectionKey::DependencyManagement => {
                    remove_positions(&mut project.dependency_management, positions)
                }
                SectionKey::Dependencies => remove_positions(&mut project.dependencies, positions),
            }
        }
    }
}

fn remove_positions<T>(list: &mut Vec<T>, positions: &BTreeSet<usize>) {
    for &i in positions.iter().rev() {
        if i < list.len() {
            list.remove(i);
        }
    }
}

/// Plans which modules and dependency entries to drop from one project.
pub fn plan_removals(project: &Project, matcher: &Matcher) -> RemovalPlan {
    trace!("Planning removals for {}", project);
    let mut plan = RemovalPlan::new();
    let index = matcher.index();

    for (i, module) in project.modules.iter().enumerate() {
        let descriptor = module_descriptor(&project.basedir, module);
        if let Some(child) = index.by_file(&descriptor)
            && matcher.matches_project(child)
        {
            plan.mark(SectionKey::Modules, i);
            report(matcher, project, SectionKey::Modules, module);
        }
    }

    let sections = [
        (SectionKey::DependencyManagement, &project.dependency_management),
        (SectionKey::Dependencies, &project.dependencies),
    ];
    for (section, dependencies) in sections {
        for (i, dependency) in dependencies.iter().enumerate() {
            if matcher.matches_dependency(&dependency.coordinate()) {
                plan.mark(section, i);
                report(matcher, project, section, &dependency.to_string());
            }
        }
    }

    if !plan.is_empty() {
        debug!("Planned {} removals for {}", plan.len(), project);
    }
    plan
}

fn report(matcher: &Matcher, project: &Project, section: SectionKey, entry: &str) {
    if let Some(observer) = matcher.observer() {
        observer.removing(project, section, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{index::ProjectIndex, selector::SelectorSet};
    use path_clean::clean;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn project(root: &Path, artifact: &str, dir: &str) -> Project {
        let basedir = clean(root.join(dir));
        Project {
            group_id: "com.example".to_string(),
            artifact_id: artifact.to_string(),
            file: basedir.join("pom.xml"),
            basedir,
            parent: None,
            modules: vec![],
            dependency_management: vec![],
            dependencies: vec![],
            aggregator: None,
        }
    }

    fn dep(group: &str, artifact: &str) -> Dependency {
        Dependency { group_id: group.to_string(), artifact_id: artifact.to_string() }
    }

    fn selectors(root: &Path, raw: &[&str]) -> SelectorSet {
        SelectorSet::new(root, &raw.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn test_plan_modules_and_dependencies() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for dir in ["sub1", "sub2", "sub3"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        let mut parent = project(root, "parent", ".");
        parent.modules = vec!["sub1".into(), "sub2/".into(), "./sub3".into()];
        parent.dependency_management = vec![dep("com.example", "sub2"), dep("org.x", "x")];
        parent.dependencies = vec![dep("org.x", "x"), dep("org.y", "lib-a"), dep("com.example", "sub2")];
        let projects = vec![
            parent,
            project(root, "sub1", "sub1"),
            project(root, "sub2", "sub2"),
            project(root, "sub3", "sub3"),
        ];
        let index = ProjectIndex::new(&projects);
        let set = selectors(root, &["sub2", ":lib-a"]);
        let matcher = Matcher::new(&set, &index);

        let plan = plan_removals(&projects[0], &matcher);
        assert_eq!(plan.positions(SectionKey::Modules), Some(&BTreeSet::from([1])));
        assert_eq!(plan.positions(SectionKey::DependencyManagement), Some(&BTreeSet::from([0])));
        assert_eq!(plan.positions(SectionKey::Dependencies), Some(&BTreeSet::from([1, 2])));
        assert_eq!(plan.len(), 4);

        let described = plan.describe(&projects[0]);
        assert_eq!(described[&SectionKey::Modules], vec!["sub2/"]);
        assert_eq!(described[&SectionKey::Dependencies], vec!["org.y:lib-a", "com.example:sub2"]);
    }

    #[test]
    fn test_module_outside_build_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("sub2")).unwrap();
        let mut parent = project(root, "parent", ".");
        parent.modules = vec!["sub2".into()];
        let projects = vec![parent];
        let index = ProjectIndex::new(&projects);
        let set = selectors(root, &["sub2"]);
        let matcher = Matcher::new(&set, &index);

        assert!(plan_removals(&projects[0], &matcher).is_empty());
    }

    #[test]
    fn test_apply_removes_highest_first() {
        let temp_dir = TempDir::new().unwrap();
        let mut p = project(temp_dir.path(), "p", ".");
        p.modules = vec!["a".into(), "b".into(), "c".into()];
        p.dependencies = vec![dep("g", "x"), dep("g", "y")];

        let mut plan = RemovalPlan::new();
        plan.mark(SectionKey::Modules, 2);
        plan.mark(SectionKey::Modules, 0);
        plan.mark(SectionKey::Dependencies, 5);
        plan.apply(&mut p);

        assert_eq!(p.modules, vec!["b"]);
        assert_eq!(p.dependencies.len(), 2);
    }

    #[test]
    fn test_empty_plan() {
        let plan = RemovalPlan::new();
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
    }
}
