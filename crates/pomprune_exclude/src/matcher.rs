use log::debug;
use pomprune_core::{Coordinate, Project};

use crate::{index::ProjectIndex, planner::SectionKey, selector::SelectorSet};

/// Receives match and removal decisions as they are made.
pub trait MatchObserver {
    fn matched(&self, subject: &str, selector: &str);

    fn removing(&self, _project: &Project, _section: SectionKey, _entry: &str) {}
}

/// Forwards decisions to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl MatchObserver for LogObserver {
    fn matched(&self, subject: &str, selector: &str) {
        debug!("{} matches '{}'", subject, selector);
    }

    fn removing(&self, project: &Project, section: SectionKey, entry: &str) {
        debug!("Removing {} from {} of {}", entry, section, project);
    }
}

/// Decides whether projects and dependency references are excluded.
pub struct Matcher<'a> {
    selectors: &'a SelectorSet,
    index: &'a ProjectIndex<'a>,
    observer: Option<&'a dyn MatchObserver>,
}

impl<'a> Matcher<'a> {
    pub fn new(selectors: &'a SelectorSet, index: &'a ProjectIndex<'a>) -> Self {
        Self { selectors, index, observer: None }
    }

    pub fn with_observer(mut self, observer: &'a dyn MatchObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn index(&self) -> &'a ProjectIndex<'a> {
        self.index
    }

    pub fn observer(&self) -> Option<&'a dyn MatchObserver> {
        self.observer
    }

    /// True when a coordinate, descriptor or base directory selector names the project.
    pub fn matches_project(&self, project: &Project) -> bool {
        let found = self.selectors.match_project(project);
        if let (Some(selector), Some(observer)) = (found, self.observer) {
            observer.matched(&format!("Project {}", project), selector);
        }
        found.is_some()
    }

    /// True when a coordinate selector names the dependency. Path selectors
    /// never apply: a bare reference has no location of its own.
    pub fn matches_dependency_reference(&self, coordinate: &Coordinate) -> bool {
        let found = self.selectors.match_coordinate(&coordinate.group_id, &coordinate.artifact_id);
        if let (Some(selector), Some(observer)) = (found, self.observer) {
            observer.matched(&format!("Dependency {}", coordinate), selector);
        }
        found.is_some()
    }

    /// Decides a dependency entry: when the coordinate identifies a project of
    /// the build that project's match is authoritative, otherwise the bare
    /// reference is matched by coordinate.
    pub fn matches_dependency(&self, coordinate: &Coordinate) -> bool {
        match self.index.by_coordinate(coordinate) {
            Some(project) => self.matches_project(project),
            None => self.matches_dependency_reference(coordinate),
        }
    }
}
