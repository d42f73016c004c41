use log::{debug, trace};
use path_clean::clean;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    document::Document,
    error::PomError,
    event::EventKind,
    tokenizer::EventReader,
    types::{Coordinate, Dependency, Project},
};

/// Reads and models the descriptor at `path`.
pub fn read_project(path: &Path) -> Result<Project, PomError> {
    trace!("Reading descriptor: {}", path.display());
    let document = Document::read(path)?;
    parse_project(&document.text, path)
}

/// Models a descriptor from its text.
///
/// Only the top-level `modules`, `dependencies` and
/// `dependencyManagement/dependencies` sections are collected; lists nested in
/// profiles or plugins are not part of the model.
pub fn parse_project(src: &str, path: &Path) -> Result<Project, PomError> {
    let file = clean(path);
    let mut raw = RawProject::default();
    let mut stack: Vec<&str> = Vec::new();
    let mut text = String::new();

    for event in EventReader::new(src) {
        let event =
            event.map_err(|source| PomError::Parse { path: file.clone(), source })?;
        match event.kind {
            EventKind::StartTag => {
                stack.push(event.name);
                text.clear();
                match stack.as_slice() {
                    ["project", "dependencies", "dependency"] => {
                        raw.dependencies.push(RawDependency::default())
                    }
                    ["project", "dependencyManagement", "dependencies", "dependency"] => {
                        raw.dependency_management.push(RawDependency::default())
                    }
                    _ => {}
                }
            }
            EventKind::Text => text.push_str(&decode_text(event.raw)),
            EventKind::EndTag => {
                let value = text.trim().to_string();
                raw.assign(&stack, value);
                stack.pop();
                text.clear();
            }
            EventKind::Comment | EventKind::Directive => {}
        }
    }

    let project = raw.resolve(file)?;
    debug!(
        "Modeled {} with {} modules, {} managed and {} direct dependencies",
        project,
        project.modules.len(),
        project.dependency_management.len(),
        project.dependencies.len()
    );
    Ok(project)
}

#[derive(Debug, Default)]
struct RawDependency {
    group_id: String,
    artifact_id: String,
}

#[derive(Debug, Default)]
struct RawProject {
    group_id: Option<String>,
    artifact_id: Option<String>,
    parent_group_id: Option<String>,
    parent_artifact_id: Option<String>,
    properties: HashMap<String, String>,
    modules: Vec<String>,
    dependency_management: Vec<RawDependency>,
    dependencies: Vec<RawDependency>,
}

impl RawProject {
    fn assign(&mut self, path: &[&str], value: String) {
        match path {
            ["project", "groupId"] => self.group_id = Some(value),
            ["project", "artifactId"] => self.artifact_id = Some(value),
            ["project", "parent", "groupId"] => self.parent_group_id = Some(value),
            ["project", "parent", "artifactId"] => self.parent_artifact_id = Some(value),
            ["project", "properties", key] => {
                self.properties.insert(key.to_string(), value);
            }
            ["project", "modules", "module"] => self.modules.push(value),
            ["project", "dependencies", "dependency", field] => {
                if let Some(dep) = self.dependencies.last_mut() {
                    dep.set(field, value);
                }
            }
            ["project", "dependencyManagement", "dependencies", "dependency", field] => {
                if let Some(dep) = self.dependency_management.last_mut() {
                    dep.set(field, value);
                }
            }
            _ => {}
        }
    }

    fn resolve(self, file: PathBuf) -> Result<Project, PomError> {
        let group_id = self
            .group_id
            .clone()
            .or_else(|| self.parent_group_id.clone())
            .ok_or_else(|| PomError::MissingCoordinate { path: file.clone(), field: "groupId" })?;
        let artifact_id = self
            .artifact_id
            .clone()
            .ok_or_else(|| PomError::MissingCoordinate { path: file.clone(), field: "artifactId" })?;

        let mut props = self.properties.clone();
        for prefix in ["project.", "pom.", ""] {
            props.insert(format!("{}groupId", prefix), group_id.clone());
            props.insert(format!("{}artifactId", prefix), artifact_id.clone());
        }
        if let Some(parent_group) = &self.parent_group_id {
            props.insert("project.parent.groupId".to_string(), parent_group.clone());
            props.insert("parent.groupId".to_string(), parent_group.clone());
        }

        let group_id = interpolate(&group_id, &props);
        let artifact_id = interpolate(&artifact_id, &props);
        let parent = match (self.parent_group_id, self.parent_artifact_id) {
            (Some(g), Some(a)) => {
                Some(Coordinate::new(interpolate(&g, &props), interpolate(&a, &props)))
            }
            _ => None,
        };
        let interpolate_all = |deps: Vec<RawDependency>| -> Vec<Dependency> {
            deps.into_iter()
                .map(|d| Dependency {
                    group_id: interpolate(&d.group_id, &props),
                    artifact_id: interpolate(&d.artifact_id, &props),
                })
                .collect()
        };
        let basedir = file.parent().map(Path::to_path_buf).unwrap_or_default();

        Ok(Project {
            group_id,
            artifact_id,
            basedir,
            parent,
            modules: self.modules,
            dependency_management: interpolate_all(self.dependency_management),
            dependencies: interpolate_all(self.dependencies),
            file,
            aggregator: None,
        })
    }
}

impl RawDependency {
    fn set(&mut self, field: &str, value: String) {
        match field {
            "groupId" => self.group_id = value,
            "artifactId" => self.artifact_id = value,
            _ => {}
        }
    }
}

/// Replaces `${key}` placeholders that have a known value; unknown ones are kept verbatim.
fn interpolate(value: &str, props: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let key = &rest[start + 2..start + 2 + len];
        out.push_str(&rest[..start]);
        match props.get(key) {
            Some(v) => out.push_str(v),
            None => out.push_str(&rest[start..start + 3 + len]),
        }
        rest = &rest[start + 3 + len..];
    }
    out.push_str(rest);
    out
}

fn decode_text(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix("<![CDATA[").and_then(|r| r.strip_suffix("]]>")) {
        return inner.to_string();
    }
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
