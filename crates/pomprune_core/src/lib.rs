//! Core utilities for pomprune tools.
//!
//! This crate provides the document-level building blocks for working with
//! multi-project build descriptors, including:
//! - Reading descriptors in the encoding they declare
//! - Streaming descriptors as structural events without losing a byte
//! - Writing event streams back out as text
//! - Modeling a descriptor's coordinates, modules and dependencies
//! - Discovering the projects of a build and its reactor root

mod config;
mod document;
mod error;
mod event;
mod parser;
mod reactor;
mod serializer;
mod tokenizer;
mod types;

/// File name of a project descriptor inside a module directory
pub const DESCRIPTOR_FILE_NAME: &str = "pom.xml";
/// Directory holding per-build configuration under the reactor root
pub const CONFIG_DIR_NAME: &str = ".mvn";

// Re-export public API
pub use config::{find_reactor_root, find_reactor_root_from};
pub use document::Document;
pub use error::{ParseError, ParseResult, PomError};
pub use event::{Event, EventKind, Position};
pub use parser::{parse_project, read_project};
pub use reactor::{Reactor, module_descriptor};
pub use serializer::{render, write_events};
pub use tokenizer::EventReader;
pub use types::{Coordinate, Dependency, Project};
