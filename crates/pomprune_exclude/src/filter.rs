//! Streaming removal of planned children from a descriptor's event stream.
//!
//! [`ExclusionFilter`] is a pure iterator transform: it pulls structural events
//! from its source and yields the same events minus the children named by a
//! [`RemovalPlan`]. Everything it yields is the untouched source text of the
//! retained events, so serializing the output reproduces the document
//! byte-for-byte except for the removed children.
//!
//! Only the top-level sections are rewritten: `modules` and `dependencies`
//! directly under the root element, and `dependencies` directly under the
//! root's `dependencyManagement`. Same-named lists nested deeper (profiles,
//! plugins) stream through unchanged. While inside one of these sections the
//! filter buffers the section's events and decides once the section closes;
//! at most one section is buffered at a time.

use log::{trace, warn};
use pomprune_core::{Event, EventKind, ParseResult};
use std::collections::{BTreeSet, VecDeque};

use crate::planner::{RemovalPlan, SectionKey};

/// Events of one section subtree, from its start tag to its end tag.
#[derive(Debug)]
struct SectionBuffer<'src> {
    section: SectionKey,
    /// Open elements outside the section root
    depth: usize,
    events: Vec<Event<'src>>,
}

impl<'src> SectionBuffer<'src> {
    fn open(section: SectionKey, depth: usize, start: Event<'src>) -> Self {
        trace!("Buffering section {} from {}", section, start.position);
        Self { section, depth, events: vec![start] }
    }
}

#[derive(Debug)]
enum FilterState<'src> {
    Outside,
    InModules(SectionBuffer<'src>),
    InDependencyManagement,
    InDependencies { buffer: SectionBuffer<'src>, managed: bool },
}

/// Result of filtering one buffered section.
#[derive(Debug)]
pub struct SectionOutcome<'src> {
    pub events: Vec<Event<'src>>,
    /// Complete child occurrences seen
    pub children: usize,
    pub removed: usize,
}

/// Drops the children at `remove` from one buffered section.
///
/// A removed child takes the separators (blank text and comments) that
/// preceded it along with it. Separators before retained children, and those
/// before the section's end tag, are kept. Positions count complete child
/// occurrences directly under the section root, in document order.
pub fn filter_section<'src>(
    buffer: Vec<Event<'src>>,
    child: &str,
    remove: &BTreeSet<usize>,
) -> SectionOutcome<'src> {
    let mut out = Vec::with_capacity(buffer.len());
    let mut separators: Vec<Event<'src>> = Vec::new();
    let mut group: Vec<Event<'src>> = Vec::new();
    // Depth inside the current child occurrence, 0 when between children
    let mut child_depth = 0usize;
    // Depth relative to the section root while between children
    let mut level = 0usize;
    let mut position = 0usize;
    let mut removed = 0usize;

    for event in buffer {
        if child_depth > 0 {
            match event.kind {
                EventKind::StartTag => child_depth += 1,
                EventKind::EndTag => child_depth -= 1,
                _ => {}
            }
            group.push(event);
            if child_depth == 0 {
                if remove.contains(&position) {
                    trace!("Dropping {} #{} with {} separators", child, position, separators.len());
                    separators.clear();
                    group.clear();
                    removed += 1;
                } else {
                    out.append(&mut separators);
                    out.append(&mut group);
                }
                position += 1;
            }
            continue;
        }

        if level == 1 && event.is_start(child) {
            child_depth = 1;
            group.push(event);
        } else if event.is_separator() {
            separators.push(event);
        } else {
            match event.kind {
                EventKind::StartTag => level += 1,
                EventKind::EndTag => level = level.saturating_sub(1),
                _ => {}
            }
            out.append(&mut separators);
            out.push(event);
        }
    }
    // Truncated section: keep whatever was still pending
    out.append(&mut separators);
    out.append(&mut group);

    SectionOutcome { events: out, children: position, removed }
}

/// A planned position the filter could not find in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unlocated {
    pub section: SectionKey,
    pub position: usize,
}

/// Iterator adapter removing planned children from an event stream.
pub struct ExclusionFilter<'p, 'src, I> {
    events: I,
    plan: &'p RemovalPlan,
    state: FilterState<'src>,
    depth: usize,
    ready: VecDeque<Event<'src>>,
    /// Sections seen closing so far
    closed: BTreeSet<SectionKey>,
    drained: bool,
    unlocated: Vec<Unlocated>,
}

impl<'p, 'src, I> ExclusionFilter<'p, 'src, I>
where
    I: Iterator<Item = ParseResult<Event<'src>>>,
{
    pub fn new(events: I, plan: &'p RemovalPlan) -> Self {
        Self {
            events,
            plan,
            state: FilterState::Outside,
            depth: 0,
            ready: VecDeque::new(),
            closed: BTreeSet::new(),
            drained: false,
            unlocated: Vec::new(),
        }
    }

    /// Planned positions that did not exist in their section. These are
    /// reported after the stream is drained; nothing was removed for them.
    pub fn unlocated(&self) -> &[Unlocated] {
        &self.unlocated
    }

    /// Advances the state machine by one event, returning it if it passes straight through.
    fn accept(&mut self, event: Event<'src>) -> Option<Event<'src>> {
        let depth = self.depth;
        match event.kind {
            EventKind::StartTag => self.depth += 1,
            EventKind::EndTag => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }

        match &mut self.state {
            FilterState::Outside => {
                if event.kind == EventKind::StartTag && depth == 1 {
                    match event.name {
                        "modules" => {
                            let buffer = SectionBuffer::open(SectionKey::Modules, depth, event);
                            self.state = FilterState::InModules(buffer);
                            return None;
                        }
                        "dependencies" => {
                            let buffer =
                                SectionBuffer::open(SectionKey::Dependencies, depth, event);
                            self.state = FilterState::InDependencies { buffer, managed: false };
                            return None;
                        }
                        "dependencyManagement" => self.state = FilterState::InDependencyManagement,
                        _ => {}
                    }
                }
                Some(event)
            }
            FilterState::InDependencyManagement => {
                if event.kind == EventKind::StartTag && depth == 2 && event.name == "dependencies"
                {
                    let buffer =
                        SectionBuffer::open(SectionKey::DependencyManagement, depth, event);
                    self.state = FilterState::InDependencies { buffer, managed: true };
                    return None;
                }
                if event.kind == EventKind::EndTag && self.depth == 1 {
                    self.state = FilterState::Outside;
                }
                Some(event)
            }
            FilterState::InModules(buffer) | FilterState::InDependencies { buffer, .. } => {
                let closes = event.kind == EventKind::EndTag && self.depth == buffer.depth;
                buffer.events.push(event);
                if closes {
                    self.close_section();
                }
                None
            }
        }
    }

    /// Filters the buffered section, queues its output and leaves the section.
    fn close_section(&mut self) {
        let (buffer, next) = match std::mem::replace(&mut self.state, FilterState::Outside) {
            FilterState::InModules(buffer) => (buffer, FilterState::Outside),
            FilterState::InDependencies { buffer, managed: true } => {
                (buffer, FilterState::InDependencyManagement)
            }
            FilterState::InDependencies { buffer, managed: false } => {
                (buffer, FilterState::Outside)
            }
            other => {
                self.state = other;
                return;
            }
        };
        self.state = next;

        let section = buffer.section;
        self.closed.insert(section);
        match self.plan.positions(section) {
            Some(remove) if !remove.is_empty() => {
                let outcome = filter_section(buffer.events, section.child_name(), remove);
                trace!(
                    "Section {}: {} children, {} removed",
                    section, outcome.children, outcome.removed
                );
                for &position in remove.range(outcome.children..) {
                    warn!(
                        "Planned removal of {} #{} in {} not found in document, keeping it",
                        section.child_name(),
                        position,
                        section
                    );
                    self.unlocated.push(Unlocated { section, position });
                }
                self.ready.extend(outcome.events);
            }
            _ => self.ready.extend(buffer.events),
        }
    }

    /// Reports planned positions in sections the document never contained.
    fn report_missing_sections(&mut self) {
        let plan = self.plan;
        for (section, positions) in plan.iter() {
            if self.closed.contains(&section) {
                continue;
            }
            for &position in positions {
                warn!(
                    "Planned removal of {} #{} not found, document has no {} section",
                    section.child_name(),
                    position,
                    section
                );
                self.unlocated.push(Unlocated { section, position });
            }
        }
    }

    /// Releases a section left open when the source ended.
    fn flush_open_section(&mut self) -> bool {
        match std::mem::replace(&mut self.state, FilterState::Outside) {
            FilterState::InModules(buffer) | FilterState::InDependencies { buffer, .. } => {
                self.ready.extend(buffer.events);
                true
            }
            _ => false,
        }
    }
}

impl<'p, 'src, I> Iterator for ExclusionFilter<'p, 'src, I>
where
    I: Iterator<Item = ParseResult<Event<'src>>>,
{
    type Item = ParseResult<Event<'src>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(Ok(event));
            }
            match self.events.next() {
                Some(Ok(event)) => {
                    if let Some(event) = self.accept(event) {
                        return Some(Ok(event));
                    }
                }
                Some(Err(err)) => return Some(Err(err)),
                None => {
                    if !self.flush_open_section() {
                        if !self.drained {
                            self.drained = true;
                            self.report_missing_sections();
                        }
                        return None;
                    }
                }
            }
        }
    }
}
