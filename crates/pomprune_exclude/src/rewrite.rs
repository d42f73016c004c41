use anyhow::{Context, Result};
use log::{debug, info, warn};
use pomprune_core::{Document, EventReader, Project, Reactor, render};
use std::path::PathBuf;

use crate::{
    config::{Config, read_selectors},
    filter::ExclusionFilter,
    index::ProjectIndex,
    matcher::{LogObserver, Matcher},
    planner::{RemovalPlan, plan_removals},
    selector::SelectorSet,
    staging::StagedWrite,
    types::{ExcludedProject, ExclusionOutcome, FailedProject, RewrittenProject},
};

/// A filtered descriptor held in memory until the whole batch has succeeded.
#[derive(Debug)]
pub struct PendingRewrite {
    pub output: PathBuf,
    /// Encoded in the original descriptor's encoding
    pub content: Vec<u8>,
    pub encoding: &'static str,
    pub unlocated: Vec<String>,
}

/// Filters `project`'s descriptor through `plan` in a single pass.
pub fn rewrite_descriptor(
    project: &Project,
    plan: &RemovalPlan,
    output_name: &str,
) -> Result<PendingRewrite> {
    let document = Document::read(&project.file)?;
    let mut filter = ExclusionFilter::new(EventReader::new(&document.text), plan);
    let text =
        render(&mut filter).with_context(|| format!("Failed to parse {}", project.file.display()))?;
    let unlocated = filter
        .unlocated()
        .iter()
        .map(|u| format!("{} #{}", u.section, u.position))
        .collect();
    Ok(PendingRewrite {
        output: project.basedir.join(output_name),
        content: document.encode(&text),
        encoding: document.encoding_name(),
        unlocated,
    })
}

/// Marks every project that is excluded outright or aggregated by an excluded project.
///
/// Relies on aggregators preceding the projects they aggregate, which
/// breadth-first reactor loading guarantees.
fn excluded_projects(projects: &[Project], matcher: &Matcher) -> Vec<bool> {
    let mut excluded = vec![false; projects.len()];
    for (i, project) in projects.iter().enumerate() {
        let with_aggregator = project.aggregator.is_some_and(|a| a < i && excluded[a]);
        excluded[i] = with_aggregator || matcher.matches_project(project);
    }
    excluded
}

/// Excludes the selected projects from the build and rewrites the descriptors
/// of the remaining projects that reference them.
pub fn run_exclusion(mut cfg: Config) -> Result<ExclusionOutcome> {
    info!("Starting exclusion");
    cfg.initialize()?;
    let root = cfg.root()?.clone();
    let excludes = cfg.excludes()?.clone();

    let Some(raw) = read_selectors(&excludes)? else {
        info!("No exclusions provided in {}", excludes.display());
        return Ok(ExclusionOutcome { dry_run: cfg.dry_run, ..Default::default() });
    };

    let selectors = SelectorSet::new(&root, &raw);
    info!("Using following exclusions: {}", selectors);
    let reactor = Reactor::load(cfg.pom()?)?;
    exclude_from_reactor(reactor, &selectors, &cfg)
}

/// Applies `selectors` to an already loaded build.
pub fn exclude_from_reactor(
    mut reactor: Reactor,
    selectors: &SelectorSet,
    cfg: &Config,
) -> Result<ExclusionOutcome> {
    let mut outcome = ExclusionOutcome {
        selectors: selectors.raw().to_vec(),
        dry_run: cfg.dry_run,
        ..Default::default()
    };

    // Everything is decided against the untouched build before any project changes
    let (excluded, pending) = {
        let index = ProjectIndex::new(&reactor.projects);
        let observer = LogObserver;
        let matcher = Matcher::new(selectors, &index).with_observer(&observer);
        let excluded = excluded_projects(&reactor.projects, &matcher);

        let mut pending: Vec<(usize, RemovalPlan, PendingRewrite)> = Vec::new();
        for (i, project) in reactor.projects.iter().enumerate() {
            if excluded[i] {
                debug!("Project excluded: {}", project);
                outcome.excluded.push(ExcludedProject {
                    coordinate: project.coordinate(),
                    file: project.file.clone(),
                    selector: selectors.match_project(project).map(str::to_string),
                });
                continue;
            }
            debug!("Project included: {}", project);

            let plan = plan_removals(project, &matcher);
            if plan.is_empty() {
                continue;
            }
            match rewrite_descriptor(project, &plan, &cfg.output_name) {
                Ok(rewrite) => pending.push((i, plan, rewrite)),
                Err(e) if cfg.isolate_failures => {
                    warn!("Leaving {} untouched: {:#}", project, e);
                    outcome.failed.push(failed_project(project, &e));
                }
                Err(e) => {
                    return Err(e.context(format!("Unable to rewrite descriptor of {}", project)));
                }
            }
        }
        (excluded, pending)
    };

    // Stage every output before any of them replaces its destination
    let mut staged: Vec<(usize, RemovalPlan, PendingRewrite, Option<StagedWrite>)> = Vec::new();
    for (i, plan, rewrite) in pending {
        if cfg.dry_run {
            staged.push((i, plan, rewrite, None));
            continue;
        }
        match StagedWrite::stage(&rewrite.output, &rewrite.content) {
            Ok(guard) => staged.push((i, plan, rewrite, Some(guard))),
            Err(e) if cfg.isolate_failures => {
                let project = &reactor.projects[i];
                warn!("Leaving {} untouched: {:#}", project, e);
                outcome.failed.push(failed_project(project, &e));
            }
            Err(e) => {
                let project = &reactor.projects[i];
                return Err(e.context(format!("Unable to write descriptor of {}", project)));
            }
        }
    }

    // Renames are the only step left that can fail once staging succeeded
    for (i, plan, rewrite, guard) in staged {
        let project = &mut reactor.projects[i];
        if let Some(guard) = guard {
            match guard.commit() {
                Ok(()) => {}
                Err(e) if cfg.isolate_failures => {
                    warn!("Leaving {} untouched: {:#}", project, e);
                    outcome.failed.push(failed_project(project, &e));
                    continue;
                }
                Err(e) => {
                    return Err(e.context(format!("Unable to write descriptor of {}", project)));
                }
            }
        }
        outcome.rewritten.push(RewrittenProject {
            coordinate: project.coordinate(),
            original: project.file.clone(),
            output: rewrite.output.clone(),
            encoding: rewrite.encoding,
            removed: plan.describe(project),
            unlocated: rewrite.unlocated,
        });
        plan.apply(project);
        project.file = rewrite.output;
        debug!("Project {} now reads {}", project, project.file.display());
    }

    outcome.reactor = retain_included(reactor, &excluded);
    info!(
        "Exclusion complete: {} projects excluded, {} descriptors rewritten, {} projects remain",
        outcome.excluded.len(),
        outcome.rewritten.len(),
        outcome.reactor.len()
    );
    Ok(outcome)
}

fn failed_project(project: &Project, error: &anyhow::Error) -> FailedProject {
    FailedProject {
        coordinate: project.coordinate(),
        file: project.file.clone(),
        error: format!("{:#}", error),
    }
}

/// Drops excluded projects, renumbering aggregator links to the kept ones.
fn retain_included(reactor: Reactor, excluded: &[bool]) -> Reactor {
    let mut new_index: Vec<Option<usize>> = vec![None; excluded.len()];
    let mut projects = Vec::with_capacity(reactor.projects.len());
    for (i, mut project) in reactor.projects.into_iter().enumerate() {
        if excluded[i] {
            continue;
        }
        new_index[i] = Some(projects.len());
        project.aggregator = project.aggregator.and_then(|a| new_index.get(a).copied().flatten());
        projects.push(project);
    }
    Reactor { projects }
}
