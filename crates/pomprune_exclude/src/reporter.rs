use std::{
    io::{self, Write},
    path::Path,
};

use colored::Colorize;
use log::{debug, trace};

use crate::{config::Config, types::ExclusionOutcome};

/// Path relative to the reactor root when it lies inside it
fn display_path(root: Option<&Path>, path: &Path) -> String {
    root.and_then(|r| path.strip_prefix(r).ok())
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(path)
        .display()
        .to_string()
}

pub fn print_no_exclusions_message<W: Write>(writer: &mut W, cfg: &Config) -> io::Result<()> {
    debug!("No exclusions applied");
    let source = cfg
        .excludes
        .as_deref()
        .map(|p| display_path(cfg.root.as_deref(), p))
        .unwrap_or_else(|| ".mvn/excludes.txt".to_string());
    writeln!(writer, "{} No exclusions provided in {}", "✓".green().bold(), source.blue())?;
    writer.flush()?;
    Ok(())
}

pub fn print_outcome_tree<W: Write>(
    writer: &mut W,
    outcome: &ExclusionOutcome,
    cfg: &Config,
) -> io::Result<()> {
    debug!(
        "Printing outcome: {} excluded, {} rewritten, {} failed",
        outcome.excluded.len(),
        outcome.rewritten.len(),
        outcome.failed.len()
    );
    let root = cfg.root.as_deref();

    writeln!(
        writer,
        "{} Excluding with {} selectors: {}\n",
        "✂".yellow().bold(),
        outcome.selectors.len().to_string().yellow(),
        outcome.selectors.join(", ")
    )?;

    if !outcome.excluded.is_empty() {
        writeln!(writer, "{}", "Excluded projects".bright_white().bold())?;
        for (idx, project) in outcome.excluded.iter().enumerate() {
            let prefix = if idx == outcome.excluded.len() - 1 { "└──" } else { "├──" };
            let reason = match &project.selector {
                Some(selector) => format!("matches '{}'", selector),
                None => "aggregated by an excluded project".to_string(),
            };
            writeln!(
                writer,
                "{}  {} {} ({})",
                prefix.dimmed(),
                project.coordinate.to_string().red(),
                display_path(root, &project.file).blue(),
                reason.dimmed()
            )?;
        }
        writeln!(writer)?;
    }

    for rewrite in &outcome.rewritten {
        trace!("Printing rewrite of {}", rewrite.coordinate);
        writeln!(
            writer,
            "{} {} {}",
            display_path(root, &rewrite.original).blue(),
            "→".dimmed(),
            display_path(root, &rewrite.output).bright_white().bold()
        )?;
        let lines: Vec<String> = rewrite
            .removed
            .iter()
            .flat_map(|(section, entries)| {
                entries.iter().map(move |e| format!("{} {}", section.as_str().dimmed(), e.red()))
            })
            .chain(rewrite.unlocated.iter().map(|u| format!("{} {}", "kept".yellow(), u)))
            .collect();
        for (idx, line) in lines.iter().enumerate() {
            let prefix = if idx == lines.len() - 1 { "└──" } else { "├──" };
            writeln!(writer, "{}  {}", prefix.dimmed(), line)?;
        }
        writeln!(writer)?;
    }

    for failure in &outcome.failed {
        writeln!(
            writer,
            "{} {} {}: {}",
            "✗".red().bold(),
            failure.coordinate,
            display_path(root, &failure.file).blue(),
            failure.error
        )?;
    }

    print_summary(writer, outcome)?;
    writer.flush()?;
    Ok(())
}

fn print_summary<W: Write>(writer: &mut W, outcome: &ExclusionOutcome) -> io::Result<()> {
    let removed: usize =
        outcome.rewritten.iter().flat_map(|r| r.removed.values()).map(Vec::len).sum();

    writeln!(writer, "{}", "─".repeat(60).dimmed())?;
    writeln!(writer, "{}", "Summary".bold())?;
    writeln!(writer, "  Projects excluded: {}", outcome.excluded.len().to_string().yellow().bold())?;
    writeln!(writer, "  Descriptors rewritten: {}", outcome.rewritten.len().to_string().yellow())?;
    writeln!(writer, "  Entries removed: {}", removed.to_string().yellow())?;
    writeln!(writer, "  Projects remaining: {}", outcome.reactor.len().to_string().cyan())?;
    if !outcome.failed.is_empty() {
        writeln!(writer, "  Failed rewrites: {}", outcome.failed.len().to_string().red().bold())?;
    }
    if outcome.dry_run {
        writeln!(writer, "  {}", "Dry run: no descriptor was written".dimmed())?;
    }
    Ok(())
}

pub fn print_json<W: Write>(writer: &mut W, outcome: &ExclusionOutcome) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, outcome)?;
    writeln!(writer)?;
    writer.flush()
}
