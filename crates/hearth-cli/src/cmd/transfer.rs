//! `hth export`, `hth import` and `hth reset`.

use anyhow::{Context as _, Result};
use clap::Args;
use hearth_core::ops;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{Household, fail, require_parent};
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Snapshot JSON previously written by `hth export`.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Confirm that every user, catalog and ledger row is discarded.
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct TransferReport {
    path: Option<String>,
    users: usize,
    entries: usize,
}

pub fn run_export(args: &ExportArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let household = Household::open(project_root, output)?;
    let snapshot = household.load();
    let text = ops::export(&snapshot).context("Failed to serialize household state")?;

    let Some(path) = &args.output else {
        // The document itself is the output, whatever the mode.
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{text}")?;
        return Ok(());
    };
    std::fs::write(path, format!("{text}\n"))
        .with_context(|| format!("Failed to write export: {}", path.display()))?;
    info!(path = %path.display(), "exported household");
    let report = TransferReport {
        path: Some(path.display().to_string()),
        users: snapshot.users.len(),
        entries: snapshot.ledger.len(),
    };
    render(output, &report, |r, w| {
        writeln!(
            w,
            "✓ Exported {} users and {} entries to {}",
            r.users,
            r.entries,
            r.path.as_deref().unwrap_or_default()
        )
    })
}

pub fn run_import(
    args: &ImportArgs,
    pin: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let household = Household::open(project_root, output)?;
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let report = household.mutate(|snapshot| {
        require_parent(snapshot, pin, output)?;
        let imported = ops::parse_import_with(&text, household.store.rules())
            .map_err(|err| fail(output, err.to_string(), err.code()))?;
        let report = TransferReport {
            path: Some(args.file.display().to_string()),
            users: imported.users.len(),
            entries: imported.ledger.len(),
        };
        Ok((imported, report))
    })?;
    render(output, &report, |r, w| {
        writeln!(w, "✓ Imported {} users and {} entries", r.users, r.entries)
    })
}

pub fn run_reset(
    args: &ResetArgs,
    pin: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let household = Household::open(project_root, output)?;
    if !args.yes {
        anyhow::bail!("Reset discards all household data. Re-run with --yes to confirm.");
    }
    let sync_url = household.config.sync.default_url.clone();
    let report = household.mutate(|snapshot| {
        require_parent(snapshot, pin, output)?;
        let fresh = ops::reset();
        let mut settings = fresh.settings.clone();
        settings.sync_endpoint_url = sync_url;
        let fresh = fresh.with_settings(settings);
        let report = TransferReport {
            path: None,
            users: fresh.users.len(),
            entries: fresh.ledger.len(),
        };
        Ok((fresh, report))
    })?;
    info!("household reset to defaults");
    render(output, &report, |r, w| {
        writeln!(w, "✓ Reset household ({} users, empty ledger)", r.users)
    })
}
