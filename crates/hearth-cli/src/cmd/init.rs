use anyhow::{Context as _, Result};
use clap::Args;
use hearth_core::config::hearth_dir;
use hearth_core::defaults;
use hearth_core::store::SnapshotStore;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use super::{load_config, require_parent, store_for};
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Replace an existing household state with fresh defaults.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[store]\n\
    file = \"state.json\"\n\
    lock_timeout_ms = 2000\n\
    \n\
    [sync]\n\
    default_url = \"http://127.0.0.1:8787\"\n";

#[derive(Debug, Serialize)]
struct InitReport {
    state_path: String,
    config_path: String,
    users: Vec<String>,
    active_user_id: String,
}

/// Execute `hth init`. Creates the project skeleton:
///
/// ```text
/// .hearth/
///   config.toml   (default project config, kept when present)
///   state.json    (seed household)
/// ```
pub fn run_init(
    args: &InitArgs,
    pin: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let dir = hearth_dir(project_root);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        std::fs::write(&config_path, CONFIG_TOML)
            .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
    }
    let config = load_config(project_root, output)?;
    let store = store_for(project_root, &config);

    if store.exists() {
        if !args.force {
            anyhow::bail!(
                "{} already exists. Use `hth init --force` to start over.",
                store.path().display()
            );
        }
        require_parent(&store.load(), pin, output)?;
    }

    let mut snapshot = defaults::default_snapshot();
    let mut settings = snapshot.settings.clone();
    settings.sync_endpoint_url.clone_from(&config.sync.default_url);
    snapshot = snapshot.with_settings(settings);
    store.save(&snapshot)?;
    info!(path = %store.path().display(), "initialized household");

    let report = InitReport {
        state_path: store.path().display().to_string(),
        config_path: config_path.display().to_string(),
        users: snapshot.users.iter().map(|u| u.id.clone()).collect(),
        active_user_id: snapshot.settings.active_user_id.clone(),
    };
    render(output, &report, |r, w| {
        writeln!(w, "✓ Initialized household at {}", r.state_path)?;
        writeln!(w, "  Users:  {}", r.users.join(", "))?;
        writeln!(w, "  Active: {}", r.active_user_id)?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  hth status")?;
        writeln!(w, "  hth earn --event tidy_room")
    })
}
