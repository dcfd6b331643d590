use anyhow::Result;
use clap::Args;
use hearth_core::Snapshot;
use hearth_core::ops;
use hearth_core::views;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use super::{Household, command_failed};
use crate::output::{OutputMode, Renderable, render, render_list};

#[derive(Args, Debug)]
pub struct SwitchArgs {
    /// User id to make active.
    pub user: String,
}

#[derive(Debug, Serialize)]
struct UserRow {
    id: String,
    name: String,
    active: bool,
    balance: i64,
}

impl Renderable for UserRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let marker = if self.active { "*" } else { " " };
        writeln!(w, "{marker} {:<10} {:<12} {:>5} pts", self.id, self.name, self.balance)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}\t{}\t{}\t{}", self.id, self.name, self.active, self.balance)
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NAME", "ACTIVE", "BALANCE"]
    }
}

fn user_rows(snapshot: &Snapshot) -> Vec<UserRow> {
    let active = snapshot.active_user().map(|u| u.id.as_str()).unwrap_or_default();
    snapshot
        .users
        .iter()
        .map(|user| UserRow {
            id: user.id.clone(),
            name: user.name.clone(),
            active: user.id == active,
            balance: views::totals(snapshot, &user.id).balance,
        })
        .collect()
}

pub fn run_users(output: OutputMode, project_root: &Path) -> Result<()> {
    let household = Household::open(project_root, output)?;
    render_list(&user_rows(&household.load()), output)
}

pub fn run_switch(args: &SwitchArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let household = Household::open(project_root, output)?;
    let user = household.mutate(|snapshot| {
        let outcome = ops::set_active_user(snapshot, args.user.trim())
            .map_err(|err| command_failed(output, &err))?;
        let user = outcome
            .state
            .active_user()
            .map(|u| serde_json::json!({ "id": u.id, "name": u.name }))
            .unwrap_or_default();
        Ok((outcome.state, user))
    })?;
    render(output, &user, |u, w| {
        writeln!(w, "✓ Active user: {}", u["name"].as_str().unwrap_or_default())
    })
}
