use anyhow::Result;
use clap::{Args, ValueEnum};
use hearth_core::views::{all_event_categories, all_reward_categories, list_categories};
use serde::Serialize;
use std::path::Path;

use super::Household;
use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogKind {
    Events,
    Rewards,
}

#[derive(Args, Debug)]
pub struct CategoriesArgs {
    #[arg(long, short, value_enum, default_value_t = CatalogKind::Events)]
    pub kind: CatalogKind,

    /// Only this user's catalog. Without it, categories span every user.
    #[arg(long, short)]
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
struct CategoryList {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    categories: Vec<String>,
}

pub fn run_categories(
    args: &CategoriesArgs,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let household = Household::open(project_root, output)?;
    let snapshot = household.load();
    let user_id = match args.user.as_deref() {
        Some(requested) => Some(household.resolve_user(&snapshot, Some(requested))?),
        None => None,
    };
    let categories = match (args.kind, user_id.as_deref()) {
        (CatalogKind::Events, Some(user)) => list_categories(snapshot.events_for(user)),
        (CatalogKind::Rewards, Some(user)) => list_categories(snapshot.rewards_for(user)),
        (CatalogKind::Events, None) => all_event_categories(&snapshot),
        (CatalogKind::Rewards, None) => all_reward_categories(&snapshot),
    };
    let list = CategoryList {
        kind: match args.kind {
            CatalogKind::Events => "events",
            CatalogKind::Rewards => "rewards",
        },
        user_id,
        categories,
    };
    render_mode(
        output,
        &list,
        |l, w| {
            for category in &l.categories {
                writeln!(w, "{category}")?;
            }
            Ok(())
        },
        |l, w| {
            pretty_section(w, &format!("Categories ({})", l.kind))?;
            for category in &l.categories {
                writeln!(w, "  {category}")?;
            }
            Ok(())
        },
    )
}
