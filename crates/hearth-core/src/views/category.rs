use std::collections::BTreeSet;

use crate::model::{CatalogItem, Snapshot};

fn sort_case_insensitive(mut names: Vec<String>) -> Vec<String> {
    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    names
}

/// Distinct categories, sorted ignoring case.
#[must_use]
pub fn list_categories<T: CatalogItem>(items: &[T]) -> Vec<String> {
    let distinct: BTreeSet<&str> = items.iter().map(CatalogItem::category).collect();
    sort_case_insensitive(distinct.into_iter().map(str::to_string).collect())
}

/// Items grouped by category. Groups follow [`list_categories`] order and
/// each group keeps catalog order.
#[must_use]
pub fn group_by_category<T: CatalogItem>(items: &[T]) -> Vec<(String, Vec<&T>)> {
    list_categories(items)
        .into_iter()
        .map(|category| {
            let members = items
                .iter()
                .filter(|item| item.category() == category)
                .collect();
            (category, members)
        })
        .collect()
}

/// Event categories across every user's catalog.
#[must_use]
pub fn all_event_categories(snapshot: &Snapshot) -> Vec<String> {
    let distinct: BTreeSet<String> = snapshot
        .users
        .iter()
        .flat_map(|user| snapshot.events_for(&user.id))
        .map(|event| event.category.clone())
        .collect();
    sort_case_insensitive(distinct.into_iter().collect())
}

/// Reward categories across every user's catalog.
#[must_use]
pub fn all_reward_categories(snapshot: &Snapshot) -> Vec<String> {
    let distinct: BTreeSet<String> = snapshot
        .users
        .iter()
        .flat_map(|user| snapshot.rewards_for(&user.id))
        .map(|reward| reward.category.clone())
        .collect();
    sort_case_insensitive(distinct.into_iter().collect())
}
