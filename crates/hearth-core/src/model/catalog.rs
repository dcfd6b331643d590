use serde::{Deserialize, Serialize};

/// Category assigned when an upsert leaves the category blank.
pub const FALLBACK_CATEGORY: &str = "Other";

/// A repeatable earning action worth a fixed number of points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub category: String,
    pub title: String,
    pub points: u32,
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

/// A redeemable item, optionally gated by a lifetime-earned threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub category: String,
    pub title: String,
    pub cost: u32,
    #[serde(default)]
    pub unlock_at_total: u32,
    pub enabled: bool,
}

/// Shared read access to events and rewards for ranking and grouping views.
pub trait CatalogItem {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn category(&self) -> &str;
    fn enabled(&self) -> bool;
}

impl CatalogItem for Event {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}

impl CatalogItem for Reward {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}
