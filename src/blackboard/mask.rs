// Per-lobe filter mask (C2). Data-only, pure: `matches` never mutates
// anything, and exclusions always dominate inclusions.

use super::item::{Category, ContextItem, Zone};
use crate::lobes::LobeId;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Mask {
    pub lobe_id: Option<LobeId>,
    pub include_categories: Option<HashSet<Category>>,
    pub exclude_categories: HashSet<Category>,
    pub include_sources: Option<HashSet<LobeId>>,
    pub exclude_sources: HashSet<LobeId>,
    pub include_zones: Option<HashSet<Zone>>,
    pub exclude_zones: HashSet<Zone>,
    pub min_priority: f64,
    pub token_cap: Option<u32>,
}

impl Mask {
    /// The default mask: no inclusion/exclusion restrictions, zero
    /// priority floor, unlimited token cap — matches every item.
    pub fn default_mask() -> Self {
        Self::default()
    }

    pub fn for_lobe(lobe_id: LobeId) -> Self {
        Self {
            lobe_id: Some(lobe_id),
            ..Self::default()
        }
    }

    pub fn with_min_priority(mut self, min_priority: f64) -> Self {
        self.min_priority = min_priority.clamp(0.0, 1.0);
        self
    }

    pub fn with_token_cap(mut self, cap: u32) -> Self {
        self.token_cap = Some(cap);
        self
    }

    pub fn exclude_category(mut self, category: Category) -> Self {
        self.exclude_categories.insert(category);
        self
    }

    pub fn include_only_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.include_categories = Some(categories.into_iter().collect());
        self
    }

    pub fn exclude_zone(mut self, zone: Zone) -> Self {
        self.exclude_zones.insert(zone);
        self
    }

    /// Pure predicate. Exclusions are checked first and always win.
    pub fn matches(&self, item: &ContextItem) -> bool {
        if item.priority < self.min_priority {
            return false;
        }
        if self.exclude_categories.contains(&item.category) {
            return false;
        }
        if self.exclude_sources.contains(&item.source_lobe) {
            return false;
        }
        if self.exclude_zones.contains(&item.zone) {
            return false;
        }
        if let Some(ref include) = self.include_categories {
            if !include.contains(&item.category) {
                return false;
            }
        }
        if let Some(ref include) = self.include_sources {
            if !include.contains(&item.source_lobe) {
                return false;
            }
        }
        if let Some(ref include) = self.include_zones {
            if !include.contains(&item.zone) {
                return false;
            }
        }
        true
    }
}
