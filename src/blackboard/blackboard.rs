// The Attention-Aware Blackboard (C2).
//
// Three zone partitions (Critical/Supporting/Actionable), each with its
// own token budget. Add/Remove serialize against each other and all
// writes via a single RwLock (guaranteeing the zone map and the token
// totals never drift apart); reads proceed concurrently.

use super::item::{ContextItem, Zone};
use super::mask::Mask;
use crate::config::{OverflowPolicy, ZoneConfig};
use crate::errors::{CortexError, CortexResult};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BlackboardStats {
    pub total_items: usize,
    pub zone_tokens: HashMap<Zone, u32>,
    pub total_tokens: u32,
    pub total_budget: u32,
    pub utilization: f64,
}

struct State {
    items: HashMap<Uuid, ContextItem>,
    /// Insertion order per zone, oldest at the front.
    zone_order: HashMap<Zone, VecDeque<Uuid>>,
    zone_tokens: HashMap<Zone, u32>,
}

impl State {
    fn new() -> Self {
        let mut zone_order = HashMap::new();
        let mut zone_tokens = HashMap::new();
        for zone in Zone::all() {
            zone_order.insert(zone, VecDeque::new());
            zone_tokens.insert(zone, 0);
        }
        Self {
            items: HashMap::new(),
            zone_order,
            zone_tokens,
        }
    }
}

pub struct Blackboard {
    state: RwLock<State>,
    config: ZoneConfig,
}

impl Blackboard {
    pub fn new(config: ZoneConfig) -> Self {
        Self {
            state: RwLock::new(State::new()),
            config,
        }
    }

    fn budget(&self, zone: Zone) -> u32 {
        match zone {
            Zone::Critical => self.config.critical_budget,
            Zone::Supporting => self.config.supporting_budget,
            Zone::Actionable => self.config.actionable_budget,
        }
    }

    /// Insert `item`. Under `Reject`, an insertion that would exceed the
    /// zone's budget fails without mutating anything. Under `Evict`,
    /// the lowest-priority, oldest-accessed items in that zone are
    /// removed (expired items preferred) until there is room, or the
    /// insert is rejected if the item alone exceeds the budget.
    pub fn add(&self, item: ContextItem) -> CortexResult<()> {
        let zone = item.zone;
        let budget = self.budget(zone);
        if item.tokens > budget {
            return Err(CortexError::rejected(format!(
                "item requires {} tokens but zone {:?} budget is only {budget}",
                item.tokens, zone
            )));
        }

        let mut state = self.state.write().unwrap();
        let current = *state.zone_tokens.get(&zone).unwrap_or(&0);

        if current + item.tokens > budget {
            match self.config.overflow_policy {
                OverflowPolicy::Reject => {
                    warn!(?zone, tokens = item.tokens, "blackboard: add rejected, zone full");
                    return Err(CortexError::rejected(format!(
                        "zone {zone:?} is full ({current}/{budget} tokens)"
                    )));
                }
                OverflowPolicy::Evict => {
                    let need = (current + item.tokens).saturating_sub(budget);
                    evict_to_free(&mut state, zone, need);
                }
            }
        }

        let tokens = item.tokens;
        let id = item.id;
        state.zone_order.entry(zone).or_default().push_back(id);
        *state.zone_tokens.entry(zone).or_insert(0) += tokens;
        state.items.insert(id, item);
        debug!(item = %id, ?zone, tokens, "blackboard: item added");
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<ContextItem> {
        self.state.read().unwrap().items.get(&id).cloned()
    }

    pub fn remove(&self, id: Uuid) -> CortexResult<ContextItem> {
        let mut state = self.state.write().unwrap();
        let item = state
            .items
            .remove(&id)
            .ok_or_else(|| CortexError::not_found(format!("context item {id}")))?;
        if let Some(order) = state.zone_order.get_mut(&item.zone) {
            order.retain(|existing| *existing != id);
        }
        if let Some(tokens) = state.zone_tokens.get_mut(&item.zone) {
            *tokens = tokens.saturating_sub(item.tokens);
        }
        Ok(item)
    }

    pub fn get_all(&self) -> Vec<ContextItem> {
        self.state.read().unwrap().items.values().cloned().collect()
    }

    /// Items in `zone`, in insertion order.
    pub fn get_zone(&self, zone: Zone) -> Vec<ContextItem> {
        let state = self.state.read().unwrap();
        state
            .zone_order
            .get(&zone)
            .map(|order| order.iter().filter_map(|id| state.items.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> BlackboardStats {
        let state = self.state.read().unwrap();
        let zone_tokens = state.zone_tokens.clone();
        let total_tokens: u32 = zone_tokens.values().sum();
        let total_budget = self.config.total_budget();
        BlackboardStats {
            total_items: state.items.len(),
            zone_tokens,
            total_tokens,
            total_budget,
            utilization: if total_budget == 0 {
                0.0
            } else {
                total_tokens as f64 / total_budget as f64
            },
        }
    }

    /// Pure, snapshot-coherent filtered view in Critical -> Actionable ->
    /// Supporting order (head/tail first, middle last), stable within a
    /// zone by insertion order. Stops accumulating once the mask's token
    /// cap would be exceeded by the next item.
    pub fn apply_mask(&self, mask: &Mask) -> Vec<ContextItem> {
        let state = self.state.read().unwrap();
        let mut out = Vec::new();
        let mut consumed_tokens: u32 = 0;

        for zone in [Zone::Critical, Zone::Actionable, Zone::Supporting] {
            let Some(order) = state.zone_order.get(&zone) else {
                continue;
            };
            for id in order {
                let Some(item) = state.items.get(id) else {
                    continue;
                };
                if !mask.matches(item) {
                    continue;
                }
                if let Some(cap) = mask.token_cap {
                    if consumed_tokens + item.tokens > cap {
                        return out;
                    }
                }
                consumed_tokens += item.tokens;
                out.push(item.clone());
            }
        }
        out
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }
}

/// Evict items from `zone` until at least `need` tokens are freed.
/// Preference order: expired items first, then ascending priority, then
/// oldest-inserted first. Caller already holds the write lock.
fn evict_to_free(state: &mut State, zone: Zone, need: u32) {
    let mut freed: u32 = 0;
    loop {
        if freed >= need {
            return;
        }
        let Some(order) = state.zone_order.get(&zone) else {
            return;
        };
        let victim = order
            .iter()
            .filter_map(|id| state.items.get(id).map(|item| (*id, item)))
            .min_by(|(_, a), (_, b)| {
                // Expired items sort first, then ascending priority, then
                // oldest created_at.
                b.is_expired()
                    .cmp(&a.is_expired())
                    .then(a.priority.partial_cmp(&b.priority).unwrap_or(std::cmp::Ordering::Equal))
                    .then(a.created_at.cmp(&b.created_at))
            })
            .map(|(id, _)| id);

        let Some(victim_id) = victim else {
            return;
        };
        let tokens = state.items.get(&victim_id).map(|i| i.tokens).unwrap_or(0);
        state.items.remove(&victim_id);
        if let Some(order) = state.zone_order.get_mut(&zone) {
            order.retain(|id| *id != victim_id);
        }
        if let Some(zt) = state.zone_tokens.get_mut(&zone) {
            *zt = zt.saturating_sub(tokens);
        }
        freed += tokens;
    }
}
