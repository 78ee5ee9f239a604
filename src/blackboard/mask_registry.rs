// MaskRegistry (C2 / §6): holds one Mask per lobe id and produces
// filtered views by delegating to Blackboard::apply_mask.

use super::blackboard::Blackboard;
use super::item::ContextItem;
use super::mask::Mask;
use crate::lobes::LobeId;
use dashmap::DashMap;

#[derive(Default)]
pub struct MaskRegistry {
    masks: DashMap<LobeId, Mask>,
}

impl MaskRegistry {
    pub fn new() -> Self {
        Self {
            masks: DashMap::new(),
        }
    }

    pub fn register(&self, mask: Mask) {
        if let Some(lobe_id) = mask.lobe_id {
            self.masks.insert(lobe_id, mask);
        }
    }

    /// Mask registered for `lobe_id`, or the default (match-everything)
    /// mask if none was registered.
    pub fn get(&self, lobe_id: LobeId) -> Mask {
        self.masks
            .get(&lobe_id)
            .map(|m| m.clone())
            .unwrap_or_else(Mask::default_mask)
    }

    pub fn list(&self) -> Vec<Mask> {
        self.masks.iter().map(|e| e.value().clone()).collect()
    }

    pub fn filtered_view(&self, lobe_id: LobeId, bb: &Blackboard) -> Vec<ContextItem> {
        let mask = self.get(lobe_id);
        bb.apply_mask(&mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::{Category, Zone};
    use crate::config::ZoneConfig;

    #[test]
    fn unregistered_lobe_gets_default_mask() {
        let registry = MaskRegistry::new();
        let mask = registry.get(LobeId::Reasoning);
        assert_eq!(mask.min_priority, 0.0);
        assert!(mask.token_cap.is_none());
    }

    #[test]
    fn registered_mask_is_returned_for_its_lobe() {
        let registry = MaskRegistry::new();
        registry.register(Mask::for_lobe(LobeId::Memory).with_min_priority(0.5));
        assert_eq!(registry.get(LobeId::Memory).min_priority, 0.5);
        assert_eq!(registry.get(LobeId::Reasoning).min_priority, 0.0);
    }

    #[test]
    fn filtered_view_delegates_to_blackboard() {
        let bb = Blackboard::new(ZoneConfig::default());
        bb.add(crate::blackboard::ContextItem::new(
            LobeId::Memory,
            Category::Memory,
            "hello",
            10,
            0.9,
            Zone::Critical,
        ))
        .unwrap();
        let registry = MaskRegistry::new();
        registry.register(Mask::for_lobe(LobeId::Reasoning).with_min_priority(0.95));
        let view = registry.filtered_view(LobeId::Reasoning, &bb);
        assert!(view.is_empty());
        registry.register(Mask::for_lobe(LobeId::Reasoning).with_min_priority(0.1));
        let view = registry.filtered_view(LobeId::Reasoning, &bb);
        assert_eq!(view.len(), 1);
    }
}
