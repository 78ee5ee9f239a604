// Router + Skill Store (C5): decides which brain processes a request.

mod classify;
mod decision;
mod skill;

pub use classify::{classify, Complexity};
pub use decision::{Brain, BrainKind, BrainResult, RouteDecision, Router, ToolCall};
pub use skill::{normalize_intent, InMemorySkillStore, Skill, SkillSource, SkillStore};
