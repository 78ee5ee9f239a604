// Supervision Engine (C4): tree-of-thought exploration with guardian
// critique, bounded by node/depth/branch caps.

mod engine;
mod expander;
mod guardian;
mod node;
mod selector;
mod tree;

pub use engine::{SupervisedStep, SupervisionEngine};
pub use expander::{Expander, StubExpander};
pub use guardian::{DefaultGuardian, Guardian, GuardianResult};
pub use node::{Action, NodeState, ThoughtNode};
pub use selector::{DefaultSelector, PathScore, Selector};
pub use tree::ThoughtTree;
