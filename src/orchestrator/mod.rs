// Orchestrator glue (C6): wires C1-C5 per request.

mod orchestrator;
mod request;

pub use orchestrator::{LobeBrain, Orchestrator};
pub use request::{OrchestrationRequest, OrchestrationResult};
