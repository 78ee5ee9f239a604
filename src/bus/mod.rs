// Neural Bus module (C1)
// Public interface for the typed pub/sub event distributor.

mod event;
mod neural_bus;
mod subscription;

pub use event::{Event, EventType};
pub use neural_bus::NeuralBus;
pub use subscription::{Handler, SubscriptionId};
