//! Multi-source synchronization: the pass itself and the operations that trigger it.

mod message;
mod orchestrator;
mod service;

pub use message::{Message, MessageResponse};
pub use orchestrator::{SyncOrchestrator, SyncOutcome, SyncPhase};
pub use service::SyncService;
