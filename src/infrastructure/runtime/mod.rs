//! Runtime infrastructure - Tokio runtime bridge for async operations

mod bridge;
mod worker;

pub use bridge::{Epoch, PanelId, RuntimeBridge, RuntimeCommand, RuntimeEvent};
pub use worker::run_async_worker;
