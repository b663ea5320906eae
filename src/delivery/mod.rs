// ABOUTME: Delivery gateways that hand fully built email messages to a transport
// ABOUTME: Memory outbox for tests, console output and .eml files on disk

pub mod console;
pub mod error;
pub mod file;
pub mod memory;

pub use console::ConsoleGateway;
pub use error::{DeliveryError, Result};
pub use file::FileGateway;
pub use memory::MemoryOutbox;

use crate::email::EmailMessage;

/// Accepts a built message and reports how many messages were delivered.
#[cfg_attr(test, mockall::automock)]
pub trait DeliveryGateway: Send + Sync {
    /// Deliver one message, returning 1 when sent and 0 when it had no recipients
    fn deliver(&self, message: &EmailMessage) -> Result<usize>;

    fn name(&self) -> &'static str {
        "gateway"
    }
}
