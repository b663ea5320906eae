// ABOUTME: In-memory delivery gateway that keeps every delivered message
// ABOUTME: Can reject selected addresses or every delivery to simulate transport failures

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::error::{DeliveryError, Result};
use super::DeliveryGateway;
use crate::email::EmailMessage;

#[derive(Debug, Default)]
pub struct MemoryOutbox {
    outbox: Mutex<Vec<EmailMessage>>,
    rejected: Mutex<HashSet<String>>,
    fail_all: AtomicBool,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn outbox(&self) -> MutexGuard<'_, Vec<EmailMessage>> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail every delivery with a transport error
    pub fn fail_deliveries(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Fail deliveries addressed to `address`
    pub fn reject(&self, address: impl Into<String>) {
        self.rejected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.into());
    }

    pub fn messages(&self) -> Vec<EmailMessage> {
        self.outbox().clone()
    }

    pub fn len(&self) -> usize {
        self.outbox().len()
    }

    pub fn is_empty(&self) -> bool {
        self.outbox().is_empty()
    }

    pub fn clear(&self) {
        self.outbox().clear();
    }
}

impl DeliveryGateway for MemoryOutbox {
    fn deliver(&self, message: &EmailMessage) -> Result<usize> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport {
                message: "connection refused".to_string(),
            });
        }

        let recipients = message.recipients();
        {
            let rejected = self.rejected.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(address) = recipients.iter().find(|a| rejected.contains(**a)) {
                return Err(DeliveryError::Transport {
                    message: format!("recipient refused: {}", address),
                });
            }
        }

        if recipients.is_empty() {
            return Ok(0);
        }

        debug!("Message {} stored in memory outbox", message.message_id);
        self.outbox().push(message.clone());
        Ok(1)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
