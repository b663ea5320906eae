// ABOUTME: Delivery gateway that prints messages instead of sending them
// ABOUTME: Writes the RFC 822 rendition of each message followed by a separator line

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use super::error::Result;
use super::DeliveryGateway;
use crate::email::EmailMessage;

pub struct ConsoleGateway {
    stream: Mutex<Box<dyn Write + Send>>,
}

impl Default for ConsoleGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleGateway {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(stream: Box<dyn Write + Send>) -> Self {
        Self {
            stream: Mutex::new(stream),
        }
    }
}

impl DeliveryGateway for ConsoleGateway {
    fn deliver(&self, message: &EmailMessage) -> Result<usize> {
        if message.recipients().is_empty() {
            return Ok(0);
        }

        let formatted = message.formatted()?;
        let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        stream.write_all(formatted.as_bytes())?;
        stream.write_all(format!("{}\n", "-".repeat(79)).as_bytes())?;
        stream.flush()?;
        Ok(1)
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
