//! Logger Bridge
//!
//! The engine reports log messages through a single-method callback
//! interface. [`BridgedLogger`] implements that interface and forwards each
//! message to a [`LogSink`] on the managed side. Whatever goes wrong while
//! delivering (the managed method throws, attaching fails, the sink panics)
//! is reported here and never reaches the engine.

use std::panic::{self, AssertUnwindSafe};

use crate::error::{BridgeError, panic_message};
use crate::log::{LogLevel, ManagedLogLevel, decode_utf16_lossy};

/// Engine logging callback interface.
///
/// May be called from any engine thread, concurrently.
pub trait Logger: Send + Sync {
    fn log_message(&self, level: LogLevel, message: &[u16]);
}

/// Managed-side receiver of log messages
pub trait LogSink: Send + Sync {
    /// Deliver one message. `message` is the engine's UTF-16 text, untouched.
    fn deliver(&self, level: ManagedLogLevel, message: &[u16]) -> Result<(), BridgeError>;
}

/// Engine logger forwarding to a managed sink
#[derive(Debug)]
pub struct BridgedLogger<S> {
    sink: S,
}

impl<S: LogSink> BridgedLogger<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: LogSink> Logger for BridgedLogger<S> {
    fn log_message(&self, level: LogLevel, message: &[u16]) {
        let managed = ManagedLogLevel::from(level);

        match panic::catch_unwind(AssertUnwindSafe(|| self.sink.deliver(managed, message))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(
                    "Failed to deliver {} log message \"{}\": {}",
                    managed,
                    decode_utf16_lossy(message),
                    err
                );
            }
            Err(payload) => {
                tracing::error!(
                    "Log sink panicked while delivering {} message \"{}\": {}",
                    managed,
                    decode_utf16_lossy(message),
                    panic_message(&*payload)
                );
            }
        }
    }
}

/// Sink writing to `tracing`, used when no managed logger is installed
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn deliver(&self, level: ManagedLogLevel, message: &[u16]) -> Result<(), BridgeError> {
        let text = decode_utf16_lossy(message);
        match level {
            ManagedLogLevel::Error => tracing::error!("[Ultralight] {}", text),
            ManagedLogLevel::Warning => tracing::warn!("[Ultralight] {}", text),
            ManagedLogLevel::Info => tracing::info!("[Ultralight] {}", text),
        }
        Ok(())
    }
}
