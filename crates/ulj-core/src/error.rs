//! Bridge Errors
//!
//! Every failure a bridge operation can surface. The JNI layer turns these
//! into thrown Java exceptions; nothing here is allowed to unwind into the
//! engine.

use std::any::Any;
use std::io;

use crate::handle::{Handle, HandleKind};

/// Bridge error
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Handle is null, stale, or names an object of the wrong kind
    #[error("Invalid handle {handle}: expected {expected}, {reason}")]
    InvalidHandle {
        handle: Handle,
        expected: HandleKind,
        reason: String,
    },

    /// A managed reference that must not be null was null
    #[error("Null reference: {0}")]
    NullReference(&'static str),

    /// Calling into the managed runtime failed (exception or JNI error)
    #[error("Managed call failed: {0}")]
    ManagedCall(String),

    /// A transient reference could not be promoted to a persistent one
    #[error("Reference promotion failed: {0}")]
    ReferencePromotion(String),

    /// The OS refused to create a thread
    #[error("Failed to spawn native thread: {0}")]
    ThreadSpawn(#[source] io::Error),

    /// Attaching the current thread to the managed runtime failed
    #[error("Failed to attach thread: {0}")]
    Attach(String),
}

impl BridgeError {
    /// Build an invalid handle error
    pub fn invalid_handle(handle: Handle, expected: HandleKind, reason: impl Into<String>) -> Self {
        Self::InvalidHandle {
            handle,
            expected,
            reason: reason.into(),
        }
    }

    /// Whether this error was caused by a null handle or reference
    pub fn is_null(&self) -> bool {
        match self {
            Self::InvalidHandle { handle, .. } => handle.is_null(),
            Self::NullReference(_) => true,
            _ => false,
        }
    }
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
