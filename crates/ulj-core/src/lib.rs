//! ulj core
//!
//! Engine-agnostic half of the Ultralight JVM bridge.
//!
//! Features:
//! - Generational, kind-checked handle table for managed-side keys
//! - Engine surface/bitmap traits with in-process implementations
//! - Logger bridge with level mapping and panic containment
//! - Native thread helper
//! - Ultralight C API binding (`native` feature)

pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod log;
pub mod logger;
pub mod platform;
pub mod reference;
pub mod surface;
pub mod thread;

#[cfg(feature = "native")]
pub mod native;

pub use config::{AttachMode, BridgeConfig};
pub use engine::{Bitmap, BitmapFormat, BitmapSurface, OwnedBitmap, OwnedBitmapSurface, Surface};
pub use error::BridgeError;
pub use handle::{Handle, HandleKind, HandleTable, NativeObject};
pub use log::{LogLevel, ManagedLogLevel};
pub use logger::{BridgedLogger, LogSink, Logger, TracingSink};
pub use platform::Platform;
pub use reference::PromotionPolicy;
pub use surface::{bitmap_of, release_bitmap};
pub use thread::{NativeThread, TaskFn, spawn_native};

/// Bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
