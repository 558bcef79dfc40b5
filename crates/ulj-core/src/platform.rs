//! Platform
//!
//! Process-wide engine platform. Holds the logger the engine reports
//! through; at most one is installed at a time.

use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use crate::log::LogLevel;
use crate::logger::Logger;

/// Engine platform singleton
#[derive(Default)]
pub struct Platform {
    logger: RwLock<Option<Arc<dyn Logger>>>,
}

impl Platform {
    /// Create a detached platform (tests, embedders with their own engine)
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide platform the engine reports to
    pub fn instance() -> &'static Arc<Platform> {
        static INSTANCE: OnceLock<Arc<Platform>> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            tracing::debug!("Creating platform instance");
            Arc::new(Platform::new())
        })
    }

    /// Install a logger, or remove the current one with `None`.
    ///
    /// The previous logger is dropped before this returns unless a log call
    /// on another thread still holds it.
    pub fn set_logger(&self, logger: Option<Arc<dyn Logger>>) {
        #[cfg(feature = "native")]
        if logger.is_some() {
            crate::native::install_logger_trampoline();
        }

        let installed = logger.is_some();
        let previous = {
            let mut slot = self.logger.write().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *slot, logger)
        };

        match (previous.is_some(), installed) {
            (_, true) => tracing::debug!("Logger installed"),
            (true, false) => tracing::debug!("Logger removed"),
            (false, false) => {}
        }
    }

    /// The currently installed logger
    pub fn logger(&self) -> Option<Arc<dyn Logger>> {
        self.logger.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn has_logger(&self) -> bool {
        self.logger.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Dispatch an engine log message to the installed logger.
    ///
    /// The logger is cloned out of the lock first, so a slow managed logger
    /// never blocks `set_logger` or other threads.
    pub fn log(&self, level: LogLevel, message: &[u16]) {
        match self.logger() {
            Some(logger) => logger.log_message(level, message),
            None => tracing::trace!("Dropping engine log message, no logger installed"),
        }
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("has_logger", &self.has_logger())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::encode_utf16;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLogger {
        calls: AtomicUsize,
        drops: Arc<AtomicUsize>,
    }

    impl Logger for CountingLogger {
        fn log_message(&self, _level: LogLevel, _message: &[u16]) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Drop for CountingLogger {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_log_without_logger() {
        let platform = Platform::new();
        assert!(!platform.has_logger());
        platform.log(LogLevel::Info, &encode_utf16("nobody listens"));
    }

    #[test]
    fn test_replacing_logger_drops_previous() {
        let platform = Platform::new();
        let drops = Arc::new(AtomicUsize::new(0));

        let first = Arc::new(CountingLogger { calls: AtomicUsize::new(0), drops: drops.clone() });
        platform.set_logger(Some(first.clone()));
        platform.log(LogLevel::Info, &encode_utf16("one"));
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        drop(first);
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        let second = Arc::new(CountingLogger { calls: AtomicUsize::new(0), drops: drops.clone() });
        platform.set_logger(Some(second));
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        platform.set_logger(None);
        assert_eq!(drops.load(Ordering::SeqCst), 2);
        assert!(!platform.has_logger());
    }

    #[test]
    fn test_instance_is_shared() {
        assert!(Arc::ptr_eq(Platform::instance(), Platform::instance()));
    }
}
