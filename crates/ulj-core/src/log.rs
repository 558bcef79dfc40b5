//! Log Levels
//!
//! Native engine levels and the managed `UltralightLogLevel` constants they
//! map onto.

use std::fmt;

/// Severity the engine attaches to a log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
}

impl LogLevel {
    pub const ALL: [LogLevel; 3] = [LogLevel::Error, LogLevel::Warning, LogLevel::Info];

    /// Convert from the engine's raw value
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(LogLevel::Error),
            1 => Some(LogLevel::Warning),
            2 => Some(LogLevel::Info),
            _ => None,
        }
    }

    pub fn to_raw(self) -> i32 {
        self as i32
    }
}

/// Managed-side level constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedLogLevel {
    Error,
    Warning,
    Info,
}

impl ManagedLogLevel {
    pub const ALL: [ManagedLogLevel; 3] =
        [ManagedLogLevel::Error, ManagedLogLevel::Warning, ManagedLogLevel::Info];

    /// Name of the enum constant on the managed side
    pub fn constant_name(self) -> &'static str {
        match self {
            ManagedLogLevel::Error => "ERROR",
            ManagedLogLevel::Warning => "WARNING",
            ManagedLogLevel::Info => "INFO",
        }
    }

    pub fn from_constant_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.constant_name() == name)
    }
}

impl From<LogLevel> for ManagedLogLevel {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => ManagedLogLevel::Error,
            LogLevel::Warning => ManagedLogLevel::Warning,
            LogLevel::Info => ManagedLogLevel::Info,
        }
    }
}

impl From<ManagedLogLevel> for LogLevel {
    fn from(level: ManagedLogLevel) -> Self {
        match level {
            ManagedLogLevel::Error => LogLevel::Error,
            ManagedLogLevel::Warning => LogLevel::Warning,
            ManagedLogLevel::Info => LogLevel::Info,
        }
    }
}

impl fmt::Display for ManagedLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.constant_name())
    }
}

/// Decode an engine UTF-16 string, replacing unpaired surrogates
pub fn decode_utf16_lossy(message: &[u16]) -> String {
    String::from_utf16_lossy(message)
}

/// Encode a Rust string the way the engine stores it
pub fn encode_utf16(message: &str) -> Vec<u16> {
    message.encode_utf16().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_total_and_injective() {
        let mapped: Vec<_> = LogLevel::ALL.iter().map(|&l| ManagedLogLevel::from(l)).collect();
        assert_eq!(mapped, ManagedLogLevel::ALL.to_vec());
    }

    #[test]
    fn test_mapping_is_stable() {
        for level in LogLevel::ALL {
            let once = ManagedLogLevel::from(level);
            let twice = ManagedLogLevel::from(LogLevel::from(once));
            assert_eq!(once, twice);
            assert_eq!(LogLevel::from(once), level);
        }
    }

    #[test]
    fn test_raw_values() {
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::from_raw(level.to_raw()), Some(level));
        }
        assert_eq!(LogLevel::from_raw(-1), None);
        assert_eq!(LogLevel::from_raw(3), None);
    }

    #[test]
    fn test_constant_names() {
        assert_eq!(ManagedLogLevel::from(LogLevel::Warning).constant_name(), "WARNING");
        assert_eq!(ManagedLogLevel::from_constant_name("INFO"), Some(ManagedLogLevel::Info));
        assert_eq!(ManagedLogLevel::from_constant_name("DEBUG"), None);
    }

    #[test]
    fn test_utf16_decoding() {
        let encoded = encode_utf16("Hello 世界");
        assert_eq!(decode_utf16_lossy(&encoded), "Hello 世界");

        // Lone high surrogate
        let broken = [0x0048, 0xD800, 0x0069];
        assert_eq!(decode_utf16_lossy(&broken), "H\u{FFFD}i");
    }
}
