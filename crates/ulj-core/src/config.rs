//! Bridge Configuration

use std::fmt;
use std::str::FromStr;

use crate::reference::PromotionPolicy;

/// How a foreign engine thread is attached to the managed runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachMode {
    /// Attach for the duration of one callback, detach afterwards
    #[default]
    Scoped,
    /// Attach once and stay attached until the thread exits
    Permanent,
}

impl FromStr for AttachMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scoped" => Ok(AttachMode::Scoped),
            "permanent" => Ok(AttachMode::Permanent),
            other => Err(format!("unknown attach mode '{}'", other)),
        }
    }
}

impl fmt::Display for AttachMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachMode::Scoped => f.write_str("scoped"),
            AttachMode::Permanent => f.write_str("permanent"),
        }
    }
}

/// Bridge configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// `tracing` filter directive
    pub log_filter: String,

    /// What to do when a managed reference cannot be promoted
    pub promotion_failure: PromotionPolicy,

    /// How engine threads enter the managed runtime
    pub attach_mode: AttachMode,

    /// Name given to native helper threads
    pub thread_name: String,

    /// Stack size for native helper threads (OS default when unset)
    pub thread_stack_size: Option<usize>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            promotion_failure: PromotionPolicy::default(),
            attach_mode: AttachMode::default(),
            thread_name: "ulj-native".to_string(),
            thread_stack_size: None,
        }
    }
}

impl BridgeConfig {
    pub const LOG_VAR: &'static str = "ULJ_LOG";
    pub const PROMOTION_FAILURE_VAR: &'static str = "ULJ_PROMOTION_FAILURE";
    pub const ATTACH_VAR: &'static str = "ULJ_ATTACH";
    pub const THREAD_NAME_VAR: &'static str = "ULJ_THREAD_NAME";
    pub const THREAD_STACK_SIZE_VAR: &'static str = "ULJ_THREAD_STACK_SIZE";

    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup.
    ///
    /// Missing keys keep their default; malformed values are logged and
    /// ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(filter) = lookup(Self::LOG_VAR).filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }
        if let Some(policy) = parse(&lookup, Self::PROMOTION_FAILURE_VAR) {
            config.promotion_failure = policy;
        }
        if let Some(mode) = parse(&lookup, Self::ATTACH_VAR) {
            config.attach_mode = mode;
        }
        if let Some(name) = lookup(Self::THREAD_NAME_VAR).filter(|v| !v.trim().is_empty()) {
            config.thread_name = name;
        }
        if let Some(size) = parse::<usize>(&lookup, Self::THREAD_STACK_SIZE_VAR) {
            config.thread_stack_size = Some(size);
        }

        config
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("Ignoring {}={:?}: {}", key, raw, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::from_lookup(|_| None);
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.promotion_failure, PromotionPolicy::Report);
        assert_eq!(config.attach_mode, AttachMode::Scoped);
    }

    #[test]
    fn test_overrides() {
        let config = BridgeConfig::from_lookup(lookup(&[
            ("ULJ_LOG", "ulj_jni=debug"),
            ("ULJ_PROMOTION_FAILURE", "abort"),
            ("ULJ_ATTACH", "Permanent"),
            ("ULJ_THREAD_NAME", "ultralight-io"),
            ("ULJ_THREAD_STACK_SIZE", "1048576"),
        ]));

        assert_eq!(config.log_filter, "ulj_jni=debug");
        assert_eq!(config.promotion_failure, PromotionPolicy::Abort);
        assert_eq!(config.attach_mode, AttachMode::Permanent);
        assert_eq!(config.thread_name, "ultralight-io");
        assert_eq!(config.thread_stack_size, Some(1024 * 1024));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = BridgeConfig::from_lookup(lookup(&[
            ("ULJ_PROMOTION_FAILURE", "sometimes"),
            ("ULJ_ATTACH", ""),
            ("ULJ_THREAD_STACK_SIZE", "big"),
            ("ULJ_LOG", "   "),
        ]));
        assert_eq!(config, BridgeConfig::default());
    }
}
