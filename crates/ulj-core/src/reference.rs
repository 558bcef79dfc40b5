//! Reference Promotion
//!
//! Native objects that call back into the managed side keep a persistent
//! reference to a managed object. Promoting the transient reference received
//! during a call can fail; [`PromotionPolicy`] decides whether that fails the
//! operation or the process.

use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// Outcome of a failed reference promotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromotionPolicy {
    /// Fail the bridge operation with [`BridgeError::ReferencePromotion`]
    #[default]
    Report,
    /// Log and abort the process
    Abort,
}

impl PromotionPolicy {
    /// Apply the policy to a failed promotion.
    ///
    /// Returns the error to propagate under `Report`; never returns under
    /// `Abort`.
    pub fn on_failure(self, detail: impl Into<String>) -> BridgeError {
        let detail = detail.into();
        match self {
            PromotionPolicy::Report => {
                tracing::warn!("Reference promotion failed: {}", detail);
                BridgeError::ReferencePromotion(detail)
            }
            PromotionPolicy::Abort => {
                tracing::error!("Reference promotion failed, aborting: {}", detail);
                std::process::abort()
            }
        }
    }
}

impl FromStr for PromotionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" => Ok(PromotionPolicy::Report),
            "abort" => Ok(PromotionPolicy::Abort),
            other => Err(format!("unknown promotion failure policy '{}'", other)),
        }
    }
}

impl fmt::Display for PromotionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromotionPolicy::Report => f.write_str("report"),
            PromotionPolicy::Abort => f.write_str("abort"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_returns_error() {
        let err = PromotionPolicy::Report.on_failure("NewGlobalRef returned null");
        match err {
            BridgeError::ReferencePromotion(detail) => {
                assert_eq!(detail, "NewGlobalRef returned null")
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("REPORT".parse::<PromotionPolicy>(), Ok(PromotionPolicy::Report));
        assert_eq!(" abort ".parse::<PromotionPolicy>(), Ok(PromotionPolicy::Abort));
        assert!("retry".parse::<PromotionPolicy>().is_err());
        assert_eq!(PromotionPolicy::Abort.to_string(), "abort");
    }
}
