//! Subscription plans and the token limits derived from them.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Tokens;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Sentinel ceiling standing in for "unbounded" on the pro plan.
pub const UNBOUNDED_CEILING: Tokens = 999;

/// Valid plan names, in ascending tier order.
const VALID_PLANS: &[&str] = &["free", "starter", "premium", "pro"];

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Subscription tier. Determines the daily free refill and balance ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Starter,
    Premium,
    Pro,
}

/// Token limits attached to a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    /// Free tokens restored at every local-midnight reset.
    pub daily_free_tokens: Tokens,
    /// Maximum balance the account may hold.
    pub ceiling: Tokens,
}

impl Plan {
    /// Limits for this plan.
    pub const fn limits(self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                daily_free_tokens: 10,
                ceiling: 10,
            },
            Plan::Starter => PlanLimits {
                daily_free_tokens: 10,
                ceiling: 300,
            },
            Plan::Premium => PlanLimits {
                daily_free_tokens: 20,
                ceiling: 500,
            },
            Plan::Pro => PlanLimits {
                daily_free_tokens: UNBOUNDED_CEILING,
                ceiling: UNBOUNDED_CEILING,
            },
        }
    }

    /// Shorthand for `self.limits().ceiling`.
    pub const fn ceiling(self) -> Tokens {
        self.limits().ceiling
    }

    /// Whether spends on this plan are free (pro is treated as unbounded).
    pub const fn is_unbounded(self) -> bool {
        matches!(self, Plan::Pro)
    }

    /// Storage / display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Premium => "premium",
            Plan::Pro => "pro",
        }
    }

    /// Parse a plan name, rejecting anything unknown.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "starter" => Ok(Plan::Starter),
            "premium" => Ok(Plan::Premium),
            "pro" => Ok(Plan::Pro),
            other => Err(CoreError::Validation(format!(
                "Unknown plan '{other}'. Must be one of: {VALID_PLANS:?}"
            ))),
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_amount_never_exceeds_ceiling() {
        for plan in [Plan::Free, Plan::Starter, Plan::Premium, Plan::Pro] {
            let limits = plan.limits();
            assert!(limits.daily_free_tokens <= limits.ceiling, "{plan}");
        }
    }

    #[test]
    fn only_pro_is_unbounded() {
        assert!(Plan::Pro.is_unbounded());
        assert!(!Plan::Free.is_unbounded());
        assert!(!Plan::Premium.is_unbounded());
        assert_eq!(Plan::Pro.ceiling(), UNBOUNDED_CEILING);
    }

    #[test]
    fn from_name_accepts_known_plans_case_insensitively() {
        assert_eq!(Plan::from_name("starter").unwrap(), Plan::Starter);
        assert_eq!(Plan::from_name(" PRO ").unwrap(), Plan::Pro);
    }

    #[test]
    fn from_name_rejects_unknown() {
        assert!(Plan::from_name("enterprise").is_err());
        assert!(Plan::from_name("").is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Plan::Premium).unwrap();
        assert_eq!(json, "\"premium\"");
    }
}
