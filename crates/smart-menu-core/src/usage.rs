//! # Plan Usage Limits
//!
//! Plan limits for menu items and AI image work, and the period a usage
//! counter belongs to. Counting itself happens atomically in the database;
//! this module only decides which counter and which ceiling apply.
//!
//! | Plan         | Menu items | Generations / month | Enhancements / month |
//! |--------------|------------|---------------------|----------------------|
//! | Trial        | 20         | 5                   | 5                    |
//! | Starter      | 30         | 30                  | 30                   |
//! | Professional | unlimited  | 200                 | 200                  |
//! | Enterprise   | unlimited  | 500                 | 500                  |

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Length of a free trial.
pub const TRIAL_DURATION_DAYS: i64 = 14;

/// Period key for counters that never reset.
pub const LIFETIME_PERIOD: &str = "lifetime";

/// Something a plan meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    MenuItems,
    ImageGeneration,
    ImageEnhancement,
}

impl UsageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageKind::MenuItems => "menu_items",
            UsageKind::ImageGeneration => "image_generation",
            UsageKind::ImageEnhancement => "image_enhancement",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UsageKind::MenuItems => "Menu Items",
            UsageKind::ImageGeneration => "Image Generation",
            UsageKind::ImageEnhancement => "Image Enhancement",
        }
    }

    /// Counter period for this kind at `now`: calendar month for image
    /// work (e.g. `2026-10`), a single lifetime counter for menu items.
    pub fn period_key(&self, now: DateTime<Utc>) -> String {
        match self {
            UsageKind::MenuItems => LIFETIME_PERIOD.to_string(),
            UsageKind::ImageGeneration | UsageKind::ImageEnhancement => {
                format!("{:04}-{:02}", now.year(), now.month())
            }
        }
    }
}

/// Subscription plan. Legacy names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Trial,
    Starter,
    #[serde(alias = "pro", alias = "standard")]
    Professional,
    #[serde(alias = "premium")]
    Enterprise,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Trial => "trial",
            Plan::Starter => "starter",
            Plan::Professional => "professional",
            Plan::Enterprise => "enterprise",
        }
    }

    /// Parses a stored plan name, mapping legacy names.
    pub fn parse(value: &str) -> Option<Plan> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trial" => Some(Plan::Trial),
            "starter" => Some(Plan::Starter),
            "professional" | "pro" | "standard" => Some(Plan::Professional),
            "enterprise" | "premium" => Some(Plan::Enterprise),
            _ => None,
        }
    }

    pub fn limit(&self, kind: UsageKind) -> UsageLimit {
        use UsageKind::*;
        use UsageLimit::*;

        match (self, kind) {
            (Plan::Trial, MenuItems) => Limited(20),
            (Plan::Trial, _) => Limited(5),
            (Plan::Starter, _) => Limited(30),
            (Plan::Professional, MenuItems) | (Plan::Enterprise, MenuItems) => Unlimited,
            (Plan::Professional, _) => Limited(200),
            (Plan::Enterprise, _) => Limited(500),
        }
    }
}

/// Ceiling for one usage kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UsageLimit {
    Limited(u32),
    Unlimited,
}

impl UsageLimit {
    /// Ceiling as stored next to a counter; `None` when unlimited.
    pub fn cap(&self) -> Option<u32> {
        match self {
            UsageLimit::Limited(n) => Some(*n),
            UsageLimit::Unlimited => None,
        }
    }
}

/// Answer to "may this user do one more of `kind`?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum UsageDecision {
    /// Counted; `used` includes this use.
    Allowed {
        kind: UsageKind,
        used: u32,
        limit: UsageLimit,
    },
    LimitReached {
        kind: UsageKind,
        limit: u32,
    },
    TrialExpired,
}

impl UsageDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, UsageDecision::Allowed { .. })
    }

    /// Remaining uses after this one; `None` when unlimited.
    pub fn remaining(&self) -> Option<u32> {
        match self {
            UsageDecision::Allowed {
                used,
                limit: UsageLimit::Limited(limit),
                ..
            } => Some(limit.saturating_sub(*used)),
            UsageDecision::Allowed { .. } => None,
            UsageDecision::LimitReached { .. } | UsageDecision::TrialExpired => Some(0),
        }
    }

    pub fn message(&self, plan: Plan) -> String {
        match self {
            UsageDecision::Allowed {
                limit: UsageLimit::Unlimited,
                ..
            } => format!("Unlimited access (Plan: {})", plan.as_str()),
            UsageDecision::Allowed { kind, .. } => format!(
                "{} {} remaining (Plan: {})",
                self.remaining().unwrap_or_default(),
                kind.as_str(),
                plan.as_str()
            ),
            UsageDecision::LimitReached { kind, limit } => format!(
                "Plan limit reached for {}. You've used {}/{}. Please upgrade your plan to continue.",
                kind.display_name(),
                limit,
                limit
            ),
            UsageDecision::TrialExpired => {
                "Trial expired. Please subscribe to continue.".to_string()
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_plan_limits() {
        assert_eq!(Plan::Trial.limit(UsageKind::MenuItems), UsageLimit::Limited(20));
        assert_eq!(Plan::Trial.limit(UsageKind::ImageGeneration), UsageLimit::Limited(5));
        assert_eq!(Plan::Starter.limit(UsageKind::ImageEnhancement), UsageLimit::Limited(30));
        assert_eq!(Plan::Professional.limit(UsageKind::MenuItems), UsageLimit::Unlimited);
        assert_eq!(Plan::Professional.limit(UsageKind::ImageGeneration), UsageLimit::Limited(200));
        assert_eq!(Plan::Enterprise.limit(UsageKind::ImageEnhancement), UsageLimit::Limited(500));
    }

    #[test]
    fn test_legacy_plan_names() {
        assert_eq!(Plan::parse("pro"), Some(Plan::Professional));
        assert_eq!(Plan::parse("Standard"), Some(Plan::Professional));
        assert_eq!(Plan::parse("premium"), Some(Plan::Enterprise));
        assert_eq!(Plan::parse("gold"), None);

        let plan: Plan = serde_json::from_str("\"premium\"").unwrap();
        assert_eq!(plan, Plan::Enterprise);
    }

    #[test]
    fn test_period_keys() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 8, 30, 0).unwrap();
        assert_eq!(UsageKind::ImageGeneration.period_key(now), "2026-03");
        assert_eq!(UsageKind::MenuItems.period_key(now), LIFETIME_PERIOD);
    }

    #[test]
    fn test_decisions() {
        let allowed = UsageDecision::Allowed {
            kind: UsageKind::ImageGeneration,
            used: 3,
            limit: UsageLimit::Limited(5),
        };
        assert!(allowed.is_allowed());
        assert_eq!(allowed.remaining(), Some(2));
        assert_eq!(allowed.message(Plan::Trial), "2 image_generation remaining (Plan: trial)");

        let reached = UsageDecision::LimitReached {
            kind: UsageKind::ImageGeneration,
            limit: 5,
        };
        assert!(!reached.is_allowed());
        assert_eq!(reached.remaining(), Some(0));

        let unlimited = UsageDecision::Allowed {
            kind: UsageKind::MenuItems,
            used: 400,
            limit: UsageLimit::Unlimited,
        };
        assert_eq!(unlimited.remaining(), None);
    }
}
