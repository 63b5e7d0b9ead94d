//! Plan usage service.
//!
//! Decides whether a user may create one more menu item or run one more
//! image job under their plan. The count and the limit check happen in a
//! single conditional write, so concurrent requests can never overshoot.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use smart_menu_core::usage::{Plan, UsageDecision, UsageKind, UsageLimit, TRIAL_DURATION_DAYS};
use smart_menu_core::validation::validate_uuid;
use smart_menu_db::UserPlan;

use crate::error::ServiceResult;
use crate::AppState;

/// Result of a check-and-consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageCheck {
    pub success: bool,
    pub allowed: bool,
    pub plan: Plan,
    #[serde(flatten)]
    pub decision: UsageDecision,
    /// `None` when unlimited.
    pub remaining: Option<u32>,
    pub message: String,
}

/// Read-only view of one counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageStatus {
    pub success: bool,
    pub plan: Plan,
    pub kind: UsageKind,
    pub period: String,
    pub used: u32,
    pub limit: UsageLimit,
    pub trial_expired: bool,
}

/// Usage service implementation.
pub struct UsageService {
    state: Arc<AppState>,
}

impl UsageService {
    /// Create a new usage service.
    pub fn new(state: Arc<AppState>) -> Self {
        UsageService { state }
    }

    /// Counts one use of `kind` if the plan allows it.
    ///
    /// A user without a plan record starts a trial here.
    pub async fn check_and_consume(&self, user_id: &str, kind: UsageKind) -> ServiceResult<UsageCheck> {
        validate_uuid("user_id", user_id)?;
        let user_id = user_id.trim();
        let plan = self.plan_for(user_id).await?;
        let now = Utc::now();

        let decision = if trial_expired(&plan) {
            warn!(user_id = %user_id, "Usage refused, trial expired");
            UsageDecision::TrialExpired
        } else {
            let limit = plan.plan.limit(kind);
            let period = kind.period_key(now);

            match self
                .state
                .db
                .usage()
                .try_consume(user_id, kind, &period, limit.cap())
                .await?
            {
                Some(used) => UsageDecision::Allowed { kind, used, limit },
                None => UsageDecision::LimitReached {
                    kind,
                    limit: limit.cap().unwrap_or_default(),
                },
            }
        };

        Ok(UsageCheck {
            success: true,
            allowed: decision.is_allowed(),
            plan: plan.plan,
            remaining: decision.remaining(),
            message: decision.message(plan.plan),
            decision,
        })
    }

    /// Current usage of `kind` without consuming anything.
    pub async fn usage_status(&self, user_id: &str, kind: UsageKind) -> ServiceResult<UsageStatus> {
        validate_uuid("user_id", user_id)?;
        let user_id = user_id.trim();
        let plan = self.plan_for(user_id).await?;
        let period = kind.period_key(Utc::now());
        let used = self.state.db.usage().current(user_id, kind, &period).await?;

        Ok(UsageStatus {
            success: true,
            plan: plan.plan,
            kind,
            period,
            used,
            limit: plan.plan.limit(kind),
            trial_expired: trial_expired(&plan),
        })
    }

    async fn plan_for(&self, user_id: &str) -> ServiceResult<UserPlan> {
        let usage = self.state.db.usage();
        if let Some(plan) = usage.get_plan(user_id).await? {
            return Ok(plan);
        }

        let plan = UserPlan {
            user_id: user_id.to_string(),
            plan: Plan::Trial,
            trial_ends_at: Some(Utc::now() + Duration::days(TRIAL_DURATION_DAYS)),
        };
        usage.set_plan(&plan).await?;
        info!(user_id = %user_id, "Trial started");

        Ok(plan)
    }
}

fn trial_expired(plan: &UserPlan) -> bool {
    plan.plan == Plan::Trial && plan.trial_ends_at.is_some_and(|ends| ends <= Utc::now())
}
