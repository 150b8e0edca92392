//! Plan banner figures. Display-only: nothing here is enforced.

use serde::Serialize;

use super::api_key::ApiKeyRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    pub plan: String,
    pub used: u64,
    pub limit: u64,
    /// Share of the limit consumed, 0.0..=100.0.
    pub percent: f64,
}

impl UsageSummary {
    pub fn from_keys(plan: &str, limit: u64, keys: &[ApiKeyRecord]) -> Self {
        let used = keys.iter().map(|k| k.usage).sum();
        Self::new(plan, used, limit)
    }

    pub fn new(plan: &str, used: u64, limit: u64) -> Self {
        let percent = if limit == 0 {
            0.0
        } else {
            (used as f64 / limit as f64 * 100.0).min(100.0)
        };
        Self {
            plan: plan.to_string(),
            used,
            limit,
            percent,
        }
    }
}
