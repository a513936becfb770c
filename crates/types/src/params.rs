//! Configurable parameters controlling pool accumulation and distribution.

use crate::errors::PoolError;
use crate::scalars::Tokens;
use serde::{Deserialize, Serialize};

/// Pool configuration.
///
/// These fields are operator-adjustable application config, loaded from
/// TOML at startup and validated before the engine accepts them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolParams {
    /// Pool size that triggers distribution
    pub target_total: Tokens,
    /// Contributor slice of the round total in basis points (8500 = 85%)
    pub contributor_bps: u16,
    /// Charity slice of the round total in basis points (1500 = 15%)
    pub charity_bps: u16,
    /// Number of top-ranked contributors eligible for a payout.
    /// Contributors below the cutoff keep their history but receive zero.
    pub top_k: usize,
    /// Upper bound on leaderboard queries to prevent unbounded scans
    pub max_leaderboard: usize,
}

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            target_total: 10_000,
            contributor_bps: 8_500,
            charity_bps: 1_500,
            top_k: 10,
            max_leaderboard: 100,
        }
    }
}

impl PoolParams {
    /// Validate parameter consistency. Called before the engine starts and
    /// after loading from config.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.target_total == 0 {
            return Err(PoolError::InvalidParameter("target_total must be positive"));
        }
        if self.contributor_bps as u32 + self.charity_bps as u32 != 10_000 {
            return Err(PoolError::InvalidParameter(
                "contributor_bps and charity_bps must sum to 10000",
            ));
        }
        if self.top_k == 0 {
            return Err(PoolError::InvalidParameter("top_k must be at least 1"));
        }
        if self.max_leaderboard == 0 {
            return Err(PoolError::InvalidParameter(
                "max_leaderboard must be at least 1",
            ));
        }
        Ok(())
    }

    /// Parse and validate parameters from a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, PoolError> {
        let params: PoolParams =
            toml::from_str(raw).map_err(|e| PoolError::Storage(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(PoolParams::default().validate().is_ok());
    }

    #[test]
    fn test_bps_must_sum_to_whole() {
        let params = PoolParams {
            contributor_bps: 8000,
            charity_bps: 1500,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(PoolError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zero_target_rejected() {
        let params = PoolParams {
            target_total: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let params = PoolParams {
            top_k: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let raw = r#"
            target_total = 1000
            contributor_bps = 8500
            charity_bps = 1500
            top_k = 3
            max_leaderboard = 50
        "#;
        let params = PoolParams::from_toml_str(raw).unwrap();
        assert_eq!(params.target_total, 1000);
        assert_eq!(params.top_k, 3);

        // Invalid split fails validation, not just parsing
        let raw = raw.replace("8500", "9000");
        assert!(PoolParams::from_toml_str(&raw).is_err());
    }
}
