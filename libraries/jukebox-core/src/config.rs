//! Engine configuration
//!
//! Limits and thresholds shared by the catalog, playlist, selector and
//! credit renewal logic. Every field has a default so a partial `[songs]`
//! section in the server configuration is enough.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{JukeboxError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of entries in a single user's playlist
    #[serde(default = "default_max_songs")]
    pub max_songs: i64,

    /// Longest song (in seconds) that may be played
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: i64,

    /// Minimum time between two plays of the same song
    #[serde(default = "default_overplay_interval_secs")]
    pub overplay_interval_secs: i64,

    /// Upper bound of a song's credit balance
    #[serde(default = "default_credit_cap")]
    pub credit_cap: i64,

    /// Hours needed to earn back one credit
    #[serde(default = "default_credit_renewal_hours")]
    pub credit_renewal_hours: i64,

    /// Minimum hype count for autoplay eligibility
    #[serde(default = "default_autoplay_hype_threshold")]
    pub autoplay_hype_threshold: i64,

    /// Autoplay requires `skip_votes * ratio <= hype_count`
    #[serde(default = "default_autoplay_skip_ratio")]
    pub autoplay_skip_ratio: i64,

    /// Rotate mode given to newly seen users
    #[serde(default)]
    pub rotate_by_default: bool,

    /// How often the credit renewal task wakes up
    #[serde(default = "default_renewal_check_interval_secs")]
    pub renewal_check_interval_secs: u64,

    /// Cap for search and failed-song listings
    #[serde(default = "default_page_limit")]
    pub page_limit: i64,
}

impl EngineConfig {
    pub fn overplay_interval(&self) -> Duration {
        Duration::seconds(self.overplay_interval_secs)
    }

    pub fn credit_renewal_period(&self) -> Duration {
        Duration::hours(self.credit_renewal_hours)
    }

    pub fn renewal_check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.renewal_check_interval_secs)
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_songs <= 0 {
            return Err(JukeboxError::InvalidConfig("max_songs must be positive".to_string()));
        }
        if self.credit_cap < 0 {
            return Err(JukeboxError::InvalidConfig("credit_cap must not be negative".to_string()));
        }
        if self.credit_renewal_hours <= 0 {
            return Err(JukeboxError::InvalidConfig(
                "credit_renewal_hours must be positive".to_string(),
            ));
        }
        if self.renewal_check_interval_secs == 0 {
            return Err(JukeboxError::InvalidConfig(
                "renewal_check_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// Default values
fn default_max_songs() -> i64 {
    50
}

fn default_max_duration_secs() -> i64 {
    1200
}

fn default_overplay_interval_secs() -> i64 {
    3600
}

fn default_credit_cap() -> i64 {
    3
}

fn default_credit_renewal_hours() -> i64 {
    24
}

fn default_autoplay_hype_threshold() -> i64 {
    1
}

fn default_autoplay_skip_ratio() -> i64 {
    2
}

fn default_renewal_check_interval_secs() -> u64 {
    3600
}

fn default_page_limit() -> i64 {
    20
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_songs: default_max_songs(),
            max_duration_secs: default_max_duration_secs(),
            overplay_interval_secs: default_overplay_interval_secs(),
            credit_cap: default_credit_cap(),
            credit_renewal_hours: default_credit_renewal_hours(),
            autoplay_hype_threshold: default_autoplay_hype_threshold(),
            autoplay_skip_ratio: default_autoplay_skip_ratio(),
            rotate_by_default: false,
            renewal_check_interval_secs: default_renewal_check_interval_secs(),
            page_limit: default_page_limit(),
        }
    }
}
