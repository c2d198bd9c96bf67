//! Bridge configuration

use std::time::Duration;

use crate::{BridgeError, BridgeResult};

/// Default deadline shared by every task of one batch (0.3 s)
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_millis(300);

/// Bridge configuration
#[derive(Clone, Debug, PartialEq)]
pub struct BridgeConfig {
    /// Deadline for a whole `all` batch
    pub batch_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }
}

impl BridgeConfig {
    /// Configuration with a custom batch deadline
    pub fn with_batch_timeout(batch_timeout: Duration) -> Self {
        BridgeConfig { batch_timeout }
    }

    /// Configuration from a deadline expressed in (fractional) seconds
    pub fn from_secs_f64(secs: f64) -> BridgeResult<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(BridgeError::InvalidConfig(format!(
                "batch timeout must be a non-negative number of seconds, got {}",
                secs
            )));
        }

        let batch_timeout = Duration::try_from_secs_f64(secs).map_err(|e| {
            BridgeError::InvalidConfig(format!("batch timeout of {} seconds: {}", secs, e))
        })?;
        Ok(Self::with_batch_timeout(batch_timeout))
    }
}
