//! Device position lookup for attendance records.
//!
//! Providers may fail in several ways; [`locate`] folds every failure,
//! including a timeout, into `None` so a record simply goes without a
//! location.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::attendance::GeoPoint;

mod cache;
mod fixed;

pub use cache::CachingLocator;
pub use fixed::FixedLocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyProfile {
    #[default]
    High,
    Medium,
    Low,
}

impl AccuracyProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccuracyProfile::High => "high",
            AccuracyProfile::Medium => "medium",
            AccuracyProfile::Low => "low",
        }
    }

    pub fn options(&self) -> PositionOptions {
        match self {
            AccuracyProfile::High => PositionOptions {
                force_fresh: true,
                timeout: Duration::from_secs(10),
                maximum_age: Some(Duration::ZERO),
            },
            AccuracyProfile::Medium => PositionOptions {
                force_fresh: true,
                timeout: Duration::from_secs(5),
                maximum_age: Some(Duration::from_secs(60)),
            },
            AccuracyProfile::Low => PositionOptions {
                force_fresh: false,
                timeout: Duration::from_secs(5),
                maximum_age: None,
            },
        }
    }
}

impl std::str::FromStr for AccuracyProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(AccuracyProfile::High),
            "medium" => Ok(AccuracyProfile::Medium),
            "low" => Ok(AccuracyProfile::Low),
            _ => anyhow::bail!("Unknown accuracy profile '{}' (expected high, medium or low)", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Ask the provider for a fresh high-accuracy fix.
    pub force_fresh: bool,
    pub timeout: Duration,
    /// Oldest cached fix that may be returned. `None` accepts any age.
    pub maximum_age: Option<Duration>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("location capability is not available on this device")]
    Unsupported,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<GeoPoint, LocationError>;
}

/// Position for a new record, or `None` when the provider is missing,
/// refuses, fails or runs past the profile's timeout.
pub async fn locate(
    provider: Option<&dyn GeolocationProvider>,
    profile: AccuracyProfile,
) -> Option<GeoPoint> {
    let Some(provider) = provider else {
        debug!("No geolocation provider configured");
        return None;
    };

    let options = profile.options();
    match tokio::time::timeout(options.timeout, provider.current_position(&options)).await {
        Ok(Ok(point)) => {
            debug!(
                "Position ({:.6}, {:.6}) with {} accuracy",
                point.latitude,
                point.longitude,
                profile.as_str()
            );
            Some(point)
        }
        Ok(Err(e)) => {
            warn!("Location error: {}", e);
            None
        }
        Err(_) => {
            warn!(
                "Location lookup timed out after {}s",
                options.timeout.as_secs()
            );
            None
        }
    }
}
