use async_trait::async_trait;

use super::{GeolocationProvider, LocationError, PositionOptions};
use crate::attendance::GeoPoint;
use crate::config::LocationConfig;

/// A terminal mounted at a known position. Without both coordinates
/// configured the capability is reported as unsupported.
pub struct FixedLocator {
    point: Option<GeoPoint>,
}

impl FixedLocator {
    pub fn new(point: Option<GeoPoint>) -> Self {
        Self { point }
    }

    pub fn from_config(config: &LocationConfig) -> Self {
        let point = match (config.latitude, config.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };
        Self::new(point)
    }
}

#[async_trait]
impl GeolocationProvider for FixedLocator {
    async fn current_position(&self, _options: &PositionOptions) -> Result<GeoPoint, LocationError> {
        self.point.ok_or(LocationError::Unsupported)
    }
}
