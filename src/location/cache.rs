use async_trait::async_trait;
use std::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::{GeolocationProvider, LocationError, PositionOptions};
use crate::attendance::GeoPoint;

/// Serves a remembered fix while it is younger than the request's
/// `maximum_age`, otherwise asks the inner provider and remembers the answer.
pub struct CachingLocator<P> {
    inner: P,
    last_fix: Mutex<Option<(Instant, GeoPoint)>>,
}

impl<P: GeolocationProvider> CachingLocator<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            last_fix: Mutex::new(None),
        }
    }

    fn cached(&self, options: &PositionOptions) -> Option<GeoPoint> {
        let guard = self.last_fix.lock().ok()?;
        let (taken_at, point) = (*guard)?;
        match options.maximum_age {
            None => Some(point),
            Some(max_age) if !max_age.is_zero() && taken_at.elapsed() <= max_age => Some(point),
            Some(_) => None,
        }
    }
}

#[async_trait]
impl<P: GeolocationProvider> GeolocationProvider for CachingLocator<P> {
    async fn current_position(&self, options: &PositionOptions) -> Result<GeoPoint, LocationError> {
        if let Some(point) = self.cached(options) {
            debug!("Using cached position");
            return Ok(point);
        }

        let point = self.inner.current_position(options).await?;
        if let Ok(mut guard) = self.last_fix.lock() {
            *guard = Some((Instant::now(), point));
        }
        Ok(point)
    }
}
