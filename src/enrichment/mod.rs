//! Turns a provisional attendance record into its final form.
//!
//! Greeting and position are looked up concurrently. Both always settle
//! (falling back when their provider fails), and only then is the final
//! record built.

use tracing::info;

use crate::attendance::AttendanceEvent;
use crate::capture::StillImage;
use crate::greeting::{generate_greeting, GreetingProvider};
use crate::location::{locate, AccuracyProfile, GeolocationProvider};

pub struct Enricher {
    greeter: Box<dyn GreetingProvider>,
    locator: Option<Box<dyn GeolocationProvider>>,
}

impl Enricher {
    pub fn new(
        greeter: Box<dyn GreetingProvider>,
        locator: Option<Box<dyn GeolocationProvider>>,
    ) -> Self {
        Self { greeter, locator }
    }

    pub async fn enrich(
        &self,
        provisional: AttendanceEvent,
        image: &StillImage,
        accuracy: AccuracyProfile,
    ) -> AttendanceEvent {
        let (greeting, location) = tokio::join!(
            generate_greeting(
                self.greeter.as_ref(),
                image,
                &provisional.staff_name,
                provisional.kind
            ),
            locate(self.locator.as_deref(), accuracy),
        );

        info!(
            "Record {} enriched (location: {})",
            provisional.id,
            if location.is_some() { "yes" } else { "no" }
        );
        provisional.enriched(greeting, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::{AttendanceKind, GeoPoint};
    use crate::location::{LocationError, PositionOptions};
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    struct SlowGreeter;

    #[async_trait]
    impl GreetingProvider for SlowGreeter {
        fn name(&self) -> &'static str {
            "Slow"
        }

        async fn generate(&self, _: &StillImage, name: &str, _: AttendanceKind) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(format!("Hi {}", name))
        }
    }

    struct BrokenGreeter;

    #[async_trait]
    impl GreetingProvider for BrokenGreeter {
        fn name(&self) -> &'static str {
            "Broken"
        }

        async fn generate(&self, _: &StillImage, _: &str, _: AttendanceKind) -> Result<String> {
            bail!("quota exceeded")
        }
    }

    struct SlowLocator;

    #[async_trait]
    impl GeolocationProvider for SlowLocator {
        async fn current_position(&self, _: &PositionOptions) -> Result<GeoPoint, LocationError> {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(GeoPoint {
                latitude: 51.5,
                longitude: -0.12,
            })
        }
    }

    struct DeniedLocator;

    #[async_trait]
    impl GeolocationProvider for DeniedLocator {
        async fn current_position(&self, _: &PositionOptions) -> Result<GeoPoint, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    fn provisional(kind: AttendanceKind) -> AttendanceEvent {
        AttendanceEvent::provisional("Alex Chen", kind, String::new(), Utc::now())
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookups_run_concurrently() {
        let enricher = Enricher::new(Box::new(SlowGreeter), Some(Box::new(SlowLocator)));
        let event = provisional(AttendanceKind::ClockIn);
        let id = event.id.clone();

        let started = tokio::time::Instant::now();
        let done = enricher
            .enrich(event, &StillImage::png(vec![]), AccuracyProfile::High)
            .await;
        let waited = started.elapsed();

        // Slowest lookup sets the pace, not the sum of both.
        assert!(waited >= Duration::from_secs(3) && waited < Duration::from_secs(4));
        assert_eq!(done.id, id);
        assert!(!done.pending);
        assert_eq!(done.greeting.as_deref(), Some("Hi Alex Chen"));
        assert_eq!(done.location.map(|p| p.latitude), Some(51.5));
    }

    #[tokio::test]
    async fn test_failures_still_settle_the_record() {
        let enricher = Enricher::new(Box::new(BrokenGreeter), Some(Box::new(DeniedLocator)));

        let done = enricher
            .enrich(
                provisional(AttendanceKind::ClockOut),
                &StillImage::png(vec![]),
                AccuracyProfile::Medium,
            )
            .await;

        assert!(!done.pending);
        assert_eq!(
            done.greeting.as_deref(),
            Some("Goodbye, Alex Chen. See you next time!")
        );
        assert!(done.location.is_none());
    }

    #[tokio::test]
    async fn test_no_locator_configured() {
        let enricher = Enricher::new(Box::new(BrokenGreeter), None);
        let done = enricher
            .enrich(
                provisional(AttendanceKind::ClockIn),
                &StillImage::png(vec![]),
                AccuracyProfile::Low,
            )
            .await;
        assert!(!done.pending);
        assert!(done.location.is_none());
    }
}
