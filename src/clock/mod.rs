use anyhow::Result;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::attendance::{AttendanceEvent, AttendanceKind};
use crate::capture::{CapturePhase, CaptureSession, CaptureStatusHandle};
use crate::enrichment::Enricher;
use crate::location::AccuracyProfile;
use crate::roster::StaffMember;
use crate::state::StateHandle;

#[derive(Debug, Clone)]
pub struct ClockRequest {
    pub member: StaffMember,
    pub kind: AttendanceKind,
    pub accuracy: AccuracyProfile,
}

/// What an interrupted countdown should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Close the camera and record nothing.
    Cancel,
    /// Skip the rest of the countdown and take the still now.
    CaptureNow,
}

#[derive(Debug)]
pub enum ClockOutcome {
    /// The camera refused access; nothing was recorded.
    CameraDenied,
    /// The countdown was interrupted before a still was taken.
    Cancelled,
    /// A provisional record is stored. The handle resolves to the final
    /// record once enrichment has replaced it in the state.
    Recorded {
        provisional: AttendanceEvent,
        enrichment: JoinHandle<AttendanceEvent>,
    },
}

pub struct ClockMachine {
    session: CaptureSession,
    enricher: Arc<Enricher>,
    state: StateHandle,
}

impl ClockMachine {
    pub fn new(session: CaptureSession, enricher: Enricher, state: StateHandle) -> Self {
        Self {
            session,
            enricher: Arc::new(enricher),
            state,
        }
    }

    pub fn status_handle(&self) -> CaptureStatusHandle {
        self.session.status_handle()
    }

    /// Run one clock action for `request`.
    ///
    /// `interrupt` resolving during the countdown either cancels it or
    /// captures immediately. Enrichment is never cancelled once a still
    /// exists.
    pub async fn clock<F>(&mut self, request: ClockRequest, interrupt: F) -> Result<ClockOutcome>
    where
        F: Future<Output = Interrupt>,
    {
        info!(
            "ClockMachine: {} for {}",
            request.kind.as_str(),
            request.member.display_name
        );

        if self.session.open().await == CapturePhase::Denied {
            warn!("ClockMachine: camera access denied");
            return Ok(ClockOutcome::CameraDenied);
        }

        let interrupted = tokio::select! {
            result = self.session.run() => Ok(result?),
            interrupt = interrupt => Err(interrupt),
        };

        let captured = match interrupted {
            Ok(image) => image,
            Err(Interrupt::Cancel) => None,
            Err(Interrupt::CaptureNow) => {
                info!("ClockMachine: manual capture");
                match self.session.capture_now().await {
                    Ok(image) => Some(image),
                    Err(e) => {
                        self.session.close();
                        return Err(e.into());
                    }
                }
            }
        };

        let Some(image) = captured else {
            self.session.close();
            info!("ClockMachine: capture cancelled");
            return Ok(ClockOutcome::Cancelled);
        };

        let provisional = AttendanceEvent::provisional(
            &request.member.display_name,
            request.kind,
            image.to_data_url(),
            Utc::now(),
        );
        self.state.upsert(provisional.clone()).await;

        let enricher = Arc::clone(&self.enricher);
        let state = self.state.clone();
        let pending = provisional.clone();
        let accuracy = request.accuracy;

        let enrichment = tokio::spawn(async move {
            let record = enricher.enrich(pending, &image, accuracy).await;
            state.upsert(record.clone()).await;
            record
        });

        Ok(ClockOutcome::Recorded {
            provisional,
            enrichment,
        })
    }
}

/// Wait for the final record, falling back to the provisional one if the
/// enrichment task died.
pub async fn settle(
    provisional: AttendanceEvent,
    enrichment: JoinHandle<AttendanceEvent>,
) -> AttendanceEvent {
    match enrichment.await {
        Ok(record) => record,
        Err(e) => {
            error!("Enrichment task failed: {}", e);
            provisional
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureDevice, Frame, FrameStream, Resolution, SessionSettings};
    use crate::greeting::StaticGreeter;
    use crate::location::FixedLocator;
    use crate::roster::{Directory, Role};
    use crate::state::AppState;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StillCamera {
        refuse: bool,
    }

    struct StillStream;

    #[async_trait]
    impl CaptureDevice for StillCamera {
        fn name(&self) -> &str {
            "still"
        }

        async fn acquire(&mut self, _hint: Resolution) -> Result<Box<dyn FrameStream>> {
            if self.refuse {
                bail!("not allowed");
            }
            Ok(Box::new(StillStream))
        }
    }

    #[async_trait]
    impl FrameStream for StillStream {
        async fn ready(&mut self) -> Result<()> {
            Ok(())
        }

        fn current_frame(&mut self) -> Result<Frame> {
            Frame::new(1, 1, vec![200, 100, 50])
        }

        fn release(&mut self) {}
    }

    fn machine(refuse: bool, state: &StateHandle) -> ClockMachine {
        let session = CaptureSession::new(
            Box::new(StillCamera { refuse }),
            SessionSettings::default(),
        );
        let locator = FixedLocator::new(Some(crate::attendance::GeoPoint {
            latitude: 1.5,
            longitude: 2.5,
        }));
        ClockMachine::new(
            session,
            Enricher::new(Box::new(StaticGreeter), Some(Box::new(locator))),
            state.clone(),
        )
    }

    fn request(kind: AttendanceKind) -> ClockRequest {
        ClockRequest {
            member: StaffMember::new("staff", "staff", "Alex Chen", Role::Staff),
            kind,
            accuracy: AccuracyProfile::High,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_records_then_enriches_in_place() {
        let state = StateHandle::new(AppState::new(Directory::with_defaults()));
        let mut machine = machine(false, &state);

        let outcome = machine
            .clock(request(AttendanceKind::ClockIn), std::future::pending())
            .await
            .unwrap();

        let ClockOutcome::Recorded {
            provisional,
            enrichment,
        } = outcome
        else {
            panic!("expected a record");
        };
        assert!(provisional.pending);
        assert!(provisional.photo.starts_with("data:image/png;base64,"));
        assert_eq!(provisional.staff_name, "Alex Chen");

        let record = settle(provisional.clone(), enrichment).await;
        assert_eq!(record.id, provisional.id);
        assert!(!record.pending);
        assert_eq!(
            record.greeting.as_deref(),
            Some("Welcome, Alex Chen. Have a great day!")
        );
        assert_eq!(record.location.map(|p| p.longitude), Some(2.5));

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.events.len(), 1);
        assert!(!snapshot.events[0].pending);
        assert_eq!(machine.status_handle().get().phase, CapturePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_countdown_records_nothing() {
        let state = StateHandle::default();
        let mut machine = machine(false, &state);

        let outcome = machine
            .clock(
                request(AttendanceKind::ClockOut),
                async {
                    tokio::time::sleep(Duration::from_millis(1500)).await;
                    Interrupt::Cancel
                },
            )
            .await
            .unwrap();

        assert!(matches!(outcome, ClockOutcome::Cancelled));
        assert!(state.snapshot().await.events.is_empty());
        assert_eq!(machine.status_handle().get().phase, CapturePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_now_skips_rest_of_countdown() {
        let state = StateHandle::default();
        let mut machine = machine(false, &state);
        let started = tokio::time::Instant::now();

        let outcome = machine
            .clock(request(AttendanceKind::ClockIn), async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Interrupt::CaptureNow
            })
            .await
            .unwrap();

        // 500ms wait plus the 300ms flash, well short of the 3s countdown
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(800) && waited < Duration::from_secs(1));

        let ClockOutcome::Recorded { enrichment, .. } = outcome else {
            panic!("expected a record");
        };
        let record = enrichment.await.unwrap();
        assert!(!record.pending);
        assert_eq!(state.snapshot().await.events.len(), 1);
        assert_eq!(machine.status_handle().get().phase, CapturePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_camera_records_nothing() {
        let state = StateHandle::default();
        let mut machine = machine(true, &state);

        let outcome = machine
            .clock(request(AttendanceKind::ClockIn), std::future::pending())
            .await
            .unwrap();

        assert!(matches!(outcome, ClockOutcome::CameraDenied));
        assert!(state.snapshot().await.events.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_phase_is_published() {
        let state = StateHandle::default();
        let mut machine = machine(true, &state);
        machine
            .clock(request(AttendanceKind::ClockIn), std::future::pending())
            .await
            .unwrap();
        assert_eq!(machine.status_handle().get().phase, CapturePhase::Denied);
    }
}
