//! Capture session lifecycle.
//!
//! open → Active (countdown) → Capturing → still emitted → Idle
//!
//! A refused device leaves the session in `Denied` until `retry`. The
//! countdown timer lives inside the session and is dropped on every exit
//! from `Active`, so no tick or capture can happen after `close`.

use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{sleep, Instant, Sleep};
use tracing::{debug, info, warn};

use super::device::{CaptureDevice, HeldStream, Resolution};
use super::still::{encode_png, StillImage};
use crate::config::CameraConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapturePhase {
    Idle,
    Active,
    Capturing,
    Denied,
}

impl CapturePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapturePhase::Idle => "idle",
            CapturePhase::Active => "active",
            CapturePhase::Capturing => "capturing",
            CapturePhase::Denied => "denied",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureStatus {
    pub phase: CapturePhase,
    pub countdown: Option<u8>,
}

impl Default for CaptureStatus {
    fn default() -> Self {
        Self {
            phase: CapturePhase::Idle,
            countdown: None,
        }
    }
}

/// Read side of a session's status, for API handlers.
#[derive(Clone)]
pub struct CaptureStatusHandle {
    rx: watch::Receiver<CaptureStatus>,
}

impl CaptureStatusHandle {
    pub fn get(&self) -> CaptureStatus {
        *self.rx.borrow()
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture is only possible while the camera is active (currently {})", .0.as_str())]
    NotActive(CapturePhase),
    #[error("failed to capture still: {0}")]
    Frame(String),
}

#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Countdown moved to the given value.
    Tick(u8),
    Captured(StillImage),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub resolution: Resolution,
    pub countdown_from: u8,
    pub tick: Duration,
    pub flash_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&CameraConfig::default())
    }
}

impl From<&CameraConfig> for SessionSettings {
    fn from(config: &CameraConfig) -> Self {
        Self {
            resolution: Resolution {
                width: config.width,
                height: config.height,
            },
            countdown_from: config.countdown_from,
            tick: config.tick(),
            flash_delay: config.flash_delay(),
        }
    }
}

struct Countdown {
    remaining: u8,
    next_tick: Pin<Box<Sleep>>,
}

impl Countdown {
    fn start(from: u8, tick: Duration) -> Self {
        Self {
            remaining: from,
            next_tick: Box::pin(sleep(tick)),
        }
    }
}

pub struct CaptureSession {
    device: Box<dyn CaptureDevice>,
    settings: SessionSettings,
    phase: CapturePhase,
    stream: Option<HeldStream>,
    countdown: Option<Countdown>,
    status: watch::Sender<CaptureStatus>,
}

impl CaptureSession {
    pub fn new(device: Box<dyn CaptureDevice>, settings: SessionSettings) -> Self {
        let (status, _) = watch::channel(CaptureStatus::default());
        Self {
            device,
            settings,
            phase: CapturePhase::Idle,
            stream: None,
            countdown: None,
            status,
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn countdown(&self) -> Option<u8> {
        self.countdown.as_ref().map(|c| c.remaining)
    }

    pub fn status_handle(&self) -> CaptureStatusHandle {
        CaptureStatusHandle {
            rx: self.status.subscribe(),
        }
    }

    fn set_phase(&mut self, phase: CapturePhase) {
        if self.phase != phase {
            debug!("Capture session: {} -> {}", self.phase.as_str(), phase.as_str());
        }
        self.phase = phase;
        self.publish();
    }

    fn publish(&self) {
        self.status.send_replace(CaptureStatus {
            phase: self.phase,
            countdown: self.countdown(),
        });
    }

    /// Request the camera. Ends in `Active` or `Denied`; a session that
    /// already holds the device is left alone.
    pub async fn open(&mut self) -> CapturePhase {
        match self.phase {
            CapturePhase::Idle | CapturePhase::Denied => self.acquire().await,
            phase => {
                warn!("Capture session already open ({})", phase.as_str());
                phase
            }
        }
    }

    /// Ask for the camera again after it was refused.
    pub async fn retry(&mut self) -> CapturePhase {
        if self.phase != CapturePhase::Denied {
            debug!("Retry requested while {}", self.phase.as_str());
            return self.phase;
        }
        self.acquire().await
    }

    async fn acquire(&mut self) -> CapturePhase {
        match self.device.acquire(self.settings.resolution).await {
            Ok(stream) => {
                let mut held = HeldStream::new(stream);
                match held.ready().await {
                    Ok(()) => {
                        self.stream = Some(held);
                        self.enter_active();
                    }
                    Err(e) => {
                        warn!("Camera produced no frames: {:#}", e);
                        drop(held);
                        self.set_phase(CapturePhase::Denied);
                    }
                }
            }
            Err(e) => {
                warn!("Camera access error on {}: {:#}", self.device.name(), e);
                self.set_phase(CapturePhase::Denied);
            }
        }
        self.phase
    }

    fn enter_active(&mut self) {
        if self.countdown.is_none() {
            self.countdown = Some(Countdown::start(
                self.settings.countdown_from,
                self.settings.tick,
            ));
        }
        info!("Camera active, auto-capturing in {}s", self.settings.countdown_from);
        self.set_phase(CapturePhase::Active);
    }

    /// Advance the session by one step.
    ///
    /// Waits for the next countdown tick, or captures once the countdown has
    /// reached zero. Returns `None` when the session is not active. Dropping
    /// the future while it waits on a tick loses nothing.
    pub async fn next_event(&mut self) -> Result<Option<CaptureEvent>, CaptureError> {
        if self.phase != CapturePhase::Active {
            return Ok(None);
        }
        let tick = self.settings.tick;
        let Some(countdown) = self.countdown.as_mut() else {
            return Ok(None);
        };

        if countdown.remaining == 0 {
            let image = self.capture().await?;
            return Ok(Some(CaptureEvent::Captured(image)));
        }

        countdown.next_tick.as_mut().await;
        countdown.remaining -= 1;
        let next = countdown.next_tick.deadline() + tick;
        countdown.next_tick.as_mut().reset(next);
        let remaining = countdown.remaining;

        debug!("Countdown {}", remaining);
        self.publish();
        Ok(Some(CaptureEvent::Tick(remaining)))
    }

    /// Drive the countdown to completion and return the still, or `None`
    /// when the session was not active.
    pub async fn run(&mut self) -> Result<Option<StillImage>, CaptureError> {
        while let Some(event) = self.next_event().await? {
            if let CaptureEvent::Captured(image) = event {
                return Ok(Some(image));
            }
        }
        Ok(None)
    }

    /// Capture immediately, skipping whatever is left of the countdown.
    pub async fn capture_now(&mut self) -> Result<StillImage, CaptureError> {
        if self.phase != CapturePhase::Active {
            return Err(CaptureError::NotActive(self.phase));
        }
        self.capture().await
    }

    async fn capture(&mut self) -> Result<StillImage, CaptureError> {
        self.countdown = None;
        self.set_phase(CapturePhase::Capturing);

        let image = match self.grab_still() {
            Ok(image) => image,
            Err(e) => {
                self.close();
                return Err(e);
            }
        };

        // flash
        sleep(self.settings.flash_delay).await;

        info!("Captured still ({} bytes)", image.bytes.len());
        self.close();
        Ok(image)
    }

    fn grab_still(&mut self) -> Result<StillImage, CaptureError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CaptureError::Frame("no camera stream".to_string()))?;
        let frame = stream
            .current_frame()
            .map_err(|e| CaptureError::Frame(format!("{:#}", e)))?;
        encode_png(&frame.mirrored()).map_err(|e| CaptureError::Frame(format!("{:#}", e)))
    }

    /// Release the camera and return to `Idle`, discarding any countdown.
    pub fn close(&mut self) {
        self.countdown = None;
        self.stream = None;
        self.set_phase(CapturePhase::Idle);
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!("Capture session dropped while holding the camera");
            self.close();
        }
    }
}
