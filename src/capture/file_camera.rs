//! Camera backed by a frame file on disk.
//!
//! Another process (a webcam grabber, a test fixture) keeps the file updated
//! with the latest binary PPM frame. Each capture re-reads it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

use super::device::{CaptureDevice, FrameStream, Resolution};
use super::frame::Frame;

pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CaptureDevice for FileCamera {
    fn name(&self) -> &str {
        "file camera"
    }

    async fn acquire(&mut self, hint: Resolution) -> Result<Box<dyn FrameStream>> {
        let data = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Camera source {:?} is not readable", self.path))?;
        let frame = Frame::from_ppm(&data)?;

        if frame.width != hint.width || frame.height != hint.height {
            debug!(
                "Camera delivers {}x{} instead of preferred {}x{}",
                frame.width, frame.height, hint.width, hint.height
            );
        }
        info!("Opened camera source {:?}", self.path);

        Ok(Box::new(FileStream {
            path: self.path.clone(),
            last: frame,
        }))
    }
}

struct FileStream {
    path: PathBuf,
    last: Frame,
}

#[async_trait]
impl FrameStream for FileStream {
    async fn ready(&mut self) -> Result<()> {
        Ok(())
    }

    fn current_frame(&mut self) -> Result<Frame> {
        // A half-written file keeps the previous frame on screen.
        if let Ok(data) = std::fs::read(&self.path) {
            if let Ok(frame) = Frame::from_ppm(&data) {
                self.last = frame;
            }
        }
        Ok(self.last.clone())
    }

    fn release(&mut self) {
        debug!("Closed camera source {:?}", self.path);
    }
}
