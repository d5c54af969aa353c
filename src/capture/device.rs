//! Capture device abstraction.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// A camera that can be opened for exclusive use.
#[async_trait]
pub trait CaptureDevice: Send {
    fn name(&self) -> &str;

    /// Request the device. `hint` is a preferred resolution the device may
    /// ignore. An error means access was refused or the device is missing.
    async fn acquire(&mut self, hint: Resolution) -> Result<Box<dyn FrameStream>>;
}

/// An acquired video stream.
#[async_trait]
pub trait FrameStream: Send {
    /// Resolves once the first frame is available.
    async fn ready(&mut self) -> Result<()>;

    /// The frame currently on screen.
    fn current_frame(&mut self) -> Result<Frame>;

    /// Stop every track and give the device back.
    fn release(&mut self);
}

/// Owns an acquired stream and releases it when dropped, on every exit path.
pub(crate) struct HeldStream {
    stream: Box<dyn FrameStream>,
}

impl HeldStream {
    pub(crate) fn new(stream: Box<dyn FrameStream>) -> Self {
        Self { stream }
    }

    pub(crate) async fn ready(&mut self) -> Result<()> {
        self.stream.ready().await
    }

    pub(crate) fn current_frame(&mut self) -> Result<Frame> {
        self.stream.current_frame()
    }
}

impl Drop for HeldStream {
    fn drop(&mut self) {
        debug!("Releasing capture stream");
        self.stream.release();
    }
}
