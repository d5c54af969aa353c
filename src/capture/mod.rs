//! Camera capture: device access, the countdown session and still encoding.

pub mod device;
pub mod file_camera;
pub mod frame;
pub mod session;
pub mod still;

pub use device::{CaptureDevice, FrameStream, Resolution};
pub use file_camera::FileCamera;
pub use frame::Frame;
pub use session::{
    CaptureError, CaptureEvent, CapturePhase, CaptureSession, CaptureStatus, CaptureStatusHandle,
    SessionSettings,
};
pub use still::{encode_png, StillImage};
