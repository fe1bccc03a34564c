use crate::{DetectionMode, FrameView, Mat4, PixelSize};

/// Opaque handle to a marker registered with a detection backend.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct MarkerHandle(pub u32);

/// What the session asks the backend to track.
#[derive(Clone, Copy, Debug)]
pub enum MarkerTarget<'a> {
    /// Image-trained pattern descriptor (raw asset bytes).
    Pattern { data: &'a [u8], size: f32 },
    /// Numeric barcode.
    Barcode { value: u32, size: f32 },
}

/// Pose of one marker seen during a detection pass.
#[derive(Clone, Copy, Debug)]
pub struct MarkerSighting {
    pub handle: MarkerHandle,
    pub transform: Mat4,
}

/// Errors raised by a detection backend.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("calibration data rejected: {reason}")]
    BadCalibration { reason: String },
    #[error("marker descriptor rejected: {reason}")]
    BadMarker { reason: String },
}

/// Marker-detection backend owned by the host.
///
/// The backend owns recognition and pose math; the session owns lifecycle
/// and sizing. `process` is synchronous from the caller's perspective but
/// may be computationally heavy, so callers skip it while the frame source
/// is not ready.
pub trait Detector {
    /// Apply the session's detection mode and pattern ratio.
    fn configure(&mut self, mode: DetectionMode, pattern_ratio: f32);

    /// Derive the camera projection from calibration data. `None` selects
    /// the backend's built-in default profile.
    fn load_calibration(&mut self, data: Option<&[u8]>) -> Result<Mat4, DetectError>;

    /// Start tracking a marker.
    fn register(&mut self, target: MarkerTarget<'_>) -> Result<MarkerHandle, DetectError>;

    /// Stop tracking a marker. Unknown handles are ignored.
    fn unregister(&mut self, handle: MarkerHandle);

    /// One detection pass. Returns the markers visible in this frame.
    fn process(&mut self, frame: FrameView<'_>) -> Vec<MarkerSighting>;

    /// Resize the internal working canvas. There is no auto-sync: a missed
    /// call leaves this canvas and the display surface out of step.
    fn set_canvas_size(&mut self, size: PixelSize);

    fn canvas_size(&self) -> PixelSize;
}
