use crate::PixelSize;

/// Borrowed view of one decoded video frame.
///
/// Row-major luma plane, `len = width * height`. Designed to map a video
/// element or native capture buffer without copying.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub width: u32,
    pub height: u32,
    pub data: &'a [u8],
}

/// Errors raised by a frame source.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("media source refused to start: {reason}")]
    AcquisitionFailed { reason: String },
    #[error("media source was already disposed")]
    Disposed,
}

/// A webcam, image, or video feed owned by the host.
///
/// Acquisition is asynchronous from the session's point of view: `begin`
/// requests the stream and [`FrameSource::ready`] flips to `true` once the
/// first frame has been decoded. Downstream consumers must skip processing
/// while `ready` is `false`.
pub trait FrameSource {
    /// Request the media stream. Completion is observed through `ready`.
    fn begin(&mut self) -> Result<(), SourceError>;

    /// True once the first frame has been decoded.
    fn ready(&self) -> bool;

    /// Latest decoded frame, if any.
    fn frame(&self) -> Option<FrameView<'_>>;

    /// Intrinsic frame dimensions, once known.
    fn native_size(&self) -> Option<PixelSize>;

    /// Recompute the on-screen element size for `viewport` and return it.
    fn layout(&mut self, viewport: PixelSize) -> PixelSize;

    /// Current on-screen element size, once laid out.
    fn element_size(&self) -> Option<PixelSize>;

    /// Release the underlying media stream. Must be idempotent and safe to
    /// call even if `begin` never ran or never completed.
    fn dispose(&mut self);
}
