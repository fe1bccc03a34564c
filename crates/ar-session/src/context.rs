//! Detection context: calibration loading and the per-frame detection pass.

use ar_session_core::{
    AssetTransport, DetectError, Detector, FrameView, MarkerHandle, MarkerSighting, MarkerTarget,
    Mat4, PixelSize, SessionConfig, TransportError,
};
use log::{debug, info};

/// Errors raised while bringing the detection context up.
#[derive(thiserror::Error, Debug)]
pub enum ContextError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Backend(#[from] DetectError),
}

/// Wraps the injected detection backend with the session-side state it
/// does not own: the calibration-derived projection matrix and the
/// explicit canvas-sizing contract.
pub struct DetectionContext<D: Detector> {
    backend: D,
    projection: Option<Mat4>,
}

impl<D: Detector> DetectionContext<D> {
    pub fn new(backend: D) -> Self {
        Self {
            backend,
            projection: None,
        }
    }

    /// Configure the backend and load the calibration resource. The
    /// projection matrix is stable for the rest of the session once this
    /// returns; consumers copy it once into their render camera.
    pub fn init<T: AssetTransport>(
        &mut self,
        config: &SessionConfig,
        transport: &T,
    ) -> Result<&Mat4, ContextError> {
        self.backend
            .configure(config.detection_mode, config.pattern_ratio);

        let matrix = match &config.calibration_url {
            Some(url) => {
                let data = transport.get(url)?;
                debug!("calibration resource fetched ({} bytes): {url}", data.len());
                self.backend.load_calibration(Some(&data))?
            }
            None => self.backend.load_calibration(None)?,
        };
        info!(
            "projection matrix derived (mode {})",
            config.detection_mode.name()
        );
        Ok(self.projection.insert(matrix))
    }

    /// True once `init` has completed.
    pub fn is_ready(&self) -> bool {
        self.projection.is_some()
    }

    /// Stable after [`DetectionContext::init`] completes.
    pub fn projection_matrix(&self) -> Option<&Mat4> {
        self.projection.as_ref()
    }

    pub fn register(&mut self, target: MarkerTarget<'_>) -> Result<MarkerHandle, DetectError> {
        self.backend.register(target)
    }

    pub fn unregister(&mut self, handle: MarkerHandle) {
        self.backend.unregister(handle);
    }

    /// One synchronous detection pass. Callers must skip this while the
    /// frame source is not ready.
    pub fn update(&mut self, frame: FrameView<'_>) -> Vec<MarkerSighting> {
        self.backend.process(frame)
    }

    /// Resize the backend's working canvas. Must be called whenever the
    /// render surface resizes; there is no auto-sync.
    pub fn set_canvas_size(&mut self, size: PixelSize) {
        self.backend.set_canvas_size(size);
    }

    pub fn canvas_size(&self) -> PixelSize {
        self.backend.canvas_size()
    }

    pub fn backend(&self) -> &D {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut D {
        &mut self.backend
    }
}
