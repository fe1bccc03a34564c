use crate::{Mat4, PixelSize, Scene};

/// Pixel-addressable output surface plus the render camera it drives.
///
/// The session keeps the surface sized in lockstep with the video element
/// and the detection canvas; it does not care which graphics API sits
/// behind this trait.
pub trait RenderSurface {
    fn set_size(&mut self, size: PixelSize);

    fn size(&self) -> PixelSize;

    /// Copy the calibration-derived projection into the render camera.
    /// Called once per session, after calibration completes.
    fn set_projection(&mut self, projection: &Mat4);

    /// Draw the current scene state.
    fn render(&mut self, scene: &Scene);
}
