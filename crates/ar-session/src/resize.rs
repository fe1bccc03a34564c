//! Viewport resize synchronization.
//!
//! The video element, the render surface, and the detection backend's
//! working canvas must stay pixel-equal. Each apply runs strictly in that
//! order and silently skips parts that do not exist yet, because
//! initialization order means resize events can arrive before dependent
//! objects do.

use std::time::{Duration, Instant};

use ar_session_core::{Detector, FrameSource, PixelSize, RenderSurface};

use crate::context::DetectionContext;

/// Delay before the one extra sync pass after the first frame. Media
/// elements often report a transient intermediate size right after
/// startup and settle shortly after.
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Tracks the last known viewport and replays it onto every size-coupled
/// element.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResizeCoordinator {
    viewport: Option<PixelSize>,
    settle_at: Option<Instant>,
}

impl ResizeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewport(&self) -> Option<PixelSize> {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: PixelSize) {
        self.viewport = Some(viewport);
    }

    /// Queue one extra apply pass at `now + SETTLE_DELAY`.
    pub fn schedule_settle(&mut self, now: Instant) {
        self.settle_at = Some(now + SETTLE_DELAY);
    }

    /// True when the queued settle pass is due. Clears the queue entry.
    pub fn take_settle(&mut self, now: Instant) -> bool {
        match self.settle_at {
            Some(at) if now >= at => {
                self.settle_at = None;
                true
            }
            _ => false,
        }
    }

    /// Propagate the current viewport: ask the source to recompute its
    /// element size, copy that size onto the render surface, then onto the
    /// detection canvas. Missing parts make this a no-op, never an error.
    pub fn apply<V, D, S>(
        &self,
        source: Option<&mut V>,
        surface: &mut S,
        context: Option<&mut DetectionContext<D>>,
    ) where
        V: FrameSource,
        D: Detector,
        S: RenderSurface,
    {
        let Some(viewport) = self.viewport else {
            return;
        };
        let Some(source) = source else {
            return;
        };

        let element = source.layout(viewport);
        surface.set_size(element);
        if let Some(context) = context {
            context.set_canvas_size(element);
        }
    }
}
