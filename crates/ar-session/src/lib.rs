//! Marker-AR session glue.
//!
//! This crate coordinates one AR run: it wires a host-supplied frame
//! source, marker-detection backend, and render surface into a single
//! lifecycle and keeps their sizes synchronized. It deliberately contains
//! no recognition, pose math, or drawing of its own; those arrive through
//! the capability traits in [`ar_session_core`].
//!
//! ## Lifecycle
//!
//! 1. Build a [`SessionConfig`] (or derive one with `ar-session-markup`),
//!    then a [`Session`] from the injected backends.
//! 2. [`Session::add_marker`] binds each marker to a fresh scene node.
//! 3. [`Session::start`] runs the optional preflight existence checks and
//!    requests the media stream. On any missing asset it aborts before the
//!    camera is touched.
//! 4. The host drives [`Session::tick`] once per display refresh and
//!    forwards viewport changes to [`Session::notify_viewport`]. The first
//!    ready frame triggers calibration loading, projection hand-off, and
//!    marker registration; after that each tick runs one detection pass
//!    and reports [`MarkerEvent`]s for found/lost transitions.
//! 5. [`Session::dispose`] releases the media stream. Hosts should remove
//!    their resize listener at the same time.
//!
//! ## API map
//! - [`probe`]: preflight asset existence checks.
//! - [`DetectionContext`]: calibration loading and per-frame detection.
//! - [`ResizeCoordinator`]: video element / render surface / detection
//!   canvas size synchronization.
//! - [`MarkerBinding`]: per-marker found/lost edge detection.
//! - [`Session`]: the lifecycle described above.

pub use ar_session_core as core;

pub use ar_session_core::{
    AssetTransport, DetectError, DetectionMode, Detector, FrameSource, FrameView, MarkerConfig,
    MarkerHandle, MarkerIdentity, MarkerSighting, MarkerTarget, Mat4, NodeId, PixelSize,
    RenderSurface, Scene, SessionConfig, SourceError, SourceKind, TransformNode, TransportError,
};

mod binding;
mod context;
pub mod probe;
mod resize;
mod session;

pub use binding::{MarkerBinding, MarkerEvent, MarkerEventKind, MarkerId};
pub use context::{ContextError, DetectionContext};
pub use resize::{ResizeCoordinator, SETTLE_DELAY};
pub use session::{Session, SessionError, SessionPhase, TickReport};
