//! Core types and capability traits for marker-AR session coordination.
//!
//! This crate is intentionally small. It does *not* implement marker
//! detection, pose estimation, or rendering; those are owned by the host
//! and injected through the traits defined here ([`FrameSource`],
//! [`Detector`], [`RenderSurface`], [`AssetTransport`]).

mod config;
mod detect;
mod frame;
mod logger;
mod scene;
mod size;
mod surface;
mod transport;

pub use config::{
    DetectionMode, MarkerConfig, MarkerIdentity, SessionConfig, SourceKind, DEFAULT_MARKER_SIZE,
    DEFAULT_PATTERN_RATIO,
};
pub use detect::{DetectError, Detector, MarkerHandle, MarkerSighting, MarkerTarget};
pub use frame::{FrameSource, FrameView, SourceError};
pub use scene::{NodeId, Scene, TransformNode};
pub use size::PixelSize;
pub use surface::RenderSurface;
pub use transport::{AssetTransport, TransportError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init, init_with_level};

/// 4x4 column-major matrix shared by marker poses and the camera projection
/// (f32 for SIMD/WASM compatibility).
pub type Mat4 = nalgebra::Matrix4<f32>;
