use serde::{Deserialize, Serialize};

/// Default physical marker edge length in scene units.
pub const DEFAULT_MARKER_SIZE: f32 = 1.0;

/// Default ratio between a marker's black border and its inner pattern.
pub const DEFAULT_PATTERN_RATIO: f32 = 0.5;

/// Where the session pulls frames from.
///
/// The session only records and logs the kind; the host constructs the
/// matching [`crate::FrameSource`] implementation.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum SourceKind {
    #[default]
    Webcam,
    Image {
        url: String,
    },
    Video {
        url: String,
    },
}

/// Detection mode forwarded to the backend.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum DetectionMode {
    Color,
    ColorAndMatrix,
    Mono,
    #[default]
    MonoAndMatrix,
}

impl DetectionMode {
    /// Parse the conventional snake_case mode names. Returns `None` for
    /// anything unrecognized; callers decide how to fall back.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "color" => Some(Self::Color),
            "color_and_matrix" => Some(Self::ColorAndMatrix),
            "mono" => Some(Self::Mono),
            "mono_and_matrix" => Some(Self::MonoAndMatrix),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::ColorAndMatrix => "color_and_matrix",
            Self::Mono => "mono",
            Self::MonoAndMatrix => "mono_and_matrix",
        }
    }
}

/// Marker identity: an image-trained pattern descriptor fetched by URL, or
/// a numeric barcode.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MarkerIdentity {
    Pattern { url: String },
    Barcode { value: u32 },
}

/// Configuration for one tracked marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub identity: MarkerIdentity,
    /// Physical marker edge length in scene units. Required for correct
    /// scale of any attached content.
    pub size: f32,
}

impl MarkerConfig {
    pub fn pattern(url: impl Into<String>) -> Self {
        Self {
            identity: MarkerIdentity::Pattern { url: url.into() },
            size: DEFAULT_MARKER_SIZE,
        }
    }

    pub fn barcode(value: u32) -> Self {
        Self {
            identity: MarkerIdentity::Barcode { value },
            size: DEFAULT_MARKER_SIZE,
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Pattern asset URL, if this is a pattern marker.
    pub fn pattern_url(&self) -> Option<&str> {
        match &self.identity {
            MarkerIdentity::Pattern { url } => Some(url),
            MarkerIdentity::Barcode { .. } => None,
        }
    }
}

/// Top-level session configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub source: SourceKind,
    pub detection_mode: DetectionMode,
    /// Ratio between the marker border and its inner pattern.
    pub pattern_ratio: f32,
    /// Camera calibration resource. `None` selects the detection backend's
    /// built-in default profile.
    pub calibration_url: Option<String>,
    /// Verify that remote assets exist before acquiring the camera.
    pub preflight: bool,
    /// Emit periodic per-frame diagnostics while running.
    pub debug: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Webcam,
            detection_mode: DetectionMode::MonoAndMatrix,
            pattern_ratio: DEFAULT_PATTERN_RATIO,
            calibration_url: None,
            preflight: true,
            debug: false,
        }
    }
}
