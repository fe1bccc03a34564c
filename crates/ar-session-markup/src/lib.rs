//! Declarative attribute layer for `ar-session`.
//!
//! Hosts that expose AR through markup (a `<a-marker type="pattern"
//! url="markers/x.patt" size="1.0">`-style tag and a scene-level system
//! declaration) translate attribute pairs into typed configuration here.
//! Parsing is deliberately permissive: a single malformed declaration must
//! not hang a whole session, so unknown values warn and fall back to safe
//! defaults instead of failing.
//!
//! This layer only translates; it never duplicates session, resize, or
//! visibility logic.

use ar_session_core::{
    DetectionMode, MarkerConfig, MarkerIdentity, SessionConfig, SourceKind, DEFAULT_MARKER_SIZE,
    DEFAULT_PATTERN_RATIO,
};
use log::warn;

/// Build a [`MarkerConfig`] from marker-tag attribute pairs.
///
/// Recognized attributes: `type` (`pattern` | `barcode`), `url` (pattern
/// asset location), `size` (physical scale), `value` (barcode number).
/// Unknown types fall back to `pattern` with a warning; numeric fields
/// coerce unparseable input to their defaults.
pub fn marker_from_attributes<'a, I>(attributes: I) -> MarkerConfig
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut marker_type = None;
    let mut url = None;
    let mut size = None;
    let mut value = None;

    for (key, raw) in attributes {
        match key {
            "type" => marker_type = Some(raw),
            "url" => url = Some(raw),
            "size" => size = Some(raw),
            "value" => value = Some(raw),
            other => warn!("ignoring unknown marker attribute {other:?}"),
        }
    }

    let size = parse_size(size);
    let identity = match marker_type {
        Some("barcode") => MarkerIdentity::Barcode {
            value: parse_barcode_value(value),
        },
        Some("pattern") | None => MarkerIdentity::Pattern {
            url: url.unwrap_or_default().to_string(),
        },
        Some(other) => {
            warn!("unsupported marker type {other:?}; falling back to pattern");
            MarkerIdentity::Pattern {
                url: url.unwrap_or_default().to_string(),
            }
        }
    };

    MarkerConfig { identity, size }
}

/// Build a [`SessionConfig`] from scene-level attribute pairs.
///
/// Recognized attributes: `sourceType` (`webcam` | `image` | `video`),
/// `sourceUrl` (for the non-webcam kinds), `detectionMode`,
/// `patternRatio`, `cameraParametersUrl`, `preflight`, `debugUIEnabled`.
pub fn session_from_attributes<'a, I>(attributes: I) -> SessionConfig
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut config = SessionConfig::default();
    let mut source_type = None;
    let mut source_url = None;

    for (key, raw) in attributes {
        match key {
            "sourceType" => source_type = Some(raw),
            "sourceUrl" => source_url = Some(raw),
            "detectionMode" => {
                config.detection_mode = DetectionMode::from_name(raw).unwrap_or_else(|| {
                    warn!("unknown detection mode {raw:?}; using the default");
                    DetectionMode::default()
                });
            }
            "patternRatio" => {
                config.pattern_ratio = raw.trim().parse().unwrap_or_else(|_| {
                    warn!("unparseable pattern ratio {raw:?}; using the default");
                    DEFAULT_PATTERN_RATIO
                });
            }
            "cameraParametersUrl" => config.calibration_url = Some(raw.to_string()),
            "preflight" => config.preflight = parse_flag(raw, config.preflight),
            "debugUIEnabled" => config.debug = parse_flag(raw, config.debug),
            other => warn!("ignoring unknown scene attribute {other:?}"),
        }
    }

    config.source = match source_type {
        Some("webcam") | None => SourceKind::Webcam,
        Some("image") => SourceKind::Image {
            url: source_url.unwrap_or_default().to_string(),
        },
        Some("video") => SourceKind::Video {
            url: source_url.unwrap_or_default().to_string(),
        },
        Some(other) => {
            warn!("unknown source type {other:?}; using the webcam");
            SourceKind::Webcam
        }
    };

    config
}

/// Barcode values parse permissively: anything non-numeric becomes 0.
pub fn parse_barcode_value(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

fn parse_size(raw: Option<&str>) -> f32 {
    match raw {
        Some(s) => s.trim().parse().unwrap_or_else(|_| {
            warn!("unparseable marker size {s:?}; using the default");
            DEFAULT_MARKER_SIZE
        }),
        None => DEFAULT_MARKER_SIZE,
    }
}

fn parse_flag(raw: &str, default: bool) -> bool {
    match raw.trim() {
        "true" | "1" => true,
        "false" | "0" => false,
        other => {
            warn!("unparseable flag {other:?}; keeping {default}");
            default
        }
    }
}
