//! End-to-end session lifecycle tests against scripted in-memory backends.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use ar_session::{
    AssetTransport, DetectError, DetectionMode, Detector, FrameSource, FrameView, MarkerConfig,
    MarkerEventKind, MarkerHandle, MarkerSighting, MarkerTarget, Mat4, PixelSize, RenderSurface,
    Scene, Session, SessionConfig, SessionError, SessionPhase, SourceError, TransportError,
};

const CALIB_URL: &str = "libs/data/camera_para.dat";
const PATTERN_URL: &str = "assets/patt.hiro";

/// Frame source whose readiness is flipped by the test through shared
/// state; records every lifecycle call.
struct ScriptedSource {
    pixels: Vec<u8>,
    state: Rc<RefCell<SourceState>>,
}

#[derive(Default)]
struct SourceState {
    begun: bool,
    ready: bool,
    element: Option<PixelSize>,
    layouts: usize,
    disposals: usize,
}

impl ScriptedSource {
    fn new() -> (Self, Rc<RefCell<SourceState>>) {
        let state = Rc::new(RefCell::new(SourceState::default()));
        (
            Self {
                pixels: vec![0u8; 4],
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl FrameSource for ScriptedSource {
    fn begin(&mut self) -> Result<(), SourceError> {
        self.state.borrow_mut().begun = true;
        Ok(())
    }

    fn ready(&self) -> bool {
        self.state.borrow().ready
    }

    fn frame(&self) -> Option<FrameView<'_>> {
        if !self.state.borrow().ready {
            return None;
        }
        Some(FrameView {
            width: 2,
            height: 2,
            data: &self.pixels,
        })
    }

    fn native_size(&self) -> Option<PixelSize> {
        Some(PixelSize::new(2, 2))
    }

    fn layout(&mut self, viewport: PixelSize) -> PixelSize {
        let mut state = self.state.borrow_mut();
        state.layouts += 1;
        state.element = Some(viewport);
        viewport
    }

    fn element_size(&self) -> Option<PixelSize> {
        self.state.borrow().element
    }

    fn dispose(&mut self) {
        self.state.borrow_mut().disposals += 1;
    }
}

/// Detector whose per-frame visibility is a scripted sequence: frame `n`
/// shows every registered marker iff `script[n]` is true.
struct ScriptedDetector {
    state: Rc<RefCell<DetectorState>>,
}

#[derive(Default)]
struct DetectorState {
    script: Vec<bool>,
    frame: usize,
    registered: Vec<MarkerHandle>,
    canvas: PixelSize,
    updates: usize,
    configured: Option<(DetectionMode, f32)>,
}

impl ScriptedDetector {
    fn new(script: Vec<bool>) -> (Self, Rc<RefCell<DetectorState>>) {
        let state = Rc::new(RefCell::new(DetectorState {
            script,
            ..DetectorState::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl Detector for ScriptedDetector {
    fn configure(&mut self, mode: DetectionMode, pattern_ratio: f32) {
        self.state.borrow_mut().configured = Some((mode, pattern_ratio));
    }

    fn load_calibration(&mut self, _data: Option<&[u8]>) -> Result<Mat4, DetectError> {
        Ok(Mat4::identity() * 2.0)
    }

    fn register(&mut self, _target: MarkerTarget<'_>) -> Result<MarkerHandle, DetectError> {
        let mut state = self.state.borrow_mut();
        let handle = MarkerHandle(state.registered.len() as u32);
        state.registered.push(handle);
        Ok(handle)
    }

    fn unregister(&mut self, handle: MarkerHandle) {
        self.state.borrow_mut().registered.retain(|h| *h != handle);
    }

    fn process(&mut self, _frame: FrameView<'_>) -> Vec<MarkerSighting> {
        let mut state = self.state.borrow_mut();
        let visible = state.script.get(state.frame).copied().unwrap_or(false);
        state.frame += 1;
        state.updates += 1;
        if visible {
            state
                .registered
                .iter()
                .map(|&handle| MarkerSighting {
                    handle,
                    transform: Mat4::identity(),
                })
                .collect()
        } else {
            Vec::new()
        }
    }

    fn set_canvas_size(&mut self, size: PixelSize) {
        self.state.borrow_mut().canvas = size;
    }

    fn canvas_size(&self) -> PixelSize {
        self.state.borrow().canvas
    }
}

#[derive(Default)]
struct RecordingSurface {
    size: PixelSize,
    projection: Option<Mat4>,
    renders: usize,
}

impl RenderSurface for RecordingSurface {
    fn set_size(&mut self, size: PixelSize) {
        self.size = size;
    }

    fn size(&self) -> PixelSize {
        self.size
    }

    fn set_projection(&mut self, projection: &Mat4) {
        self.projection = Some(*projection);
    }

    fn render(&mut self, _scene: &Scene) {
        self.renders += 1;
    }
}

/// Transport serving an in-memory URL map and counting fetches.
struct MapTransport {
    assets: HashMap<String, Vec<u8>>,
    gets: Rc<RefCell<usize>>,
}

impl MapTransport {
    fn with_assets(urls: &[&str]) -> Self {
        Self {
            assets: urls
                .iter()
                .map(|url| (url.to_string(), vec![1u8, 2, 3]))
                .collect(),
            gets: Rc::new(RefCell::new(0)),
        }
    }
}

impl AssetTransport for MapTransport {
    fn head(&self, url: &str) -> Result<u16, TransportError> {
        if self.assets.contains_key(url) {
            Ok(200)
        } else {
            Ok(404)
        }
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        *self.gets.borrow_mut() += 1;
        self.assets
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

type TestSession = Session<ScriptedSource, ScriptedDetector, RecordingSurface, MapTransport>;

fn config() -> SessionConfig {
    SessionConfig {
        calibration_url: Some(CALIB_URL.into()),
        ..SessionConfig::default()
    }
}

fn session_with_script(
    script: Vec<bool>,
) -> (
    TestSession,
    Rc<RefCell<SourceState>>,
    Rc<RefCell<DetectorState>>,
) {
    let (source, source_state) = ScriptedSource::new();
    let (detector, detector_state) = ScriptedDetector::new(script);
    let transport = MapTransport::with_assets(&[CALIB_URL, PATTERN_URL]);
    let session = Session::new(
        config(),
        source,
        detector,
        RecordingSurface::default(),
        transport,
    );
    (session, source_state, detector_state)
}

#[test]
fn detection_is_skipped_until_the_source_is_ready() {
    let (mut session, source, detector) = session_with_script(vec![true; 10]);
    session.add_marker(MarkerConfig::pattern(PATTERN_URL)).unwrap();
    session.start().unwrap();

    for _ in 0..3 {
        let report = session.tick().unwrap();
        assert!(!report.detected);
        assert!(report.events.is_empty());
    }
    assert_eq!(detector.borrow().updates, 0);
    // The scene still rendered every tick while waiting.
    assert_eq!(session.surface().renders, 3);

    source.borrow_mut().ready = true;
    let report = session.tick().unwrap();
    assert!(report.detected);
    assert_eq!(detector.borrow().updates, 1);
    assert_eq!(session.phase(), SessionPhase::Running);
    // The backend was configured with the session's mode and ratio before
    // the first pass.
    assert_eq!(
        detector.borrow().configured,
        Some((DetectionMode::MonoAndMatrix, 0.5))
    );
}

#[test]
fn sizes_stay_pixel_equal_across_resizes() {
    let (mut session, source, detector) = session_with_script(vec![false; 10]);
    session.add_marker(MarkerConfig::pattern(PATTERN_URL)).unwrap();
    session.start().unwrap();
    session.notify_viewport(PixelSize::new(800, 600));
    source.borrow_mut().ready = true;
    session.tick().unwrap();

    for viewport in [PixelSize::new(1280, 720), PixelSize::new(640, 480)] {
        session.notify_viewport(viewport);
        assert_eq!(source.borrow().element, Some(viewport));
        assert_eq!(session.surface().size(), viewport);
        assert_eq!(detector.borrow().canvas, viewport);
    }
}

#[test]
fn resize_before_detection_context_sizes_source_and_surface_only() {
    let (mut session, source, detector) = session_with_script(vec![]);
    session.start().unwrap();

    // Source requested but no first frame yet: the detection context does
    // not exist, and the resize must neither fail nor touch its canvas.
    session.notify_viewport(PixelSize::new(1024, 768));
    assert_eq!(source.borrow().element, Some(PixelSize::new(1024, 768)));
    assert_eq!(session.surface().size(), PixelSize::new(1024, 768));
    assert_eq!(detector.borrow().canvas, PixelSize::default());
}

#[test]
fn resize_before_start_is_a_silent_no_op() {
    let (mut session, source, _) = session_with_script(vec![]);
    session.notify_viewport(PixelSize::new(1024, 768));
    assert_eq!(source.borrow().layouts, 0);
    assert_eq!(session.surface().size(), PixelSize::default());
}

#[test]
fn missing_calibration_asset_aborts_before_the_camera_opens() {
    let (source, source_state) = ScriptedSource::new();
    let (detector, _) = ScriptedDetector::new(vec![]);
    // Pattern present, calibration missing.
    let transport = MapTransport::with_assets(&[PATTERN_URL]);
    let mut session = Session::new(
        config(),
        source,
        detector,
        RecordingSurface::default(),
        transport,
    );
    session.add_marker(MarkerConfig::pattern(PATTERN_URL)).unwrap();

    let err = session.start().unwrap_err();
    match err {
        SessionError::MissingAssets { labels } => {
            assert_eq!(labels, vec!["camera calibration".to_string()])
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!source_state.borrow().begun, "camera must never be opened");
    assert_eq!(session.phase(), SessionPhase::Failed);
    // Failed sessions tick as no-ops and never render.
    let report = session.tick().unwrap();
    assert!(!report.detected);
    assert_eq!(session.surface().renders, 0);
}

#[test]
fn one_found_and_one_lost_per_visible_run() {
    // 10 visible frames then 5 occluded.
    let mut script = vec![true; 10];
    script.extend(vec![false; 5]);
    let (mut session, source, _) = session_with_script(script);
    let marker = session
        .add_marker(MarkerConfig::pattern(PATTERN_URL).with_size(0.5))
        .unwrap();
    session.start().unwrap();
    source.borrow_mut().ready = true;

    let mut found_frames = Vec::new();
    let mut lost_frames = Vec::new();
    for _ in 0..15 {
        let report = session.tick().unwrap();
        for event in &report.events {
            assert_eq!(event.marker, marker);
            match event.kind {
                MarkerEventKind::Found => found_frames.push(report.frame),
                MarkerEventKind::Lost => lost_frames.push(report.frame),
            }
        }
    }

    assert_eq!(found_frames.len(), 1, "exactly one found per visible run");
    assert_eq!(lost_frames.len(), 1, "exactly one lost per occlusion");
    assert_eq!(found_frames[0], 0, "found on the first visible frame");
    assert_eq!(lost_frames[0], 10, "lost on the first occluded frame");
}

#[test]
fn long_visible_run_emits_no_repeat_found() {
    let (mut session, source, _) = session_with_script(vec![true; 50]);
    session.add_marker(MarkerConfig::barcode(3)).unwrap();
    session.start().unwrap();
    source.borrow_mut().ready = true;

    let mut events = Vec::new();
    for _ in 0..50 {
        events.extend(session.tick().unwrap().events);
    }
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, MarkerEventKind::Found);
}

#[test]
fn settle_pass_reapplies_sizing_without_a_host_resize() {
    let (mut session, source, _) = session_with_script(vec![false; 10]);
    session.start().unwrap();
    session.notify_viewport(PixelSize::new(800, 600));
    let layouts_after_viewport = source.borrow().layouts;

    source.borrow_mut().ready = true;
    let t0 = Instant::now();
    session.tick_at(t0).unwrap();
    // First frame applies sizing twice: once on readiness, once after the
    // detection context comes up.
    let layouts_after_first_frame = source.borrow().layouts;
    assert_eq!(layouts_after_first_frame, layouts_after_viewport + 2);

    // Before the delay elapses nothing extra happens.
    session.tick_at(t0 + Duration::from_millis(100)).unwrap();
    assert_eq!(source.borrow().layouts, layouts_after_first_frame);

    // After the delay, exactly one extra pass.
    session.tick_at(t0 + Duration::from_millis(301)).unwrap();
    assert_eq!(source.borrow().layouts, layouts_after_first_frame + 1);
    session.tick_at(t0 + Duration::from_millis(400)).unwrap();
    assert_eq!(source.borrow().layouts, layouts_after_first_frame + 1);
}

#[test]
fn pattern_fetch_failure_is_fatal_at_first_frame() {
    let (source, _) = ScriptedSource::new();
    let (detector, _) = ScriptedDetector::new(vec![]);
    // Calibration reachable, pattern missing; preflight disabled so the
    // failure surfaces at registration time instead.
    let transport = MapTransport::with_assets(&[CALIB_URL]);
    let mut session = Session::new(
        SessionConfig {
            preflight: false,
            ..config()
        },
        source,
        detector,
        RecordingSurface::default(),
        transport,
    );
    session.add_marker(MarkerConfig::pattern(PATTERN_URL)).unwrap();
    session.start().unwrap();
    session.source_mut().state.borrow_mut().ready = true;

    let err = session.tick().unwrap_err();
    assert!(matches!(err, SessionError::Transport(_)));
    assert_eq!(session.phase(), SessionPhase::Failed);
}

#[test]
fn barcode_markers_need_no_asset_fetch() {
    let (source, _) = ScriptedSource::new();
    let (detector, detector_state) = ScriptedDetector::new(vec![]);
    let transport = MapTransport::with_assets(&[]);
    let gets = Rc::clone(&transport.gets);
    let mut session = Session::new(
        SessionConfig {
            calibration_url: None,
            preflight: true,
            ..SessionConfig::default()
        },
        source,
        detector,
        RecordingSurface::default(),
        transport,
    );
    session.add_marker(MarkerConfig::barcode(7)).unwrap();
    session.start().unwrap();
    session.source_mut().state.borrow_mut().ready = true;
    session.tick().unwrap();

    assert_eq!(*gets.borrow(), 0, "no transport fetch for barcode markers");
    assert_eq!(detector_state.borrow().registered.len(), 1);
    assert_eq!(session.phase(), SessionPhase::Running);
}

#[test]
fn projection_matrix_is_copied_once_and_stays_stable() {
    let (mut session, source, _) = session_with_script(vec![false; 5]);
    session.start().unwrap();
    source.borrow_mut().ready = true;
    session.tick().unwrap();

    let expected = Mat4::identity() * 2.0;
    assert_eq!(session.projection_matrix(), Some(&expected));
    assert_eq!(session.surface().projection, Some(expected));

    session.tick().unwrap();
    assert_eq!(session.projection_matrix(), Some(&expected));
}

#[test]
fn markers_added_while_running_register_immediately() {
    let (mut session, source, detector) = session_with_script(vec![true; 10]);
    session.start().unwrap();
    source.borrow_mut().ready = true;
    session.tick().unwrap();
    assert_eq!(detector.borrow().registered.len(), 0);

    session.add_marker(MarkerConfig::pattern(PATTERN_URL)).unwrap();
    assert_eq!(detector.borrow().registered.len(), 1);

    let report = session.tick().unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].kind, MarkerEventKind::Found);
}

#[test]
fn dispose_is_idempotent_and_releases_the_source() {
    let (mut session, source, detector) = session_with_script(vec![]);
    session.add_marker(MarkerConfig::barcode(1)).unwrap();
    session.start().unwrap();
    source.borrow_mut().ready = true;
    session.tick().unwrap();
    assert_eq!(detector.borrow().registered.len(), 1);

    session.dispose();
    session.dispose();
    assert_eq!(source.borrow().disposals, 1);
    assert_eq!(session.phase(), SessionPhase::Disposed);
    assert!(detector.borrow().registered.is_empty());

    // Disposed sessions tick as no-ops.
    let report = session.tick().unwrap();
    assert!(!report.detected);
}

#[test]
fn dispose_before_start_is_safe() {
    let (mut session, source, _) = session_with_script(vec![]);
    session.dispose();
    assert_eq!(source.borrow().disposals, 1);
    assert_eq!(session.phase(), SessionPhase::Disposed);
}
