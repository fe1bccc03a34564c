//! Headless rendition of the classic "rotating cone on a hiro marker"
//! demo: a session wired from small in-memory backends, with a content
//! node spinning above the marker root while the marker is visible.
//!
//! Run with `RUST_LOG=debug cargo run --example rotating_cone`.

use std::collections::HashMap;

use ar_session::{
    AssetTransport, DetectError, DetectionMode, Detector, FrameSource, FrameView, MarkerConfig,
    MarkerHandle, MarkerSighting, MarkerTarget, Mat4, PixelSize, RenderSurface, Scene, Session,
    SessionConfig, SourceError, TransportError,
};
use nalgebra::{Rotation3, Vector3};

const CAMERA_URL: &str = "libs/data/camera_para.dat";
const PATTERN_URL: &str = "assets/patt.hiro";

/// Static test-card "webcam": ready immediately, one fixed frame.
struct TestCardSource {
    pixels: Vec<u8>,
    size: PixelSize,
    element: Option<PixelSize>,
    ready: bool,
}

impl TestCardSource {
    fn new() -> Self {
        let size = PixelSize::new(640, 480);
        Self {
            pixels: vec![128; (size.width * size.height) as usize],
            size,
            element: None,
            ready: false,
        }
    }
}

impl FrameSource for TestCardSource {
    fn begin(&mut self) -> Result<(), SourceError> {
        self.ready = true;
        Ok(())
    }

    fn ready(&self) -> bool {
        self.ready
    }

    fn frame(&self) -> Option<FrameView<'_>> {
        self.ready.then(|| FrameView {
            width: self.size.width,
            height: self.size.height,
            data: &self.pixels,
        })
    }

    fn native_size(&self) -> Option<PixelSize> {
        Some(self.size)
    }

    fn layout(&mut self, viewport: PixelSize) -> PixelSize {
        self.element = Some(viewport);
        viewport
    }

    fn element_size(&self) -> Option<PixelSize> {
        self.element
    }

    fn dispose(&mut self) {
        self.ready = false;
    }
}

/// Toy backend: every registered marker is "seen" on frames 30..90.
#[derive(Default)]
struct ToyDetector {
    registered: Vec<MarkerHandle>,
    canvas: PixelSize,
    frame: u64,
}

impl Detector for ToyDetector {
    fn configure(&mut self, _mode: DetectionMode, _pattern_ratio: f32) {}

    fn load_calibration(&mut self, _data: Option<&[u8]>) -> Result<Mat4, DetectError> {
        Ok(Mat4::new_perspective(4.0 / 3.0, 0.7, 0.1, 1000.0))
    }

    fn register(&mut self, _target: MarkerTarget<'_>) -> Result<MarkerHandle, DetectError> {
        let handle = MarkerHandle(self.registered.len() as u32);
        self.registered.push(handle);
        Ok(handle)
    }

    fn unregister(&mut self, handle: MarkerHandle) {
        self.registered.retain(|h| *h != handle);
    }

    fn process(&mut self, _frame: FrameView<'_>) -> Vec<MarkerSighting> {
        let frame = self.frame;
        self.frame += 1;
        if (30..90).contains(&frame) {
            self.registered
                .iter()
                .map(|&handle| MarkerSighting {
                    handle,
                    transform: Mat4::new_translation(&Vector3::new(0.0, 0.0, -5.0)),
                })
                .collect()
        } else {
            Vec::new()
        }
    }

    fn set_canvas_size(&mut self, size: PixelSize) {
        self.canvas = size;
    }

    fn canvas_size(&self) -> PixelSize {
        self.canvas
    }
}

#[derive(Default)]
struct HeadlessSurface {
    size: PixelSize,
    projection: Option<Mat4>,
}

impl RenderSurface for HeadlessSurface {
    fn set_size(&mut self, size: PixelSize) {
        self.size = size;
    }

    fn size(&self) -> PixelSize {
        self.size
    }

    fn set_projection(&mut self, projection: &Mat4) {
        self.projection = Some(*projection);
    }

    fn render(&mut self, _scene: &Scene) {}
}

/// In-memory stand-in for the demo's asset directory.
struct BundledAssets(HashMap<&'static str, Vec<u8>>);

impl BundledAssets {
    fn new() -> Self {
        let mut assets = HashMap::new();
        assets.insert(CAMERA_URL, vec![0u8; 176]);
        assets.insert(PATTERN_URL, vec![0u8; 64]);
        Self(assets)
    }
}

impl AssetTransport for BundledAssets {
    fn head(&self, url: &str) -> Result<u16, TransportError> {
        Ok(if self.0.contains_key(url) { 200 } else { 404 })
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = SessionConfig {
        calibration_url: Some(CAMERA_URL.into()),
        ..SessionConfig::default()
    };
    let mut session = Session::new(
        config,
        TestCardSource::new(),
        ToyDetector::default(),
        HeadlessSurface::default(),
        BundledAssets::new(),
    );

    let marker = session.add_marker(MarkerConfig::pattern(PATTERN_URL))?;
    session.notify_viewport(PixelSize::new(1280, 720));
    session.start()?;

    // Cone-shaped content sits one unit above the marker root and spins.
    let root = session
        .marker(marker)
        .map(|binding| binding.node())
        .ok_or("marker binding missing")?;
    let cone = {
        let scene = session.scene_mut();
        let cone = scene.spawn_child(root);
        scene.node_mut(cone).transform = Mat4::new_translation(&Vector3::new(0.0, 1.0, 0.0));
        cone
    };

    let spin = Rotation3::from_axis_angle(&Vector3::y_axis(), 0.02).to_homogeneous();
    for _ in 0..120 {
        let report = session.tick_with(|scene| {
            let node = scene.node_mut(cone);
            node.transform *= spin;
        })?;
        for event in &report.events {
            println!("frame {:3}: marker {:?}", report.frame, event.kind);
        }
    }

    if let Some(projection) = session.surface().projection {
        println!("camera projection:\n{projection:.3}");
    }
    let scene = session.scene();
    println!(
        "cone world transform after 120 frames (visible: {}):",
        scene.world_visible(cone)
    );
    println!("{:.3}", scene.world_transform(cone));

    session.dispose();
    Ok(())
}
