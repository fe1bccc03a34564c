//! Session lifecycle: preflight, media acquisition, calibration, and the
//! per-frame loop.

use std::time::Instant;

use ar_session_core::{
    AssetTransport, Detector, FrameSource, MarkerConfig, MarkerHandle, MarkerIdentity,
    MarkerTarget, Mat4, PixelSize, RenderSurface, Scene, SessionConfig, SourceError,
    TransportError,
};
use log::{debug, error, info};

use crate::binding::{MarkerBinding, MarkerEvent, MarkerId};
use crate::context::{ContextError, DetectionContext};
use crate::probe::{run_preflight, ProbeTarget};
use crate::resize::ResizeCoordinator;

/// Initialization stages a session moves through, in order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionPhase {
    /// Constructed; media not yet requested.
    Created,
    /// Media stream requested; waiting for the first decoded frame.
    WaitingForVideo,
    /// Detection and rendering are live.
    Running,
    /// A fatal initialization error stopped the session.
    Failed,
    /// Explicitly torn down.
    Disposed,
}

/// Errors that terminate a session. Initialization failures are fatal for
/// the whole session: there is no partial mode without detection.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("required assets missing: {}", .labels.join(", "))]
    MissingAssets { labels: Vec<String> },
    #[error("operation not valid in the {0:?} phase")]
    WrongPhase(SessionPhase),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// What happened during one [`Session::tick`].
#[derive(Debug, Default)]
pub struct TickReport {
    /// Index of this tick since the session was created.
    pub frame: u64,
    /// Whether a detection pass ran this tick.
    pub detected: bool,
    /// Visibility edges observed this tick.
    pub events: Vec<MarkerEvent>,
}

/// One AR run.
///
/// Owns the injected frame source, detection backend, render surface, and
/// asset transport, plus the scene graph and marker bindings. All state is
/// confined to the session; ticks are synchronous units of work driven by
/// the host's refresh cadence.
pub struct Session<V, D: Detector, S, T> {
    config: SessionConfig,
    video: V,
    context: DetectionContext<D>,
    surface: S,
    transport: T,
    scene: Scene,
    markers: Vec<MarkerBinding>,
    resize: ResizeCoordinator,
    phase: SessionPhase,
    frame: u64,
}

impl<V, D, S, T> Session<V, D, S, T>
where
    V: FrameSource,
    D: Detector,
    S: RenderSurface,
    T: AssetTransport,
{
    pub fn new(config: SessionConfig, video: V, detector: D, surface: S, transport: T) -> Self {
        Self {
            config,
            video,
            context: DetectionContext::new(detector),
            surface,
            transport,
            scene: Scene::new(),
            markers: Vec::new(),
            resize: ResizeCoordinator::new(),
            phase: SessionPhase::Created,
            frame: 0,
        }
    }

    /// Run the preflight checks and request the media stream.
    ///
    /// Heavyweight resources are only acquired after every check passes:
    /// a missing calibration or pattern file aborts here, before the
    /// camera is ever opened.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Created {
            return Err(SessionError::WrongPhase(self.phase));
        }

        if self.config.preflight {
            let targets = self.preflight_targets();
            if !targets.is_empty() {
                let report = run_preflight(&self.transport, &targets);
                if !report.all_ok() {
                    error!("preflight failed; aborting before media acquisition");
                    self.phase = SessionPhase::Failed;
                    return Err(SessionError::MissingAssets {
                        labels: report.missing_labels(),
                    });
                }
            }
        }

        if let Err(err) = self.video.begin() {
            self.phase = SessionPhase::Failed;
            return Err(err.into());
        }
        self.phase = SessionPhase::WaitingForVideo;
        debug!("media stream requested ({:?})", self.config.source);
        Ok(())
    }

    /// Bind a marker to a fresh scene node and return its id.
    ///
    /// Markers added before the detection context is up are registered
    /// with the backend when it completes; later additions register
    /// immediately.
    pub fn add_marker(&mut self, config: MarkerConfig) -> Result<MarkerId, SessionError> {
        if matches!(self.phase, SessionPhase::Failed | SessionPhase::Disposed) {
            return Err(SessionError::WrongPhase(self.phase));
        }

        let node = self.scene.spawn();
        self.scene.node_mut(node).visible = false;

        let mut binding = MarkerBinding::new(config, node);
        if self.context.is_ready() {
            let handle =
                Self::register_marker(binding.config(), &mut self.context, &self.transport)?;
            binding.bind_handle(handle);
        }

        let id = MarkerId(self.markers.len());
        self.markers.push(binding);
        Ok(id)
    }

    /// Viewport resize notification from the host. Safe in any phase; the
    /// host should pair listener registration with [`Session::dispose`].
    pub fn notify_viewport(&mut self, viewport: PixelSize) {
        self.resize.set_viewport(viewport);
        self.apply_resize();
    }

    /// Advance the lifecycle and run one frame.
    pub fn tick(&mut self) -> Result<TickReport, SessionError> {
        self.tick_at(Instant::now())
    }

    /// [`Session::tick`] with an explicit clock, for hosts that drive time.
    pub fn tick_at(&mut self, now: Instant) -> Result<TickReport, SessionError> {
        self.tick_at_with(now, |_| {})
    }

    /// One tick with a per-frame hook, run after detection and visibility
    /// sampling but before the render: the place for incremental
    /// application logic such as animating attached content.
    pub fn tick_with(&mut self, hook: impl FnOnce(&mut Scene)) -> Result<TickReport, SessionError> {
        self.tick_at_with(Instant::now(), hook)
    }

    pub fn tick_at_with(
        &mut self,
        now: Instant,
        hook: impl FnOnce(&mut Scene),
    ) -> Result<TickReport, SessionError> {
        let mut report = TickReport {
            frame: self.frame,
            ..TickReport::default()
        };

        match self.phase {
            SessionPhase::Created | SessionPhase::Failed | SessionPhase::Disposed => {
                return Ok(report)
            }
            SessionPhase::WaitingForVideo => {
                if self.video.ready() {
                    if let Err(err) = self.on_first_frame(now) {
                        self.phase = SessionPhase::Failed;
                        error!("initialization failed: {err}");
                        return Err(err);
                    }
                }
            }
            SessionPhase::Running => {}
        }

        if self.resize.take_settle(now) {
            debug!("settle resize pass");
            self.apply_resize();
        }

        // Detection runs only with a ready source; otherwise the scene is
        // rendered unchanged.
        if self.phase == SessionPhase::Running && self.video.ready() {
            if let Some(frame) = self.video.frame() {
                let sightings = self.context.update(frame);
                report.detected = true;

                for binding in &self.markers {
                    self.scene.node_mut(binding.node()).visible = false;
                }
                for sighting in &sightings {
                    let hit = self
                        .markers
                        .iter()
                        .find(|b| b.handle() == Some(sighting.handle));
                    if let Some(binding) = hit {
                        let node = self.scene.node_mut(binding.node());
                        node.visible = true;
                        node.transform = sighting.transform;
                    }
                }
            }
        }

        // Visibility edges: sample each bound node once per frame.
        for index in 0..self.markers.len() {
            let node = self.markers[index].node();
            let visible = self.scene.node(node).visible;
            if let Some(kind) = self.markers[index].observe(visible) {
                debug!("marker {index} {kind:?}");
                report.events.push(MarkerEvent {
                    marker: MarkerId(index),
                    node,
                    kind,
                });
            }
        }

        if self.config.debug && report.detected && self.frame % 60 == 0 {
            let visible = self
                .markers
                .iter()
                .filter(|b| self.scene.node(b.node()).visible)
                .count();
            debug!(
                "frame {}: {visible} of {} markers visible",
                self.frame,
                self.markers.len()
            );
        }

        hook(&mut self.scene);
        self.surface.render(&self.scene);
        self.frame += 1;
        Ok(report)
    }

    /// Release the media stream and stop the session. Idempotent; safe
    /// even if initialization never completed.
    pub fn dispose(&mut self) {
        if self.phase == SessionPhase::Disposed {
            return;
        }
        for binding in &self.markers {
            if let Some(handle) = binding.handle() {
                self.context.unregister(handle);
            }
        }
        self.video.dispose();
        self.phase = SessionPhase::Disposed;
        info!("session disposed");
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn source(&self) -> &V {
        &self.video
    }

    pub fn source_mut(&mut self) -> &mut V {
        &mut self.video
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn context(&self) -> &DetectionContext<D> {
        &self.context
    }

    pub fn markers(&self) -> &[MarkerBinding] {
        &self.markers
    }

    pub fn marker(&self, id: MarkerId) -> Option<&MarkerBinding> {
        self.markers.get(id.0)
    }

    /// Stable once the detection context has initialized.
    pub fn projection_matrix(&self) -> Option<&Mat4> {
        self.context.projection_matrix()
    }

    fn preflight_targets(&self) -> Vec<ProbeTarget> {
        let mut targets = Vec::new();
        if let Some(url) = &self.config.calibration_url {
            targets.push(ProbeTarget::new(url.clone(), "camera calibration"));
        }
        for binding in &self.markers {
            if let Some(url) = binding.config().pattern_url() {
                targets.push(ProbeTarget::new(url, "marker pattern"));
            }
        }
        targets
    }

    /// First ready frame: size everything, bring the detection context up,
    /// hand the projection to the render camera, register queued markers.
    fn on_first_frame(&mut self, now: Instant) -> Result<(), SessionError> {
        match self.video.native_size() {
            Some(size) => info!("video source ready ({size})"),
            None => info!("video source ready"),
        }
        self.apply_resize();
        self.resize.schedule_settle(now);

        let projection = *self.context.init(&self.config, &self.transport)?;
        self.surface.set_projection(&projection);
        // The detection canvas exists now; bring it in line immediately
        // rather than waiting for the settle pass.
        self.apply_resize();

        for index in 0..self.markers.len() {
            if self.markers[index].handle().is_some() {
                continue;
            }
            let config = self.markers[index].config().clone();
            let handle = Self::register_marker(&config, &mut self.context, &self.transport)?;
            self.markers[index].bind_handle(handle);
        }

        self.phase = SessionPhase::Running;
        info!("session running; {} marker(s) tracked", self.markers.len());
        Ok(())
    }

    fn register_marker(
        config: &MarkerConfig,
        context: &mut DetectionContext<D>,
        transport: &T,
    ) -> Result<MarkerHandle, SessionError> {
        let handle = match &config.identity {
            MarkerIdentity::Pattern { url } => {
                let data = transport.get(url)?;
                context
                    .register(MarkerTarget::Pattern {
                        data: &data,
                        size: config.size,
                    })
                    .map_err(ContextError::Backend)?
            }
            MarkerIdentity::Barcode { value } => context
                .register(MarkerTarget::Barcode {
                    value: *value,
                    size: config.size,
                })
                .map_err(ContextError::Backend)?,
        };
        Ok(handle)
    }

    fn apply_resize(&mut self) {
        let source = match self.phase {
            SessionPhase::WaitingForVideo | SessionPhase::Running => Some(&mut self.video),
            _ => None,
        };
        let context = if self.context.is_ready() {
            Some(&mut self.context)
        } else {
            None
        };
        self.resize.apply(source, &mut self.surface, context);
    }
}
