//! Marker bindings and found/lost edge detection.

use ar_session_core::{MarkerConfig, MarkerHandle, NodeId};

/// Index of a marker binding within its session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct MarkerId(pub(crate) usize);

impl MarkerId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Visibility transition kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MarkerEventKind {
    Found,
    Lost,
}

/// Edge-triggered visibility notification. Consumers see exactly one
/// `Found` per contiguous visible run, however long the run is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MarkerEvent {
    pub marker: MarkerId,
    pub node: NodeId,
    pub kind: MarkerEventKind,
}

/// Associates one marker identity with one transform node and watches the
/// node's visibility for transitions.
///
/// The node's visibility is derived from detection, never set directly by
/// consumers; this binding only samples it once per frame and compares
/// against the previous sample.
#[derive(Debug)]
pub struct MarkerBinding {
    config: MarkerConfig,
    node: NodeId,
    handle: Option<MarkerHandle>,
    last_visible: bool,
}

impl MarkerBinding {
    pub(crate) fn new(config: MarkerConfig, node: NodeId) -> Self {
        Self {
            config,
            node,
            handle: None,
            last_visible: false,
        }
    }

    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    /// The transform node this marker drives.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Backend handle, once the marker is registered.
    pub fn handle(&self) -> Option<MarkerHandle> {
        self.handle
    }

    pub(crate) fn bind_handle(&mut self, handle: MarkerHandle) {
        self.handle = Some(handle);
    }

    /// Sample the node's current visibility. A change since the previous
    /// sample yields exactly one event.
    pub(crate) fn observe(&mut self, visible: bool) -> Option<MarkerEventKind> {
        let edge = match (self.last_visible, visible) {
            (false, true) => Some(MarkerEventKind::Found),
            (true, false) => Some(MarkerEventKind::Lost),
            _ => None,
        };
        self.last_visible = visible;
        edge
    }
}
