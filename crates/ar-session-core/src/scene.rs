use crate::Mat4;

/// Index of a node within its [`Scene`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One transform node: local transform, visibility flag, optional parent.
///
/// Marker bindings drive the root node of their subtree; attached content
/// hangs off it as children and inherits visibility and pose.
#[derive(Clone, Debug)]
pub struct TransformNode {
    pub transform: Mat4,
    pub visible: bool,
    pub parent: Option<NodeId>,
}

impl Default for TransformNode {
    fn default() -> Self {
        Self {
            transform: Mat4::identity(),
            visible: true,
            parent: None,
        }
    }
}

/// Flat arena of transform nodes. Nodes are never removed; a session's
/// scene lives exactly as long as the session.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<TransformNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root-level node.
    pub fn spawn(&mut self) -> NodeId {
        self.nodes.push(TransformNode::default());
        NodeId(self.nodes.len() - 1)
    }

    /// Add a node parented to `parent`.
    pub fn spawn_child(&mut self, parent: NodeId) -> NodeId {
        self.nodes.push(TransformNode {
            parent: Some(parent),
            ..TransformNode::default()
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &TransformNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TransformNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visibility including ancestors: a node is shown only when it and
    /// every ancestor are visible.
    pub fn world_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.0];
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Transform including ancestors (parent chain product).
    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let node = &self.nodes[id.0];
        match node.parent {
            Some(parent) => self.world_transform(parent) * node.transform,
            None => node.transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Vector3};

    #[test]
    fn child_visibility_follows_parent() {
        let mut scene = Scene::new();
        let root = scene.spawn();
        let child = scene.spawn_child(root);

        assert!(scene.world_visible(child));

        scene.node_mut(root).visible = false;
        assert!(!scene.world_visible(root));
        assert!(!scene.world_visible(child));

        // Re-showing the parent restores the child without touching it.
        scene.node_mut(root).visible = true;
        assert!(scene.world_visible(child));
    }

    #[test]
    fn hidden_child_under_visible_parent() {
        let mut scene = Scene::new();
        let root = scene.spawn();
        let child = scene.spawn_child(root);
        scene.node_mut(child).visible = false;
        assert!(scene.world_visible(root));
        assert!(!scene.world_visible(child));
    }

    #[test]
    fn world_transform_chains_through_parents() {
        let mut scene = Scene::new();
        let root = scene.spawn();
        let child = scene.spawn_child(root);

        let lift = Mat4::new_translation(&Vector3::new(0.0, 1.0, 0.0));
        let spin = Rotation3::from_axis_angle(&Vector3::y_axis(), 0.5).to_homogeneous();
        scene.node_mut(root).transform = spin;
        scene.node_mut(child).transform = lift;

        let world = scene.world_transform(child);
        assert_relative_eq!(world, spin * lift, epsilon = 1e-6);
    }
}
