//! Scene graph nodes

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use super::attachments::{Geometry, Material};
use crate::foundation::math::Transform;

new_key_type! {
    /// Arena handle of a node; stale once the node is removed
    pub struct NodeKey;
}

/// What kind of vertex a node is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Plain grouping node
    #[default]
    Group,
    /// Grouping node whose transform is driven by pose updates
    Transform,
    /// Renderable node with material and geometry attachments
    Mesh,
}

bitflags! {
    /// Per-node render state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct RenderFlags: u32 {
        /// Node and its subtree are drawn
        const VISIBLE = 1 << 0;
        /// Node casts shadows
        const CAST_SHADOW = 1 << 1;
        /// Node receives shadows
        const RECEIVE_SHADOW = 1 << 2;
    }
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Free-form metadata bag carried by every node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Ids of the USE sites that alias this node, separator-joined
    #[serde(rename = "USE", skip_serializing_if = "Option::is_none")]
    pub use_targets: Option<String>,
    /// Whether the shape is closed (`false` asks for double-sided materials)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solid: Option<bool>,
    /// Anything else the description carried
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    /// Whether this node is the DEF source of USE aliases
    pub fn has_use(&self) -> bool {
        self.use_targets.is_some()
    }
}

/// A vertex in the scene graph
///
/// Structural links (`parent`, `children`) are maintained by
/// [`SceneGraph`](super::SceneGraph); everything else is plain data.
#[derive(Debug, Clone)]
pub struct Node {
    /// Name, possibly carrying several external ids
    pub name: String,
    /// Node kind
    pub kind: NodeKind,
    /// Local transform
    pub transform: Transform,
    /// Render state
    pub flags: RenderFlags,
    /// Material attachment (meshes)
    pub material: Option<Material>,
    /// Geometry attachment (meshes)
    pub geometry: Option<Geometry>,
    /// Metadata bag
    pub metadata: Metadata,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

impl Node {
    /// Create a detached node
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::default(),
            flags: RenderFlags::default(),
            material: None,
            geometry: None,
            metadata: Metadata::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Create a group node
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    /// Create a mesh node with its attachments
    pub fn mesh(name: impl Into<String>, material: Material, geometry: Geometry) -> Self {
        Self {
            material: Some(material),
            geometry: Some(geometry),
            ..Self::new(name, NodeKind::Mesh)
        }
    }

    /// Set the transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the `USE` metadata field
    pub fn with_use(mut self, targets: impl Into<String>) -> Self {
        self.metadata.use_targets = Some(targets.into());
        self
    }

    /// Set the `solid` metadata marker
    pub fn with_solid(mut self, solid: bool) -> Self {
        self.metadata.solid = Some(solid);
        self
    }

    /// Whether the node is a renderable mesh
    pub fn is_mesh(&self) -> bool {
        self.kind == NodeKind::Mesh
    }

    /// Whether the node is drawn
    pub fn is_visible(&self) -> bool {
        self.flags.contains(RenderFlags::VISIBLE)
    }

    /// Structural parent, `None` for the root and detached nodes
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Structural children in traversal order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Copy of the node's data without its structural links
    pub(crate) fn detached_copy(&self) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags_visible() {
        let node = Node::group("n1");
        assert!(node.is_visible());
        assert!(!node.flags.contains(RenderFlags::CAST_SHADOW));
    }

    #[test]
    fn test_use_metadata_name_on_the_wire() {
        let metadata = Node::group("n3").with_use("n2;n8").metadata;
        let encoded = ron::to_string(&metadata).unwrap();
        assert!(encoded.contains("USE"));

        let decoded: Metadata = ron::from_str(&encoded).unwrap();
        assert_eq!(decoded.use_targets.as_deref(), Some("n2;n8"));
        assert!(decoded.has_use());
    }
}
