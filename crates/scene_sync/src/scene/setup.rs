//! Post-load attachment setup
//!
//! Runs once over every freshly loaded subtree, before it becomes visible to
//! pose updates.

use log::trace;

use super::node::{NodeKey, RenderFlags};
use super::scene_graph::SceneGraph;
use crate::core::SetupConfig;

/// Collaborator that prepares attachments of newly loaded nodes
pub trait AttachmentSetup {
    /// Prepare every node below and including `root`
    fn setup(&mut self, graph: &mut SceneGraph, root: NodeKey);
}

/// Default setup: shadow flags and double-sided open shapes
#[derive(Debug, Clone, Default)]
pub struct StandardAttachmentSetup {
    config: SetupConfig,
}

impl StandardAttachmentSetup {
    /// Create a setup pass from configuration
    pub fn new(config: SetupConfig) -> Self {
        Self { config }
    }
}

impl AttachmentSetup for StandardAttachmentSetup {
    fn setup(&mut self, graph: &mut SceneGraph, root: NodeKey) {
        let mut meshes = 0;
        for key in graph.depth_first(root) {
            let Some(node) = graph.get_mut(key) else { continue };
            if !node.is_mesh() {
                continue;
            }
            meshes += 1;
            node.flags.set(RenderFlags::CAST_SHADOW, self.config.cast_shadows);
            node.flags.set(RenderFlags::RECEIVE_SHADOW, self.config.receive_shadows);
            if node.metadata.solid == Some(false) {
                if let Some(material) = node.material.as_mut() {
                    material.double_sided = true;
                }
            }
        }
        trace!("Attachment setup prepared {} mesh(es)", meshes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::attachments::{Geometry, Material};
    use crate::scene::node::Node;

    #[test]
    fn test_open_shapes_become_double_sided() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("n1"));
        graph.set_root(root);
        let open = graph.insert(Node::mesh("n2", Material::new("n3"), Geometry::default()).with_solid(false));
        let closed = graph.insert(Node::mesh("n4", Material::new("n5"), Geometry::default()));
        graph.add_child(root, open);
        graph.add_child(root, closed);

        StandardAttachmentSetup::new(SetupConfig::new().with_shadows(true, false)).setup(&mut graph, root);

        let open = graph.get(open).unwrap();
        assert!(open.material.as_ref().unwrap().double_sided);
        assert!(open.flags.contains(RenderFlags::CAST_SHADOW));
        assert!(!open.flags.contains(RenderFlags::RECEIVE_SHADOW));
        assert!(!graph.get(closed).unwrap().material.as_ref().unwrap().double_sided);
        assert!(!graph.get(root).unwrap().flags.contains(RenderFlags::CAST_SHADOW));
    }
}
