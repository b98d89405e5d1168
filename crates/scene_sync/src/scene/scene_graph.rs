//! Scene graph arena
//!
//! Nodes are stored in a slot map and linked by [`NodeKey`]. A parent owns its
//! children: removing a node frees its whole subtree, which also makes every
//! key into that subtree stale. "Still attached" therefore means the key is
//! live and its parent chain ends at the current root.

use slotmap::SlotMap;

use super::attachments::{AttachmentRef, AttachmentSlot};
use super::loader::NodeDescription;
use super::node::{Node, NodeKey};

/// Mutable tree of scene nodes
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, Node>,
    root: Option<NodeKey>,
}

impl SceneGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Current root, if a scene is loaded
    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    /// Make a detached node the root
    ///
    /// Any previous root subtree is freed.
    pub fn set_root(&mut self, key: NodeKey) {
        debug_assert!(self.parent(key).is_none(), "root must be detached");
        if let Some(previous) = self.root.take() {
            if previous != key {
                self.free_subtree(previous);
            }
        }
        self.root = Some(key);
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Number of live nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the key refers to a live node
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Node data
    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Mutable node data
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Insert a detached node
    pub fn insert(&mut self, mut node: Node) -> NodeKey {
        node.parent = None;
        node.children.clear();
        self.nodes.insert(node)
    }

    /// Instantiate a described subtree, detached
    pub fn insert_tree(&mut self, description: &NodeDescription) -> NodeKey {
        let key = self.insert(description.to_node());
        for child in &description.children {
            let child_key = self.insert_tree(child);
            self.add_child(key, child_key);
        }
        key
    }

    /// Append a detached node to `parent`'s children
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child);
    }

    /// Insert a detached node at `index` among `parent`'s children
    pub fn insert_child(&mut self, parent: NodeKey, index: usize, child: NodeKey) {
        debug_assert!(self.contains(child), "child must be live");
        debug_assert!(self.parent(child).is_none(), "child must be detached");
        debug_assert!(Some(child) != self.root, "root cannot become a child");
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            debug_assert!(false, "parent must be live");
            return;
        };
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child);
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
        }
    }

    /// Structural parent of a node
    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|node| node.parent)
    }

    /// Structural children of a node in traversal order
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        match self.nodes.get(key) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Position of a node among its parent's children
    pub fn sibling_index(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        self.children(parent).iter().position(|&child| child == key)
    }

    /// Parent chain of a node, nearest first, excluding the node itself
    pub fn ancestors(&self, key: NodeKey) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.parent(key),
        }
    }

    /// Whether the node is live and reachable from the root
    pub fn is_attached(&self, key: NodeKey) -> bool {
        if !self.contains(key) {
            return false;
        }
        let top = self.ancestors(key).last().unwrap_or(key);
        Some(top) == self.root
    }

    /// Unlink a node from its parent, keeping its subtree alive
    ///
    /// Returns the sibling index it occupied.
    pub fn detach(&mut self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        let index = self.sibling_index(key)?;
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.remove(index);
        }
        if let Some(node) = self.nodes.get_mut(key) {
            node.parent = None;
        }
        Some(index)
    }

    /// Remove a node and everything below it
    ///
    /// Removing the root clears the root reference. Returns the number of
    /// nodes freed.
    pub fn remove_subtree(&mut self, key: NodeKey) -> usize {
        if !self.contains(key) {
            return 0;
        }
        if self.root == Some(key) {
            self.root = None;
        } else {
            self.detach(key);
        }
        self.free_subtree(key)
    }

    /// Swap the child at `index` of `parent` for a detached replacement
    ///
    /// The replacement takes exactly the slot the old child occupied, so
    /// traversal order of the siblings is unchanged. The old child is returned
    /// detached and still alive.
    pub fn replace_child_at(&mut self, parent: NodeKey, index: usize, replacement: NodeKey) -> Option<NodeKey> {
        debug_assert!(self.parent(replacement).is_none(), "replacement must be detached");
        let old = *self.children(parent).get(index)?;
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.remove(index);
            parent_node.children.insert(index, replacement);
        }
        if let Some(node) = self.nodes.get_mut(replacement) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(old) {
            node.parent = None;
        }
        Some(old)
    }

    /// Replace a node in place with a detached replacement and free the old subtree
    ///
    /// Returns the sibling index both nodes occupied, or `None` when the old
    /// node has no parent.
    pub fn replace_in_place(&mut self, old: NodeKey, replacement: NodeKey) -> Option<usize> {
        let parent = self.parent(old)?;
        let index = self.sibling_index(old)?;
        let removed = self.replace_child_at(parent, index, replacement)?;
        debug_assert_eq!(removed, old);
        self.free_subtree(removed);
        Some(index)
    }

    /// Deep copy of a subtree, attachments included
    ///
    /// The copy is detached; its root has no parent.
    pub fn clone_subtree(&mut self, key: NodeKey) -> Option<NodeKey> {
        let copy = self.nodes.get(key)?.detached_copy();
        let children = self.children(key).to_vec();
        let copy_key = self.nodes.insert(copy);
        for child in children {
            if let Some(child_copy) = self.clone_subtree(child) {
                self.add_child(copy_key, child_copy);
            }
        }
        Some(copy_key)
    }

    /// Pre-order depth-first walk starting at `start`
    pub fn depth_first(&self, start: NodeKey) -> Vec<NodeKey> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(key) = stack.pop() {
            if !self.contains(key) {
                continue;
            }
            order.push(key);
            stack.extend(self.children(key).iter().rev().copied());
        }
        order
    }

    /// Borrow one attachment of a node
    pub fn attachment(&self, owner: NodeKey, slot: AttachmentSlot) -> Option<AttachmentRef<'_>> {
        let node = self.nodes.get(owner)?;
        match slot {
            AttachmentSlot::Material => node.material.as_ref().map(AttachmentRef::Material),
            AttachmentSlot::Geometry => node.geometry.as_ref().map(AttachmentRef::Geometry),
            AttachmentSlot::Texture(texture) => node
                .material
                .as_ref()
                .and_then(|material| material.texture(texture))
                .map(AttachmentRef::Texture),
        }
    }

    fn free_subtree(&mut self, key: NodeKey) -> usize {
        let mut freed = 0;
        let mut stack = vec![key];
        while let Some(key) = stack.pop() {
            if let Some(node) = self.nodes.remove(key) {
                freed += 1;
                stack.extend(node.children);
            }
        }
        freed
    }
}

/// Iterator over a node's parent chain
#[derive(Debug)]
pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    next: Option<NodeKey>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.graph.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::attachments::{Geometry, Material, Texture, TextureSlot};

    fn names(graph: &SceneGraph, keys: &[NodeKey]) -> Vec<String> {
        keys.iter().map(|&key| graph.get(key).unwrap().name.clone()).collect()
    }

    fn three_children() -> (SceneGraph, NodeKey, [NodeKey; 3]) {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Node::group("n1"));
        graph.set_root(root);
        let a = graph.insert(Node::group("n2"));
        let b = graph.insert(Node::group("n3"));
        let c = graph.insert(Node::group("n4"));
        for child in [a, b, c] {
            graph.add_child(root, child);
        }
        (graph, root, [a, b, c])
    }

    #[test]
    fn test_add_child_links_parent() {
        let (graph, root, [a, _, c]) = three_children();
        assert_eq!(graph.parent(a), Some(root));
        assert_eq!(graph.sibling_index(c), Some(2));
        assert!(graph.is_attached(c));
    }

    #[test]
    fn test_replace_in_place_keeps_sibling_order() {
        let (mut graph, root, [_, b, _]) = three_children();
        let replacement = graph.insert(Node::group("n9"));

        let index = graph.replace_in_place(b, replacement);

        assert_eq!(index, Some(1));
        assert_eq!(names(&graph, graph.children(root)), vec!["n2", "n9", "n4"]);
        assert_eq!(graph.parent(replacement), Some(root));
        assert!(!graph.contains(b));
    }

    #[test]
    fn test_remove_subtree_frees_descendants() {
        let (mut graph, root, [a, _, _]) = three_children();
        let grandchild = graph.insert(Node::group("n5"));
        graph.add_child(a, grandchild);

        let freed = graph.remove_subtree(a);

        assert_eq!(freed, 2);
        assert!(!graph.contains(grandchild));
        assert_eq!(graph.children(root).len(), 2);
    }

    #[test]
    fn test_remove_root_clears_root() {
        let (mut graph, root, _) = three_children();
        assert_eq!(graph.remove_subtree(root), 4);
        assert_eq!(graph.root(), None);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_detached_nodes_are_not_attached() {
        let (mut graph, _, [a, _, _]) = three_children();
        let orphan = graph.insert(Node::group("n8"));
        assert!(!graph.is_attached(orphan));

        graph.detach(a);
        assert!(graph.contains(a));
        assert!(!graph.is_attached(a));
    }

    #[test]
    fn test_clone_subtree_is_deep() {
        let (mut graph, _, [a, _, _]) = three_children();
        let material = Material::new("n6")
            .with_texture(TextureSlot::Map, Texture::new("n7"))
            .with_texture(TextureSlot::NormalMap, Texture::new("n8"));
        let mesh = graph.insert(Node::mesh("n5", material, Geometry::default()));
        graph.add_child(a, mesh);

        let copy = graph.clone_subtree(a).unwrap();
        let copy_mesh = graph.children(copy)[0];

        assert_ne!(copy_mesh, mesh);
        assert_eq!(graph.parent(copy), None);
        assert_eq!(graph.get(copy_mesh).unwrap().material, graph.get(mesh).unwrap().material);

        graph.get_mut(copy_mesh).unwrap().material.as_mut().unwrap().name = "changed".into();
        assert_eq!(graph.get(mesh).unwrap().material.as_ref().unwrap().name, "n6");
    }

    #[test]
    fn test_depth_first_is_pre_order() {
        let (mut graph, root, [a, _, _]) = three_children();
        let grandchild = graph.insert(Node::group("n5"));
        graph.add_child(a, grandchild);

        let order = graph.depth_first(root);
        assert_eq!(names(&graph, &order), vec!["n1", "n2", "n5", "n3", "n4"]);
    }

    #[test]
    fn test_attachment_views() {
        let mut graph = SceneGraph::new();
        let material = Material::new("n6").with_texture(TextureSlot::AoMap, Texture::new("n7"));
        let mesh = graph.insert(Node::mesh("n5", material, Geometry::default()));

        let texture = graph.attachment(mesh, AttachmentSlot::Texture(TextureSlot::AoMap));
        assert_eq!(texture.map(|t| t.name().to_string()), Some("n7".to_string()));
        assert!(graph.attachment(mesh, AttachmentSlot::Texture(TextureSlot::Map)).is_none());
    }

    #[test]
    fn test_insert_tree_keeps_document_order() {
        let mut graph = SceneGraph::new();
        let description = NodeDescription::group("n1")
            .with_child(NodeDescription::group("n2").with_child(NodeDescription::group("n3")))
            .with_child(NodeDescription::group("n4").with_use("n2"));

        let root = graph.insert_tree(&description);
        graph.set_root(root);

        assert_eq!(graph.len(), 4);
        assert_eq!(names(&graph, &graph.depth_first(root)), vec!["n1", "n2", "n3", "n4"]);
        let last = graph.children(root)[1];
        assert!(graph.get(last).unwrap().metadata.has_use());
    }
}
