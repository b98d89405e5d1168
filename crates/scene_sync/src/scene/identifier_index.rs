//! Identifier index
//!
//! Resolves an external id to the node, or node attachment, that carries it
//! in its name. The search is depth-first and deterministic:
//!
//! 1. the node's own name
//! 2. its structural children, in order
//! 3. for meshes, the material, then the material's maps in
//!    [`TextureSlot::SEARCH_ORDER`](super::TextureSlot::SEARCH_ORDER), then the geometry
//!
//! The first match wins. Successful resolutions are memoized per id. A cached
//! entry is served only while its node is still attached to the graph; a
//! stale entry (node removed or spliced out by alias propagation) falls back
//! to a fresh search. Entries are evicted explicitly only on deletion and
//! cleared on scene reset.

use std::collections::HashMap;

use log::{debug, trace};

use super::attachments::AttachmentSlot;
use super::identifier::{ExternalId, NameMatcher};
use super::node::{Node, NodeKey};
use super::scene_graph::SceneGraph;

/// Where a match was found, relative to its structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolutionContext {
    /// Attachment that held the match, `None` for a structural node
    pub field: Option<AttachmentSlot>,
    /// Structural parent of a node match, or the owning node of an attachment
    pub parent: Option<NodeKey>,
}

/// Result of resolving an id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Matching node, or the node owning the matching attachment
    pub node: NodeKey,
    /// How the match hangs off the graph
    pub context: ResolutionContext,
}

impl Resolution {
    /// Whether the id named an attachment rather than a node
    pub fn is_attachment(&self) -> bool {
        self.context.field.is_some()
    }

    /// Attachment slot of the match
    pub fn field(&self) -> Option<AttachmentSlot> {
        self.context.field
    }

    /// Recorded parent of the match
    pub fn parent(&self) -> Option<NodeKey> {
        self.context.parent
    }
}

/// Starting point of a search
#[derive(Debug, Clone, Copy)]
pub enum SearchStart<'a> {
    /// The graph root
    Root,
    /// A single subtree
    Node(NodeKey),
    /// Several subtrees, searched in order
    Nodes(&'a [NodeKey]),
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Resolutions served from the cache
    pub hits: u64,
    /// Resolutions that needed a search
    pub misses: u64,
    /// Cached entries found detached and searched again
    pub stale: u64,
}

/// Memoized id → node resolver
#[derive(Debug, Default)]
pub struct IdentifierIndex {
    cache: HashMap<ExternalId, Resolution>,
    matcher: NameMatcher,
    stats: IndexStats,
}

impl IdentifierIndex {
    /// Create an empty index using `matcher` to compare names
    pub fn new(matcher: NameMatcher) -> Self {
        Self {
            cache: HashMap::new(),
            matcher,
            stats: IndexStats::default(),
        }
    }

    /// Name matcher in use
    pub fn matcher(&self) -> &NameMatcher {
        &self.matcher
    }

    /// Resolve an id against the whole scene
    pub fn resolve(&mut self, graph: &SceneGraph, id: &ExternalId) -> Option<Resolution> {
        self.resolve_from(graph, SearchStart::Root, id)
    }

    /// Resolve an id starting from a given point
    ///
    /// A live cache entry wins regardless of `start`. Matches are cached only
    /// when attached to the graph, so searching a detached subtree never
    /// pollutes the cache.
    pub fn resolve_from(&mut self, graph: &SceneGraph, start: SearchStart<'_>, id: &ExternalId) -> Option<Resolution> {
        if let Some(cached) = self.cache.get(id).copied() {
            if graph.is_attached(cached.node) {
                self.stats.hits += 1;
                trace!("Identifier cache hit for {}", id);
                return Some(cached);
            }
            self.stats.stale += 1;
            self.cache.remove(id);
            debug!("Identifier cache entry for {} went stale, searching again", id);
        }

        self.stats.misses += 1;
        let found = match start {
            SearchStart::Root => graph
                .root()
                .and_then(|root| self.search(graph, root, None, id)),
            SearchStart::Node(key) => self.search(graph, key, graph.parent(key), id),
            SearchStart::Nodes(keys) => keys
                .iter()
                .find_map(|&key| self.search(graph, key, graph.parent(key), id)),
        };

        match found {
            Some(resolution) if graph.is_attached(resolution.node) => {
                self.cache.insert(id.clone(), resolution);
            }
            Some(_) => trace!("{} matched in a detached subtree, not caching", id),
            None => trace!("{} not found", id),
        }
        found
    }

    fn search(&self, graph: &SceneGraph, key: NodeKey, parent: Option<NodeKey>, id: &ExternalId) -> Option<Resolution> {
        let node = graph.get(key)?;
        if self.matcher.matches(&node.name, id) {
            return Some(Resolution {
                node: key,
                context: ResolutionContext { field: None, parent },
            });
        }

        for &child in node.children() {
            if let Some(found) = self.search(graph, child, Some(key), id) {
                return Some(found);
            }
        }

        if node.is_mesh() {
            if let Some(slot) = self.search_attachments(node, id) {
                return Some(Resolution {
                    node: key,
                    context: ResolutionContext {
                        field: Some(slot),
                        parent: Some(key),
                    },
                });
            }
        }
        None
    }

    fn search_attachments(&self, node: &Node, id: &ExternalId) -> Option<AttachmentSlot> {
        for slot in AttachmentSlot::MESH_SEARCH_ORDER {
            match slot {
                AttachmentSlot::Material => {
                    let Some(material) = &node.material else { continue };
                    if self.matcher.matches(&material.name, id) {
                        return Some(slot);
                    }
                    if let Some((texture_slot, _)) = material
                        .textures()
                        .find(|(_, texture)| self.matcher.matches(&texture.name, id))
                    {
                        return Some(AttachmentSlot::Texture(texture_slot));
                    }
                }
                AttachmentSlot::Geometry => {
                    if node.geometry.as_ref().is_some_and(|geometry| self.matcher.matches(&geometry.name, id)) {
                        return Some(slot);
                    }
                }
                AttachmentSlot::Texture(_) => {}
            }
        }
        None
    }

    /// Peek at the cache without validating or searching
    pub fn cached(&self, id: &ExternalId) -> Option<&Resolution> {
        self.cache.get(id)
    }

    /// Drop the cache entry for an id
    pub fn evict(&mut self, id: &ExternalId) -> Option<Resolution> {
        self.cache.remove(id)
    }

    /// Drop every cache entry and reset the counters
    pub fn clear(&mut self) {
        self.cache.clear();
        self.stats = IndexStats::default();
    }

    /// Number of cached ids
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Cache counters since the last clear
    pub fn stats(&self) -> IndexStats {
        self.stats
    }
}
