//! DEF/USE alias resolver
//!
//! A DEF node carries a `USE` metadata field listing the ids of the graph
//! locations that alias it. The graph has no multi-parent sharing, so every
//! USE site holds its own deep clone of the DEF node, and those clones are
//! rebuilt whenever something inside the DEF subtree changes.
//!
//! Discovery runs once per id and is memoized: the nearest `USE`-bearing
//! ancestor-or-self of the mutated node (walking up to, but excluding, the
//! root) becomes the source. The ids in its `USE` field are resolved once per
//! source into the USE site list, which every id below that source shares.
//! Ids that resolve to nothing are dropped for good. Ids without a source are
//! remembered as non-aliases.
//!
//! A tracked USE site that left the graph is looked up again by the ids in
//! its name before it is given up.

use std::collections::HashMap;

use log::{debug, trace, warn};

use super::identifier::{ExternalId, NameMatcher};
use super::identifier_index::IdentifierIndex;
use super::node::NodeKey;
use super::scene_graph::SceneGraph;
use crate::events::{Event, EventSystem};

/// Memoized alias relation of one id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasEntry {
    /// DEF node, `None` when the id is not part of an alias
    pub source: Option<NodeKey>,
    /// Current clones standing in for the USE sites, in `USE` order
    pub targets: Vec<NodeKey>,
}

impl AliasEntry {
    /// Whether a source was found for the id
    pub fn is_alias(&self) -> bool {
        self.source.is_some()
    }
}

/// One tracked USE site and the name it was last seen under
#[derive(Debug, Clone)]
struct UseSite {
    node: NodeKey,
    name: String,
}

/// Keeps USE sites in sync with their DEF node
#[derive(Debug)]
pub struct AliasResolver {
    sources: HashMap<ExternalId, Option<NodeKey>>,
    sites: HashMap<NodeKey, Vec<UseSite>>,
    use_tokens: NameMatcher,
}

impl AliasResolver {
    /// Create a resolver splitting `USE` fields on `use_separator`
    pub fn new(use_separator: impl Into<String>) -> Self {
        Self {
            sources: HashMap::new(),
            sites: HashMap::new(),
            use_tokens: NameMatcher::new(use_separator, Default::default()),
        }
    }

    /// Propagate a change of `node` to every alias of the given ids
    ///
    /// Several ids are handled one after another; each one is discovered and
    /// propagated on its own. Returns the number of USE sites rebuilt.
    pub fn propagate(
        &mut self,
        graph: &mut SceneGraph,
        index: &mut IdentifierIndex,
        events: &mut EventSystem,
        node: NodeKey,
        ids: &[ExternalId],
    ) -> usize {
        match ids {
            [] => 0,
            [id] => self.propagate_one(graph, index, events, node, id),
            many => many
                .iter()
                .map(|id| self.propagate(graph, index, events, node, std::slice::from_ref(id)))
                .sum(),
        }
    }

    fn propagate_one(
        &mut self,
        graph: &mut SceneGraph,
        index: &mut IdentifierIndex,
        events: &mut EventSystem,
        node: NodeKey,
        id: &ExternalId,
    ) -> usize {
        let source = match self.sources.get(id) {
            Some(known) => *known,
            None => {
                let found = self.find_source(graph, node);
                match found {
                    Some(source) if self.sites.contains_key(&source) => {
                        trace!("{} shares the USE sites of an already known DEF node", id);
                    }
                    Some(source) => {
                        let sites = self.discover(graph, index, source);
                        debug!("{} aliases {} USE site(s)", id, sites.len());
                        self.sites.insert(source, sites);
                    }
                    None => trace!("{} is not part of an alias", id),
                }
                self.sources.insert(id.clone(), found);
                found
            }
        };

        let Some(source) = source else {
            return 0;
        };
        if !graph.contains(source) {
            debug!("DEF node of {} is gone, nothing to propagate", id);
            return 0;
        }
        let Some(sites) = self.sites.get_mut(&source) else {
            return 0;
        };

        let mut rebuilt = 0;
        sites.retain_mut(|site| {
            if !graph.is_attached(site.node) {
                match relocate(graph, index, &site.name, source) {
                    Some(found) => {
                        debug!("USE site {:?} of {} moved, following it", site.name, id);
                        site.node = found;
                    }
                    None => {
                        debug!("USE site {:?} of {} is no longer in the graph, dropping it", site.name, id);
                        return false;
                    }
                }
            }
            if overlaps(graph, site.node, source) {
                warn!("USE site of {} overlaps its DEF node, dropping it", id);
                return false;
            }
            let Some(clone) = graph.clone_subtree(source) else {
                return false;
            };
            if let Some(clone_node) = graph.get_mut(clone) {
                clone_node.name = site.name.clone();
                clone_node.metadata.use_targets = None;
            }
            match graph.replace_in_place(site.node, clone) {
                Some(sibling_index) => {
                    trace!("Rebuilt USE site of {} at sibling index {}", id, sibling_index);
                    events.send(Event::structure_changed(node));
                    site.node = clone;
                    rebuilt += 1;
                    true
                }
                None => {
                    debug_assert!(false, "attached USE site without a parent");
                    graph.remove_subtree(clone);
                    false
                }
            }
        });
        rebuilt
    }

    fn discover(&self, graph: &SceneGraph, index: &mut IdentifierIndex, source: NodeKey) -> Vec<UseSite> {
        let use_field = graph
            .get(source)
            .and_then(|n| n.metadata.use_targets.clone())
            .unwrap_or_default();
        let mut sites = Vec::new();
        for token in self.use_tokens.tokens(&use_field) {
            let Ok(target_id) = ExternalId::parse(token) else {
                debug!("Ignoring malformed USE target {:?}", token);
                continue;
            };
            match index.resolve(graph, &target_id) {
                Some(found) if found.is_attachment() => {
                    debug!("USE target {} names an attachment, ignoring it", target_id);
                }
                Some(found) if overlaps(graph, found.node, source) => {
                    warn!("USE target {} overlaps its DEF node, ignoring it", target_id);
                }
                Some(found) => sites.push(UseSite {
                    node: found.node,
                    name: graph.get(found.node).map(|n| n.name.clone()).unwrap_or_default(),
                }),
                None => debug!("USE target {} does not resolve, dropping it", target_id),
            }
        }
        sites
    }

    /// Nearest `USE`-bearing ancestor-or-self of `node`, excluding the root
    fn find_source(&self, graph: &SceneGraph, node: NodeKey) -> Option<NodeKey> {
        let root = graph.root();
        std::iter::once(node)
            .chain(graph.ancestors(node))
            .take_while(|&key| Some(key) != root)
            .find(|&key| graph.get(key).is_some_and(|n| n.metadata.has_use()))
    }

    /// Whether `node` sits inside a DEF subtree
    pub fn participates(&self, graph: &SceneGraph, node: NodeKey) -> bool {
        self.find_source(graph, node).is_some()
    }

    /// Memoized relation of an id
    pub fn entry(&self, id: &ExternalId) -> Option<AliasEntry> {
        let source = *self.sources.get(id)?;
        let targets = source
            .and_then(|key| self.sites.get(&key))
            .map(|sites| sites.iter().map(|site| site.node).collect())
            .unwrap_or_default();
        Some(AliasEntry { source, targets })
    }

    /// Forget every memoized relation
    pub fn clear(&mut self) {
        self.sources.clear();
        self.sites.clear();
    }

    /// Number of memoized ids
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether nothing is memoized
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for AliasResolver {
    fn default() -> Self {
        Self::new(";")
    }
}

/// Whether `inner` is `outer` or lies below it
fn encloses(graph: &SceneGraph, outer: NodeKey, inner: NodeKey) -> bool {
    inner == outer || graph.ancestors(inner).any(|key| key == outer)
}

/// Whether a USE site and its DEF node share any part of the tree
fn overlaps(graph: &SceneGraph, site: NodeKey, source: NodeKey) -> bool {
    encloses(graph, site, source) || encloses(graph, source, site)
}

/// Attached node now carrying one of the ids in `name`, if any
fn relocate(graph: &SceneGraph, index: &mut IdentifierIndex, name: &str, source: NodeKey) -> Option<NodeKey> {
    let ids: Vec<ExternalId> = index.matcher().ids(name).collect();
    ids.iter()
        .filter_map(|id| index.resolve(graph, id))
        .find(|found| !found.is_attachment() && !overlaps(graph, found.node, source))
        .map(|found| found.node)
}
