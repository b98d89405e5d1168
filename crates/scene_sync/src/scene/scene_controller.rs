//! Scene controller
//!
//! Owns the graph, both caches and the event bus, and sequences identifier
//! resolution, deletion and alias propagation for every external input:
//!
//! - full scene loads reset everything and install a new root
//! - subtree loads attach under an existing node and refresh its aliases
//! - pose updates mutate one node and refresh its aliases
//! - deletions remove a node or reset an attachment
//!
//! Every operation runs to completion before the next one starts, and queued
//! events are dispatched at the end of each operation. Asynchronous loads
//! report into a channel that [`SceneController::process_completed_loads`]
//! drains on the owning thread.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, info, trace, warn};

use super::alias_resolver::AliasResolver;
use super::attachments::{AttachmentSlot, Geometry, Material};
use super::error::SceneError;
use super::identifier::{ExternalId, NameMatcher};
use super::identifier_index::{IdentifierIndex, Resolution};
use super::lighting::DirectionalLight;
use super::loader::{LoadError, LoadedScene, SceneLoader};
use super::node::{Node, NodeKey};
use super::pose::{PoseOutcome, PoseReport, PoseUpdate};
use super::scene_graph::SceneGraph;
use super::setup::{AttachmentSetup, StandardAttachmentSetup};
use crate::core::SceneSyncConfig;
use crate::events::{Event, EventArg, EventHandler, EventSystem, EventType};
use crate::input::{PickingNotifier, PickingTarget};

/// Where the result of an asynchronous load goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadTarget {
    /// Replace the whole scene
    Scene,
    /// Attach below the node carrying this id
    Subtree(ExternalId),
}

struct CompletedLoad {
    target: LoadTarget,
    url: String,
    result: Result<LoadedScene, LoadError>,
}

/// Single owner of the live scene and its caches
pub struct SceneController {
    config: SceneSyncConfig,
    graph: SceneGraph,
    index: IdentifierIndex,
    aliases: AliasResolver,
    events: EventSystem,
    lights: Vec<DirectionalLight>,
    setup: Box<dyn AttachmentSetup>,
    completed_tx: Sender<CompletedLoad>,
    completed_rx: Receiver<CompletedLoad>,
}

impl SceneController {
    /// Create a controller with default configuration
    pub fn new() -> Self {
        Self::with_config(SceneSyncConfig::default())
    }

    /// Create a controller from configuration
    pub fn with_config(config: SceneSyncConfig) -> Self {
        let matcher = NameMatcher::new(config.identifiers.name_separator.clone(), config.identifiers.matching);
        let (completed_tx, completed_rx) = mpsc::channel();
        Self {
            index: IdentifierIndex::new(matcher),
            aliases: AliasResolver::new(config.aliasing.use_separator.clone()),
            setup: Box::new(StandardAttachmentSetup::new(config.setup.clone())),
            config,
            graph: SceneGraph::new(),
            events: EventSystem::new(),
            lights: Vec::new(),
            completed_tx,
            completed_rx,
        }
    }

    /// Replace the attachment setup collaborator (builder pattern)
    pub fn with_setup(mut self, setup: Box<dyn AttachmentSetup>) -> Self {
        self.setup = setup;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &SceneSyncConfig {
        &self.config
    }

    /// The live graph
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The identifier index
    pub fn index(&self) -> &IdentifierIndex {
        &self.index
    }

    /// The alias resolver
    pub fn aliases(&self) -> &AliasResolver {
        &self.aliases
    }

    /// Directional lights of everything loaded so far
    pub fn lights(&self) -> &[DirectionalLight] {
        &self.lights
    }

    /// Resolve an id against the live scene
    pub fn resolve(&mut self, id: &ExternalId) -> Option<Resolution> {
        self.index.resolve(&self.graph, id)
    }

    /// Register a handler on the scene event bus
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.events.register_handler(event_type, handler);
    }

    /// Keep a picker informed of every structural change
    pub fn attach_picking<T: PickingTarget + 'static>(&mut self, target: Rc<RefCell<T>>) {
        for event_type in [
            EventType::StructureChanged,
            EventType::NodeDeleted,
            EventType::SceneLoaded,
            EventType::SceneUnloaded,
        ] {
            self.events
                .register_handler(event_type, Box::new(PickingNotifier::new(Rc::clone(&target))));
        }
    }

    /// Replace the whole scene
    ///
    /// Both caches are dropped. Several top-level subtrees are gathered under
    /// an unnamed group root.
    pub fn load_scene(&mut self, scene: LoadedScene) -> Result<NodeKey, SceneError> {
        if scene.roots.is_empty() {
            return Err(LoadError::EmptyScene.into());
        }

        self.graph.clear();
        self.index.clear();
        self.aliases.clear();

        let root = match scene.roots.as_slice() {
            [single] => self.graph.insert_tree(single),
            many => {
                let root = self.graph.insert(Node::group(""));
                for description in many {
                    let child = self.graph.insert_tree(description);
                    self.graph.add_child(root, child);
                }
                root
            }
        };
        self.graph.set_root(root);
        self.setup.setup(&mut self.graph, root);
        self.lights = scene.lights;

        info!(
            "Loaded scene: {} node(s), {} light(s)",
            self.graph.len(),
            self.lights.len()
        );
        self.events.send(
            Event::new(EventType::SceneLoaded)
                .with_arg("node", EventArg::Node(root))
                .with_arg("count", EventArg::Count(self.graph.len())),
        );
        self.events.dispatch();
        Ok(root)
    }

    /// Attach loaded subtrees below the node carrying `parent`
    ///
    /// An attachment id attaches below its owning mesh. Returns the new
    /// subtree roots; empty when `parent` does not resolve.
    pub fn load_subtree(&mut self, parent: &ExternalId, scene: LoadedScene) -> Result<Vec<NodeKey>, SceneError> {
        if scene.roots.is_empty() {
            return Err(LoadError::EmptyScene.into());
        }
        let Some(resolution) = self.index.resolve(&self.graph, parent) else {
            debug!("Subtree parent {} not found, dropping the load", parent);
            return Ok(Vec::new());
        };
        let parent_key = resolution.node;

        let mut added = Vec::with_capacity(scene.roots.len());
        for description in &scene.roots {
            let key = self.graph.insert_tree(description);
            self.setup.setup(&mut self.graph, key);
            self.graph.add_child(parent_key, key);
            added.push(key);
        }
        self.lights.extend(scene.lights);
        debug!("Attached {} subtree(s) below {}", added.len(), parent);
        self.events.send(Event::structure_changed(parent_key));

        let ids = self.propagation_ids(parent_key);
        self.aliases
            .propagate(&mut self.graph, &mut self.index, &mut self.events, parent_key, &ids);
        self.events.dispatch();
        Ok(added)
    }

    /// Ask `loader` for `url`; the result is applied by [`Self::process_completed_loads`]
    pub fn request_load(&self, loader: &dyn SceneLoader, url: &str, target: LoadTarget) {
        let sender = self.completed_tx.clone();
        let owned_url = url.to_string();
        loader.load(
            url,
            Box::new(move |result| {
                let completed = CompletedLoad {
                    target,
                    url: owned_url,
                    result,
                };
                if sender.send(completed).is_err() {
                    debug!("Scene controller dropped before a load completed");
                }
            }),
        );
    }

    /// Apply every load that completed since the last call
    ///
    /// Each completion is applied as one unit. Returns the number applied;
    /// failed loads are logged and skipped.
    pub fn process_completed_loads(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completed) = self.completed_rx.try_recv() {
            let outcome = completed.result.map_err(SceneError::from).and_then(|scene| match &completed.target {
                LoadTarget::Scene => self.load_scene(scene).map(|_| ()),
                LoadTarget::Subtree(parent) => self.load_subtree(parent, scene).map(|_| ()),
            });
            match outcome {
                Ok(()) => applied += 1,
                Err(e) => warn!("Load of {} failed: {}", completed.url, e),
            }
        }
        applied
    }

    /// Apply one pose record
    ///
    /// Malformed values reject the record before anything is touched. An id
    /// that does not resolve leaves the graph and the caches as they were.
    /// An id naming a material only takes colours; other attachment ids take
    /// nothing.
    pub fn apply_pose(&mut self, update: &PoseUpdate) -> Result<PoseOutcome, SceneError> {
        let attributes = update.parse_attributes()?;
        let id = update.external_id();
        let Some(resolution) = self.index.resolve(&self.graph, &id) else {
            debug!("Pose update for unknown id {}, skipping", id);
            return Ok(PoseOutcome::Skipped);
        };

        let node_key = resolution.node;
        let field = resolution.field();
        let Some(node) = self.graph.get_mut(node_key) else {
            return Ok(PoseOutcome::Skipped);
        };
        let written = attributes
            .iter()
            .filter(|attribute| attribute.reaches(field) && attribute.apply(node))
            .count();
        if written < attributes.len() {
            trace!("{} of {} attribute(s) did not apply to {}", attributes.len() - written, attributes.len(), id);
        }

        let refreshed = self.aliases.propagate(
            &mut self.graph,
            &mut self.index,
            &mut self.events,
            node_key,
            std::slice::from_ref(&id),
        );
        self.events.dispatch();
        Ok(PoseOutcome::Applied {
            node: node_key,
            attributes: written,
            refreshed,
        })
    }

    /// Apply a feed of pose records in order
    pub fn apply_poses(&mut self, updates: &[PoseUpdate]) -> PoseReport {
        let mut report = PoseReport::default();
        for update in updates {
            let result = self.apply_pose(update);
            if let Err(e) = &result {
                warn!("Rejected pose record for n{}: {}", update.id, e);
            }
            report.record(&result);
        }
        debug!(
            "Pose feed: {} applied, {} skipped, {} rejected",
            report.applied, report.skipped, report.rejected
        );
        report
    }

    /// Delete the node or attachment carrying `id`
    ///
    /// Attachments are reset: materials and geometries to fresh defaults,
    /// texture maps to empty. Returns whether anything was deleted.
    pub fn delete(&mut self, id: &ExternalId) -> bool {
        let Some(resolution) = self.index.resolve(&self.graph, id) else {
            debug!("Delete of unknown id {}, nothing to do", id);
            return false;
        };

        let (affected, removed) = match resolution.field() {
            Some(slot) => {
                let owner = resolution.node;
                if let Some(node) = self.graph.get_mut(owner) {
                    reset_attachment(node, slot);
                }
                debug!("Reset {} of {} for {}", slot, self.graph.get(owner).map_or("", |n| n.name.as_str()), id);
                (Some(owner), 0)
            }
            None => {
                let parent = self.graph.parent(resolution.node);
                debug_assert_eq!(parent, resolution.parent(), "cached parent out of date");
                let removed = self.graph.remove_subtree(resolution.node);
                debug!("Removed {} node(s) for {}", removed, id);
                (parent, removed)
            }
        };
        self.index.evict(id);

        self.events.send(
            Event::new(EventType::NodeDeleted)
                .with_arg("id", EventArg::Id(id.to_string()))
                .with_arg("count", EventArg::Count(removed)),
        );

        if let Some(parent) = affected {
            if removed > 0 {
                self.events.send(Event::structure_changed(parent));
            }
            if self.aliases.participates(&self.graph, parent) {
                let ids = self.propagation_ids(parent);
                self.aliases
                    .propagate(&mut self.graph, &mut self.index, &mut self.events, parent, &ids);
            }
        }
        self.events.dispatch();
        true
    }

    /// Drop the scene, its lights and both caches
    pub fn unload(&mut self) {
        self.graph.clear();
        self.index.clear();
        self.aliases.clear();
        self.lights.clear();
        info!("Scene unloaded");
        self.events.send(Event::new(EventType::SceneUnloaded));
        self.events.dispatch();
    }

    /// Ids of the nearest node at or above `key` whose name carries any
    fn propagation_ids(&self, key: NodeKey) -> Vec<ExternalId> {
        std::iter::once(key)
            .chain(self.graph.ancestors(key))
            .filter_map(|ancestor| self.graph.get(ancestor))
            .map(|node| self.index.matcher().ids(&node.name).collect::<Vec<_>>())
            .find(|ids| !ids.is_empty())
            .unwrap_or_default()
    }
}

impl Default for SceneController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SceneController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneController")
            .field("nodes", &self.graph.len())
            .field("cached_ids", &self.index.len())
            .field("aliases", &self.aliases.len())
            .field("lights", &self.lights.len())
            .finish()
    }
}

fn reset_attachment(node: &mut Node, slot: AttachmentSlot) {
    match slot {
        AttachmentSlot::Material => node.material = Some(Material::default()),
        AttachmentSlot::Geometry => node.geometry = Some(Geometry::default()),
        AttachmentSlot::Texture(texture) => {
            if let Some(material) = node.material.as_mut() {
                *material.texture_mut(texture) = None;
            }
        }
    }
}
