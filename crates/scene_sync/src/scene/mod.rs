//! Live scene graph
//!
//! ## Architecture
//!
//! ```text
//! Loader / pose feed / delete requests
//!      ↓
//! SceneController ──→ EventSystem ──→ picking, other listeners
//!      ↓
//! IdentifierIndex ⇄ AliasResolver
//!      ↓
//! SceneGraph (slot map arena)
//! ```
//!
//! Nodes carry external ids (`n<digits>`) in their names. The identifier
//! index maps an id to the node or attachment that carries it, the alias
//! resolver keeps DEF/USE clones in sync, and the controller sequences both
//! for every external input.

mod alias_resolver;
mod attachments;
mod error;
mod identifier;
mod identifier_index;
mod lighting;
mod loader;
mod node;
mod pose;
mod scene_controller;
mod scene_graph;
mod setup;

#[cfg(test)]
mod tests;

pub use alias_resolver::{AliasEntry, AliasResolver};
pub use attachments::{
    AttachmentRef, AttachmentSlot, Geometry, GeometryShape, Material, Texture, TextureSlot,
};
pub use error::SceneError;
pub use identifier::{ExternalId, IdMatching, NameMatcher};
pub use identifier_index::{IdentifierIndex, IndexStats, Resolution, ResolutionContext, SearchStart};
pub use lighting::DirectionalLight;
pub use loader::{LoadCallback, LoadError, LoadedScene, NodeDescription, RonSceneLoader, SceneLoader};
pub use node::{Metadata, Node, NodeKey, NodeKind, RenderFlags};
pub use pose::{PoseAttribute, PoseOutcome, PoseReport, PoseUpdate};
pub use scene_controller::{LoadTarget, SceneController};
pub use scene_graph::{Ancestors, SceneGraph};
pub use setup::{AttachmentSetup, StandardAttachmentSetup};
