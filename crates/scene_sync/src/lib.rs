//! # Scene Sync
//!
//! Keeps a live, mutable scene graph in step with an external feed of
//! structural and pose updates.
//!
//! ## Features
//!
//! - **Identifier Index**: memoized resolution of external ids (`n<digits>`)
//!   to nodes, materials, geometries and texture maps
//! - **DEF/USE Aliasing**: every USE site holds a deep clone of its DEF node,
//!   rebuilt in place whenever the DEF subtree changes
//! - **Deletion**: structural removal or attachment reset by id
//! - **Scene Controller**: full and incremental loads, pose feeds, event bus
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_sync::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scene = LoadedScene::single(
//!         NodeDescription::group("n1")
//!             .with_child(NodeDescription::group("n2"))
//!             .with_child(NodeDescription::group("n3").with_use("n2")),
//!     );
//!
//!     let mut controller = SceneController::new();
//!     controller.load_scene(scene)?;
//!     controller.apply_pose(&PoseUpdate::new(3).with("translation", "0 1 0"))?;
//!
//!     let n2 = controller.resolve(&ExternalId::parse("n2")?).ok_or("n2 missing")?;
//!     let clone = controller.graph().get(n2.node).ok_or("clone missing")?;
//!     assert_eq!(clone.transform.position, Vec3::new(0.0, 1.0, 0.0));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod events;
pub mod foundation;
pub mod input;
pub mod scene;

/// Common imports for scene sync users
pub mod prelude {
    pub use crate::{
        core::{Config, SceneSyncConfig},
        events::{Event, EventHandler, EventType},
        foundation::math::{Transform, Vec3},
        input::{PickingState, PickingTarget},
        scene::{
            ExternalId, LoadTarget, LoadedScene, NodeDescription, NodeKey, PoseOutcome, PoseUpdate,
            RonSceneLoader, SceneController, SceneError, SceneLoader,
        },
    };
}
