//! Input-side consumers of the scene graph

pub mod picking;

pub use picking::{PickingNotifier, PickingState, PickingTarget};
