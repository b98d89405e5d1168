//! Scene error types
//!
//! Unresolved ids, ambiguous ids and dangling `USE` targets are not errors:
//! they are reported through `Option`s, outcomes and log lines. Only input
//! that cannot be interpreted at all ends up here.

use super::loader::LoadError;

/// Errors raised while applying external input to the scene
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// Id not in `n<digits>` form
    #[error("Invalid external id: {0:?}")]
    InvalidId(String),

    /// Attribute value that does not parse for its attribute
    #[error("Invalid value {value:?} for attribute {attribute}")]
    InvalidAttribute {
        /// Attribute key from the pose record
        attribute: String,
        /// Offending value
        value: String,
    },

    /// Pose record that could not be decoded
    #[error("Malformed pose record: {0}")]
    MalformedPose(String),

    /// Scene load failure
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
}
