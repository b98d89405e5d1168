//! Pose update records
//!
//! A pose record names a node by numeric id and carries string-valued
//! attributes, e.g. `{"id": 3, "translation": "0 1.5 0", "render": "false"}`.
//! Values use the whitespace/comma separated notation of the scene
//! descriptions they were authored against.

use std::collections::BTreeMap;

use log::trace;
use serde::{Deserialize, Serialize};

use super::attachments::AttachmentSlot;
use super::error::SceneError;
use super::identifier::ExternalId;
use super::node::{Node, NodeKey, RenderFlags};
use crate::foundation::math::{axis_angle, Vec3};

/// One record of the pose feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseUpdate {
    /// Numeric id of the target, `n` prefix omitted
    pub id: u64,
    /// Attribute key to string value
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl PoseUpdate {
    /// Create an empty record for a numeric id
    pub fn new(id: u64) -> Self {
        Self {
            id,
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute (builder pattern)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Canonical external id of the target
    pub fn external_id(&self) -> ExternalId {
        ExternalId::from_numeric(self.id)
    }

    /// Decode a single JSON record
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        serde_json::from_str(text).map_err(|e| SceneError::MalformedPose(e.to_string()))
    }

    /// Decode a JSON array of records
    pub fn feed_from_json(text: &str) -> Result<Vec<Self>, SceneError> {
        serde_json::from_str(text).map_err(|e| SceneError::MalformedPose(e.to_string()))
    }

    /// Parse every recognised attribute
    ///
    /// Unknown keys are skipped; the first malformed value fails the record.
    pub fn parse_attributes(&self) -> Result<Vec<PoseAttribute>, SceneError> {
        let mut parsed = Vec::with_capacity(self.attributes.len());
        for (key, value) in &self.attributes {
            match PoseAttribute::parse(key, value)? {
                Some(attribute) => parsed.push(attribute),
                None => trace!("Ignoring unknown pose attribute {:?} for {}", key, self.external_id()),
            }
        }
        Ok(parsed)
    }
}

/// A decoded pose attribute
#[derive(Debug, Clone, PartialEq)]
pub enum PoseAttribute {
    /// Local position
    Translation(Vec3),
    /// Local rotation as axis and angle in radians
    Rotation {
        /// Rotation axis, not necessarily normalized
        axis: Vec3,
        /// Angle in radians
        angle: f32,
    },
    /// Material base colour
    DiffuseColor(Vec3),
    /// Material emissive colour
    EmissiveColor(Vec3),
    /// Visibility
    Render(bool),
}

impl PoseAttribute {
    /// Parse one key/value pair; `Ok(None)` for keys this crate does not drive
    pub fn parse(key: &str, value: &str) -> Result<Option<Self>, SceneError> {
        let attribute = match key {
            "translation" => {
                let [x, y, z] = floats(key, value)?;
                Self::Translation(Vec3::new(x, y, z))
            }
            "rotation" => {
                let [x, y, z, angle] = floats(key, value)?;
                Self::Rotation {
                    axis: Vec3::new(x, y, z),
                    angle,
                }
            }
            "diffuseColor" | "baseColor" => {
                let [r, g, b] = floats(key, value)?;
                Self::DiffuseColor(Vec3::new(r, g, b))
            }
            "emissiveColor" => {
                let [r, g, b] = floats(key, value)?;
                Self::EmissiveColor(Vec3::new(r, g, b))
            }
            "render" => match value.trim().to_ascii_lowercase().as_str() {
                "true" => Self::Render(true),
                "false" => Self::Render(false),
                _ => return Err(invalid(key, value)),
            },
            _ => return Ok(None),
        };
        Ok(Some(attribute))
    }

    /// Whether the attribute drives what an id resolved to
    ///
    /// `slot` is `None` for a node match. Colours reach a node's material or
    /// a material match; everything else only reaches nodes.
    pub fn reaches(&self, slot: Option<AttachmentSlot>) -> bool {
        match self {
            Self::DiffuseColor(_) | Self::EmissiveColor(_) => matches!(slot, None | Some(AttachmentSlot::Material)),
            Self::Translation(_) | Self::Rotation { .. } | Self::Render(_) => slot.is_none(),
        }
    }

    /// Write the attribute into a node
    ///
    /// Colours need a material; returns `false` when the node has none.
    pub fn apply(&self, node: &mut Node) -> bool {
        match self {
            Self::Translation(position) => node.transform.position = *position,
            Self::Rotation { axis, angle } => node.transform.rotation = axis_angle(*axis, *angle),
            Self::DiffuseColor(color) => match node.material.as_mut() {
                Some(material) => material.base_color = *color,
                None => return false,
            },
            Self::EmissiveColor(color) => match node.material.as_mut() {
                Some(material) => material.emissive = *color,
                None => return false,
            },
            Self::Render(visible) => node.flags.set(RenderFlags::VISIBLE, *visible),
        }
        true
    }
}

fn invalid(key: &str, value: &str) -> SceneError {
    SceneError::InvalidAttribute {
        attribute: key.to_string(),
        value: value.to_string(),
    }
}

fn floats<const N: usize>(key: &str, value: &str) -> Result<[f32; N], SceneError> {
    let mut out = [0.0; N];
    let mut parts = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty());
    for slot in &mut out {
        *slot = parts
            .next()
            .and_then(|part| part.parse::<f32>().ok())
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(key, value))?;
    }
    if parts.next().is_some() {
        return Err(invalid(key, value));
    }
    Ok(out)
}

/// Result of applying one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseOutcome {
    /// The record reached a node
    Applied {
        /// Node that was mutated
        node: NodeKey,
        /// Attributes written
        attributes: usize,
        /// USE sites rebuilt afterwards
        refreshed: usize,
    },
    /// The id did not resolve; nothing changed
    Skipped,
}

/// Summary of a batch of pose records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoseReport {
    /// Records that reached a node
    pub applied: usize,
    /// Records whose id did not resolve
    pub skipped: usize,
    /// Records with malformed values
    pub rejected: usize,
}

impl PoseReport {
    /// Count one record's result
    pub fn record(&mut self, result: &Result<PoseOutcome, SceneError>) {
        match result {
            Ok(PoseOutcome::Applied { .. }) => self.applied += 1,
            Ok(PoseOutcome::Skipped) => self.skipped += 1,
            Err(_) => self.rejected += 1,
        }
    }

    /// Records seen
    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.rejected
    }
}
