//! Attachment slots owned by scene nodes
//!
//! Attachments are the non-structural sub-objects of a node: its material, its
//! geometry and the texture maps of the material. They are not children; they
//! never appear in traversal order and are cloned by value with their node.
//!
//! The identifier index searches attachments in a fixed order. That order is
//! spelled out once here as static slot lists rather than by probing fields.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Texture map slots of a material, in resolver search order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureSlot {
    /// Base colour map (`map`)
    Map,
    /// Ambient occlusion map (`aoMap`)
    AoMap,
    /// Roughness map (`roughnessMap`)
    RoughnessMap,
    /// Metalness map (`metalnessMap`)
    MetalnessMap,
    /// Normal map (`normalMap`)
    NormalMap,
    /// Emissive map (`emissiveMap`)
    EmissiveMap,
}

impl TextureSlot {
    /// Order in which material maps are searched for an id
    pub const SEARCH_ORDER: [Self; 6] = [
        Self::Map,
        Self::AoMap,
        Self::RoughnessMap,
        Self::MetalnessMap,
        Self::NormalMap,
        Self::EmissiveMap,
    ];

    /// Field name used by the scene description format
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::AoMap => "aoMap",
            Self::RoughnessMap => "roughnessMap",
            Self::MetalnessMap => "metalnessMap",
            Self::NormalMap => "normalMap",
            Self::EmissiveMap => "emissiveMap",
        }
    }
}

/// Which attachment of a node held a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentSlot {
    /// The node's material
    Material,
    /// The node's geometry
    Geometry,
    /// One of the material's texture maps
    Texture(TextureSlot),
}

impl AttachmentSlot {
    /// Order in which a mesh's own attachments are searched
    pub const MESH_SEARCH_ORDER: [Self; 2] = [Self::Material, Self::Geometry];

    /// Field name used by the scene description format
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Geometry => "geometry",
            Self::Texture(slot) => slot.field_name(),
        }
    }
}

impl std::fmt::Display for AttachmentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Texture reference held by a material map slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Texture {
    /// Name, possibly carrying external ids
    pub name: String,
    /// Where the texture data is streamed from
    pub uri: Option<String>,
}

impl Texture {
    /// Create a named texture
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: None,
        }
    }

    /// Set the source uri
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

/// Physically based material attached to a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Name, possibly carrying external ids
    pub name: String,
    /// Diffuse / base colour (linear RGB)
    pub base_color: Vec3,
    /// Emissive colour (linear RGB)
    pub emissive: Vec3,
    /// Perceptual roughness in [0, 1]
    pub roughness: f32,
    /// Metalness in [0, 1]
    pub metalness: f32,
    /// Render both faces
    pub double_sided: bool,
    /// Base colour map
    pub map: Option<Texture>,
    /// Ambient occlusion map
    pub ao_map: Option<Texture>,
    /// Roughness map
    pub roughness_map: Option<Texture>,
    /// Metalness map
    pub metalness_map: Option<Texture>,
    /// Normal map
    pub normal_map: Option<Texture>,
    /// Emissive map
    pub emissive_map: Option<Texture>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: Vec3::new(1.0, 1.0, 1.0),
            emissive: Vec3::zeros(),
            roughness: 1.0,
            metalness: 0.0,
            double_sided: false,
            map: None,
            ao_map: None,
            roughness_map: None,
            metalness_map: None,
            normal_map: None,
            emissive_map: None,
        }
    }
}

impl Material {
    /// Create a named default material
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the base colour
    pub fn with_base_color(mut self, color: Vec3) -> Self {
        self.base_color = color;
        self
    }

    /// Attach a texture to a map slot
    pub fn with_texture(mut self, slot: TextureSlot, texture: Texture) -> Self {
        *self.texture_mut(slot) = Some(texture);
        self
    }

    /// Texture held by a map slot
    pub fn texture(&self, slot: TextureSlot) -> Option<&Texture> {
        match slot {
            TextureSlot::Map => self.map.as_ref(),
            TextureSlot::AoMap => self.ao_map.as_ref(),
            TextureSlot::RoughnessMap => self.roughness_map.as_ref(),
            TextureSlot::MetalnessMap => self.metalness_map.as_ref(),
            TextureSlot::NormalMap => self.normal_map.as_ref(),
            TextureSlot::EmissiveMap => self.emissive_map.as_ref(),
        }
    }

    /// Mutable access to a map slot
    pub fn texture_mut(&mut self, slot: TextureSlot) -> &mut Option<Texture> {
        match slot {
            TextureSlot::Map => &mut self.map,
            TextureSlot::AoMap => &mut self.ao_map,
            TextureSlot::RoughnessMap => &mut self.roughness_map,
            TextureSlot::MetalnessMap => &mut self.metalness_map,
            TextureSlot::NormalMap => &mut self.normal_map,
            TextureSlot::EmissiveMap => &mut self.emissive_map,
        }
    }

    /// Occupied map slots in search order
    pub fn textures(&self) -> impl Iterator<Item = (TextureSlot, &Texture)> + '_ {
        TextureSlot::SEARCH_ORDER
            .into_iter()
            .filter_map(move |slot| self.texture(slot).map(|texture| (slot, texture)))
    }
}

/// Shape carried by a geometry attachment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryShape {
    /// Raw indexed triangle data
    Buffer {
        /// Vertex positions
        positions: Vec<[f32; 3]>,
        /// Triangle indices
        indices: Vec<u32>,
    },
    /// Axis-aligned box primitive
    Box {
        /// Edge lengths
        size: Vec3,
    },
    /// Sphere primitive
    Sphere {
        /// Radius
        radius: f32,
    },
}

/// Geometry attached to a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Name, possibly carrying external ids
    pub name: String,
    /// Shape data
    pub shape: GeometryShape,
}

impl Default for Geometry {
    /// An empty buffer geometry
    fn default() -> Self {
        Self {
            name: String::new(),
            shape: GeometryShape::Buffer {
                positions: Vec::new(),
                indices: Vec::new(),
            },
        }
    }
}

impl Geometry {
    /// Create a named geometry
    pub fn new(name: impl Into<String>, shape: GeometryShape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

/// Borrowed view of one attachment
#[derive(Debug, Clone, Copy)]
pub enum AttachmentRef<'a> {
    /// A material
    Material(&'a Material),
    /// A geometry
    Geometry(&'a Geometry),
    /// A texture map
    Texture(&'a Texture),
}

impl AttachmentRef<'_> {
    /// Name of the attachment
    pub fn name(&self) -> &str {
        match self {
            Self::Material(material) => &material.name,
            Self::Geometry(geometry) => &geometry.name,
            Self::Texture(texture) => &texture.name,
        }
    }
}
