//! Cross-component scene scenarios driven through the controller

mod aliasing;

use super::{
    Geometry, GeometryShape, LoadedScene, Material, NodeDescription, NodeKind, Texture, TextureSlot,
};
use crate::foundation::math::Vec3;

/// Reference scene used by the scenarios
///
/// ```text
/// n1
/// ├── n10
/// │   ├── n11
/// │   ├── n2            USE site of n3
/// │   └── n12
/// ├── n3  (USE = "n2")  DEF node
/// │   └── n4  mesh: material n5 (map n6, roughnessMap n7), geometry n8
/// └── n20
/// ```
pub(super) fn reference_scene() -> LoadedScene {
    let material = Material::new("n5")
        .with_base_color(Vec3::new(0.8, 0.1, 0.1))
        .with_texture(TextureSlot::Map, Texture::new("n6").with_uri("albedo.png"))
        .with_texture(TextureSlot::RoughnessMap, Texture::new("n7").with_uri("rough.png"));
    let mesh = NodeDescription {
        name: "n4".to_string(),
        kind: NodeKind::Mesh,
        material: Some(material),
        geometry: Some(Geometry::new("n8", GeometryShape::Box { size: Vec3::new(1.0, 2.0, 1.0) })),
        ..Default::default()
    };

    let root = NodeDescription::group("n1")
        .with_child(
            NodeDescription::group("n10")
                .with_child(NodeDescription::group("n11"))
                .with_child(NodeDescription::group("n2"))
                .with_child(NodeDescription::group("n12")),
        )
        .with_child(NodeDescription {
            kind: NodeKind::Transform,
            ..NodeDescription::group("n3").with_use("n2").with_child(mesh)
        })
        .with_child(NodeDescription::group("n20"));

    LoadedScene::single(root)
}
