//! DEF/USE propagation through pose updates, deletions and subtree loads

use approx::assert_relative_eq;

use super::reference_scene;
use crate::foundation::math::Vec3;
use crate::scene::{
    ExternalId, LoadedScene, Material, NodeDescription, NodeKey, NodeKind, PoseOutcome, PoseUpdate, SceneController,
};

fn id(text: &str) -> ExternalId {
    ExternalId::parse(text).unwrap()
}

fn loaded() -> SceneController {
    let mut controller = SceneController::new();
    controller.load_scene(reference_scene()).unwrap();
    controller
}

fn node_of(controller: &mut SceneController, text: &str) -> NodeKey {
    controller.resolve(&id(text)).unwrap().node
}

fn child_names(controller: &SceneController, parent: NodeKey) -> Vec<String> {
    let graph = controller.graph();
    graph
        .children(parent)
        .iter()
        .map(|&key| graph.get(key).unwrap().name.clone())
        .collect()
}

#[test]
fn test_pose_on_def_node_rebuilds_use_site() {
    let mut controller = loaded();
    let def = node_of(&mut controller, "n3");
    let original_n2 = node_of(&mut controller, "n2");
    let n10 = node_of(&mut controller, "n10");
    assert_eq!(controller.graph().get(def).unwrap().name, "n3");

    let outcome = controller
        .apply_pose(&PoseUpdate::new(3).with("translation", "0 2 0"))
        .unwrap();
    assert_eq!(
        outcome,
        PoseOutcome::Applied {
            node: def,
            attributes: 1,
            refreshed: 1
        }
    );

    assert_eq!(child_names(&controller, n10), vec!["n11", "n2", "n12"]);
    let clone = controller.graph().children(n10)[1];
    assert!(!controller.graph().contains(original_n2));
    assert_relative_eq!(
        controller.graph().get(clone).unwrap().transform.position,
        Vec3::new(0.0, 2.0, 0.0)
    );

    let resolved = controller.resolve(&id("n2")).unwrap();
    assert_eq!(resolved.node, clone);
    assert_eq!(resolved.parent(), Some(n10));
}

#[test]
fn test_clone_carries_every_attachment() {
    let mut controller = loaded();
    let def_mesh = node_of(&mut controller, "n4");
    controller
        .apply_pose(&PoseUpdate::new(3).with("rotation", "0 1 0 0.5"))
        .unwrap();

    let clone = node_of(&mut controller, "n2");
    let graph = controller.graph();
    let clone_mesh = graph.children(clone)[0];
    let original = graph.get(def_mesh).unwrap();
    let copy = graph.get(clone_mesh).unwrap();
    assert_ne!(clone_mesh, def_mesh);
    assert_eq!(copy.material, original.material);
    assert_eq!(copy.geometry, original.geometry);
    let maps: Vec<_> = copy.material.as_ref().unwrap().textures().map(|(_, t)| t.name.clone()).collect();
    assert_eq!(maps, vec!["n6", "n7"]);
}

#[test]
fn test_repeated_updates_keep_position() {
    let mut controller = loaded();
    let n10 = node_of(&mut controller, "n10");

    for step in 0..4 {
        let value = format!("{} 0 0", step);
        controller
            .apply_pose(&PoseUpdate::new(3).with("translation", value))
            .unwrap();
        assert_eq!(child_names(&controller, n10), vec!["n11", "n2", "n12"]);
    }
    let clone = node_of(&mut controller, "n2");
    assert_relative_eq!(controller.graph().get(clone).unwrap().transform.position.x, 3.0);
}

#[test]
fn test_non_alias_updates_leave_structure_alone() {
    let mut controller = loaded();
    let n2 = node_of(&mut controller, "n2");
    let nodes = controller.graph().len();

    for _ in 0..3 {
        let outcome = controller
            .apply_pose(&PoseUpdate::new(20).with("render", "false"))
            .unwrap();
        assert!(matches!(outcome, PoseOutcome::Applied { refreshed: 0, .. }));
    }

    assert_eq!(controller.graph().len(), nodes);
    assert_eq!(node_of(&mut controller, "n2"), n2);
    assert!(!controller.aliases().entry(&id("n20")).unwrap().is_alias());
}

#[test]
fn test_pose_inside_def_subtree_propagates() {
    let mut controller = loaded();
    let outcome = controller
        .apply_pose(&PoseUpdate::new(4).with("diffuseColor", "0 0 1"))
        .unwrap();
    assert!(matches!(outcome, PoseOutcome::Applied { refreshed: 1, .. }));

    let clone = node_of(&mut controller, "n2");
    let clone_mesh = controller.graph().children(clone)[0];
    let material = controller.graph().get(clone_mesh).unwrap().material.as_ref().unwrap();
    assert_eq!(material.base_color, Vec3::new(0.0, 0.0, 1.0));
}

#[test]
fn test_deleting_inside_def_refreshes_use_site() {
    let mut controller = loaded();
    assert!(controller.delete(&id("n4")));

    let clone = node_of(&mut controller, "n2");
    assert!(controller.graph().children(clone).is_empty());
    assert!(controller.resolve(&id("n4")).is_none());
}

#[test]
fn test_deleted_material_is_reset_in_use_site() {
    let mut controller = loaded();
    assert!(controller.delete(&id("n5")));

    let clone = node_of(&mut controller, "n2");
    let clone_mesh = controller.graph().children(clone)[0];
    let copy = controller.graph().get(clone_mesh).unwrap();
    assert_eq!(copy.material, Some(Material::default()));
    assert_eq!(copy.geometry.as_ref().unwrap().name, "n8");
}

#[test]
fn test_subtree_load_below_def_reaches_use_site() {
    let mut controller = loaded();
    let added = controller
        .load_subtree(&id("n3"), LoadedScene::single(NodeDescription::group("n30")))
        .unwrap();
    assert_eq!(added.len(), 1);

    let clone = node_of(&mut controller, "n2");
    assert_eq!(child_names(&controller, clone), vec!["n4", "n30"]);
}

#[test]
fn test_dangling_use_target_is_dropped() {
    let mut controller = SceneController::new();
    let scene = LoadedScene::single(
        NodeDescription::group("n1")
            .with_child(NodeDescription::group("n2"))
            .with_child(NodeDescription::group("n3").with_use("n2;n99")),
    );
    controller.load_scene(scene).unwrap();

    let outcome = controller
        .apply_pose(&PoseUpdate::new(3).with("translation", "1 1 1"))
        .unwrap();
    assert!(matches!(outcome, PoseOutcome::Applied { refreshed: 1, .. }));
    assert_eq!(controller.aliases().entry(&id("n3")).unwrap().targets.len(), 1);
}

#[test]
fn test_def_child_keeps_reaching_use_site_after_def_update() {
    let mut controller = loaded();
    let def_mesh = node_of(&mut controller, "n4");
    controller.apply_pose(&PoseUpdate::new(4).with("translation", "1 0 0")).unwrap();
    controller.apply_pose(&PoseUpdate::new(3).with("translation", "0 2 0")).unwrap();

    let outcome = controller
        .apply_pose(&PoseUpdate::new(4).with("translation", "5 5 5"))
        .unwrap();
    assert_eq!(
        outcome,
        PoseOutcome::Applied {
            node: def_mesh,
            attributes: 1,
            refreshed: 1
        }
    );

    let clone = node_of(&mut controller, "n2");
    let clone_mesh = controller.graph().children(clone)[0];
    assert_relative_eq!(
        controller.graph().get(clone_mesh).unwrap().transform.position,
        Vec3::new(5.0, 5.0, 5.0)
    );
    assert_eq!(controller.aliases().entry(&id("n4")), controller.aliases().entry(&id("n3")));
}

#[test]
fn test_deleting_below_unnamed_group_refreshes_use_site() {
    let mut controller = SceneController::new();
    let scene = LoadedScene::single(
        NodeDescription::group("n1")
            .with_child(
                NodeDescription::group("n3")
                    .with_use("n2")
                    .with_child(NodeDescription::group("").with_child(NodeDescription::group("n31"))),
            )
            .with_child(NodeDescription::group("n2")),
    );
    controller.load_scene(scene).unwrap();
    controller.apply_pose(&PoseUpdate::new(3).with("translation", "1 0 0")).unwrap();

    assert!(controller.delete(&id("n31")));

    let clone = node_of(&mut controller, "n2");
    let group = controller.graph().children(clone)[0];
    assert_eq!(controller.graph().get(group).unwrap().name, "");
    assert!(controller.graph().children(group).is_empty());
}

#[test]
fn test_subtree_load_below_unnamed_mesh_reaches_use_site() {
    let mut controller = SceneController::new();
    let mesh = NodeDescription {
        kind: NodeKind::Mesh,
        material: Some(Material::new("n5")),
        ..NodeDescription::group("")
    };
    let scene = LoadedScene::single(
        NodeDescription::group("n1")
            .with_child(NodeDescription::group("n3").with_use("n2").with_child(mesh))
            .with_child(NodeDescription::group("n2")),
    );
    controller.load_scene(scene).unwrap();

    let added = controller
        .load_subtree(&id("n5"), LoadedScene::single(NodeDescription::group("n40")))
        .unwrap();
    assert_eq!(added.len(), 1);

    let clone = node_of(&mut controller, "n2");
    let clone_mesh = controller.graph().children(clone)[0];
    assert_eq!(child_names(&controller, clone_mesh), vec!["n40"]);
}
