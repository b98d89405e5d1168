//! Scene loading collaborator
//!
//! A loader turns a description into node subtrees plus the directional
//! lights the description declares. Loading by url is asynchronous from the
//! controller's point of view: the loader reports through a callback, which
//! may run on another thread.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::attachments::{Geometry, Material};
use super::lighting::DirectionalLight;
use super::node::{Metadata, Node, NodeKind, RenderFlags};
use crate::foundation::math::Transform;

/// Loader errors
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// Description could not be read
    #[error("Failed to read {url}: {source}")]
    Io {
        /// Requested location
        url: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Description could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Description holds no nodes
    #[error("Scene description contains no nodes")]
    EmptyScene,
}

/// Serializable description of one node and its subtree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDescription {
    /// Node name, possibly carrying several external ids
    pub name: String,
    /// Node kind
    pub kind: NodeKind,
    /// Local transform
    pub transform: Transform,
    /// Initial render state
    pub flags: RenderFlags,
    /// Material attachment
    pub material: Option<Material>,
    /// Geometry attachment
    pub geometry: Option<Geometry>,
    /// Metadata bag, including `USE`
    pub metadata: Metadata,
    /// Children in traversal order
    pub children: Vec<NodeDescription>,
}

impl NodeDescription {
    /// Create a description of a group node
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a child (builder pattern)
    pub fn with_child(mut self, child: NodeDescription) -> Self {
        self.children.push(child);
        self
    }

    /// Set the `USE` metadata field
    pub fn with_use(mut self, targets: impl Into<String>) -> Self {
        self.metadata.use_targets = Some(targets.into());
        self
    }

    /// Detached node for this description, without children
    pub fn to_node(&self) -> Node {
        let mut node = Node::new(self.name.clone(), self.kind);
        node.transform = self.transform.clone();
        node.flags = self.flags;
        node.material = self.material.clone();
        node.geometry = self.geometry.clone();
        node.metadata = self.metadata.clone();
        node
    }

    /// Number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

/// Output of a loader: subtrees and lights
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadedScene {
    /// Top-level subtrees in document order
    pub roots: Vec<NodeDescription>,
    /// Directional lights declared by the description
    pub lights: Vec<DirectionalLight>,
}

impl LoadedScene {
    /// Scene with a single subtree and no lights
    pub fn single(root: NodeDescription) -> Self {
        Self {
            roots: vec![root],
            lights: Vec::new(),
        }
    }

    /// Add a light (builder pattern)
    pub fn with_light(mut self, light: DirectionalLight) -> Self {
        self.lights.push(light);
        self
    }
}

/// Completion callback handed to [`SceneLoader::load`]
pub type LoadCallback = Box<dyn FnOnce(Result<LoadedScene, LoadError>) + Send>;

/// Produces node subtrees from scene descriptions
pub trait SceneLoader {
    /// Parse a description held in memory
    fn parse(&self, description: &str) -> Result<LoadedScene, LoadError>;

    /// Fetch and parse the description at `url`, reporting through `on_complete`
    ///
    /// The callback runs exactly once, on whichever thread finished the work.
    fn load(&self, url: &str, on_complete: LoadCallback);
}

/// Loader for the crate's own RON description format
///
/// Urls are file paths, relative ones resolved against the base directory.
#[derive(Debug, Clone, Default)]
pub struct RonSceneLoader {
    base_dir: Option<PathBuf>,
}

impl RonSceneLoader {
    /// Create a loader resolving paths against the working directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative urls against `base_dir`
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    fn resolve_path(&self, url: &str) -> PathBuf {
        let path = Path::new(url);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Read and parse a description file synchronously
    pub fn load_file(&self, url: &str) -> Result<LoadedScene, LoadError> {
        let path = self.resolve_path(url);
        debug!("Loading scene description from {}", path.display());
        let contents = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            url: url.to_string(),
            source,
        })?;
        self.parse(&contents)
    }
}

impl SceneLoader for RonSceneLoader {
    fn parse(&self, description: &str) -> Result<LoadedScene, LoadError> {
        let mut scene: LoadedScene = ron::from_str(description).map_err(|e| LoadError::Parse(e.to_string()))?;
        if scene.roots.is_empty() {
            return Err(LoadError::EmptyScene);
        }
        scene.lights = scene.lights.into_iter().map(DirectionalLight::normalized).collect();
        let nodes: usize = scene.roots.iter().map(NodeDescription::node_count).sum();
        info!("Parsed scene description: {} node(s), {} light(s)", nodes, scene.lights.len());
        Ok(scene)
    }

    fn load(&self, url: &str, on_complete: LoadCallback) {
        on_complete(self.load_file(url));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::attachments::TextureSlot;
    use std::sync::mpsc;

    const SCENE: &str = r#"(
        roots: [
            (
                name: "n1",
                children: [
                    (name: "n2"),
                    (
                        name: "n3",
                        kind: Mesh,
                        material: Some((name: "n5", map: Some((name: "n6", uri: Some("brick.png"))))),
                        geometry: Some((name: "n7", shape: Sphere(radius: 0.5))),
                        metadata: (USE: Some("n2"), solid: Some(false)),
                    ),
                ],
            ),
        ],
        lights: [(name: "n9", intensity: 2.0)],
    )"#;

    #[test]
    fn test_parse_description() {
        let scene = RonSceneLoader::new().parse(SCENE).unwrap();
        assert_eq!(scene.roots.len(), 1);
        assert_eq!(scene.roots[0].node_count(), 3);

        let mesh = &scene.roots[0].children[1];
        assert_eq!(mesh.kind, NodeKind::Mesh);
        assert_eq!(mesh.metadata.use_targets.as_deref(), Some("n2"));
        assert_eq!(mesh.metadata.solid, Some(false));
        let material = mesh.material.as_ref().unwrap();
        assert_eq!(material.texture(TextureSlot::Map).unwrap().name, "n6");

        assert_eq!(scene.lights.len(), 1);
        assert_eq!(scene.lights[0].name, "n9");
        assert_eq!(scene.lights[0].intensity, 2.0);
    }

    #[test]
    fn test_empty_description_is_rejected() {
        let result = RonSceneLoader::new().parse("(roots: [])");
        assert!(matches!(result, Err(LoadError::EmptyScene)));
    }

    #[test]
    fn test_parse_error() {
        let result = RonSceneLoader::new().parse("(roots: [(name: 5)])");
        assert!(matches!(result, Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_load_reports_through_callback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scene.ron"), SCENE).unwrap();
        let loader = RonSceneLoader::new().with_base_dir(dir.path());

        let (sender, receiver) = mpsc::channel();
        loader.load("scene.ron", Box::new(move |result| {
            sender.send(result).unwrap();
        }));

        let scene = receiver.recv().unwrap().unwrap();
        assert_eq!(scene.roots[0].name, "n1");
    }

    #[test]
    fn test_missing_file() {
        let result = RonSceneLoader::new().load_file("/definitely/not/here.ron");
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_description_to_node() {
        let description = NodeDescription::group("n4;n8").with_use("n2").with_child(NodeDescription::group("n5"));
        let node = description.to_node();
        assert_eq!(node.name, "n4;n8");
        assert!(node.metadata.has_use());
        assert!(node.children().is_empty());
    }
}
