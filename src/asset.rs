/*
 * Asset Module
 *
 * Scene assets describe what a creature model offers the simulation: its
 * meshes in scene-graph order, and for each mesh the morph targets it can
 * blend. Assets come from an AssetSource (glTF files on disk in the viewer)
 * and are kept in a small LRU cache keyed by model path.
 */

use std::collections::VecDeque;
use std::path::PathBuf;

use log::debug;
use serde::Deserialize;

use crate::error::{AssetMalformedError, LoadError, SpawnError};

// One mesh of a scene with its blendable targets
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTemplate {
    pub name: String,
    pub target_names: Vec<String>,
    pub default_weights: Vec<f32>,
}

impl MeshTemplate {
    pub fn new(name: impl Into<String>, target_names: &[&str]) -> Self {
        Self {
            name: name.into(),
            target_names: target_names.iter().map(|n| n.to_string()).collect(),
            default_weights: vec![0.0; target_names.len()],
        }
    }

    pub fn target_count(&self) -> usize {
        self.default_weights.len()
    }

    pub fn slot_of(&self, target: &str) -> Option<usize> {
        self.target_names.iter().position(|name| name == target)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneAsset {
    pub path: String,
    pub meshes: Vec<MeshTemplate>,
}

impl SceneAsset {
    pub fn new(path: impl Into<String>, meshes: Vec<MeshTemplate>) -> Self {
        Self {
            path: path.into(),
            meshes,
        }
    }

    pub fn mesh(&self, name: &str) -> Option<&MeshTemplate> {
        self.meshes.iter().find(|mesh| mesh.name == name)
    }
}

// Where scene assets come from; fetches run off the frame thread
pub trait AssetSource: Send + Sync {
    fn fetch(&self, path: &str) -> Result<SceneAsset, SpawnError>;
}

// Reads glTF / GLB files below an asset root directory
#[derive(Debug, Clone)]
pub struct GltfSource {
    root: PathBuf,
}

#[derive(Deserialize, Default)]
struct MeshExtras {
    #[serde(rename = "targetNames", default)]
    target_names: Vec<String>,
}

impl GltfSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // Model paths are web-style (`/assets/modelo.glb`); map them below the root
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    pub fn parse(path: &str, bytes: &[u8]) -> Result<SceneAsset, AssetMalformedError> {
        let gltf = gltf::Gltf::from_slice(bytes)
            .map_err(|err| AssetMalformedError::new(path, err.to_string()))?;
        scene_from_document(path, &gltf.document)
    }
}

impl AssetSource for GltfSource {
    fn fetch(&self, path: &str) -> Result<SceneAsset, SpawnError> {
        let full_path = self.resolve(path);
        let bytes = std::fs::read(&full_path).map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })?;
        debug!("Read {} bytes for {}", bytes.len(), full_path.display());

        Ok(Self::parse(path, &bytes)?)
    }
}

fn scene_from_document(path: &str, document: &gltf::Document) -> Result<SceneAsset, AssetMalformedError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetMalformedError::new(path, "document has no scene"))?;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        collect_meshes(&node, &mut meshes);
    }

    if meshes.is_empty() {
        return Err(AssetMalformedError::new(path, "scene contains no meshes"));
    }

    Ok(SceneAsset::new(path, meshes))
}

// Depth-first, parents before children, the order a scene traversal visits them
fn collect_meshes(node: &gltf::Node, meshes: &mut Vec<MeshTemplate>) {
    if let Some(mesh) = node.mesh() {
        let target_count = mesh
            .primitives()
            .map(|primitive| primitive.morph_targets().count())
            .max()
            .unwrap_or(0);

        let mut default_weights = mesh.weights().map(|w| w.to_vec()).unwrap_or_default();
        default_weights.resize(target_count, 0.0);

        let extras: MeshExtras = mesh
            .extras()
            .as_ref()
            .and_then(|raw| serde_json::from_str(raw.get()).ok())
            .unwrap_or_default();
        let mut target_names = extras.target_names;
        target_names.truncate(target_count);
        while target_names.len() < target_count {
            target_names.push(format!("target{}", target_names.len()));
        }

        let name = node
            .name()
            .or_else(|| mesh.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh{}", mesh.index()));

        meshes.push(MeshTemplate {
            name,
            target_names,
            default_weights,
        });
    }

    for child in node.children() {
        collect_meshes(&child, meshes);
    }
}

// Bounded cache of loaded assets; the least recently used entry goes first
#[derive(Debug)]
pub struct AssetCache {
    capacity: usize,
    entries: VecDeque<SceneAsset>,
}

impl AssetCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    // A clone of the cached asset, refreshing its recency
    pub fn get(&mut self, path: &str) -> Option<SceneAsset> {
        let index = self.entries.iter().position(|asset| asset.path == path)?;
        let asset = self.entries.remove(index)?;
        let copy = asset.clone();
        self.entries.push_back(asset);
        Some(copy)
    }

    pub fn insert(&mut self, asset: SceneAsset) {
        if let Some(index) = self.entries.iter().position(|cached| cached.path == asset.path) {
            self.entries.remove(index);
        }
        self.entries.push_back(asset);

        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!("Asset cache full, dropping {}", evicted.path);
            }
        }
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|asset| asset.path == path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 36 zero bytes: three VEC3 positions
    const MORPH_GLTF: &str = r#"{
        "asset": {"version": "2.0"},
        "buffers": [{"byteLength": 36, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"}],
        "bufferViews": [{"buffer": 0, "byteLength": 36}],
        "accessors": [{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [0, 0, 0]}],
        "meshes": [{
            "name": "BodyMesh",
            "primitives": [{"attributes": {"POSITION": 0}, "targets": [{"POSITION": 0}, {"POSITION": 0}]}],
            "weights": [0.25, 0.0],
            "extras": {"targetNames": ["spiky", "round"]}
        }],
        "nodes": [{"name": "Body", "mesh": 0}],
        "scenes": [{"nodes": [0]}],
        "scene": 0
    }"#;

    #[test]
    fn parses_meshes_and_named_targets() {
        let asset = GltfSource::parse("/assets/blob.gltf", MORPH_GLTF.as_bytes()).unwrap();
        assert_eq!(asset.meshes.len(), 1);

        let body = asset.mesh("Body").unwrap();
        assert_eq!(body.target_names, vec!["spiky", "round"]);
        assert_eq!(body.default_weights, vec![0.25, 0.0]);
        assert_eq!(body.slot_of("round"), Some(1));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = GltfSource::parse("x.glb", b"definitely not gltf").unwrap_err();
        assert_eq!(err.path, "x.glb");
    }

    #[test]
    fn scene_without_meshes_is_malformed() {
        let json = r#"{"asset": {"version": "2.0"}, "nodes": [{"name": "empty"}], "scenes": [{"nodes": [0]}]}"#;
        let err = GltfSource::parse("empty.gltf", json.as_bytes()).unwrap_err();
        assert!(err.reason.contains("no meshes"));

        let json = r#"{"asset": {"version": "2.0"}}"#;
        let err = GltfSource::parse("bare.gltf", json.as_bytes()).unwrap_err();
        assert!(err.reason.contains("no scene"));
    }

    #[test]
    fn fetch_resolves_web_paths_below_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/blob.gltf"), MORPH_GLTF).unwrap();

        let source = GltfSource::new(dir.path());
        let asset = source.fetch("/assets/blob.gltf").unwrap();
        assert_eq!(asset.path, "/assets/blob.gltf");

        let err = source.fetch("/assets/missing.gltf").unwrap_err();
        assert!(matches!(err, SpawnError::Load(LoadError::Io { .. })));
    }

    #[test]
    fn cache_evicts_least_recently_used() {
        let mut cache = AssetCache::new(2);
        cache.insert(SceneAsset::new("a", vec![]));
        cache.insert(SceneAsset::new("b", vec![]));

        // Touch "a" so "b" becomes the oldest
        assert!(cache.get("a").is_some());
        cache.insert(SceneAsset::new("c", vec![]));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn reinserting_replaces_entry() {
        let mut cache = AssetCache::new(4);
        cache.insert(SceneAsset::new("a", vec![]));
        cache.insert(SceneAsset::new("a", vec![MeshTemplate::new("m", &[])]));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().meshes.len(), 1);
    }
}
