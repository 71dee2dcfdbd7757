//! Scene graph seam
//!
//! The media core reads top-level nodes (position and geometry type) and
//! writes only texture bindings onto matched surfaces.

use std::collections::HashMap;

use glam::Vec3;

use crate::video::TextureBinding;

/// Opaque handle of a node owned by the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeHandle(pub u32);

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node {}", self.0)
    }
}

/// Read-only view of one top-level scene node
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNodeInfo {
    pub handle: NodeHandle,
    pub is_mesh: bool,
    /// Geometry type tag, e.g. "PlaneGeometry"
    pub geometry_type: String,
    pub position: Vec3,
}

impl SceneNodeInfo {
    /// Mesh whose geometry denotes a flat surface
    pub fn is_planar(&self) -> bool {
        self.is_mesh && self.geometry_type.contains("Plane")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("{0} is not in the scene")]
    UnknownNode(NodeHandle),
    #[error("{0} has no material to receive a texture")]
    NoMaterial(NodeHandle),
}

/// Scene collaborator as seen by the media core
pub trait SceneGraph {
    /// Top-level nodes in scene order
    fn top_level_nodes(&self) -> Vec<SceneNodeInfo>;

    /// Bind a video texture region to a node's material
    fn assign_texture(&mut self, node: NodeHandle, binding: TextureBinding) -> Result<(), SceneError>;
}

#[derive(Debug, Clone)]
struct SceneNode {
    info: SceneNodeInfo,
    /// Rotation about the vertical axis, radians
    rotation_y: f32,
    has_material: bool,
    texture: Option<TextureBinding>,
}

/// Minimal in-memory scene
#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    index: HashMap<NodeHandle, usize>,
    next_handle: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, is_mesh: bool, geometry_type: &str, position: Vec3, rotation_y: f32) -> NodeHandle {
        let handle = NodeHandle(self.next_handle);
        self.next_handle += 1;
        self.index.insert(handle, self.nodes.len());
        self.nodes.push(SceneNode {
            info: SceneNodeInfo {
                handle,
                is_mesh,
                geometry_type: geometry_type.to_string(),
                position,
            },
            rotation_y,
            has_material: is_mesh,
            texture: None,
        });
        handle
    }

    /// Add a textured mesh at the top level
    pub fn add_mesh(&mut self, geometry_type: &str, position: Vec3, rotation_y: f32) -> NodeHandle {
        self.insert(true, geometry_type, position, rotation_y)
    }

    /// Add a non-mesh node (group, light, camera)
    pub fn add_group(&mut self, position: Vec3) -> NodeHandle {
        self.insert(false, "Group", position, 0.0)
    }

    pub fn remove(&mut self, handle: NodeHandle) -> bool {
        let Some(idx) = self.index.remove(&handle) else {
            return false;
        };
        self.nodes.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&SceneNodeInfo> {
        self.index.get(&handle).map(|&i| &self.nodes[i].info)
    }

    pub fn rotation_y(&self, handle: NodeHandle) -> Option<f32> {
        self.index.get(&handle).map(|&i| self.nodes[i].rotation_y)
    }

    /// Texture currently bound to a node
    pub fn texture(&self, handle: NodeHandle) -> Option<&TextureBinding> {
        self.index.get(&handle).and_then(|&i| self.nodes[i].texture.as_ref())
    }
}

impl SceneGraph for Scene {
    fn top_level_nodes(&self) -> Vec<SceneNodeInfo> {
        self.nodes.iter().map(|n| n.info.clone()).collect()
    }

    fn assign_texture(&mut self, node: NodeHandle, binding: TextureBinding) -> Result<(), SceneError> {
        let idx = *self.index.get(&node).ok_or(SceneError::UnknownNode(node))?;
        let entry = &mut self.nodes[idx];
        if !entry.has_material {
            return Err(SceneError::NoMaterial(node));
        }
        entry.texture = Some(binding);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::TextureRegion;
    use std::path::PathBuf;

    fn binding() -> TextureBinding {
        TextureBinding {
            source: PathBuf::from("stitched.mp4"),
            region: TextureRegion::CENTER,
        }
    }

    #[test]
    fn test_planar_detection() {
        let mut scene = Scene::new();
        let plane = scene.add_mesh("PlaneGeometry", Vec3::ZERO, 0.0);
        let boxed = scene.add_mesh("BoxGeometry", Vec3::ZERO, 0.0);
        let group = scene.add_group(Vec3::ZERO);

        assert!(scene.node(plane).unwrap().is_planar());
        assert!(!scene.node(boxed).unwrap().is_planar());
        assert!(!scene.node(group).unwrap().is_planar());
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("PlaneGeometry", Vec3::X, 0.0);
        let b = scene.add_mesh("PlaneGeometry", Vec3::Y, 0.0);
        let c = scene.add_mesh("PlaneGeometry", Vec3::Z, 0.0);

        assert!(scene.remove(b));
        assert!(!scene.remove(b));
        let handles: Vec<_> = scene.top_level_nodes().iter().map(|n| n.handle).collect();
        assert_eq!(handles, vec![a, c]);
        assert_eq!(scene.node(c).unwrap().position, Vec3::Z);
    }

    #[test]
    fn test_assign_texture() {
        let mut scene = Scene::new();
        let plane = scene.add_mesh("PlaneGeometry", Vec3::ZERO, 0.0);
        let group = scene.add_group(Vec3::ZERO);

        scene.assign_texture(plane, binding()).unwrap();
        assert_eq!(scene.texture(plane), Some(&binding()));
        assert_eq!(scene.assign_texture(group, binding()), Err(SceneError::NoMaterial(group)));
        assert_eq!(
            scene.assign_texture(NodeHandle(99), binding()),
            Err(SceneError::UnknownNode(NodeHandle(99)))
        );
    }
}
