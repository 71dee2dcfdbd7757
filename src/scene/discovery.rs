//! Projection plane discovery
//!
//! Polled once per frame until the center, left and right planes are all
//! found in the same poll. The result is latched: later polls return it
//! without looking at the scene again.

use glam::Vec3;
use serde::Serialize;

use super::graph::{NodeHandle, SceneGraph, SceneNodeInfo};
use crate::video::TextureRegion;

/// One of the three projection surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceSlot {
    Center,
    Left,
    Right,
}

impl SurfaceSlot {
    pub const ALL: [SurfaceSlot; 3] = [SurfaceSlot::Center, SurfaceSlot::Left, SurfaceSlot::Right];

    /// Third of the stitched video shown on this surface
    pub fn texture_region(self) -> TextureRegion {
        match self {
            SurfaceSlot::Left => TextureRegion::LEFT,
            SurfaceSlot::Center => TextureRegion::CENTER,
            SurfaceSlot::Right => TextureRegion::RIGHT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SurfaceSlot::Center => "center",
            SurfaceSlot::Left => "left",
            SurfaceSlot::Right => "right",
        }
    }
}

impl std::fmt::Display for SurfaceSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a surface should be and how far it may stray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedSurface {
    pub slot: SurfaceSlot,
    pub position: Vec3,
    pub tolerance: f32,
}

impl ExpectedSurface {
    /// Whether a node qualifies for this slot
    pub fn matches(&self, node: &SceneNodeInfo) -> bool {
        node.is_planar() && node.position.distance(self.position) <= self.tolerance
    }
}

/// The three matched surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundPlanes {
    pub center: NodeHandle,
    pub left: NodeHandle,
    pub right: NodeHandle,
}

impl FoundPlanes {
    pub fn get(&self, slot: SurfaceSlot) -> NodeHandle {
        match slot {
            SurfaceSlot::Center => self.center,
            SurfaceSlot::Left => self.left,
            SurfaceSlot::Right => self.right,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SurfaceSlot, NodeHandle)> + '_ {
        SurfaceSlot::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }
}

/// Poll-until-found search for the three projection planes
#[derive(Debug, Clone)]
pub struct PlaneDiscovery {
    expected: [ExpectedSurface; 3],
    found: Option<FoundPlanes>,
    polls: u64,
}

impl PlaneDiscovery {
    /// Expected surfaces in any order; each slot must appear exactly once
    pub fn new(expected: [ExpectedSurface; 3]) -> Self {
        Self {
            expected,
            found: None,
            polls: 0,
        }
    }

    pub fn expected(&self, slot: SurfaceSlot) -> Option<&ExpectedSurface> {
        self.expected.iter().find(|e| e.slot == slot)
    }

    /// First node in scene order that matches a slot
    pub fn find_near<'a>(nodes: &'a [SceneNodeInfo], expected: &ExpectedSurface) -> Option<&'a SceneNodeInfo> {
        nodes.iter().find(|node| expected.matches(node))
    }

    /// Search the scene once
    ///
    /// Returns the planes when all three slots match in this poll, or the
    /// latched result of an earlier successful poll.
    pub fn poll<S: SceneGraph + ?Sized>(&mut self, scene: &S) -> Option<FoundPlanes> {
        if let Some(found) = self.found {
            return Some(found);
        }
        self.polls += 1;

        let nodes = scene.top_level_nodes();
        let handle = |slot: SurfaceSlot| {
            self.expected(slot)
                .and_then(|expected| Self::find_near(&nodes, expected))
                .map(|node| node.handle)
        };

        let (Some(center), Some(left), Some(right)) =
            (handle(SurfaceSlot::Center), handle(SurfaceSlot::Left), handle(SurfaceSlot::Right))
        else {
            return None;
        };

        let found = FoundPlanes { center, left, right };
        tracing::info!(
            "Found center/left/right planes after {} poll(s): {}, {}, {}",
            self.polls,
            center,
            left,
            right
        );
        self.found = Some(found);
        Some(found)
    }

    pub fn is_found(&self) -> bool {
        self.found.is_some()
    }

    pub fn found(&self) -> Option<FoundPlanes> {
        self.found
    }

    /// Number of polls that actually searched the scene
    pub fn polls(&self) -> u64 {
        self.polls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::graph::Scene;

    fn expected() -> [ExpectedSurface; 3] {
        [
            ExpectedSurface {
                slot: SurfaceSlot::Center,
                position: Vec3::new(0.0, 0.0, 0.0),
                tolerance: 0.9,
            },
            ExpectedSurface {
                slot: SurfaceSlot::Left,
                position: Vec3::new(10.0, 0.0, 0.0),
                tolerance: 1.6,
            },
            ExpectedSurface {
                slot: SurfaceSlot::Right,
                position: Vec3::new(-10.0, 0.0, 0.0),
                tolerance: 1.6,
            },
        ]
    }

    fn plane(scene: &mut Scene, x: f32, y: f32) -> NodeHandle {
        scene.add_mesh("PlaneGeometry", Vec3::new(x, y, 0.0), 0.0)
    }

    #[test]
    fn test_finds_all_three_within_tolerance() {
        let mut scene = Scene::new();
        let c = plane(&mut scene, 0.5, 0.0);
        let l = plane(&mut scene, 10.0, 1.5);
        let r = plane(&mut scene, -11.5, 0.0);

        let mut discovery = PlaneDiscovery::new(expected());
        let found = discovery.poll(&scene).unwrap();
        assert_eq!(found, FoundPlanes { center: c, left: l, right: r });
        assert_eq!(found.get(SurfaceSlot::Left), l);
    }

    #[test]
    fn test_tolerance_is_per_slot() {
        let mut scene = Scene::new();
        // 1.2 from center: within the side radius, outside the center radius
        plane(&mut scene, 1.2, 0.0);
        plane(&mut scene, 10.0, 0.0);
        plane(&mut scene, -10.0, 0.0);

        let mut discovery = PlaneDiscovery::new(expected());
        assert_eq!(discovery.poll(&scene), None);

        let c = plane(&mut scene, 0.0, 0.85);
        assert_eq!(discovery.poll(&scene).map(|f| f.center), Some(c));
    }

    #[test]
    fn test_side_tolerance_boundary() {
        let mut scene = Scene::new();
        plane(&mut scene, 0.0, 0.0);
        plane(&mut scene, 10.0, 1.61);
        plane(&mut scene, -10.0, 0.0);

        let mut discovery = PlaneDiscovery::new(expected());
        assert_eq!(discovery.poll(&scene), None);
    }

    #[test]
    fn test_non_planar_and_non_mesh_ignored() {
        let mut scene = Scene::new();
        scene.add_mesh("BoxGeometry", Vec3::ZERO, 0.0);
        scene.add_group(Vec3::new(10.0, 0.0, 0.0));
        plane(&mut scene, -10.0, 0.0);

        let mut discovery = PlaneDiscovery::new(expected());
        assert_eq!(discovery.poll(&scene), None);
        assert_eq!(discovery.polls(), 1);
    }

    #[test]
    fn test_first_match_in_scene_order_wins() {
        let mut scene = Scene::new();
        let first = plane(&mut scene, 0.3, 0.0);
        let _closer = plane(&mut scene, 0.0, 0.0);
        plane(&mut scene, 10.0, 0.0);
        plane(&mut scene, -10.0, 0.0);

        let mut discovery = PlaneDiscovery::new(expected());
        assert_eq!(discovery.poll(&scene).unwrap().center, first);
    }

    #[test]
    fn test_latched_after_success() {
        let mut scene = Scene::new();
        let c = plane(&mut scene, 0.0, 0.0);
        plane(&mut scene, 10.0, 0.0);
        plane(&mut scene, -10.0, 0.0);

        let mut discovery = PlaneDiscovery::new(expected());
        let found = discovery.poll(&scene).unwrap();

        scene.remove(c);
        assert_eq!(discovery.poll(&scene), Some(found));
        assert_eq!(discovery.polls(), 1);
        assert!(discovery.is_found());
    }
}
