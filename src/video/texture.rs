//! Stitched video split into three textures
//!
//! The video holds the left, center and right views side by side in equal
//! horizontal thirds. Each surface samples its third through an offset and
//! repeat on the shared video texture.

use std::path::{Path, PathBuf};

use glam::Vec2;

use crate::scene::{FoundPlanes, SceneError, SceneGraph, SurfaceSlot};

/// Normalized UV window into the stitched frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureRegion {
    pub offset: Vec2,
    pub repeat: Vec2,
}

impl TextureRegion {
    const THIRD: f32 = 1.0 / 3.0;

    pub const LEFT: TextureRegion = TextureRegion::third(0.0);
    pub const CENTER: TextureRegion = TextureRegion::third(Self::THIRD);
    pub const RIGHT: TextureRegion = TextureRegion::third(2.0 * Self::THIRD);

    const fn third(offset_x: f32) -> Self {
        Self {
            offset: Vec2::new(offset_x, 0.0),
            repeat: Vec2::new(Self::THIRD, 1.0),
        }
    }

    /// Map a surface UV (0..1) into stitched-frame UV
    pub fn map_uv(&self, uv: Vec2) -> Vec2 {
        self.offset + uv * self.repeat
    }

    /// Pixel column range covered in a frame of the given width
    pub fn pixel_columns(&self, frame_width: u32) -> (u32, u32) {
        let start = (self.offset.x * frame_width as f32).round() as u32;
        let end = ((self.offset.x + self.repeat.x) * frame_width as f32).round() as u32;
        (start, end.min(frame_width))
    }
}

/// A video texture region bound to a surface material
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    /// Video the texture streams from
    pub source: PathBuf,
    pub region: TextureRegion,
}

/// The three surface textures of one stitched video
#[derive(Debug, Clone)]
pub struct StitchedVideoTextures {
    source: PathBuf,
    attached: [bool; 3],
}

impl StitchedVideoTextures {
    pub fn new(source: &Path) -> Self {
        tracing::info!("Video textures created for {} (3 thirds)", source.display());
        Self {
            source: source.to_path_buf(),
            attached: [false; 3],
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn binding(&self, slot: SurfaceSlot) -> TextureBinding {
        TextureBinding {
            source: self.source.clone(),
            region: slot.texture_region(),
        }
    }

    fn slot_index(slot: SurfaceSlot) -> usize {
        match slot {
            SurfaceSlot::Center => 0,
            SurfaceSlot::Left => 1,
            SurfaceSlot::Right => 2,
        }
    }

    pub fn is_attached(&self, slot: SurfaceSlot) -> bool {
        self.attached[Self::slot_index(slot)]
    }

    pub fn all_attached(&self) -> bool {
        self.attached.iter().all(|a| *a)
    }

    /// Bind each third to its surface
    ///
    /// Slots already attached are skipped. A failed slot is logged and left
    /// for a later attempt; the others still attach.
    pub fn attach<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        planes: &FoundPlanes,
    ) -> Vec<(SurfaceSlot, SceneError)> {
        let mut failures = Vec::new();
        for (slot, node) in planes.iter() {
            if self.is_attached(slot) {
                continue;
            }
            match scene.assign_texture(node, self.binding(slot)) {
                Ok(()) => self.attached[Self::slot_index(slot)] = true,
                Err(e) => {
                    tracing::warn!("Failed to attach {} video texture: {}", slot, e);
                    failures.push((slot, e));
                }
            }
        }
        if failures.is_empty() {
            tracing::info!("Video textures attached to planes");
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeHandle, Scene, ScreenLayout};

    #[test]
    fn test_regions_cover_thirds() {
        assert_eq!(TextureRegion::LEFT.offset.x, 0.0);
        assert!((TextureRegion::CENTER.offset.x - 1.0 / 3.0).abs() < 1e-6);
        assert!((TextureRegion::RIGHT.offset.x - 2.0 / 3.0).abs() < 1e-6);
        for region in [TextureRegion::LEFT, TextureRegion::CENTER, TextureRegion::RIGHT] {
            assert!((region.repeat.x - 1.0 / 3.0).abs() < 1e-6);
            assert_eq!(region.repeat.y, 1.0);
        }
    }

    #[test]
    fn test_uv_mapping_and_pixel_columns() {
        let right = TextureRegion::RIGHT;
        assert!(right.map_uv(Vec2::new(1.0, 0.5)).abs_diff_eq(Vec2::new(1.0, 0.5), 1e-6));
        assert_eq!(TextureRegion::LEFT.pixel_columns(5760), (0, 1920));
        assert_eq!(TextureRegion::CENTER.pixel_columns(5760), (1920, 3840));
        assert_eq!(right.pixel_columns(5760), (3840, 5760));
    }

    #[test]
    fn test_attach_binds_each_slot() {
        let layout = ScreenLayout::default();
        let mut scene = Scene::new();
        let placed = layout.populate(&mut scene);
        let planes = FoundPlanes {
            center: placed[0].1,
            left: placed[1].1,
            right: placed[2].1,
        };

        let mut textures = StitchedVideoTextures::new(Path::new("stitched-LCR-final.mp4"));
        assert!(textures.attach(&mut scene, &planes).is_empty());
        assert!(textures.all_attached());
        assert_eq!(scene.texture(planes.left).map(|b| b.region), Some(TextureRegion::LEFT));
        assert_eq!(scene.texture(planes.right).map(|b| b.region), Some(TextureRegion::RIGHT));
    }

    #[test]
    fn test_failed_slot_retried_later() {
        let mut scene = Scene::new();
        let center = scene.add_mesh("PlaneGeometry", glam::Vec3::ZERO, 0.0);
        let right = scene.add_mesh("PlaneGeometry", glam::Vec3::X, 0.0);
        let planes = FoundPlanes {
            center,
            left: NodeHandle(42),
            right,
        };

        let mut textures = StitchedVideoTextures::new(Path::new("v.mp4"));
        let failures = textures.attach(&mut scene, &planes);
        assert_eq!(failures, vec![(SurfaceSlot::Left, SceneError::UnknownNode(NodeHandle(42)))]);
        assert!(textures.is_attached(SurfaceSlot::Center));
        assert!(!textures.is_attached(SurfaceSlot::Left));

        let left = scene.add_mesh("PlaneGeometry", glam::Vec3::NEG_X, 0.0);
        let planes = FoundPlanes { left, ..planes };
        assert!(textures.attach(&mut scene, &planes).is_empty());
        assert!(textures.all_attached());
    }
}
