//! Three-panel screen geometry
//!
//! The side panels sit beside the center panel, pulled back by half a panel
//! width and turned inward by the side angle. The same geometry authors the
//! cover planes and tells discovery where to look for them.

use std::f32::consts::PI;

use glam::Vec3;

use super::discovery::{ExpectedSurface, SurfaceSlot};
use super::graph::{NodeHandle, Scene};
use crate::settings::ScreenSettings;

/// Geometry tag of the authored cover planes
pub const PLANE_GEOMETRY: &str = "PlaneGeometry";

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenLayout {
    pub width: f32,
    pub height: f32,
    pub center: Vec3,
    /// Inward turn of the side panels, radians
    pub side_angle: f32,
    pub side_gap: f32,
    pub center_tolerance: f32,
    pub side_tolerance: f32,
}

impl ScreenLayout {
    pub fn from_settings(settings: &ScreenSettings) -> Self {
        Self {
            width: settings.width,
            height: settings.height,
            center: settings.center.into(),
            side_angle: settings.side_angle_degrees.to_radians(),
            side_gap: settings.side_gap,
            center_tolerance: settings.center_tolerance,
            side_tolerance: settings.side_tolerance,
        }
    }

    /// Where the panel for a slot is placed
    pub fn expected_position(&self, slot: SurfaceSlot) -> Vec3 {
        let half = self.width * 0.5;
        match slot {
            SurfaceSlot::Center => self.center,
            SurfaceSlot::Left => self.center + Vec3::new(half + self.side_gap, 0.0, -half),
            SurfaceSlot::Right => self.center + Vec3::new(-(half + self.side_gap), 0.0, -half),
        }
    }

    /// Rotation about the vertical axis; every panel faces the audience
    pub fn rotation_y(&self, slot: SurfaceSlot) -> f32 {
        match slot {
            SurfaceSlot::Center => PI,
            SurfaceSlot::Left => PI + self.side_angle,
            SurfaceSlot::Right => PI - self.side_angle,
        }
    }

    pub fn tolerance(&self, slot: SurfaceSlot) -> f32 {
        match slot {
            SurfaceSlot::Center => self.center_tolerance,
            SurfaceSlot::Left | SurfaceSlot::Right => self.side_tolerance,
        }
    }

    /// Discovery targets for the three panels
    pub fn expected_surfaces(&self) -> [ExpectedSurface; 3] {
        SurfaceSlot::ALL.map(|slot| ExpectedSurface {
            slot,
            position: self.expected_position(slot),
            tolerance: self.tolerance(slot),
        })
    }

    /// Add the three cover planes to a scene
    pub fn populate(&self, scene: &mut Scene) -> [(SurfaceSlot, NodeHandle); 3] {
        let placed = SurfaceSlot::ALL.map(|slot| {
            let handle = scene.add_mesh(PLANE_GEOMETRY, self.expected_position(slot), self.rotation_y(slot));
            (slot, handle)
        });
        tracing::info!("Cover planes added ({}x{})", self.width, self.height);
        placed
    }
}

impl Default for ScreenLayout {
    fn default() -> Self {
        Self::from_settings(&ScreenSettings::default())
    }
}
