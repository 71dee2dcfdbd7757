//! Scene collaborator, screen layout and projection plane discovery

mod discovery;
mod graph;
mod layout;

pub use discovery::{ExpectedSurface, FoundPlanes, PlaneDiscovery, SurfaceSlot};
pub use graph::{NodeHandle, Scene, SceneError, SceneGraph, SceneNodeInfo};
pub use layout::{ScreenLayout, PLANE_GEOMETRY};
