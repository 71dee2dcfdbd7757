//! ScreenX Cinema Library
//!
//! Media core for a walkable three-panel cinema: finds the projection planes in
//! a loaded scene, routes a 5.1 audio track into positional sound sources and
//! keeps a muted stitched video and the multichannel audio in lockstep.

pub mod audio;
pub mod control;
pub mod media;
pub mod scene;
pub mod session;
pub mod settings;
pub mod status;
pub mod sync;
pub mod telemetry;
pub mod video;

pub use audio::{AudioBackend, ChannelRole, SoftwareAudioContext, SpatialAudioGraph, SpatialPositions};
pub use control::{ChapterTable, ControlSurface, KeyInput, TransportCommand};
pub use media::{FileMediaFactory, MediaElement, MediaEvent, MediaFactory, MediaKind, MediaPair};
pub use scene::{PlaneDiscovery, Scene, SceneGraph, ScreenLayout, SurfaceSlot};
pub use session::CinemaSession;
pub use settings::{CinemaSettings, SettingsError};
pub use status::StatusSnapshot;
pub use sync::{PlaybackSynchronizer, ReadinessOutcome, ReadinessTracker};
pub use video::{StitchedVideoTextures, TextureRegion};
