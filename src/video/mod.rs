//! Video texture regions for the three projection surfaces

mod texture;

pub use texture::{StitchedVideoTextures, TextureBinding, TextureRegion};
