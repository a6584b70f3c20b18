pub mod geometry;
pub mod uv;
pub mod normalizer;
pub mod image_data;
pub mod asset;

pub use geometry::{
  HalaGeometry,
  HalaUvMapping,
  HALA_MISSING_UV_INDEX,
};
pub use uv::HalaUvBounds;
pub use normalizer::HalaNormalization;
pub use image_data::HalaMaterialImage;
pub use asset::HalaMeshAsset;
