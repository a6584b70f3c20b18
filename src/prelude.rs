pub use crate::error::{
  HalaMeshError,
  HalaMeshErrorKind,
};
pub use crate::config::HalaMeshLoadOptions;
pub use crate::device::HalaComputeDevice;
pub use crate::mesh::{
  HalaMeshAsset,
  HalaMaterialImage,
  HalaNormalization,
};
pub use crate::loader::{
  HalaGltfFilter,
  HalaMeshFormat,
  HalaRelocationReport,
};
