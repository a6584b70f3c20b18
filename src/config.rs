use std::path::{
  Path,
  PathBuf,
};

use serde::{
  Deserialize,
  Serialize,
};

use crate::device::HalaComputeDevice;
use crate::error::HalaMeshError;

fn default_as_one() -> f32 {
  1.0
}

/// The options of one mesh load.
/// An absent exclusion list skips its glTF filtering step entirely,
/// while an empty list still runs the step and removes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalaMeshLoadOptions {
  #[serde(default)]
  pub device: HalaComputeDevice,
  #[serde(default = "default_as_one")]
  pub target_scale: f32,
  #[serde(default)]
  pub mesh_dy: f32,
  #[serde(default)]
  pub remove_mesh_part_names: Option<Vec<String>>,
  #[serde(default)]
  pub remove_unsupported_buffers: Option<Vec<String>>,
  #[serde(default)]
  pub intermediate_dir: Option<PathBuf>,
}

impl Default for HalaMeshLoadOptions {
  fn default() -> Self {
    Self {
      device: HalaComputeDevice::Cpu,
      target_scale: 1.0,
      mesh_dy: 0.0,
      remove_mesh_part_names: None,
      remove_unsupported_buffers: None,
      intermediate_dir: None,
    }
  }
}

/// The implementation of the load options.
impl HalaMeshLoadOptions {
  /// Parse the options from a JSON string.
  /// param json: The JSON text.
  /// return: The validated options.
  pub fn from_json_str(json: &str) -> Result<Self, HalaMeshError> {
    let options: Self = serde_json::from_str(json)?;
    options.validate()?;
    Ok(options)
  }

  /// Parse the options from a JSON file.
  /// param path: The file path.
  /// return: The validated options.
  pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, HalaMeshError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
      .map_err(|err| HalaMeshError::io("Read", path, err))?;
    Self::from_json_str(&json)
  }

  /// Check the numeric parameters.
  /// return: The result.
  pub fn validate(&self) -> Result<(), HalaMeshError> {
    if !self.target_scale.is_finite() || self.target_scale <= 0.0 {
      return Err(HalaMeshError::invalid_argument(
        &format!("Target scale must be a positive number, got {}.", self.target_scale),
      ));
    }
    if !self.mesh_dy.is_finite() {
      return Err(HalaMeshError::invalid_argument(
        &format!("Mesh dy must be finite, got {}.", self.mesh_dy),
      ));
    }
    Ok(())
  }
}
