use std::str::FromStr;

use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer,
};

use crate::error::HalaMeshError;

/// The compute device the loaded arrays are placed on.
/// The placement is chosen once when an asset is created and never migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HalaComputeDevice {
  #[default]
  Cpu,
  Accelerator {
    index: u32,
  },
}

/// The implementation of the compute device.
impl HalaComputeDevice {
  pub fn is_cpu(&self) -> bool {
    matches!(self, HalaComputeDevice::Cpu)
  }
}

impl FromStr for HalaComputeDevice {
  type Err = HalaMeshError;

  /// Parse "cpu", "cuda", "cuda:N" or "gpu:N".
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim().to_ascii_lowercase();
    if s == "cpu" {
      return Ok(HalaComputeDevice::Cpu);
    }
    let (prefix, index) = match s.split_once(':') {
      Some((prefix, index)) => (prefix, Some(index)),
      None => (s.as_str(), None),
    };
    if prefix != "cuda" && prefix != "gpu" {
      return Err(HalaMeshError::invalid_argument(&format!("Unknown compute device \"{}\".", s)));
    }
    let index = match index {
      Some(index) => index.parse::<u32>()
        .map_err(|err| HalaMeshError::new(
          crate::error::HalaMeshErrorKind::InvalidArgument,
          &format!("Invalid device index in \"{}\".", s),
          Some(Box::new(err)),
        ))?,
      None => 0,
    };
    Ok(HalaComputeDevice::Accelerator { index })
  }
}

impl std::fmt::Display for HalaComputeDevice {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      HalaComputeDevice::Cpu => write!(f, "cpu"),
      HalaComputeDevice::Accelerator { index } => write!(f, "cuda:{}", index),
    }
  }
}

impl Serialize for HalaComputeDevice {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for HalaComputeDevice {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(|err: HalaMeshError| serde::de::Error::custom(err.message().to_owned()))
  }
}
