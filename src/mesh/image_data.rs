use std::path::{
  Path,
  PathBuf,
};

use image::GenericImageView;

use crate::error::{
  HalaMeshError,
  HalaMeshErrorKind,
};

/// The merged material texture produced by a format conversion.
/// Material tiles are square and packed left to right.
pub struct HalaMaterialImage {
  pub path: PathBuf,
  pub width: u32,
  pub height: u32,
  pub data: Vec<u8>,
}

impl std::fmt::Debug for HalaMaterialImage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HalaMaterialImage")
      .field("path", &self.path)
      .field("width", &self.width)
      .field("height", &self.height)
      .finish()
  }
}

/// The implementation of the material image.
impl HalaMaterialImage {
  /// Load the image with the given file path as RGBA8.
  /// param path: The file path.
  /// return: The result.
  pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, HalaMeshError> {
    let path = path.as_ref();

    let img = image::open(path)
      .map_err(|e| HalaMeshError::new(
        HalaMeshErrorKind::ConversionError,
        &format!("Failed to open image \"{}\".", path.to_string_lossy()),
        Some(Box::new(e)),
      ))?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
      return Err(HalaMeshError::conversion(&format!("Image \"{}\" is empty.", path.to_string_lossy()), None));
    }

    Ok(Self {
      path: path.to_path_buf(),
      width,
      height,
      data: img.into_rgba8().into_raw(),
    })
  }

  /// The number of material tiles packed into the image.
  /// return: width / height rounded down, at least 1.
  pub fn material_count(&self) -> u32 {
    let count = self.width / self.height;
    if count == 0 {
      log::warn!(
        "Material image \"{}\" is taller than wide ({}x{}), assuming one material.",
        self.path.to_string_lossy(), self.width, self.height,
      );
    }
    count.max(1)
  }
}
