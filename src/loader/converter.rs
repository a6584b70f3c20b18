use std::path::{
  Path,
  PathBuf,
};

use crate::config::HalaMeshLoadOptions;
use crate::error::HalaMeshError;
use super::{
  HalaGltfConverter,
  HalaGltfFilter,
  HalaMeshFormat,
};

/// The material definition file written next to a converted mesh.
pub const MATERIAL_FILE_NAME: &str = "material.mtl";
/// The merged texture written next to a converted mesh.
pub const MERGED_TEXTURE_FILE_NAME: &str = "material_0.png";

/// The files produced by one format conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct HalaConversion {
  /// The natively supported file to load.
  pub converted_path: PathBuf,
  /// The filtered glTF document, when the filter ran.
  pub filtered_path: Option<PathBuf>,
  /// The material definition file.
  pub material_path: PathBuf,
  /// The merged texture, when one was produced.
  pub texture_path: Option<PathBuf>,
}

/// A converter from a foreign format to a natively supported one.
pub trait HalaFormatConverter {
  /// Whether this converter reads the given format.
  fn can_convert(&self, format: &HalaMeshFormat) -> bool;

  /// Convert the file at `path` into a natively supported sibling file.
  /// param path: The source file path.
  /// return: The produced files.
  fn convert(&self, path: &Path) -> Result<HalaConversion, HalaMeshError>;
}

/// The registered converters, asked in order.
fn converters() -> Vec<Box<dyn HalaFormatConverter>> {
  vec![Box::new(HalaGltfConverter)]
}

/// Convert a foreign format file, filtering glTF documents first.
/// param path: The source file path.
/// param format: The classified format of `path`.
/// param options: The load options carrying the exclusion lists.
/// return: The produced files.
pub fn convert(path: &Path, format: &HalaMeshFormat, options: &HalaMeshLoadOptions) -> Result<HalaConversion, HalaMeshError> {
  let filter = HalaGltfFilter::new(
    options.remove_mesh_part_names.as_deref(),
    options.remove_unsupported_buffers.as_deref(),
  );
  let filtered_path = match format {
    HalaMeshFormat::Gltf => Some(filter.filter_file(path)?),
    HalaMeshFormat::Glb => {
      if filter.remove_mesh_part_names.is_some() || filter.remove_unsupported_buffers.is_some() {
        log::warn!("Filtering is not applied to binary glTF \"{}\".", path.to_string_lossy());
      }
      None
    },
    _ => None,
  };
  let source = filtered_path.as_deref().unwrap_or(path);

  let converter = converters().into_iter()
    .find(|converter| converter.can_convert(format))
    .ok_or(HalaMeshError::conversion(&format!("No converter can read \"{}\".", path.to_string_lossy()), None))?;

  log::info!("Converting \"{}\" to a natively supported format.", source.to_string_lossy());
  let mut conversion = converter.convert(source)?;
  conversion.filtered_path = filtered_path;
  log::info!("Converted \"{}\" to \"{}\".", path.to_string_lossy(), conversion.converted_path.to_string_lossy());
  Ok(conversion)
}
