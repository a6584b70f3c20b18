use std::path::{
  Path,
  PathBuf,
};

use glam::{
  Vec2,
  Vec3,
};

use crate::config::HalaMeshLoadOptions;
use crate::device::HalaComputeDevice;
use crate::error::HalaMeshError;
use crate::loader::{
  convert,
  read_geometry,
  relocate_artifacts,
  HalaConversion,
  HalaMeshFormat,
  HalaRelocationReport,
};
use super::geometry::HalaGeometry;
use super::image_data::HalaMaterialImage;
use super::normalizer::{
  normalize_vertices,
  HalaNormalization,
};
use super::uv::is_valid_uv_mapping;

/// A loaded, normalized mesh ready for texture synthesis.
/// UV coordinates are indexed independently of vertices through `uv_faces`.
pub struct HalaMeshAsset {
  pub vertices: Vec<Vec3>,
  pub faces: Vec<[u32; 3]>,
  pub uv_coordinates: Option<Vec<Vec2>>,
  pub uv_faces: Option<Vec<[i32; 3]>>,
  pub source_path: PathBuf,
  pub normalization: HalaNormalization,
  pub material_image: Option<HalaMaterialImage>,
  pub material_count: Option<u32>,
  pub device: HalaComputeDevice,
  pub relocation: Option<HalaRelocationReport>,
}

/// The Drop implementation of the mesh asset.
impl Drop for HalaMeshAsset {
  fn drop(&mut self) {
    log::debug!("A HalaMeshAsset dropped.");
  }
}

/// The implementation of the mesh asset.
impl HalaMeshAsset {
  /// Load, convert when needed, and normalize a mesh file.
  /// param path: The mesh file path.
  /// param options: The load options.
  /// return: The normalized asset.
  pub fn new<P: AsRef<Path>>(path: P, options: &HalaMeshLoadOptions) -> Result<Self, HalaMeshError> {
    options.validate()?;
    let path = path.as_ref();

    let format = HalaMeshFormat::from_path(path)?;
    let conversion = if format.is_native() {
      None
    } else {
      Some(convert(path, &format, options)?)
    };
    let load_path = conversion.as_ref()
      .map_or(path, |conversion| conversion.converted_path.as_path())
      .to_path_buf();

    let geometry = read_geometry(&load_path)?;
    let (material_image, material_count) = match conversion.as_ref() {
      Some(conversion) => Self::load_material_image(conversion)?,
      None => (None, None),
    };
    let source_path = std::fs::canonicalize(&load_path)
      .map_err(|err| HalaMeshError::io("Resolve", &load_path, err))?;

    let mut asset = Self::from_geometry(geometry, source_path, options)?;
    asset.material_image = material_image;
    asset.material_count = material_count;

    if let (Some(conversion), Some(intermediate_dir)) = (conversion.as_ref(), options.intermediate_dir.as_ref()) {
      let report = relocate_artifacts(conversion, intermediate_dir)?;
      if let Some(image) = asset.material_image.as_mut() {
        if let Some(destination) = report.destination_of(&image.path) {
          image.path = destination.to_path_buf();
        }
      }
      asset.relocation = Some(report);
    }

    log::debug!("A HalaMeshAsset created.");
    Ok(asset)
  }

  /// Build a normalized asset from already read geometry.
  /// param geometry: The raw geometry.
  /// param source_path: The file the geometry was read from.
  /// param options: The load options.
  /// return: The normalized asset.
  pub fn from_geometry(geometry: HalaGeometry, source_path: PathBuf, options: &HalaMeshLoadOptions) -> Result<Self, HalaMeshError> {
    options.validate()?;
    if let Some(index) = geometry.find_invalid_face_index() {
      return Err(HalaMeshError::malformed(
        &format!("Face index {} out of range (0..{}) in \"{}\".", index, geometry.vertices.len(), source_path.to_string_lossy()),
      ));
    }

    let HalaGeometry { mut vertices, faces, uv } = geometry;
    let normalization = normalize_vertices(&mut vertices, options.target_scale, options.mesh_dy)?;
    let (uv_coordinates, uv_faces) = match uv {
      Some(uv) => (Some(uv.coordinates), Some(uv.faces)),
      None => (None, None),
    };

    Ok(Self {
      vertices,
      faces,
      uv_coordinates,
      uv_faces,
      source_path,
      normalization,
      material_image: None,
      material_count: None,
      device: options.device,
      relocation: None,
    })
  }

  /// Check whether the UV data is usable downstream.
  /// return: True if UVs and UV faces are present, UVs are not empty and no UV index is negative.
  pub fn has_valid_uv_mapping(&self) -> bool {
    is_valid_uv_mapping(self.uv_coordinates.as_deref(), self.uv_faces.as_deref())
  }

  /// The vertex mean before normalization.
  pub fn original_center(&self) -> Vec3 {
    self.normalization.center
  }

  /// The maximum recentered vertex norm before normalization.
  pub fn original_scale(&self) -> f32 {
    self.normalization.scale
  }

  /// Load the merged texture a conversion produced, if any.
  fn load_material_image(conversion: &HalaConversion) -> Result<(Option<HalaMaterialImage>, Option<u32>), HalaMeshError> {
    match conversion.texture_path.as_ref() {
      Some(texture_path) if texture_path.exists() => {
        let image = HalaMaterialImage::new_with_file(texture_path)?;
        let material_count = image.material_count();
        log::info!("Loaded merged texture \"{}\" with {} materials.", texture_path.to_string_lossy(), material_count);
        Ok((Some(image), Some(material_count)))
      },
      _ => Ok((None, Some(1))),
    }
  }
}
