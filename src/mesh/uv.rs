use glam::Vec2;

use super::geometry::HalaUvMapping;

/// The 2D bounds of a set of texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalaUvBounds {
  pub min: Vec2,
  pub max: Vec2,
}

/// The implementation of the UV bounds.
impl HalaUvBounds {
  /// Compute the bounds of the given coordinates.
  /// param coordinates: The UV coordinates.
  /// return: The bounds, none if the slice is empty.
  pub fn from_coordinates(coordinates: &[Vec2]) -> Option<Self> {
    let first = *coordinates.first()?;
    let (min, max) = coordinates.iter()
      .fold((first, first), |(min, max), uv| (min.min(*uv), max.max(*uv)));
    Some(Self { min, max })
  }
}

/// Check whether UV data is structurally usable downstream.
/// Never fails, a violation only yields false.
/// param coordinates: The UV coordinates.
/// param faces: The UV face indices.
/// return: True if both are present, the coordinates are not empty and no index is negative.
pub fn is_valid_uv_mapping(coordinates: Option<&[Vec2]>, faces: Option<&[[i32; 3]]>) -> bool {
  let (coordinates, faces) = match (coordinates, faces) {
    (Some(coordinates), Some(faces)) => (coordinates, faces),
    _ => {
      log::debug!("No UV coordinates found.");
      return false;
    },
  };
  if coordinates.is_empty() {
    log::debug!("Empty UV vertex array.");
    return false;
  }
  let min_index = faces.iter().flat_map(|face| face.iter()).min().copied();
  if matches!(min_index, Some(index) if index < 0) {
    log::debug!("Invalid UV face indices found.");
    return false;
  }

  log::debug!("Valid UV mapping found: {} UV vertices, {} UV faces.", coordinates.len(), faces.len());
  true
}

/// Log the UV bounds, the UV index range and the first samples.
/// param mapping: The UV mapping.
pub fn log_uv_summary(mapping: &HalaUvMapping) {
  log::info!("Loaded {} UV vertices and {} UV faces.", mapping.coordinates.len(), mapping.faces.len());
  if let Some(bounds) = HalaUvBounds::from_coordinates(&mapping.coordinates) {
    log::info!("UV bounds X: {:.4} to {:.4}", bounds.min.x, bounds.max.x);
    log::info!("UV bounds Y: {:.4} to {:.4}", bounds.min.y, bounds.max.y);
  }
  let indices = mapping.faces.iter().flat_map(|face| face.iter());
  if let (Some(min), Some(max)) = (indices.clone().min(), indices.max()) {
    log::info!("UV face index range: {} to {}", min, max);
  }
  for (i, uv) in mapping.coordinates.iter().take(5).enumerate() {
    log::debug!("UV[{}]: ({:.6}, {:.6})", i, uv.x, uv.y);
  }
}
