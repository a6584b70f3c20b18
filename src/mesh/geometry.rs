use glam::{
  Vec2,
  Vec3,
};

/// The UV face index of a corner whose face line gave no UV index.
pub const HALA_MISSING_UV_INDEX: i32 = -1;

/// Texture coordinates with their own face indexing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HalaUvMapping {
  pub coordinates: Vec<Vec2>,
  pub faces: Vec<[i32; 3]>,
}

/// The raw geometry read from a natively supported file, before normalization.
/// Face indices are 0-based and valid for `vertices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HalaGeometry {
  pub vertices: Vec<Vec3>,
  pub faces: Vec<[u32; 3]>,
  pub uv: Option<HalaUvMapping>,
}

/// The implementation of the geometry.
impl HalaGeometry {
  pub fn num_of_triangles(&self) -> usize {
    self.faces.len()
  }

  /// Check every face index against the vertex count.
  /// return: The first out of range index, if any.
  pub fn find_invalid_face_index(&self) -> Option<u32> {
    let num_of_vertices = self.vertices.len() as u64;
    self.faces.iter()
      .flat_map(|face| face.iter())
      .find(|&&index| index as u64 >= num_of_vertices)
      .copied()
  }
}

/// Fan-triangulate a polygon given by its corner list.
/// param corners: The polygon corners in winding order.
/// return: The triangles (corner 0, i, i + 1).
pub fn triangulate_fan<T: Copy>(corners: &[T]) -> Vec<[T; 3]> {
  if corners.len() < 3 {
    return Vec::new();
  }
  (1..corners.len() - 1)
    .map(|i| [corners[0], corners[i], corners[i + 1]])
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fan_of_quad() {
    assert_eq!(triangulate_fan(&[0, 1, 2, 3]), vec![[0, 1, 2], [0, 2, 3]]);
  }

  #[test]
  fn fan_of_degenerate_polygon_is_empty() {
    assert!(triangulate_fan(&[0, 1]).is_empty());
  }

  #[test]
  fn invalid_face_index_is_found() {
    let geometry = HalaGeometry {
      vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
      faces: vec![[0, 1, 2], [0, 2, 3]],
      uv: None,
    };
    assert_eq!(geometry.find_invalid_face_index(), Some(3));
  }
}
