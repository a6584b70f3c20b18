use glam::{
  DVec3,
  Vec3,
};

use crate::error::HalaMeshError;

/// The transform recorded while normalizing a vertex set.
/// `center` and `scale` are the values before `target_scale` was applied,
/// so `v_original = (v - (0, mesh_dy, 0)) / target_scale * scale + center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalaNormalization {
  pub center: Vec3,
  pub scale: f32,
  pub target_scale: f32,
  pub mesh_dy: f32,
}

/// The implementation of the normalization record.
impl HalaNormalization {
  /// Map a normalized point back to the source frame.
  /// param point: The normalized point.
  /// return: The point in the source frame.
  pub fn invert(&self, point: Vec3) -> Vec3 {
    let unshifted = point - Vec3::new(0.0, self.mesh_dy, 0.0);
    unshifted / self.target_scale * self.scale + self.center
  }
}

/// Recenter the vertices at their mean, scale the farthest one to `target_scale`
/// and lift everything by `mesh_dy` along the second axis.
/// param vertices: The vertices, overwritten in place.
/// param target_scale: The maximum norm after normalization.
/// param mesh_dy: The vertical offset.
/// return: The recorded transform.
pub fn normalize_vertices(vertices: &mut [Vec3], target_scale: f32, mesh_dy: f32) -> Result<HalaNormalization, HalaMeshError> {
  if vertices.is_empty() {
    return Err(HalaMeshError::degenerate("Cannot normalize a mesh without vertices."));
  }
  if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
    return Err(HalaMeshError::malformed(&format!("Vertex {} is not finite: {:?}.", index, vertices[index])));
  }

  let sum = vertices.iter().fold(DVec3::ZERO, |acc, v| acc + v.as_dvec3());
  let center = (sum / vertices.len() as f64).as_vec3();

  for v in vertices.iter_mut() {
    *v -= center;
  }
  let scale = vertices.iter().map(|v| v.length()).fold(0.0f32, f32::max);
  if scale == 0.0 || !scale.is_finite() {
    return Err(HalaMeshError::degenerate(&format!("Mesh scale is {}, all vertices coincide.", scale)));
  }

  for v in vertices.iter_mut() {
    *v = *v / scale * target_scale;
    v.y += mesh_dy;
  }

  log::debug!("Normalized {} vertices: center {:?}, scale {}.", vertices.len(), center, scale);
  Ok(HalaNormalization {
    center,
    scale,
    target_scale,
    mesh_dy,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::HalaMeshErrorKind;

  fn sample() -> Vec<Vec3> {
    vec![
      Vec3::new(1.0, 2.0, 3.0),
      Vec3::new(5.0, 2.0, 3.0),
      Vec3::new(1.0, 8.0, 3.0),
      Vec3::new(1.0, 2.0, -4.0),
    ]
  }

  #[test]
  fn centered_and_scaled() {
    let mut vertices = sample();
    let record = normalize_vertices(&mut vertices, 2.0, 0.0).unwrap();
    let mean = vertices.iter().fold(Vec3::ZERO, |acc, v| acc + *v) / vertices.len() as f32;
    assert!(mean.length() < 1e-5);
    let max_norm = vertices.iter().map(|v| v.length()).fold(0.0f32, f32::max);
    assert!((max_norm - 2.0).abs() < 1e-5);
    assert_eq!(record.center, Vec3::new(2.0, 3.5, 1.25));
    assert!(record.scale > 0.0);
  }

  #[test]
  fn vertical_offset_is_added() {
    let mut plain = sample();
    normalize_vertices(&mut plain, 1.0, 0.0).unwrap();
    let mut lifted = sample();
    normalize_vertices(&mut lifted, 1.0, 0.5).unwrap();
    for (a, b) in plain.iter().zip(lifted.iter()) {
      assert!((b.y - (a.y + 0.5)).abs() < 1e-6);
      assert_eq!(a.x, b.x);
      assert_eq!(a.z, b.z);
    }
  }

  #[test]
  fn invert_restores_source() {
    let source = sample();
    let mut vertices = source.clone();
    let record = normalize_vertices(&mut vertices, 0.7, -0.3).unwrap();
    for (normalized, original) in vertices.iter().zip(source.iter()) {
      assert!((record.invert(*normalized) - *original).length() < 1e-4);
    }
  }

  #[test]
  fn coincident_vertices_are_degenerate() {
    let mut vertices = vec![Vec3::splat(4.0); 5];
    let err = normalize_vertices(&mut vertices, 1.0, 0.0).unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::DegenerateMesh);
  }

  #[test]
  fn non_finite_vertex_is_malformed() {
    let mut vertices = sample();
    vertices[2].x = f32::NAN;
    let err = normalize_vertices(&mut vertices, 1.0, 0.0).unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);

    let mut vertices = sample();
    vertices[0].z = f32::INFINITY;
    let err = normalize_vertices(&mut vertices, 1.0, 0.0).unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);
  }

  #[test]
  fn empty_set_is_degenerate() {
    let err = normalize_vertices(&mut [], 1.0, 0.0).unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::DegenerateMesh);
  }
}
