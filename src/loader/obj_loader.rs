use std::path::Path;

use glam::{
  Vec2,
  Vec3,
};

use crate::error::{
  HalaMeshError,
  HalaMeshErrorKind,
};
use crate::mesh::geometry::{
  HalaGeometry,
  HalaUvMapping,
  HALA_MISSING_UV_INDEX,
  triangulate_fan,
};
use crate::mesh::uv::log_uv_summary;
use super::HalaMeshReader;

/// The Wavefront OBJ loader.
/// The file text is parsed directly so UV indexing stays exactly as authored.
pub struct HalaObjLoader;

/// One corner of a face line, 0-based.
#[derive(Debug, Clone, Copy)]
struct _FaceCorner {
  vertex: usize,
  uv: Option<usize>,
}

/// A strategy of the auxiliary library load.
type HalaObjLoadStrategy = fn(&Path) -> Result<Vec<tobj::Model>, HalaMeshError>;

/// Tried in order, the first success wins.
const LIBRARY_STRATEGIES: [(&str, HalaObjLoadStrategy); 2] = [
  ("with materials", load_with_materials),
  ("without materials", load_without_materials),
];

impl HalaMeshReader for HalaObjLoader {
  fn read(path: &Path) -> Result<HalaGeometry, HalaMeshError> {
    let text = std::fs::read_to_string(path)
      .map_err(|err| HalaMeshError::io("Read", path, err))?;
    let geometry = Self::parse(&text)?;

    Self::cross_check(path, &geometry);

    match geometry.uv.as_ref() {
      Some(mapping) => log_uv_summary(mapping),
      None => log::info!("No UV coordinates found in OBJ file \"{}\".", path.to_string_lossy()),
    }
    Ok(geometry)
  }

  fn supported_extensions() -> &'static [&'static str] {
    &["obj"]
  }
}

/// The implementation of the OBJ loader.
impl HalaObjLoader {
  /// Parse OBJ text. Only `v`, `vt` and `f` records are consumed.
  /// param text: The file content.
  /// return: The geometry.
  pub fn parse(text: &str) -> Result<HalaGeometry, HalaMeshError> {
    let mut vertices = Vec::new();
    let mut uvs = Vec::new();
    let mut faces = Vec::new();
    let mut uv_faces = Vec::new();
    let mut num_of_faces_with_uv = 0usize;
    let mut num_of_faces_without_uv = 0usize;

    for (line_idx, line) in text.lines().enumerate() {
      let line_no = line_idx + 1;
      let mut it = line.split_whitespace();
      match it.next() {
        Some("v") => {
          let x = parse_float(it.next(), line_no, "vertex")?;
          let y = parse_float(it.next(), line_no, "vertex")?;
          let z = parse_float(it.next(), line_no, "vertex")?;
          vertices.push(Vec3::new(x, y, z));
        },
        Some("vt") => {
          let u = parse_float(it.next(), line_no, "texture coordinate")?;
          let v = match it.next() {
            Some(token) => parse_float(Some(token), line_no, "texture coordinate")?,
            None => 0.0,
          };
          uvs.push(Vec2::new(u, v));
        },
        Some("f") => {
          let corners = it
            .map(|token| parse_corner(token, vertices.len(), uvs.len(), line_no))
            .collect::<Result<Vec<_>, _>>()?;
          if corners.len() < 3 {
            return Err(HalaMeshError::malformed(&format!("Face at line {} has fewer than 3 vertices.", line_no)));
          }
          if corners.iter().any(|corner| corner.uv.is_some()) {
            num_of_faces_with_uv += 1;
          }
          if corners.iter().any(|corner| corner.uv.is_none()) {
            num_of_faces_without_uv += 1;
          }

          for [c0, c1, c2] in triangulate_fan(&corners) {
            faces.push([
              to_u32(c0.vertex, line_no)?,
              to_u32(c1.vertex, line_no)?,
              to_u32(c2.vertex, line_no)?,
            ]);
            uv_faces.push([
              to_uv_index(c0.uv, line_no)?,
              to_uv_index(c1.uv, line_no)?,
              to_uv_index(c2.uv, line_no)?,
            ]);
          }
        },
        _ => {},
      }
    }

    if let Some(face) = faces.iter().find(|face| face.iter().any(|&i| i as usize >= vertices.len())) {
      return Err(HalaMeshError::malformed(
        &format!("Face {:?} references a vertex out of range (0..{}).", face, vertices.len()),
      ));
    }
    if let Some(face) = uv_faces.iter().find(|face| face.iter().any(|&i| i >= 0 && i as usize >= uvs.len())) {
      return Err(HalaMeshError::malformed(
        &format!("UV face {:?} references a texture coordinate out of range (0..{}).", face, uvs.len()),
      ));
    }

    let uv = if num_of_faces_with_uv > 0 {
      if num_of_faces_without_uv > 0 {
        log::warn!(
          "{} faces have no UV index on some corners, their UV face indices are set to {}.",
          num_of_faces_without_uv, HALA_MISSING_UV_INDEX,
        );
      }
      Some(HalaUvMapping {
        coordinates: uvs,
        faces: uv_faces,
      })
    } else {
      None
    };

    Ok(HalaGeometry {
      vertices,
      faces,
      uv,
    })
  }

  /// Load the file again through tobj and compare with the direct parse.
  /// tobj reads the same records, so this is a consistency check only; the direct parse is never replaced.
  /// param path: The OBJ file path.
  /// param geometry: The directly parsed geometry.
  fn cross_check(path: &Path, geometry: &HalaGeometry) {
    let (strategy, models) = match load_with_strategies(path) {
      Ok(loaded) => loaded,
      Err(err) => {
        log::warn!("Library load of \"{}\" failed, keeping the direct parse: {}", path.to_string_lossy(), err);
        return;
      },
    };

    let num_of_triangles: usize = models.iter().map(|model| model.mesh.indices.len() / 3).sum();
    if num_of_triangles != geometry.num_of_triangles() {
      log::warn!(
        "Library load {} of \"{}\" found {} triangles, direct parse found {}.",
        strategy, path.to_string_lossy(), num_of_triangles, geometry.num_of_triangles(),
      );
    } else {
      log::debug!("Library load {} of \"{}\" agrees on {} triangles.", strategy, path.to_string_lossy(), num_of_triangles);
    }
  }
}

fn parse_float(token: Option<&str>, line_no: usize, what: &str) -> Result<f32, HalaMeshError> {
  let token = token
    .ok_or(HalaMeshError::malformed(&format!("Missing {} component at line {}.", what, line_no)))?;
  token.parse::<f32>()
    .map_err(|err| HalaMeshError::new(
      HalaMeshErrorKind::MalformedAsset,
      &format!("Invalid {} component \"{}\" at line {}.", what, token, line_no),
      Some(Box::new(err)),
    ))
}

/// Resolve a 1-based or negative relative OBJ index to 0-based.
fn resolve_index(token: &str, num_of_defined: usize, line_no: usize) -> Result<usize, HalaMeshError> {
  let index = token.parse::<i64>()
    .map_err(|err| HalaMeshError::new(
      HalaMeshErrorKind::MalformedAsset,
      &format!("Invalid face index \"{}\" at line {}.", token, line_no),
      Some(Box::new(err)),
    ))?;
  let resolved = if index > 0 {
    index - 1
  } else {
    num_of_defined as i64 + index
  };
  if index == 0 || resolved < 0 {
    return Err(HalaMeshError::malformed(&format!("Face index {} at line {} is out of range.", index, line_no)));
  }
  Ok(resolved as usize)
}

/// Parse "v", "v/vt", "v//vn" or "v/vt/vn"; normals are ignored.
fn parse_corner(token: &str, num_of_vertices: usize, num_of_uvs: usize, line_no: usize) -> Result<_FaceCorner, HalaMeshError> {
  let mut parts = token.split('/');
  let vertex = match parts.next() {
    Some(part) if !part.is_empty() => resolve_index(part, num_of_vertices, line_no)?,
    _ => return Err(HalaMeshError::malformed(&format!("Face corner \"{}\" at line {} has no vertex index.", token, line_no))),
  };
  let uv = match parts.next() {
    Some(part) if !part.is_empty() => Some(resolve_index(part, num_of_uvs, line_no)?),
    _ => None,
  };
  Ok(_FaceCorner { vertex, uv })
}

fn to_u32(index: usize, line_no: usize) -> Result<u32, HalaMeshError> {
  u32::try_from(index)
    .map_err(|_| HalaMeshError::malformed(&format!("Face index {} at line {} is too large.", index, line_no)))
}

fn to_uv_index(index: Option<usize>, line_no: usize) -> Result<i32, HalaMeshError> {
  match index {
    Some(index) => i32::try_from(index)
      .map_err(|_| HalaMeshError::malformed(&format!("UV index {} at line {} is too large.", index, line_no))),
    None => Ok(HALA_MISSING_UV_INDEX),
  }
}

fn library_load_options() -> tobj::LoadOptions {
  tobj::LoadOptions {
    single_index: false,
    triangulate: true,
    ignore_points: true,
    ignore_lines: true,
    ..Default::default()
  }
}

fn load_with_materials(path: &Path) -> Result<Vec<tobj::Model>, HalaMeshError> {
  let (models, materials) = tobj::load_obj(path, &library_load_options())
    .map_err(|err| HalaMeshError::new(HalaMeshErrorKind::MalformedAsset, "Load OBJ geometry failed.", Some(Box::new(err))))?;
  let materials = materials
    .map_err(|err| HalaMeshError::new(HalaMeshErrorKind::MalformedAsset, "Load OBJ materials failed.", Some(Box::new(err))))?;
  log::debug!("Library load found {} models and {} materials.", models.len(), materials.len());
  Ok(models)
}

fn load_without_materials(path: &Path) -> Result<Vec<tobj::Model>, HalaMeshError> {
  let (models, _) = tobj::load_obj(path, &library_load_options())
    .map_err(|err| HalaMeshError::new(HalaMeshErrorKind::MalformedAsset, "Load OBJ geometry failed.", Some(Box::new(err))))?;
  log::debug!("Library load found {} models.", models.len());
  Ok(models)
}

/// Run the library strategies in order.
/// return: The name of the first successful strategy and its models.
fn load_with_strategies(path: &Path) -> Result<(&'static str, Vec<tobj::Model>), HalaMeshError> {
  let mut last_err = None;
  for (name, strategy) in LIBRARY_STRATEGIES.iter() {
    match strategy(path) {
      Ok(models) => return Ok((*name, models)),
      Err(err) => {
        log::debug!("Library load {} failed: {}", name, err);
        last_err = Some(err);
      },
    }
  }
  Err(last_err.unwrap_or_else(|| HalaMeshError::malformed("No library load strategy.")))
}

#[cfg(test)]
mod tests {
  use super::*;

  const TRIANGLE_WITH_UV: &str = "\
# one triangle
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

  #[test]
  fn triangle_with_uv() {
    let geometry = HalaObjLoader::parse(TRIANGLE_WITH_UV).unwrap();
    assert_eq!(geometry.vertices.len(), 3);
    assert_eq!(geometry.faces, vec![[0, 1, 2]]);
    let uv = geometry.uv.unwrap();
    assert_eq!(uv.coordinates, vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)]);
    assert_eq!(uv.faces, vec![[0, 1, 2]]);
  }

  #[test]
  fn no_uv_records() {
    let geometry = HalaObjLoader::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
    assert_eq!(geometry.faces, vec![[0, 1, 2]]);
    assert!(geometry.uv.is_none());
  }

  #[test]
  fn uv_records_without_face_indices_are_absent() {
    let geometry = HalaObjLoader::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1//1 2//1 3//1\n").unwrap();
    assert!(geometry.uv.is_none());
  }

  #[test]
  fn quads_are_fan_triangulated() {
    let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\nf 1/1 2/2 3/3 4/4\n";
    let geometry = HalaObjLoader::parse(text).unwrap();
    assert_eq!(geometry.faces, vec![[0, 1, 2], [0, 2, 3]]);
    assert_eq!(geometry.uv.unwrap().faces, vec![[0, 1, 2], [0, 2, 3]]);
  }

  #[test]
  fn relative_indices_are_resolved() {
    let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf -3/-3 -2/-2 -1/-1\n";
    let geometry = HalaObjLoader::parse(text).unwrap();
    assert_eq!(geometry.faces, vec![[0, 1, 2]]);
    assert_eq!(geometry.uv.unwrap().faces, vec![[0, 1, 2]]);
  }

  #[test]
  fn partial_uv_keeps_faces_parallel() {
    let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\nf 2 4 3\n";
    let geometry = HalaObjLoader::parse(text).unwrap();
    let uv = geometry.uv.unwrap();
    assert_eq!(uv.faces.len(), geometry.faces.len());
    assert_eq!(uv.faces[1], [HALA_MISSING_UV_INDEX; 3]);
  }

  #[test]
  fn out_of_range_vertex_is_malformed() {
    let err = HalaObjLoader::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n").unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);
  }

  #[test]
  fn out_of_range_uv_is_malformed() {
    let err = HalaObjLoader::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/2 3/1\n").unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);
  }

  #[test]
  fn zero_index_is_malformed() {
    let err = HalaObjLoader::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);
  }

  #[test]
  fn short_face_is_malformed() {
    let err = HalaObjLoader::parse("v 0 0 0\nv 1 0 0\nf 1 2\n").unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);
  }

  #[test]
  fn bad_float_is_malformed() {
    let err = HalaObjLoader::parse("v 0 zero 0\n").unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);
  }

  fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("hala_obj_loader_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  #[test]
  fn missing_material_library_falls_back() {
    let dir = scratch_dir("missing_mtl");
    let path = dir.join("triangle.obj");
    std::fs::write(&path, format!("mtllib missing.mtl\nusemtl paint\n{}", TRIANGLE_WITH_UV)).unwrap();

    assert!(load_with_materials(&path).is_err());
    let (strategy, models) = load_with_strategies(&path).unwrap();
    assert_eq!(strategy, "without materials");
    assert_eq!(models.iter().map(|model| model.mesh.indices.len() / 3).sum::<usize>(), 1);

    let geometry = HalaObjLoader::read(&path).unwrap();
    assert_eq!(geometry.faces, vec![[0, 1, 2]]);
    let uv = geometry.uv.unwrap();
    assert_eq!(uv.coordinates, vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)]);
    assert_eq!(uv.faces, vec![[0, 1, 2]]);

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn material_aware_load_wins_when_it_succeeds() {
    let dir = scratch_dir("with_mtl");
    let path = dir.join("triangle.obj");
    std::fs::write(dir.join("paint.mtl"), "newmtl paint\nKd 1 0 0\n").unwrap();
    std::fs::write(&path, format!("mtllib paint.mtl\nusemtl paint\n{}", TRIANGLE_WITH_UV)).unwrap();

    let (strategy, _) = load_with_strategies(&path).unwrap();
    assert_eq!(strategy, "with materials");

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn unreadable_file_fails_every_strategy() {
    let err = load_with_strategies(Path::new("/nonexistent/triangle.obj")).unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);
  }
}
