use std::path::Path;

use glam::Vec3;

use crate::error::{
  HalaMeshError,
  HalaMeshErrorKind,
};
use crate::mesh::geometry::{
  HalaGeometry,
  triangulate_fan,
};
use super::HalaMeshReader;

/// The ASCII Object File Format loader. OFF carries no UVs.
pub struct HalaOffLoader;

impl HalaMeshReader for HalaOffLoader {
  fn read(path: &Path) -> Result<HalaGeometry, HalaMeshError> {
    let text = std::fs::read_to_string(path)
      .map_err(|err| HalaMeshError::io("Read", path, err))?;
    let geometry = Self::parse(&text)?;
    log::debug!(
      "Loaded OFF file \"{}\": {} vertices, {} triangles.",
      path.to_string_lossy(), geometry.vertices.len(), geometry.faces.len(),
    );
    Ok(geometry)
  }

  fn supported_extensions() -> &'static [&'static str] {
    &["off"]
  }
}

/// The whitespace separated fields of one OFF line.
struct _OffFields<'a> {
  fields: std::str::SplitWhitespace<'a>,
}

impl<'a> _OffFields<'a> {
  fn new(line: &'a str) -> Self {
    Self {
      fields: line.split_whitespace(),
    }
  }

  fn next_field(&mut self, what: &str) -> Result<&'a str, HalaMeshError> {
    self.fields.next()
      .ok_or(HalaMeshError::malformed(&format!("Missing {} in OFF file.", what)))
  }

  fn next_usize(&mut self, what: &str) -> Result<usize, HalaMeshError> {
    let field = self.next_field(what)?;
    field.parse::<usize>()
      .map_err(|err| HalaMeshError::new(
        HalaMeshErrorKind::MalformedAsset,
        &format!("Invalid {} \"{}\" in OFF file.", what, field),
        Some(Box::new(err)),
      ))
  }

  fn next_f32(&mut self, what: &str) -> Result<f32, HalaMeshError> {
    let field = self.next_field(what)?;
    field.parse::<f32>()
      .map_err(|err| HalaMeshError::new(
        HalaMeshErrorKind::MalformedAsset,
        &format!("Invalid {} \"{}\" in OFF file.", what, field),
        Some(Box::new(err)),
      ))
  }
}

/// The implementation of the OFF loader.
impl HalaOffLoader {
  /// Parse OFF text.
  /// param text: The file content.
  /// return: The geometry, UVs always absent.
  pub fn parse(text: &str) -> Result<HalaGeometry, HalaMeshError> {
    let mut lines = text.lines()
      .map(|line| line.split('#').next().unwrap_or("").trim())
      .filter(|line| !line.is_empty());

    // The header keyword may be prefixed by ST, C and N, and may share its line with the counts.
    let header_line = lines.next()
      .ok_or(HalaMeshError::malformed("Empty OFF file."))?;
    let mut header = _OffFields::new(header_line);
    let keyword = header.next_field("header")?;
    if keyword.trim_start_matches("ST").trim_start_matches('C').trim_start_matches('N') != "OFF" {
      return Err(HalaMeshError::malformed(&format!("Invalid OFF header \"{}\".", keyword)));
    }
    let rest = header.fields.clone().collect::<Vec<_>>();
    if rest.first() == Some(&"BINARY") {
      return Err(HalaMeshError::unsupported_format("Binary OFF files are not supported."));
    }
    let mut counts = if rest.is_empty() {
      _OffFields::new(lines.next().ok_or(HalaMeshError::malformed("OFF file has no element counts."))?)
    } else {
      header
    };
    let num_of_vertices = counts.next_usize("vertex count")?;
    let num_of_faces = counts.next_usize("face count")?;

    // Header counts are untrusted, the vectors grow with the lines actually read.
    // Extra columns (colors, normals) after the position are ignored.
    let mut vertices = Vec::new();
    for i in 0..num_of_vertices {
      let line = lines.next()
        .ok_or(HalaMeshError::malformed(&format!("OFF file ends before vertex {}.", i)))?;
      let mut fields = _OffFields::new(line);
      let x = fields.next_f32("vertex coordinate")?;
      let y = fields.next_f32("vertex coordinate")?;
      let z = fields.next_f32("vertex coordinate")?;
      vertices.push(Vec3::new(x, y, z));
    }

    let mut faces = Vec::new();
    for i in 0..num_of_faces {
      let line = lines.next()
        .ok_or(HalaMeshError::malformed(&format!("OFF file ends before face {}.", i)))?;
      let mut fields = _OffFields::new(line);
      let num_of_corners = fields.next_usize("face corner count")?;
      if num_of_corners < 3 {
        return Err(HalaMeshError::malformed(&format!("OFF face {} has fewer than 3 vertices.", i)));
      }
      let mut corners = Vec::new();
      for _ in 0..num_of_corners {
        let index = fields.next_usize("face index")?;
        if index >= num_of_vertices {
          return Err(HalaMeshError::malformed(
            &format!("OFF face {} references vertex {} out of range (0..{}).", i, index, num_of_vertices),
          ));
        }
        let index = u32::try_from(index)
          .map_err(|_| HalaMeshError::malformed(&format!("OFF face index {} is too large.", index)))?;
        corners.push(index);
      }
      faces.extend(triangulate_fan(&corners));
    }

    Ok(HalaGeometry {
      vertices,
      faces,
      uv: None,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TETRAHEDRON: &str = "\
OFF
# a tetrahedron
4 4 6
0 0 0
1 0 0
0 1 0
0 0 1
3 0 1 2
3 0 1 3
3 0 2 3
3 1 2 3
";

  #[test]
  fn tetrahedron() {
    let geometry = HalaOffLoader::parse(TETRAHEDRON).unwrap();
    assert_eq!(geometry.vertices.len(), 4);
    assert_eq!(geometry.faces, vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]]);
    assert!(geometry.uv.is_none());
  }

  #[test]
  fn counts_on_header_line_and_quads() {
    let text = "OFF 4 1 0\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n";
    let geometry = HalaOffLoader::parse(text).unwrap();
    assert_eq!(geometry.faces, vec![[0, 1, 2], [0, 2, 3]]);
  }

  #[test]
  fn colored_variant_ignores_extra_columns() {
    let text = "COFF\n3 1 0\n0 0 0 255 0 0 255\n1 0 0 0 255 0 255\n0 1 0 0 0 255 255\n3 0 1 2 10 20 30\n";
    let geometry = HalaOffLoader::parse(text).unwrap();
    assert_eq!(geometry.vertices[1], Vec3::X);
    assert_eq!(geometry.faces, vec![[0, 1, 2]]);
  }

  #[test]
  fn out_of_range_index_is_malformed() {
    let text = "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 3\n";
    let err = HalaOffLoader::parse(text).unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);
  }

  #[test]
  fn binary_is_unsupported() {
    let err = HalaOffLoader::parse("OFF BINARY\n").unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::UnsupportedFormat);
  }

  #[test]
  fn huge_counts_are_malformed() {
    let err = HalaOffLoader::parse("OFF\n1000000000000000000 1 0\n0 0 0\n").unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);

    let err = HalaOffLoader::parse("OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n1000000000000000000 0 1 2\n").unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);
  }

  #[test]
  fn bad_header_is_malformed() {
    let err = HalaOffLoader::parse("PLY\n3 1 0\n").unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::MalformedAsset);
  }
}
