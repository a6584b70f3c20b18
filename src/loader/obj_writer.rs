use std::fs::File;
use std::io::{
  BufWriter,
  Write,
};
use std::path::Path;

use glam::{
  Vec2,
  Vec3,
};

use crate::error::HalaMeshError;

/// The content of an OBJ file written by a conversion.
/// UVs, when present, are per vertex and share the vertex indexing.
pub struct HalaObjContent<'a> {
  pub vertices: &'a [Vec3],
  pub tex_coords: Option<&'a [Vec2]>,
  pub faces: &'a [[u32; 3]],
  pub material_lib: Option<&'a str>,
  pub material_name: Option<&'a str>,
}

/// Write the OBJ file, 1-based indices, in the given vertex and face order.
/// param path: The output path.
/// param content: The mesh content.
/// return: The result.
pub fn write_obj(path: &Path, content: &HalaObjContent) -> Result<(), HalaMeshError> {
  let file = File::create(path)
    .map_err(|err| HalaMeshError::io("Create", path, err))?;
  let mut w = BufWriter::new(file);
  write_obj_records(&mut w, content)
    .and_then(|_| w.flush())
    .map_err(|err| HalaMeshError::io("Write", path, err))
}

fn write_obj_records<W: Write>(w: &mut W, content: &HalaObjContent) -> std::io::Result<()> {
  if let Some(material_lib) = content.material_lib {
    writeln!(w, "mtllib {}", material_lib)?;
  }
  for v in content.vertices {
    writeln!(w, "v {} {} {}", v.x, v.y, v.z)?;
  }
  if let Some(tex_coords) = content.tex_coords {
    for uv in tex_coords {
      writeln!(w, "vt {} {}", uv.x, uv.y)?;
    }
  }
  if let Some(material_name) = content.material_name {
    writeln!(w, "usemtl {}", material_name)?;
  }
  for face in content.faces {
    let [a, b, c] = [face[0] + 1, face[1] + 1, face[2] + 1];
    if content.tex_coords.is_some() {
      writeln!(w, "f {}/{} {}/{} {}/{}", a, a, b, b, c, c)?;
    } else {
      writeln!(w, "f {} {} {}", a, b, c)?;
    }
  }
  Ok(())
}

/// Write a single-material MTL file.
/// param path: The output path.
/// param material_name: The material name.
/// param texture_file: The diffuse texture file name, relative to the MTL file.
/// return: The result.
pub fn write_mtl(path: &Path, material_name: &str, texture_file: Option<&str>) -> Result<(), HalaMeshError> {
  let mut text = format!("newmtl {}\nKa 1 1 1\nKd 1 1 1\nKs 0 0 0\n", material_name);
  if let Some(texture_file) = texture_file {
    text.push_str(&format!("map_Kd {}\n", texture_file));
  }
  std::fs::write(path, text)
    .map_err(|err| HalaMeshError::io("Write", path, err))
}
