use std::path::{
  Path,
  PathBuf,
};

use serde_json::Value;

use crate::error::HalaMeshError;
use super::marked_sibling_path;

/// Removes mesh parts and buffers from a glTF JSON document by name.
/// A `None` list skips its step entirely; `Some(&[])` runs it and removes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalaGltfFilter<'a> {
  /// Substrings of material names whose primitives are dropped from the first mesh.
  pub remove_mesh_part_names: Option<&'a [String]>,
  /// Substrings of buffer URIs whose buffers are dropped.
  pub remove_unsupported_buffers: Option<&'a [String]>,
}

/// The path the filtered document of `path` is written to.
/// param path: The source glTF path.
/// return: "<stem>-removed.<ext>" next to the source.
pub fn removed_path_for(path: &Path) -> PathBuf {
  let extension = path.extension()
    .map(|ext| ext.to_string_lossy().to_string())
    .unwrap_or_else(|| "gltf".to_owned());
  marked_sibling_path(path, "-removed", &extension)
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
  needles.iter().any(|needle| haystack.contains(needle.as_str()))
}

/// The implementation of the glTF filter.
impl<'a> HalaGltfFilter<'a> {
  /// Create a filter from optional exclusion lists.
  /// param remove_mesh_part_names: The material name substrings.
  /// param remove_unsupported_buffers: The buffer URI substrings.
  /// return: The filter.
  pub fn new(remove_mesh_part_names: Option<&'a [String]>, remove_unsupported_buffers: Option<&'a [String]>) -> Self {
    Self {
      remove_mesh_part_names,
      remove_unsupported_buffers,
    }
  }

  /// Read a glTF document, filter it and write it next to the source.
  /// The source file is never modified.
  /// param path: The source glTF path.
  /// return: The path of the filtered document.
  pub fn filter_file(&self, path: &Path) -> Result<PathBuf, HalaMeshError> {
    let text = std::fs::read_to_string(path)
      .map_err(|err| HalaMeshError::io("Read", path, err))?;
    let mut document: Value = serde_json::from_str(&text)?;
    self.apply(&mut document)?;

    let updated_path = removed_path_for(path);
    let text = serde_json::to_string_pretty(&document)?;
    std::fs::write(&updated_path, text)
      .map_err(|err| HalaMeshError::io("Write", &updated_path, err))?;
    log::debug!("Filtered glTF document written to \"{}\".", updated_path.to_string_lossy());
    Ok(updated_path)
  }

  /// Filter the document in memory.
  /// param document: The glTF JSON document.
  /// return: The result.
  pub fn apply(&self, document: &mut Value) -> Result<(), HalaMeshError> {
    if let Some(names) = self.remove_mesh_part_names {
      let removed = Self::remove_mesh_parts(document, names)?;
      log::info!("Deleted {} primitives with materials named {:?} from glTF model.", removed, names);
    }
    if let Some(uris) = self.remove_unsupported_buffers {
      let removed = Self::remove_buffers(document, uris)?;
      log::info!("Deleted {} unsupported buffers within uri {:?} from glTF model.", removed, uris);
    }
    Ok(())
  }

  /// Drop the primitives of the first mesh whose material name contains any of `names`.
  /// return: The number of removed primitives.
  fn remove_mesh_parts(document: &mut Value, names: &[String]) -> Result<usize, HalaMeshError> {
    let material_names = match document.get("materials") {
      Some(Value::Array(materials)) => materials.iter()
        .map(|material| material.get("name").and_then(Value::as_str).unwrap_or("").to_owned())
        .collect::<Vec<_>>(),
      Some(_) => return Err(HalaMeshError::malformed("glTF \"materials\" is not an array.")),
      None => Vec::new(),
    };

    let primitives = document.get_mut("meshes")
      .and_then(|meshes| meshes.get_mut(0))
      .and_then(|mesh| mesh.get_mut("primitives"))
      .and_then(Value::as_array_mut)
      .ok_or(HalaMeshError::malformed("glTF document has no primitives in its first mesh."))?;

    let num_of_primitives = primitives.len();
    let mut kept = Vec::with_capacity(num_of_primitives);
    for primitive in primitives.drain(..) {
      // A primitive without a material has no name to match.
      let excluded = match primitive.get("material") {
        Some(material) => {
          let index = material.as_u64()
            .ok_or(HalaMeshError::malformed(&format!("Invalid primitive material reference {}.", material)))?;
          let material_name = material_names.get(index as usize)
            .ok_or(HalaMeshError::malformed(&format!("Primitive references missing material {}.", index)))?;
          contains_any(material_name, names)
        },
        None => false,
      };
      if !excluded {
        kept.push(primitive);
      }
    }

    let removed = num_of_primitives - kept.len();
    *primitives = kept;
    Ok(removed)
  }

  /// Drop the buffers whose URI contains any of `uris`.
  /// return: The number of removed buffers.
  fn remove_buffers(document: &mut Value, uris: &[String]) -> Result<usize, HalaMeshError> {
    let buffers = match document.get_mut("buffers") {
      Some(Value::Array(buffers)) => buffers,
      Some(_) => return Err(HalaMeshError::malformed("glTF \"buffers\" is not an array.")),
      None => return Ok(0),
    };
    let num_of_buffers = buffers.len();
    buffers.retain(|buffer| {
      match buffer.get("uri").and_then(Value::as_str) {
        Some(uri) => !contains_any(uri, uris),
        None => true,
      }
    });
    Ok(num_of_buffers - buffers.len())
  }
}
