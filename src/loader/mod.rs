pub mod obj_loader;
pub mod off_loader;
pub mod obj_writer;
pub mod gltf_filter;
pub mod gltf_converter;
pub mod converter;
pub mod relocator;

use std::path::{
  Path,
  PathBuf,
};

use crate::error::HalaMeshError;
use crate::mesh::geometry::HalaGeometry;

pub use obj_loader::HalaObjLoader;
pub use off_loader::HalaOffLoader;
pub use gltf_filter::{
  HalaGltfFilter,
  removed_path_for,
};
pub use gltf_converter::HalaGltfConverter;
pub use converter::{
  HalaConversion,
  HalaFormatConverter,
  convert,
  MATERIAL_FILE_NAME,
  MERGED_TEXTURE_FILE_NAME,
};
pub use relocator::{
  HalaRelocationReport,
  relocate_artifacts,
};

/// The format of a mesh file, classified by its final extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HalaMeshFormat {
  /// Wavefront OBJ, natively supported with UVs.
  Obj,
  /// Object File Format, natively supported without UVs.
  Off,
  /// glTF JSON document.
  Gltf,
  /// glTF binary container.
  Glb,
  /// Anything else, lowercased extension without the dot.
  Foreign(String),
}

/// The implementation of the mesh format.
impl HalaMeshFormat {
  /// Classify a path by its extension. Directory names never take part.
  /// param path: The file path.
  /// return: The format.
  pub fn from_path(path: &Path) -> Result<Self, HalaMeshError> {
    let extension = path.extension()
      .and_then(|ext| ext.to_str())
      .ok_or(HalaMeshError::unsupported_format(&format!("Get file \"{}\" extension failed.", path.to_string_lossy())))?
      .to_ascii_lowercase();
    Ok(match extension.as_str() {
      "obj" => HalaMeshFormat::Obj,
      "off" => HalaMeshFormat::Off,
      "gltf" => HalaMeshFormat::Gltf,
      "glb" => HalaMeshFormat::Glb,
      _ => HalaMeshFormat::Foreign(extension),
    })
  }

  pub fn is_native(&self) -> bool {
    matches!(self, HalaMeshFormat::Obj | HalaMeshFormat::Off)
  }

  pub fn is_gltf_family(&self) -> bool {
    matches!(self, HalaMeshFormat::Gltf | HalaMeshFormat::Glb)
  }
}

/// A reader of one natively supported format.
pub trait HalaMeshReader {
  /// Read vertices, faces and, when the format carries them, UVs.
  /// param path: The file path.
  /// return: The geometry with 0-based face indices.
  fn read(path: &Path) -> Result<HalaGeometry, HalaMeshError>;

  /// The lowercase extensions, without the dot, this reader handles.
  fn supported_extensions() -> &'static [&'static str];
}

/// A path next to `path` with `marker` appended to the file stem.
/// param path: The source path.
/// param marker: The stem suffix, e.g. "-converted".
/// param extension: The new extension without the dot.
/// return: The sibling path.
pub fn marked_sibling_path(path: &Path, marker: &str, extension: &str) -> PathBuf {
  let stem = path.file_stem()
    .map(|stem| stem.to_string_lossy().to_string())
    .unwrap_or_default();
  path.with_file_name(format!("{}{}.{}", stem, marker, extension))
}

/// Read the geometry of a natively supported file.
/// param path: The file path.
/// return: The geometry.
pub fn read_geometry(path: &Path) -> Result<HalaGeometry, HalaMeshError> {
  let extension = path.extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| ext.to_ascii_lowercase())
    .unwrap_or_default();
  if HalaObjLoader::supported_extensions().contains(&extension.as_str()) {
    HalaObjLoader::read(path)
  } else if HalaOffLoader::supported_extensions().contains(&extension.as_str()) {
    HalaOffLoader::read(path)
  } else {
    Err(HalaMeshError::unsupported_format(&format!("Unsupported file \"{}\".", path.to_string_lossy())))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::HalaMeshErrorKind;

  #[test]
  fn classify_extensions() {
    assert_eq!(HalaMeshFormat::from_path(Path::new("a/b.obj")).unwrap(), HalaMeshFormat::Obj);
    assert_eq!(HalaMeshFormat::from_path(Path::new("b.OFF")).unwrap(), HalaMeshFormat::Off);
    assert_eq!(HalaMeshFormat::from_path(Path::new("car.gltf")).unwrap(), HalaMeshFormat::Gltf);
    assert_eq!(HalaMeshFormat::from_path(Path::new("car.glb")).unwrap(), HalaMeshFormat::Glb);
    assert_eq!(HalaMeshFormat::from_path(Path::new("car.fbx")).unwrap(), HalaMeshFormat::Foreign("fbx".to_owned()));
  }

  #[test]
  fn directory_names_do_not_count() {
    let format = HalaMeshFormat::from_path(Path::new("/data/scan.obj.backup/model.glb")).unwrap();
    assert_eq!(format, HalaMeshFormat::Glb);
    assert!(!format.is_native());
    assert!(format.is_gltf_family());
  }

  #[test]
  fn missing_extension_is_unsupported() {
    let err = HalaMeshFormat::from_path(Path::new("/data/model")).unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::UnsupportedFormat);
  }

  #[test]
  fn reader_rejects_foreign_formats() {
    let err = read_geometry(Path::new("model.stl")).unwrap_err();
    assert_eq!(err.kind(), HalaMeshErrorKind::UnsupportedFormat);
  }

  #[test]
  fn sibling_path_gets_marker() {
    assert_eq!(
      marked_sibling_path(Path::new("/data/car.v2.glb"), "-converted", "obj"),
      PathBuf::from("/data/car.v2-converted.obj"),
    );
  }

  #[test]
  fn reader_is_chosen_by_supported_extension() {
    let dir = std::env::temp_dir().join(format!("hala_loader_dispatch_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let obj_path = dir.join("TRIANGLE.OBJ");
    std::fs::write(&obj_path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/1 3/1\n").unwrap();
    let off_path = dir.join("triangle.off");
    std::fs::write(&off_path, "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n").unwrap();

    assert!(HalaObjLoader::supported_extensions().contains(&"obj"));
    assert!(read_geometry(&obj_path).unwrap().uv.is_some());
    assert!(HalaOffLoader::supported_extensions().contains(&"off"));
    assert!(read_geometry(&off_path).unwrap().uv.is_none());
    assert_eq!(read_geometry(&dir.join("triangle")).unwrap_err().kind(), HalaMeshErrorKind::UnsupportedFormat);

    std::fs::remove_dir_all(&dir).unwrap();
  }
}
