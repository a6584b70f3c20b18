use std::path::{
  Path,
  PathBuf,
};

use crate::error::HalaMeshError;
use super::HalaConversion;

/// The outcome of moving conversion artifacts. Failures never abort a load.
#[derive(Debug, Default)]
pub struct HalaRelocationReport {
  /// (from, to) of every moved file.
  pub moved: Vec<(PathBuf, PathBuf)>,
  /// Files whose move was attempted and failed.
  pub failed: Vec<(PathBuf, HalaMeshError)>,
}

/// The implementation of the relocation report.
impl HalaRelocationReport {
  pub fn is_complete(&self) -> bool {
    self.failed.is_empty()
  }

  /// The new location of a moved file.
  /// param from: The original path.
  /// return: The destination, none if it was not moved.
  pub fn destination_of(&self, from: &Path) -> Option<&Path> {
    self.moved.iter()
      .find(|(src, _)| src == from)
      .map(|(_, dst)| dst.as_path())
  }
}

/// Move the intermediate files of a conversion into `intermediate_dir`.
/// Optional artifacts that do not exist are skipped; the material file move is always attempted.
/// param conversion: The produced files.
/// param intermediate_dir: The holding directory, created when absent.
/// return: The report.
pub fn relocate_artifacts(conversion: &HalaConversion, intermediate_dir: &Path) -> Result<HalaRelocationReport, HalaMeshError> {
  std::fs::create_dir_all(intermediate_dir)
    .map_err(|err| HalaMeshError::io("Create directory", intermediate_dir, err))?;

  let mut report = HalaRelocationReport::default();
  let optional_artifacts = [
    conversion.filtered_path.as_deref(),
    Some(conversion.converted_path.as_path()),
    conversion.texture_path.as_deref(),
  ];
  for artifact in optional_artifacts.into_iter().flatten() {
    if artifact.exists() {
      move_into(artifact, intermediate_dir, &mut report);
    }
  }
  move_into(&conversion.material_path, intermediate_dir, &mut report);

  log::info!(
    "Moved {} intermediate files into \"{}\", {} failed.",
    report.moved.len(), intermediate_dir.to_string_lossy(), report.failed.len(),
  );
  Ok(report)
}

fn move_into(from: &Path, dir: &Path, report: &mut HalaRelocationReport) {
  let to = match from.file_name() {
    Some(file_name) => dir.join(file_name),
    None => {
      report.failed.push((from.to_path_buf(), HalaMeshError::invalid_argument(&format!("\"{}\" has no file name.", from.to_string_lossy()))));
      return;
    },
  };
  match move_file(from, &to) {
    Ok(()) => {
      log::debug!("Moved \"{}\" to \"{}\".", from.to_string_lossy(), to.to_string_lossy());
      report.moved.push((from.to_path_buf(), to));
    },
    Err(err) => {
      log::warn!("Move \"{}\" failed: {}", from.to_string_lossy(), err);
      report.failed.push((from.to_path_buf(), err));
    },
  }
}

/// Rename, falling back to copy and remove across file systems.
fn move_file(from: &Path, to: &Path) -> Result<(), HalaMeshError> {
  if std::fs::rename(from, to).is_ok() {
    return Ok(());
  }
  std::fs::copy(from, to)
    .map_err(|err| HalaMeshError::io("Move", from, err))?;
  std::fs::remove_file(from)
    .map_err(|err| HalaMeshError::io("Remove", from, err))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hala_relocator_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  #[test]
  fn moves_existing_artifacts() {
    let dir = scratch_dir("moves");
    let converted = dir.join("car-converted.obj");
    let material = dir.join("material.mtl");
    std::fs::write(&converted, "v 0 0 0\n").unwrap();
    std::fs::write(&material, "newmtl material_0\n").unwrap();
    let conversion = HalaConversion {
      converted_path: converted.clone(),
      filtered_path: Some(dir.join("car-removed.gltf")),
      material_path: material.clone(),
      texture_path: None,
    };

    let holding = dir.join("intermediate");
    let report = relocate_artifacts(&conversion, &holding).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.moved.len(), 2);
    assert!(!converted.exists());
    assert!(holding.join("car-converted.obj").exists());
    assert!(holding.join("material.mtl").exists());
    assert_eq!(report.destination_of(&converted), Some(holding.join("car-converted.obj").as_path()));

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn missing_material_is_reported_not_fatal() {
    let dir = scratch_dir("missing");
    let converted = dir.join("car-converted.obj");
    std::fs::write(&converted, "v 0 0 0\n").unwrap();
    let conversion = HalaConversion {
      converted_path: converted,
      filtered_path: None,
      material_path: dir.join("material.mtl"),
      texture_path: None,
    };

    let report = relocate_artifacts(&conversion, &dir.join("intermediate")).unwrap();
    assert_eq!(report.moved.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, dir.join("material.mtl"));

    std::fs::remove_dir_all(&dir).unwrap();
  }
}
