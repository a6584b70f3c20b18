use thiserror::Error;

/// The failure category of a mesh load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalaMeshErrorKind {
  /// The extension is not recognized or cannot be reached by conversion.
  UnsupportedFormat,
  /// A foreign format could not be parsed or exported.
  ConversionError,
  /// The file content is inconsistent (bad indices, missing keys).
  MalformedAsset,
  /// The vertex set has no extent to normalize.
  DegenerateMesh,
  /// Reading or writing a file failed.
  Io,
  /// The caller passed an unusable parameter.
  InvalidArgument,
}

/// The error type of the hala-mesh-loader crate.
#[derive(Error, Debug)]
pub struct HalaMeshError {
  kind: HalaMeshErrorKind,
  msg: String,
  #[source]
  source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// The implementation of the error type of the hala-mesh-loader crate.
impl HalaMeshError {
  /// Create a new error.
  /// param kind: The category of the error.
  /// param msg: The message of the error.
  /// param source: The source of the error.
  /// return: The error.
  pub fn new(kind: HalaMeshErrorKind, msg: &str, source: Option<Box<dyn std::error::Error + Send + Sync>>) -> Self {
    Self {
      kind,
      msg: msg.to_string(),
      source,
    }
  }

  pub fn unsupported_format(msg: &str) -> Self {
    Self::new(HalaMeshErrorKind::UnsupportedFormat, msg, None)
  }

  pub fn conversion(msg: &str, source: Option<Box<dyn std::error::Error + Send + Sync>>) -> Self {
    Self::new(HalaMeshErrorKind::ConversionError, msg, source)
  }

  pub fn malformed(msg: &str) -> Self {
    Self::new(HalaMeshErrorKind::MalformedAsset, msg, None)
  }

  pub fn degenerate(msg: &str) -> Self {
    Self::new(HalaMeshErrorKind::DegenerateMesh, msg, None)
  }

  pub fn invalid_argument(msg: &str) -> Self {
    Self::new(HalaMeshErrorKind::InvalidArgument, msg, None)
  }

  /// Wrap an I/O failure on the given path.
  /// param action: What was being done, e.g. "Read".
  /// param path: The file path.
  /// param err: The I/O error.
  /// return: The error.
  pub fn io(action: &str, path: &std::path::Path, err: std::io::Error) -> Self {
    Self::new(
      HalaMeshErrorKind::Io,
      &format!("{} file \"{}\" failed.", action, path.to_string_lossy()),
      Some(Box::new(err)),
    )
  }

  pub fn kind(&self) -> HalaMeshErrorKind {
    self.kind
  }

  pub fn message(&self) -> &str {
    &self.msg
  }
}

impl std::convert::From<serde_json::Error> for HalaMeshError {
  fn from(err: serde_json::Error) -> Self {
    Self {
      kind: HalaMeshErrorKind::MalformedAsset,
      msg: format!("Parse JSON failed: {}", err),
      source: Some(Box::new(err)),
    }
  }
}

/// The implementation Display trait for the error type of the hala-mesh-loader crate.
impl std::fmt::Display for HalaMeshError {
  /// Format the error.
  /// param f: The formatter.
  /// return: The result.
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.msg)
  }
}
