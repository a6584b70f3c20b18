pub mod prelude;
pub mod error;
pub mod config;
pub mod device;
pub mod mesh;
pub mod loader;
