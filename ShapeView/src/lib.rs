//! # ShapeView
//!
//! Viewer-side services on top of [`darkstar`]: configuration, the shape
//! library, texture resolution and GPU-ready vertex data. Windowing and the
//! draw calls themselves belong to the embedding application.
//!
//! ## Quick Start
//!
//! ```no_run
//! use shapeview::prelude::*;
//!
//! let config = ViewerConfig::load_default()?;
//! let mut session = Session::start(config)?;
//! let handle = session.open_model("larmor.dts")?;
//!
//! let mut instance = session.instance(handle)?;
//! instance.advance(1.0 / 30.0);
//! for item in instance.draw_list()? {
//!     let shape = session.library().get(handle)?;
//!     if let Some(mesh) = GpuMesh::for_item(shape, &item) {
//!         println!("{} vertices, {} batches", mesh.vertices.len(), mesh.batches.len());
//!     }
//! }
//! # Ok::<(), shapeview::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod gpu;
pub mod library;
pub mod session;
pub mod textures;

#[cfg(test)]
pub(crate) mod test_support;

pub use darkstar;
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{ConfigOverrides, PlaybackSettings, ViewSettings, ViewerConfig};
    pub use crate::error::{Error, Result};
    pub use crate::gpu::{Batch, BlendMode, GpuMesh, GpuVertex, model_matrix};
    pub use crate::library::{DecodeOutcome, ShapeHandle, ShapeLibrary, decode_all};
    pub use crate::session::Session;
    pub use crate::textures::{MaterialTexture, TextureCache, save_png};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
