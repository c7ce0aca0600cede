//! # Darkstar
//!
//! A pure-Rust reader for the asset formats of the Darkstar engine (Starsiege,
//! Starsiege: Tribes).
//!
//! ## Supported Formats
//!
//! - **PVOL volumes** - Directory parsing with lazy LZH expansion
//! - **Palettes** - Microsoft RIFF `PAL `, `PPAL` and multi-table `PL98`
//! - **Bitmaps** - `PBMP` and 8/24-bit `BM` files, converted to RGBA8
//! - **DTS shapes** - `TS::Shape` revisions 1 through 8 with their
//!   `TS::CelAnimMesh` geometry and `TS::MaterialList`
//!
//! ## Quick Start
//!
//! ### Resolving Assets
//!
//! ```no_run
//! use darkstar::vfs::AssetLocator;
//!
//! // Earlier roots win when a name exists in several places
//! let locator = AssetLocator::from_roots(["base", "base/shapes.vol"])?;
//! let bytes = locator.resolve("larmor.dts")?;
//! println!("{} bytes", bytes.len());
//! # Ok::<(), darkstar::Error>(())
//! ```
//!
//! ### Decoding and Animating a Shape
//!
//! ```no_run
//! use std::sync::Arc;
//! use darkstar::prelude::*;
//!
//! let bytes = std::fs::read("larmor.dts")?;
//! let shape = Arc::new(ShapeDecoder::decode(&bytes)?);
//!
//! let mut instance = ShapeInstance::new(shape);
//! instance.play("run")?;
//! instance.advance(0.25);
//! for item in instance.draw_list()? {
//!     println!("object {} mesh {} at {:?}", item.object, item.mesh, item.transform);
//! }
//! # Ok::<(), darkstar::Error>(())
//! ```

pub mod anim;
pub mod archive;
pub mod binary;
pub mod error;
pub mod formats;
pub mod render;
pub mod shape;
pub mod texture;
pub mod vfs;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};

    // Volumes and lookup
    pub use crate::archive::{ArchiveReader, CompressionMethod, VolumeDirectory, VolumeEntry};
    pub use crate::vfs::{AssetEntry, AssetLocator, Volume};

    // Images
    pub use crate::formats::{Bitmap, Palette, Rgba, TexturePixels};
    pub use crate::texture::load_material_texture;

    // Shapes
    pub use crate::shape::{
        DetailLevel, Material, MaterialList, Mesh, MeshGeometry, Node, Object, Sequence, Shape,
        ShapeDecoder, ShapeParts, Transform, projected_size,
    };

    // Animation
    pub use crate::anim::{Direction, ObjectState, PlaybackState, Pose, PoseEvaluator, ShapeInstance};
    pub use crate::render::DrawItem;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
