//! Startup and model-loading policy
//!
//! Missing search roots, palette or initial model fail [`Session::start`].
//! Once running, a model that fails to load is reported to the caller and
//! logged; the session and every loaded shape stay usable.

use std::sync::Arc;

use darkstar::anim::ShapeInstance;
use darkstar::formats::Palette;
use darkstar::shape::{Shape, projected_size};
use darkstar::vfs::AssetLocator;

use crate::config::ViewerConfig;
use crate::error::{Error, Result};
use crate::library::{ShapeHandle, ShapeLibrary};
use crate::textures::{MaterialTexture, TextureCache};

pub struct Session {
    config: ViewerConfig,
    locator: AssetLocator,
    palette: Palette,
    library: ShapeLibrary,
    textures: TextureCache,
    current: Option<ShapeHandle>,
}

impl Session {
    /// Mount the configured roots, then load the palette and initial model.
    pub fn start(config: ViewerConfig) -> Result<Self> {
        if config.search_roots.is_empty() {
            return Err(Error::NoSearchRoots);
        }
        let locator = AssetLocator::from_roots(&config.search_roots)?;
        Self::with_locator(config, locator)
    }

    /// [`start`](Self::start) over an already-mounted locator.
    pub fn with_locator(config: ViewerConfig, locator: AssetLocator) -> Result<Self> {
        let palette = Palette::decode(&locator.resolve(&config.palette)?)?;
        tracing::debug!("Session palette {}: {} table(s)", config.palette, palette.tables().len());

        let mut session = Self {
            config,
            locator,
            palette,
            library: ShapeLibrary::new(),
            textures: TextureCache::new(),
            current: None,
        };
        if let Some(model) = session.config.model.clone() {
            let handle = session.library.load(&session.locator, &model)?;
            session.current = Some(handle);
        }
        Ok(session)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn locator(&self) -> &AssetLocator {
        &self.locator
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn library(&self) -> &ShapeLibrary {
        &self.library
    }

    pub fn current(&self) -> Option<ShapeHandle> {
        self.current
    }

    pub fn current_shape(&self) -> Option<&Shape> {
        self.current
            .and_then(|handle| self.library.get(handle).ok())
            .map(Arc::as_ref)
    }

    /// Load `name` and make it current. On failure the previous model stays current.
    pub fn open_model(&mut self, name: &str) -> Result<ShapeHandle> {
        match self.library.load(&self.locator, name) {
            Ok(handle) => {
                self.current = Some(handle);
                Ok(handle)
            }
            Err(err) => {
                tracing::warn!("Failed to load {name}: {err}");
                Err(err)
            }
        }
    }

    /// A playback cursor for `handle` with the configured time scale.
    ///
    /// The autoplay sequence starts if the shape has one by that name.
    pub fn instance(&self, handle: ShapeHandle) -> Result<ShapeInstance> {
        let mut instance = self.library.instance(handle)?;
        instance.set_time_scale(self.config.playback.time_scale);
        if let Some(sequence) = &self.config.playback.autoplay {
            if instance.shape().sequence_index(sequence).is_ok() {
                instance.play(sequence)?;
            } else {
                tracing::debug!("No autoplay sequence '{sequence}' in this shape");
            }
        }
        Ok(instance)
    }

    /// Projected pixel size of `shape` from the configured camera.
    pub fn screen_size(&self, shape: &Shape) -> f32 {
        let view = &self.config.view;
        projected_size(shape.radius(), view.camera_distance, view.width, view.height)
    }

    /// Resolve every material of `handle` against the session palette.
    pub fn textures(&mut self, handle: ShapeHandle) -> Result<Vec<MaterialTexture>> {
        let shape = Arc::clone(self.library.get(handle)?);
        Ok(self
            .textures
            .resolve_shape(&self.locator, &shape, Some(&self.palette)))
    }
}
