use std::sync::Arc;

use crate::{
    config::SnapConfig,
    fonts::catalog::FontCatalog,
    foundation::clock::{Clock, SystemClock},
    foundation::error::SnapResult,
    render::compositor::Compositor,
    render::cpu::CpuSurface,
};

/// Shared handles every category needs: settings, fonts and the clock.
///
/// Build one per process and pass it by reference; cloning is cheap.
#[derive(Clone)]
pub struct SnapContext {
    config: SnapConfig,
    fonts: FontCatalog,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SnapContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapContext")
            .field("config", &self.config)
            .field("fonts", &self.fonts)
            .finish_non_exhaustive()
    }
}

impl SnapContext {
    /// Validate `config` and start loading fonts from its font directories.
    pub fn new(config: SnapConfig) -> SnapResult<Self> {
        config.validate()?;
        let fonts = FontCatalog::load(config.font_dirs.clone());
        Ok(Self {
            config,
            fonts,
            clock: Arc::new(SystemClock),
        })
    }

    /// Context over explicit parts; used by tests and embedders with their own font source.
    pub fn from_parts(config: SnapConfig, fonts: FontCatalog, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            fonts,
            clock,
        }
    }

    /// Settings.
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Font catalog.
    pub fn fonts(&self) -> &FontCatalog {
        &self.fonts
    }

    /// Clock used for day keys and timestamps.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// CPU compositor configured from these settings.
    pub fn compositor(&self) -> Compositor<CpuSurface> {
        Compositor::new(CpuSurface::new(self.fonts.clone()))
            .with_font_wait(self.config.font_wait())
            .with_quality(self.config.jpeg_quality)
    }
}
