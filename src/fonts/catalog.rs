use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::fonts::options::{FONT_OPTIONS, FontKey, STICKER_FONT_FILES};

/// What a font is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// Caption text in the given table font.
    Caption(FontKey),
    /// Sticker glyphs.
    Sticker,
}

/// Font bytes read from disk.
#[derive(Clone)]
pub struct LoadedFont {
    /// Role the font was loaded for.
    pub role: FontRole,
    /// File the bytes came from.
    pub path: PathBuf,
    /// Raw font file bytes.
    pub bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("role", &self.role)
            .field("path", &self.path)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// Outcome of a bounded font wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontReadiness {
    /// The font is loaded and usable.
    Ready,
    /// Loading finished without finding the font; fallbacks apply.
    Unavailable,
    /// The bound elapsed while the font was still loading.
    TimedOut,
}

#[derive(Clone, Debug)]
enum FontSlot {
    Ready(Arc<LoadedFont>),
    Missing,
}

#[derive(Default)]
struct Slots {
    by_role: HashMap<FontRole, FontSlot>,
}

/// Process-wide font catalog.
///
/// Font files are read once, on a background thread started by [`FontCatalog::load`]. Readers
/// either poll ([`FontCatalog::font`]) or block with a bound ([`FontCatalog::wait_ready`]).
#[derive(Clone)]
pub struct FontCatalog {
    shared: Arc<(Mutex<Slots>, Condvar)>,
}

impl std::fmt::Debug for FontCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.lock();
        f.debug_struct("FontCatalog")
            .field("resolved", &slots.by_role.len())
            .finish()
    }
}

impl FontCatalog {
    /// Start loading every caption font and the sticker stack from `dirs`.
    pub fn load(dirs: Vec<PathBuf>) -> Self {
        let catalog = Self::from_slots(Slots::default());
        let worker = catalog.clone();
        let spawned = std::thread::Builder::new()
            .name("snapbook-fonts".to_string())
            .spawn(move || worker.load_all(&dirs));
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "font loader thread failed to start; fonts unavailable");
            catalog.resolve_all_missing();
        }
        catalog
    }

    /// Catalog with no fonts at all; every wait returns [`FontReadiness::Unavailable`].
    pub fn empty() -> Self {
        let catalog = Self::from_slots(Slots::default());
        catalog.resolve_all_missing();
        catalog
    }

    /// Catalog built from in-memory font bytes; roles not listed are unavailable.
    pub fn from_fonts(fonts: Vec<(FontRole, Vec<u8>)>) -> Self {
        let catalog = Self::empty();
        for (role, bytes) in fonts {
            catalog.resolve(
                role,
                FontSlot::Ready(Arc::new(LoadedFont {
                    role,
                    path: PathBuf::from(format!("<memory:{role:?}>")),
                    bytes: Arc::new(bytes),
                })),
            );
        }
        catalog
    }

    fn from_slots(slots: Slots) -> Self {
        Self {
            shared: Arc::new((Mutex::new(slots), Condvar::new())),
        }
    }

    /// Block until `role` is resolved or `timeout` elapses.
    pub fn wait_ready(&self, role: FontRole, timeout: Duration) -> FontReadiness {
        let (_, cvar) = &*self.shared;
        let deadline = Instant::now() + timeout;
        let mut slots = self.lock();
        loop {
            match slots.by_role.get(&role) {
                Some(FontSlot::Ready(_)) => return FontReadiness::Ready,
                Some(FontSlot::Missing) => return FontReadiness::Unavailable,
                None => {}
            }
            let now = Instant::now();
            if now >= deadline {
                return FontReadiness::TimedOut;
            }
            let (guard, _) = cvar
                .wait_timeout(slots, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            slots = guard;
        }
    }

    /// Loaded font for `role`, if it is ready right now.
    pub fn font(&self, role: FontRole) -> Option<Arc<LoadedFont>> {
        match self.lock().by_role.get(&role) {
            Some(FontSlot::Ready(f)) => Some(f.clone()),
            _ => None,
        }
    }

    /// Best available caption font: the chosen key, then the system default, then the sticker
    /// stack.
    pub fn caption_font(&self, key: FontKey) -> Option<Arc<LoadedFont>> {
        self.font(FontRole::Caption(key))
            .or_else(|| self.font(FontRole::Caption(FontKey::System)))
            .or_else(|| self.font(FontRole::Sticker))
    }

    /// Best available sticker font: the glyph stack, then the system caption font.
    pub fn sticker_font(&self) -> Option<Arc<LoadedFont>> {
        self.font(FontRole::Sticker)
            .or_else(|| self.font(FontRole::Caption(FontKey::System)))
    }

    fn load_all(&self, dirs: &[PathBuf]) {
        let mut roles: Vec<(FontRole, &'static [&'static str])> = FONT_OPTIONS
            .iter()
            .map(|o| (FontRole::Caption(o.key), o.files))
            .collect();
        roles.push((FontRole::Sticker, STICKER_FONT_FILES));

        for (role, files) in roles {
            let slot = match find_font_file(dirs, files) {
                Some(path) => match std::fs::read(&path) {
                    Ok(bytes) => {
                        tracing::debug!(?role, path = %path.display(), "font loaded");
                        FontSlot::Ready(Arc::new(LoadedFont {
                            role,
                            path,
                            bytes: Arc::new(bytes),
                        }))
                    }
                    Err(e) => {
                        tracing::warn!(?role, path = %path.display(), error = %e, "font read failed");
                        FontSlot::Missing
                    }
                },
                None => {
                    tracing::debug!(?role, "no font file found");
                    FontSlot::Missing
                }
            };
            self.resolve(role, slot);
        }
    }

    fn resolve(&self, role: FontRole, slot: FontSlot) {
        let (_, cvar) = &*self.shared;
        self.lock().by_role.insert(role, slot);
        cvar.notify_all();
    }

    fn resolve_all_missing(&self) {
        for o in &FONT_OPTIONS {
            self.resolve(FontRole::Caption(o.key), FontSlot::Missing);
        }
        self.resolve(FontRole::Sticker, FontSlot::Missing);
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.shared.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_font_file(dirs: &[PathBuf], files: &[&str]) -> Option<PathBuf> {
    for wanted in files {
        for dir in dirs {
            if let Some(p) = find_in_dir(dir, wanted) {
                return Some(p);
            }
        }
    }
    None
}

fn find_in_dir(dir: &Path, wanted: &str) -> Option<PathBuf> {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return None;
    };
    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if name.eq_ignore_ascii_case(wanted) {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/fonts/catalog.rs"]
mod tests;
