use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::{
    assets::decode::payload_dimensions,
    assets::ingest::ingest_with_quality,
    context::SnapContext,
    editor::session::{EditorSession, SessionSeed},
    foundation::core::EditingFrame,
    foundation::error::{SnapError, SnapResult},
    model::snap::Snap,
    store::kv::KvStore,
    store::schema::SnapStore,
};

/// Where a category shows its list.
pub trait SnapView {
    /// Redraw with the visible items (latest first).
    fn render(&mut self, items: &[Snap]);
}

/// Change subscriber. Errors and panics are logged and never reach the caller.
pub type Subscriber = Box<dyn FnMut() -> anyhow::Result<()>>;

/// Per-category settings.
pub struct CategoryConfig {
    /// Namespace key; must be non-empty and free of `:`.
    pub category: String,
    /// Keep at most one snap per day.
    pub single: bool,
    /// Longer-side bound for captured photos.
    pub ingest_max_side: u32,
    /// Largest editing stage, in stage pixels.
    pub stage_max: (f64, f64),
    /// Optional render target.
    pub view: Option<Box<dyn SnapView>>,
    /// Called after each render with whether anything is shown.
    pub on_render: Option<Box<dyn FnMut(bool)>>,
}

impl CategoryConfig {
    /// Single-snap category `category` with default sizes.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            single: true,
            ingest_max_side: 1200,
            stage_max: (840.0, 600.0),
            view: None,
            on_render: None,
        }
    }

    /// Set the single flag.
    pub fn single(mut self, single: bool) -> Self {
        self.single = single;
        self
    }

    /// Set the ingest bound.
    pub fn ingest_max_side(mut self, max_side: u32) -> Self {
        self.ingest_max_side = max_side;
        self
    }

    /// Set the render target.
    pub fn view(mut self, view: impl SnapView + 'static) -> Self {
        self.view = Some(Box::new(view));
        self
    }

    /// Set the render callback.
    pub fn on_render(mut self, f: impl FnMut(bool) + 'static) -> Self {
        self.on_render = Some(Box::new(f));
        self
    }

    fn validate(&self) -> SnapResult<()> {
        if self.category.is_empty() || self.category.contains(':') {
            return Err(SnapError::validation(format!(
                "invalid category key '{}'",
                self.category
            )));
        }
        if self.ingest_max_side == 0 {
            return Err(SnapError::validation("ingest_max_side must be > 0"));
        }
        Ok(())
    }
}

/// Decoded image ready to hand to another component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapFile {
    /// File name.
    pub name: String,
    /// MIME type.
    pub mime: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Public surface of one snap category.
pub struct SnapCategory<S> {
    ctx: SnapContext,
    store: SnapStore<S>,
    config: CategoryConfig,
    subscribers: Vec<Subscriber>,
}

impl<S: KvStore> SnapCategory<S> {
    /// Migrate legacy data, sync today's mirror and render once.
    #[tracing::instrument(skip_all, fields(category = %config.category, single = config.single))]
    pub fn init(ctx: &SnapContext, store: S, config: CategoryConfig) -> SnapResult<Self> {
        config.validate()?;
        let mut this = Self {
            ctx: ctx.clone(),
            store: SnapStore::new(store, ctx.clock()),
            config,
            subscribers: Vec::new(),
        };
        this.store.migrate_if_needed(&this.config.category)?;
        this.reload()?;
        Ok(this)
    }

    /// Category key.
    pub fn key(&self) -> &str {
        &self.config.category
    }

    /// Schema manager, for inspection and tooling.
    pub fn store(&self) -> &SnapStore<S> {
        &self.store
    }

    /// Timestamp for a record saved now.
    pub fn now_millis(&self) -> i64 {
        self.store.now_millis()
    }

    /// Today's list, truncated (and resaved) to one entry for single categories.
    pub fn items(&mut self) -> SnapResult<Vec<Snap>> {
        let category = self.config.category.clone();
        let mut items = self.store.ensure_today_mirror(&category)?;
        if self.config.single && items.len() > 1 {
            items.truncate(1);
            tracing::debug!("single category held several snaps; keeping the latest");
            items = self.store.commit_today(&category, items)?;
        }
        Ok(items)
    }

    /// Today's records from the calendar, after the same single-category truncation as
    /// [`SnapCategory::items`]. Edits start from these so a degraded mirror never leaks back.
    fn canonical_items(&mut self) -> SnapResult<Vec<Snap>> {
        self.items()?;
        self.store.today_items(&self.config.category)
    }

    /// `true` when today has at least one snap.
    pub fn has_snap(&mut self) -> SnapResult<bool> {
        Ok(!self.items()?.is_empty())
    }

    /// `true` when adding would replace today's snap and the user should confirm.
    pub fn needs_replace_confirmation(&mut self) -> SnapResult<bool> {
        Ok(self.config.single && self.has_snap()?)
    }

    /// Newest composite as a file. `None` when there is none or its payload was evicted.
    pub fn latest_as_file(&mut self, mime: &str, filename: &str) -> Option<SnapFile> {
        let items = match self.items() {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("latest snap unavailable: {e}");
                return None;
            }
        };
        let latest = items.first()?;
        if latest.raster_payload.is_empty() {
            tracing::debug!("latest snap has no image payload");
            return None;
        }
        match latest.raster_payload.to_bytes() {
            Ok(bytes) => Some(SnapFile {
                name: filename.to_string(),
                mime: mime.to_string(),
                bytes,
            }),
            Err(e) => {
                tracing::warn!("latest snap payload unreadable: {e}");
                None
            }
        }
    }

    /// Register a change subscriber.
    pub fn on_change(&mut self, subscriber: impl FnMut() -> anyhow::Result<()> + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Re-read and re-render without notifying subscribers.
    pub fn reload(&mut self) -> SnapResult<()> {
        let items = self.items()?;
        if let Some(view) = self.config.view.as_mut() {
            view.render(&items);
        }
        if let Some(cb) = self.config.on_render.as_mut() {
            cb(!items.is_empty());
        }
        Ok(())
    }

    /// Ingest a captured photo and open an editor on it.
    ///
    /// An unreadable photo is a [`SnapError::Decode`] and nothing is written.
    pub fn begin_capture(&self, raw: &[u8]) -> SnapResult<EditorSession> {
        let cfg = self.ctx.config();
        let max_side = self.config.ingest_max_side;
        let base = ingest_with_quality(raw, max_side, cfg.jpeg_quality)?;
        let frame = self.stage_for(&base)?;
        Ok(EditorSession::open(base, frame, SessionSeed::default()))
    }

    /// Open an editor on today's snap at `index`; `None` for a stale index.
    pub fn begin_edit(&mut self, index: usize) -> SnapResult<Option<EditorSession>> {
        let items = self.canonical_items()?;
        let Some(snap) = items.get(index) else {
            tracing::debug!(index, "edit of missing snap ignored");
            return Ok(None);
        };
        let base = snap.editable_base().clone();
        if base.is_empty() {
            tracing::debug!(index, "snap has no photo left to edit");
            return Ok(None);
        }
        let frame = self.stage_for(&base)?;
        Ok(Some(EditorSession::open(
            base,
            frame,
            SessionSeed::from_snap(snap),
        )))
    }

    fn stage_for(&self, base: &crate::assets::payload::Payload) -> SnapResult<EditingFrame> {
        let (w, h) = payload_dimensions(base)?;
        let (max_w, max_h) = self.config.stage_max;
        Ok(EditingFrame::fit(w, h, max_w, max_h))
    }

    /// Add a saved snap: it replaces today's entry in single categories and is prepended
    /// otherwise. Returns today's list as persisted.
    #[tracing::instrument(skip_all, fields(category = %self.config.category))]
    pub fn commit_new(&mut self, snap: Snap) -> SnapResult<Vec<Snap>> {
        let items = if self.config.single {
            vec![snap]
        } else {
            let mut items = self.canonical_items()?;
            items.insert(0, snap);
            items
        };
        self.commit(items)
    }

    /// Replace today's snap at `index` in place. A stale index is a no-op returning `false`.
    #[tracing::instrument(skip_all, fields(category = %self.config.category, index = index))]
    pub fn commit_edit(&mut self, index: usize, snap: Snap) -> SnapResult<bool> {
        let mut items = self.canonical_items()?;
        let Some(slot) = items.get_mut(index) else {
            tracing::debug!(index, "edit of missing snap ignored");
            return Ok(false);
        };
        *slot = snap;
        self.commit(items)?;
        Ok(true)
    }

    /// Delete today's snap at `index`. A stale index is a no-op returning `false`.
    #[tracing::instrument(skip_all, fields(category = %self.config.category, index = index))]
    pub fn delete(&mut self, index: usize) -> SnapResult<bool> {
        let mut items = self.canonical_items()?;
        if index >= items.len() {
            tracing::debug!(index, "delete of missing snap ignored");
            return Ok(false);
        }
        items.remove(index);
        self.commit(items)?;
        Ok(true)
    }

    fn commit(&mut self, items: Vec<Snap>) -> SnapResult<Vec<Snap>> {
        let category = self.config.category.clone();
        let persisted = self.store.commit_today(&category, items)?;
        self.reload()?;
        self.notify();
        Ok(persisted)
    }

    fn notify(&mut self) {
        for (i, sub) in self.subscribers.iter_mut().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| sub())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(subscriber = i, "change subscriber failed: {e:#}"),
                Err(_) => tracing::warn!(subscriber = i, "change subscriber panicked"),
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/category/category.rs"]
mod tests;
