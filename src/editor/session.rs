use crate::{
    assets::payload::Payload,
    editor::palette::{self, PaletteCategory},
    fonts::options::FontKey,
    foundation::core::EditingFrame,
    foundation::error::{SnapError, SnapResult},
    model::snap::{Snap, Sticker, clamp_scale},
    render::compositor::Compositor,
    render::plan::ComposeRequest,
    render::surface::RenderSurface,
};

/// Glyph size on the editing stage at scale 1; also the hit box side.
pub const STAGE_STICKER_PX: f64 = 48.0;

/// Session-local sticker handle. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StickerId(u64);

/// A sticker on the stage.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedSticker {
    /// Session handle.
    pub id: StickerId,
    /// Glyph, position and scale in stage coordinates.
    pub sticker: Sticker,
}

/// Reported editor mode. When several apply, the first listed wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorState {
    /// A selected sticker is being dragged.
    Dragging,
    /// A palette glyph is chosen; canvas taps place it.
    Armed,
    /// One sticker is active.
    Selected,
    /// Nothing chosen or selected.
    Idle,
}

/// Initial contents of a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSeed {
    /// Caption text.
    pub caption: String,
    /// Stickers to restore.
    pub stickers: Vec<Sticker>,
    /// Frame `stickers` were recorded in.
    pub recorded_frame: Option<EditingFrame>,
    /// Caption font.
    pub font_key: FontKey,
}

impl SessionSeed {
    /// Seed for re-editing `snap`.
    pub fn from_snap(snap: &Snap) -> Self {
        Self {
            caption: snap.caption.clone(),
            stickers: snap.restorable_stickers().to_vec(),
            recorded_frame: snap.editing_frame,
            font_key: snap.caption_font_key,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Grab {
    id: StickerId,
    dx: f64,
    dy: f64,
}

/// Modal sticker/caption editor over an in-memory working copy.
///
/// Nothing is written until the caller commits the [`Snap`] returned by [`EditorSession::save`].
#[derive(Debug)]
pub struct EditorSession {
    base: Payload,
    frame: EditingFrame,
    stickers: Vec<PlacedSticker>,
    next_id: u64,
    armed: Option<String>,
    selected: Option<StickerId>,
    grab: Option<Grab>,
    scale_control: f64,
    caption: String,
    font_key: FontKey,
    palette_index: usize,
}

impl EditorSession {
    /// Open a session on `base`, shown in a stage of size `frame`.
    ///
    /// Seed stickers are rescaled from their recorded frame to `frame`.
    pub fn open(base: Payload, frame: EditingFrame, seed: SessionSeed) -> Self {
        let frame = frame.sanitized((1.0, 1.0));
        let (sx, sy) = match seed.recorded_frame {
            Some(rec) => (ratio(frame.width, rec.width), ratio(frame.height, rec.height)),
            None => (1.0, 1.0),
        };
        let mut session = Self {
            base,
            frame,
            stickers: Vec::with_capacity(seed.stickers.len()),
            next_id: 0,
            armed: None,
            selected: None,
            grab: None,
            scale_control: 1.0,
            caption: seed.caption,
            font_key: seed.font_key,
            palette_index: 0,
        };
        for st in seed.stickers {
            session.add(Sticker {
                x: st.x * sx,
                y: st.y * sy,
                scale: clamp_scale(st.scale),
                glyph: st.glyph,
            });
        }
        session
    }

    fn add(&mut self, sticker: Sticker) -> StickerId {
        let id = StickerId(self.next_id);
        self.next_id += 1;
        self.stickers.push(PlacedSticker { id, sticker });
        id
    }

    fn get_mut(&mut self, id: StickerId) -> Option<&mut Sticker> {
        self.stickers
            .iter_mut()
            .find(|p| p.id == id)
            .map(|p| &mut p.sticker)
    }

    /// Current mode.
    pub fn state(&self) -> EditorState {
        if self.grab.is_some() {
            EditorState::Dragging
        } else if self.armed.is_some() {
            EditorState::Armed
        } else if self.selected.is_some() {
            EditorState::Selected
        } else {
            EditorState::Idle
        }
    }

    /// Active sticker, independent of [`EditorSession::state`].
    pub fn selection(&self) -> Option<StickerId> {
        self.selected
    }

    /// Sticker by handle.
    pub fn sticker(&self, id: StickerId) -> Option<&Sticker> {
        self.stickers
            .iter()
            .find(|p| p.id == id)
            .map(|p| &p.sticker)
    }

    /// Stickers in z order.
    pub fn stickers(&self) -> &[PlacedSticker] {
        &self.stickers
    }

    /// Glyph canvas taps will place.
    pub fn armed_glyph(&self) -> Option<&str> {
        self.armed.as_deref()
    }

    /// Scale new stickers get.
    pub fn scale_control(&self) -> f64 {
        self.scale_control
    }

    /// Stage size.
    pub fn frame(&self) -> EditingFrame {
        self.frame
    }

    /// Photo being annotated.
    pub fn base(&self) -> &Payload {
        &self.base
    }

    /// Palette category being browsed.
    pub fn palette(&self) -> &'static PaletteCategory {
        &palette::PALETTE[self.palette_index]
    }

    /// Switch the browsed palette category.
    pub fn browse_palette(&mut self, index: usize) -> SnapResult<&'static PaletteCategory> {
        let cat = palette::category(index)
            .ok_or_else(|| SnapError::validation(format!("no palette category {index}")))?;
        self.palette_index = index;
        Ok(cat)
    }

    /// Arm `glyph` for placement.
    pub fn choose_glyph(&mut self, glyph: impl Into<String>) {
        self.armed = Some(glyph.into());
    }

    /// Route a tap: onto the topmost sticker under the point, else onto the canvas.
    pub fn tap(&mut self, x: f64, y: f64) -> Option<StickerId> {
        match self.sticker_at(x, y) {
            Some(id) => {
                self.tap_sticker(id);
                Some(id)
            }
            None => self.tap_canvas(x, y),
        }
    }

    /// Place the armed glyph at `(x, y)` and select it. Stays armed. No-op when not armed.
    pub fn tap_canvas(&mut self, x: f64, y: f64) -> Option<StickerId> {
        let glyph = self.armed.clone()?;
        let id = self.add(Sticker {
            glyph,
            x,
            y,
            scale: self.scale_control,
        });
        self.selected = Some(id);
        Some(id)
    }

    /// Select `id`; the scale control follows its scale. Unknown ids are ignored.
    pub fn tap_sticker(&mut self, id: StickerId) -> bool {
        let Some(scale) = self.sticker(id).map(|s| s.scale) else {
            return false;
        };
        self.selected = Some(id);
        self.scale_control = scale;
        true
    }

    /// Topmost sticker whose stage box contains `(x, y)`.
    pub fn sticker_at(&self, x: f64, y: f64) -> Option<StickerId> {
        self.stickers.iter().rev().find_map(|p| {
            let half = STAGE_STICKER_PX * p.sticker.scale / 2.0;
            let hit = (x - p.sticker.x).abs() <= half && (y - p.sticker.y).abs() <= half;
            hit.then_some(p.id)
        })
    }

    /// Start dragging the sticker under the pointer, selecting it.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<StickerId> {
        let id = self.sticker_at(x, y)?;
        self.tap_sticker(id);
        let st = self.sticker(id)?;
        self.grab = Some(Grab {
            id,
            dx: x - st.x,
            dy: y - st.y,
        });
        Some(id)
    }

    /// Move the dragged sticker, keeping the grab offset.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let Some(grab) = self.grab else {
            return;
        };
        if let Some(st) = self.get_mut(grab.id) {
            st.x = x - grab.dx;
            st.y = y - grab.dy;
        }
    }

    /// End a drag; the sticker stays selected.
    pub fn pointer_up(&mut self) {
        self.grab = None;
    }

    /// Set the scale control (clamped) and apply it to the selected sticker.
    pub fn set_scale(&mut self, scale: f64) {
        let scale = clamp_scale(scale);
        self.scale_control = scale;
        if let Some(id) = self.selected
            && let Some(st) = self.get_mut(id)
        {
            st.scale = scale;
        }
    }

    /// Remove the selected sticker.
    pub fn delete_selected(&mut self) -> Option<Sticker> {
        let id = self.selected.take()?;
        self.grab = None;
        let i = self.stickers.iter().position(|p| p.id == id)?;
        Some(self.stickers.remove(i).sticker)
    }

    /// Remove every sticker.
    pub fn clear_all(&mut self) {
        self.stickers.clear();
        self.selected = None;
        self.grab = None;
    }

    /// Drop the selection and the armed glyph.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.armed = None;
        self.grab = None;
    }

    /// Caption text.
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Replace the caption.
    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    /// Caption font.
    pub fn font_key(&self) -> FontKey {
        self.font_key
    }

    /// Change the caption font.
    pub fn set_font(&mut self, key: FontKey) {
        self.font_key = key;
    }

    /// What the compositor would render right now.
    pub fn compose_request(&self) -> ComposeRequest {
        ComposeRequest {
            base: self.base.clone(),
            caption: self.caption.clone(),
            stickers: self.plain_stickers(),
            frame: Some(self.frame),
            font_key: self.font_key,
        }
    }

    fn plain_stickers(&self) -> Vec<Sticker> {
        self.stickers.iter().map(|p| p.sticker.clone()).collect()
    }

    /// Render and build the finished record. Ends the session.
    #[tracing::instrument(skip_all, fields(stickers = self.stickers.len()))]
    pub fn save<R: RenderSurface>(
        self,
        compositor: &mut Compositor<R>,
        timestamp: i64,
    ) -> SnapResult<Snap> {
        let raster = compositor.compose(&self.compose_request())?;
        Ok(Snap {
            raster_payload: raster,
            stickers: self.plain_stickers(),
            base_payload: self.base,
            caption: self.caption,
            caption_font_key: self.font_key,
            editing_frame: Some(self.frame),
            timestamp,
        })
    }

    /// Discard the working copy. Ends the session.
    pub fn cancel(self) {
        tracing::debug!(stickers = self.stickers.len(), "editor session cancelled");
    }
}

fn ratio(now: f64, recorded: f64) -> f64 {
    if recorded.is_finite() && recorded > 0.0 {
        now / recorded
    } else {
        1.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/session.rs"]
mod tests;
