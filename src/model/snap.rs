use std::collections::BTreeMap;

use crate::{
    assets::payload::Payload, fonts::options::FontKey, foundation::clock::DayKey,
    foundation::core::EditingFrame,
};

/// Lowest sticker scale the editor allows.
pub const MIN_STICKER_SCALE: f64 = 0.5;
/// Highest sticker scale the editor allows.
pub const MAX_STICKER_SCALE: f64 = 2.5;

/// A positioned, scaled glyph overlay.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sticker {
    /// Display symbol.
    #[serde(alias = "text")]
    pub glyph: String,
    /// Center x in editing-frame coordinates.
    pub x: f64,
    /// Center y in editing-frame coordinates.
    pub y: f64,
    /// Size multiplier.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

/// Clamp a scale into the editor range; non-finite values reset to 1.
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(MIN_STICKER_SCALE, MAX_STICKER_SCALE)
    } else {
        1.0
    }
}

/// One annotated photo. Edits replace the whole record.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Snap {
    /// Final composite (photo + stickers + caption). Empty when evicted by relief.
    #[serde(default)]
    pub raster_payload: Payload,
    /// Original photo without annotations.
    #[serde(default)]
    pub base_payload: Payload,
    /// Caption text.
    #[serde(default)]
    pub caption: String,
    /// Caption font.
    #[serde(default)]
    pub caption_font_key: FontKey,
    /// Stickers in placement (z) order.
    #[serde(default)]
    pub stickers: Vec<Sticker>,
    /// Viewport the sticker coordinates were recorded in.
    #[serde(default)]
    pub editing_frame: Option<EditingFrame>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Snap {
    /// Photo to open in the editor: the un-annotated base when present, else the composite.
    pub fn editable_base(&self) -> &Payload {
        if self.base_payload.is_empty() {
            &self.raster_payload
        } else {
            &self.base_payload
        }
    }

    /// Stickers that can be restored for re-editing.
    ///
    /// Without a separate base photo the stickers are already burnt into the composite, so
    /// restoring them would draw them twice.
    pub fn restorable_stickers(&self) -> &[Sticker] {
        if self.base_payload.is_empty() {
            &[]
        } else {
            &self.stickers
        }
    }

    /// Metadata-only projection written to the legacy list.
    pub fn legacy_meta(&self) -> LegacyMeta {
        LegacyMeta {
            ts: self.timestamp,
            caption: self.caption.clone(),
            caption_font_key: self.caption_font_key,
        }
    }

    /// Drop both payloads, keeping metadata.
    pub fn evict_payloads(&mut self) {
        self.raster_payload = Payload::empty();
        self.base_payload = Payload::empty();
    }
}

/// Record shape of the pre-calendar flat list.
///
/// Full records carry `data`/`base`; after migration the list only holds the metadata fields.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRecord {
    /// Composite data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
    /// Base photo data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Payload>,
    /// Caption text.
    #[serde(default)]
    pub caption: String,
    /// Caption font key.
    #[serde(default)]
    pub caption_font_key: FontKey,
    /// Stickers with `text` glyphs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stickers: Vec<Sticker>,
    /// Recorded viewport (`{w, h}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<EditingFrame>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub ts: i64,
}

impl LegacyRecord {
    /// Wrap as a [`Snap`]; missing payloads become empty.
    pub fn into_snap(self) -> Snap {
        let raster = self.data.unwrap_or_default();
        Snap {
            base_payload: self.base.unwrap_or_else(|| raster.clone()),
            raster_payload: raster,
            caption: self.caption,
            caption_font_key: self.caption_font_key,
            stickers: self.stickers,
            editing_frame: self.frame,
            timestamp: self.ts,
        }
    }
}

/// Metadata-only legacy projection. Never carries payloads.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMeta {
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
    /// Caption text.
    pub caption: String,
    /// Caption font key.
    pub caption_font_key: FontKey,
}

/// Full history: day -> snaps in display order (latest first).
pub type CalendarMap = BTreeMap<DayKey, Vec<Snap>>;

/// Cached view of one calendar day.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TodayMirror {
    /// Day this mirror was derived for.
    pub date: DayKey,
    /// Copy of `calendar[date]`.
    #[serde(default)]
    pub items: Vec<Snap>,
}

impl TodayMirror {
    /// Derive the mirror for `today` from the canonical calendar.
    pub fn derive(calendar: &CalendarMap, today: &DayKey) -> Self {
        Self {
            date: today.clone(),
            items: calendar.get(today).cloned().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/snap.rs"]
mod tests;
