use std::{collections::HashMap, path::PathBuf};

use crate::{
    fonts::catalog::LoadedFont,
    foundation::error::{SnapError, SnapResult},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley layouts.
pub struct TextBrush {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

/// Single-line layout flattened into absolutely positioned glyphs.
#[derive(Clone, Debug, Default)]
pub struct ShapedLine {
    /// Glyph id plus baseline position relative to the layout's top-left corner.
    pub glyphs: Vec<(u32, f32, f32)>,
    /// Advance width.
    pub width: f64,
    /// Line box height.
    pub height: f64,
}

/// Parley contexts plus the family name each font file registered under.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    families: HashMap<PathBuf, String>,
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl TextShaper {
    /// Fresh contexts with no fonts registered.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    fn family_for(&mut self, font: &LoadedFont) -> SnapResult<String> {
        if let Some(name) = self.families.get(&font.path) {
            return Ok(name.clone());
        }
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes.as_ref().clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            SnapError::validation(format!(
                "no font families registered from '{}'",
                font.path.display()
            ))
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| SnapError::validation("registered font family has no name"))?
            .to_string();
        self.families.insert(font.path.clone(), name.clone());
        Ok(name)
    }

    /// Shape `text` on one line (no wrapping) with `font` at `size_px`.
    pub fn shape_line(
        &mut self,
        font: &LoadedFont,
        text: &str,
        size_px: f32,
    ) -> SnapResult<ShapedLine> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(SnapError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush::default()));
        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(
                    run.positioned_glyphs()
                        .map(|g| (u32::from(g.id), g.x, g.y)),
                );
            }
        }
        Ok(ShapedLine {
            glyphs,
            width: f64::from(layout.width()),
            height: f64::from(layout.height()),
        })
    }
}
