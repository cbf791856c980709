//! Fixed caption font table and the sticker glyph font stack.

/// Caption font choice stored with each snap.
///
/// Persisted as a lowercase key; unknown keys read back as [`FontKey::System`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontKey {
    /// Glyph-capable device default.
    #[default]
    System,
    /// Handwritten style.
    Yomogi,
    /// Rounded style.
    Kosugi,
    /// Mincho (serif) style.
    Sawarabi,
    /// Clean sans.
    Noto,
}

impl FontKey {
    /// All keys in table order.
    pub const ALL: [FontKey; 5] = [
        FontKey::System,
        FontKey::Yomogi,
        FontKey::Kosugi,
        FontKey::Sawarabi,
        FontKey::Noto,
    ];

    /// Persisted key string.
    pub fn key(self) -> &'static str {
        match self {
            FontKey::System => "system",
            FontKey::Yomogi => "yomogi",
            FontKey::Kosugi => "kosugi",
            FontKey::Sawarabi => "sawarabi",
            FontKey::Noto => "noto",
        }
    }

    /// Parse a persisted key, falling back to [`FontKey::System`] for anything unknown.
    pub fn from_key_lossy(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|k| k.key().eq_ignore_ascii_case(s.trim()))
            .unwrap_or_default()
    }

    /// Table entry for this key.
    pub fn option(self) -> &'static FontOption {
        FONT_OPTIONS
            .iter()
            .find(|o| o.key == self)
            .unwrap_or(&FONT_OPTIONS[0])
    }
}

impl serde::Serialize for FontKey {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.key())
    }
}

impl<'de> serde::Deserialize<'de> for FontKey {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Self::from_key_lossy(&s))
    }
}

impl std::fmt::Display for FontKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One row of the caption font table.
#[derive(Debug)]
pub struct FontOption {
    /// Key persisted with the snap.
    pub key: FontKey,
    /// Label shown in the font picker.
    pub label: &'static str,
    /// Font file names searched for in the configured font directories.
    pub files: &'static [&'static str],
}

/// Caption font table, system default first.
pub static FONT_OPTIONS: [FontOption; 5] = [
    FontOption {
        key: FontKey::System,
        label: "Device default",
        files: &[
            "NotoSansJP-Regular.ttf",
            "NotoSansJP-Regular.otf",
            "NotoSansCJK-Regular.ttc",
            "DejaVuSans.ttf",
        ],
    },
    FontOption {
        key: FontKey::Yomogi,
        label: "Handwritten (Yomogi)",
        files: &["Yomogi-Regular.ttf"],
    },
    FontOption {
        key: FontKey::Kosugi,
        label: "Rounded (Kosugi Maru)",
        files: &["KosugiMaru-Regular.ttf"],
    },
    FontOption {
        key: FontKey::Sawarabi,
        label: "Mincho (Sawarabi Mincho)",
        files: &["SawarabiMincho-Regular.ttf"],
    },
    FontOption {
        key: FontKey::Noto,
        label: "Clean (Noto Sans JP)",
        files: &[
            "NotoSansJP-Regular.ttf",
            "NotoSansJP-Regular.otf",
            "NotoSansJP-VariableFont_wght.ttf",
        ],
    },
];

/// Font files tried, in order, for sticker glyphs.
pub static STICKER_FONT_FILES: &[&str] = &[
    "NotoColorEmoji.ttf",
    "NotoEmoji-Regular.ttf",
    "NotoEmoji-VariableFont_wght.ttf",
    "seguiemj.ttf",
    "AppleColorEmoji.ttc",
    "DejaVuSans.ttf",
];

#[cfg(test)]
#[path = "../../tests/unit/fonts/options.rs"]
mod tests;
