/// A named group of sticker glyphs.
#[derive(Debug)]
pub struct PaletteCategory {
    /// Display title.
    pub title: &'static str,
    /// Glyphs in display order. Duplicates are allowed.
    pub glyphs: &'static [&'static str],
}

/// Built-in sticker palette.
pub static PALETTE: [PaletteCategory; 6] = [
    PaletteCategory {
        title: "Feelings & hearts",
        glyphs: &[
            "💖", "✨", "😂", "😍", "😎", "🥳", "👍", "❤️", "😂", "😅", "🤣", "😇", "😉", "😊",
            "🙂", "😄", "😁", "😋", "😌", "😘", "🥰", "😗", "😙", "😚", "🤗", "🤫", "🤔", "🤩",
            "🥳", "🤯", "😭", "😥", "😰", "😱", "😳", "🥺", "😲",
        ],
    },
    PaletteCategory {
        title: "Animals",
        glyphs: &[
            "🐱", "🐾", "🐶", "🐻", "🐰", "🌸", "🐟", "🦋", "🐼", "🐨", "🐯", "🦁", "🐸", "🐒",
            "🐔", "🐧", "🐦", "🐌", "🐢", "🐍", "🐘", "🦒", "🦓", "🦌", "🐉",
        ],
    },
    PaletteCategory {
        title: "Food & drink",
        glyphs: &[
            "🍣", "🍖", "🍦", "🍓", "🧀", "☕️", "🍺", "🍰", "🍕", "🍔", "🍟", "🌭", "🍿", "🍙",
            "🍚", "🍜", "🍛", "🍝", "🥖", "🥐", "🧇", "🥞", "🍳", "🥓", "🍗", "🍞", "🥚", "🍩",
            "🍪", "🍫", "🍬", "🍭", "🍯", "🍧", "🍨", "🥧", "🧁", "🍮", "🍵", "🥤", "🥛", "🍷",
            "🥂", "🥃", "🍸", "🍹", "🍶",
        ],
    },
    PaletteCategory {
        title: "Nature & weather",
        glyphs: &[
            "☀️", "💧", "❄️", "☔️", "🌪️", "🎃", "🎄", "🎁", "🎈", "🌤️", "⛅️", "☁️", "🌦️", "🌧️",
            "⛈️", "🌩️", "💦", "☃️", "⛄️", "🌬️", "🌈", "🔥", "⭐", "🌟", "💫", "⚡️", "🌙", "🌊",
            "🍂", "🍁", "🍄", "🌿", "🌱", "🌲", "🌳", "🌵", "🌴",
        ],
    },
    PaletteCategory {
        title: "Vehicles & toys",
        glyphs: &[
            "🚗", "🚌", "✈️", "🚀", "🚢", "🧸", "🧶", "🎮", "🕹️", "🎲", "🧩", "🚲", "🏍️", "🛴",
            "🚂", "🛸", "🚁", "⛵️", "⚓️",
        ],
    },
    PaletteCategory {
        title: "Life & events",
        glyphs: &[
            "🏠", "🛋️", "🛌", "🛁", "🚽", "🎁", "🎈", "🎊", "🎉", "🎂", "💍", "💎", "👑", "💰",
            "💵", "💴", "💶", "💷", "🎶", "🎵", "🎷", "🎸", "🎹", "🏫", "🎓", "✏️", "📚", "📏",
            "🏥", "🏦", "🏪", "🛣️", "🚦", "🚧", "🔔", "💡", "✉️", "✂️", "📎", "🔗", "📞", "💻",
            "📱", "🖨️", "⌨️", "⚾️", "🏀", "⚽️", "🎾", "🏂",
        ],
    },
];

/// Category at `index`, if any.
pub fn category(index: usize) -> Option<&'static PaletteCategory> {
    PALETTE.get(index)
}

#[cfg(test)]
#[path = "../../tests/unit/editor/palette.rs"]
mod tests;
