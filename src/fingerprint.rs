//! Visual confirmation of the master password.
//!
//! Three colored icons derived from HMAC-SHA256(key = master password, message = ""). The same
//! password always shows the same icons, so a typo is noticed before the generated password is
//! used. This is a display aid only; many passwords share a fingerprint.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

/// Table order is part of the output: reordering changes every fingerprint.
pub const ICONS: [&str; 46] = [
    "🏷️", "❤️", "🛏️", "🏫", "🔌", "🚑", "🚌", "🚗", "✈️", "🚀", "🚢", "🚇",
    "🚚", "💴", "💶", "₿", "💵", "💷", "🗄️", "📊", "🛏️", "🍺", "🔔", "🔭",
    "🎂", "💣", "💼", "🐛", "📷", "🛒", "📜", "☕", "☁️", "☕", "💬", "🧊",
    "🍴", "🗄️", "💎", "❗", "👁️", "🚩", "🧪", "⚽", "🎮", "🎓",
];

pub const COLORS: [&str; 14] = [
    "\x1b[97m", // white
    "\x1b[36m", // cyan
    "\x1b[36m",
    "\x1b[35m", // magenta
    "\x1b[35m",
    "\x1b[35m",
    "\x1b[34m", // blue
    "\x1b[35m",
    "\x1b[34m",
    "\x1b[34m",
    "\x1b[31m", // red
    "\x1b[33m", // yellow
    "\x1b[33m",
    "\x1b[32m", // green
];

pub const RESET: &str = "\x1b[0m";

const GLYPHS: usize = 3;
const GROUP_BYTES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub color: &'static str,
    pub icon: &'static str,
}

impl Glyph {
    fn from_group(group: u32) -> Self {
        Glyph {
            color: COLORS[group as usize % COLORS.len()],
            icon: ICONS[group as usize % ICONS.len()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint([Glyph; GLYPHS]);

impl Fingerprint {
    pub fn of(master: &[u8]) -> Self {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(master)
            .expect("HMAC accepts keys of any length");
        mac.update(b"");
        let mut digest = Zeroizing::new([0u8; 32]);
        digest.copy_from_slice(&mac.finalize().into_bytes());

        let mut glyphs = [Glyph::from_group(0); GLYPHS];
        for (glyph, group) in glyphs.iter_mut().zip(digest.chunks_exact(GROUP_BYTES)) {
            let group = group
                .iter()
                .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte));
            *glyph = Glyph::from_group(group);
        }
        Fingerprint(glyphs)
    }

    pub fn glyphs(&self) -> &[Glyph; GLYPHS] {
        &self.0
    }
}

/// ` <color><icon>` per glyph, then a color reset. No trailing newline.
impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for glyph in &self.0 {
            write!(f, " {}{}", glyph.color, glyph.icon)?;
        }
        f.write_str(RESET)
    }
}
