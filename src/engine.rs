//! LessPass-compatible password derivation.
//!
//! Derivation hierarchy:
//!
//! salt    = site || login || hex(counter)
//!   ↓
//! entropy = PBKDF2-HMAC-SHA256(master, salt, 100_000 rounds, 32 bytes)
//!   ↓
//! password = render(entropy, charsets, length)
//!
//! The entropy is treated as one 256-bit big-endian integer and consumed by repeated
//! division, so the same inputs always render the same password.

use crate::options::GenerationContext;
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

pub const DEFAULT_LENGTH: u32 = 16;
pub const DEFAULT_COUNTER: u32 = 1;
pub const MIN_LENGTH: u32 = 5;
pub const MAX_LENGTH: u32 = 35;
pub const MIN_COUNTER: u32 = 1;

const PBKDF2_ROUNDS: u32 = 100_000;
const ENTROPY_LEN: usize = 32;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Charset {
    Lowercase,
    Uppercase,
    Digits,
    Symbols,
}

impl Charset {
    /// Rendering order. Changing it changes every generated password.
    pub const ALL: [Charset; 4] = [
        Charset::Lowercase,
        Charset::Uppercase,
        Charset::Digits,
        Charset::Symbols,
    ];

    pub fn alphabet(self) -> &'static [u8] {
        match self {
            Charset::Lowercase => LOWERCASE,
            Charset::Uppercase => UPPERCASE,
            Charset::Digits => DIGITS,
            Charset::Symbols => SYMBOLS,
        }
    }

    /// Short option letter selecting this class.
    pub fn flag(self) -> char {
        match self {
            Charset::Lowercase => 'l',
            Charset::Uppercase => 'u',
            Charset::Digits => 'd',
            Charset::Symbols => 's',
        }
    }

    fn bit(self) -> u8 {
        match self {
            Charset::Lowercase => 0x01,
            Charset::Uppercase => 0x02,
            Charset::Digits => 0x04,
            Charset::Symbols => 0x08,
        }
    }
}

/// Set of character classes allowed in a generated password.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Zeroize)]
pub struct CharsetSelection(u8);

impl CharsetSelection {
    pub const ALL: CharsetSelection = CharsetSelection(0x0f);

    pub const fn empty() -> Self {
        CharsetSelection(0)
    }

    #[must_use]
    pub fn with(self, charset: Charset) -> Self {
        CharsetSelection(self.0 | charset.bit())
    }

    pub fn contains(self, charset: Charset) -> bool {
        self.0 & charset.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Selected classes in rendering order.
    pub fn iter(self) -> impl Iterator<Item = Charset> {
        Charset::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Charset> for CharsetSelection {
    fn from_iter<T: IntoIterator<Item = Charset>>(iter: T) -> Self {
        iter.into_iter()
            .fold(CharsetSelection::empty(), CharsetSelection::with)
    }
}

/// Engine failures. Each carries a stable negative code reported to the user.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeriveError {
    #[error("length out of range")]
    InvalidLength,
    #[error("counter out of range")]
    InvalidCounter,
    #[error("no character classes selected")]
    NoCharsets,
    #[error("output buffer too small")]
    Capacity,
}

impl DeriveError {
    pub fn code(self) -> i32 {
        match self {
            DeriveError::InvalidLength => -1,
            DeriveError::InvalidCounter => -2,
            DeriveError::NoCharsets => -3,
            DeriveError::Capacity => -4,
        }
    }
}

/// Deterministic keyed password derivation plus the ranges it accepts.
pub trait DerivationEngine {
    fn length_is_valid(&self, length: u32) -> bool;

    fn counter_is_valid(&self, counter: u32) -> bool;

    /// Fill `ctx`'s output buffer with a password for (`site`, `login`, `master`).
    fn derive(
        &self,
        ctx: &mut GenerationContext,
        site: &str,
        login: &str,
        master: &[u8],
    ) -> Result<(), DeriveError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LessPass;

impl DerivationEngine for LessPass {
    fn length_is_valid(&self, length: u32) -> bool {
        (MIN_LENGTH..=MAX_LENGTH).contains(&length)
    }

    fn counter_is_valid(&self, counter: u32) -> bool {
        counter >= MIN_COUNTER
    }

    fn derive(
        &self,
        ctx: &mut GenerationContext,
        site: &str,
        login: &str,
        master: &[u8],
    ) -> Result<(), DeriveError> {
        if !self.length_is_valid(ctx.length()) {
            return Err(DeriveError::InvalidLength);
        }
        if !self.counter_is_valid(ctx.counter()) {
            return Err(DeriveError::InvalidCounter);
        }
        let charsets = ctx.charsets();
        if charsets.is_empty() {
            return Err(DeriveError::NoCharsets);
        }

        let salt = format!("{site}{login}{:x}", ctx.counter());
        let mut entropy = Entropy::derive(master, salt.as_bytes());
        debug!(length = ctx.length(), counter = ctx.counter(), "deriving password");

        let length = ctx.length() as usize;
        let out = ctx.output_mut(length).ok_or(DeriveError::Capacity)?;
        render(&mut entropy, charsets, out);
        Ok(())
    }
}

/// 256-bit big-endian integer consumed by successive small divisions.
struct Entropy(Zeroizing<[u8; ENTROPY_LEN]>);

impl Entropy {
    fn derive(master: &[u8], salt: &[u8]) -> Self {
        let mut bytes = Zeroizing::new([0u8; ENTROPY_LEN]);
        pbkdf2::pbkdf2_hmac::<Sha256>(master, salt, PBKDF2_ROUNDS, bytes.as_mut());
        Entropy(bytes)
    }

    /// Divide in place by `modulus` and return the remainder.
    fn take(&mut self, modulus: usize) -> usize {
        debug_assert!(modulus > 0 && modulus <= u16::MAX as usize);
        let modulus = modulus as u32;
        let mut rem = 0u32;
        for byte in self.0.iter_mut() {
            let acc = (rem << 8) | u32::from(*byte);
            *byte = (acc / modulus) as u8;
            rem = acc % modulus;
        }
        rem as usize
    }
}

/// Render into `out`, whose length is the requested password length.
///
/// `out.len()` must be at least the number of selected classes.
fn render(entropy: &mut Entropy, charsets: CharsetSelection, out: &mut [u8]) {
    let classes = charsets.iter().count();
    let body = out.len() - classes;

    // Body drawn from the concatenated alphabet, without building it.
    let pool: usize = charsets.iter().map(|c| c.alphabet().len()).sum();
    for slot in out[..body].iter_mut() {
        *slot = pick(charsets, entropy.take(pool));
    }

    // One guaranteed character per class, drawn before any insertion.
    let mut extra = Zeroizing::new([0u8; Charset::ALL.len()]);
    for (slot, charset) in extra.iter_mut().zip(charsets.iter()) {
        let alphabet = charset.alphabet();
        *slot = alphabet[entropy.take(alphabet.len())];
    }

    let mut filled = body;
    for &ch in extra[..classes].iter() {
        let at = entropy.take(filled);
        out.copy_within(at..filled, at + 1);
        out[at] = ch;
        filled += 1;
    }
}

/// Index into the concatenation of the selected alphabets.
fn pick(charsets: CharsetSelection, mut index: usize) -> u8 {
    for charset in charsets.iter() {
        let alphabet = charset.alphabet();
        if index < alphabet.len() {
            return alphabet[index];
        }
        index -= alphabet.len();
    }
    unreachable!("index is reduced modulo the pool size")
}
