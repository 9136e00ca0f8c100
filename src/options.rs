use crate::cli::ParsedOptions;
use crate::engine::{CharsetSelection, DerivationEngine, DEFAULT_COUNTER, DEFAULT_LENGTH};
use crate::error::Error;
use std::fmt;
use zeroize::Zeroize;

/// Output capacity of a generation context. Comfortably above the engine's maximum length.
pub const OUTPUT_CAPACITY: usize = 64;

/// Settings handed to the derivation engine, plus the buffer it writes the password into.
///
/// The output buffer is fixed-size so the password never lives in a reallocating heap buffer.
#[derive(Zeroize)]
pub struct GenerationContext {
    charsets: CharsetSelection,
    length: u32,
    counter: u32,
    output: [u8; OUTPUT_CAPACITY],
    output_len: usize,
}

impl GenerationContext {
    /// Fresh context carrying the engine defaults.
    pub fn new() -> Self {
        Self {
            charsets: CharsetSelection::ALL,
            length: DEFAULT_LENGTH,
            counter: DEFAULT_COUNTER,
            output: [0u8; OUTPUT_CAPACITY],
            output_len: 0,
        }
    }

    pub fn charsets(&self) -> CharsetSelection {
        self.charsets
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn set_charsets(&mut self, charsets: CharsetSelection) {
        self.charsets = charsets;
    }

    pub fn set_length(&mut self, length: u32) {
        self.length = length;
    }

    pub fn set_counter(&mut self, counter: u32) {
        self.counter = counter;
    }

    /// Generated password, empty until the engine succeeds.
    pub fn password(&self) -> &[u8] {
        &self.output[..self.output_len]
    }

    /// Claim `len` bytes of the output buffer for the engine to fill.
    pub fn output_mut(&mut self, len: usize) -> Option<&mut [u8]> {
        if len > OUTPUT_CAPACITY {
            return None;
        }
        self.output_len = len;
        Some(&mut self.output[..len])
    }

    /// True when every byte of the context, settings included, has been wiped.
    pub fn is_wiped(&self) -> bool {
        self.charsets.is_empty()
            && self.length == 0
            && self.counter == 0
            && self.output_len == 0
            && self.output.iter().all(|b| *b == 0)
    }
}

impl Default for GenerationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GenerationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationContext")
            .field("charsets", &self.charsets)
            .field("length", &self.length)
            .field("counter", &self.counter)
            .finish_non_exhaustive()
    }
}

/// The effective settings as a short-option string, e.g. `-ludsc1n16`.
pub struct Summary<'a>(pub &'a GenerationContext);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("-")?;
        for charset in self.0.charsets.iter() {
            write!(f, "{}", charset.flag())?;
        }
        write!(f, "c{}n{}", self.0.counter, self.0.length)
    }
}

/// Everything the rest of the pipeline needs from the command line besides the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub site: String,
    pub login: String,
    pub print: bool,
}

impl ParsedOptions {
    /// Apply the user's explicit choices onto `ctx`, checking numeric values against the
    /// engine's ranges.
    ///
    /// `ctx` is reset to the engine defaults first. An explicit charset selection replaces the
    /// default set. Stops at the first rejected value.
    pub fn finalize(
        self,
        engine: &dyn DerivationEngine,
        ctx: &mut GenerationContext,
    ) -> Result<Request, Error> {
        *ctx = GenerationContext::new();

        if let Some(charsets) = self.charsets {
            ctx.set_charsets(charsets);
        }
        if let Some(length) = self.length {
            ctx.set_length(checked("length", length, |n| engine.length_is_valid(n))?);
        }
        if let Some(counter) = self.counter {
            ctx.set_counter(checked("counter", counter, |n| engine.counter_is_valid(n))?);
        }

        Ok(Request {
            site: self.site,
            login: self.login,
            print: self.print,
        })
    }
}

fn checked(
    field: &'static str,
    value: i64,
    valid: impl Fn(u32) -> bool,
) -> Result<u32, Error> {
    u32::try_from(value)
        .ok()
        .filter(|n| valid(*n))
        .ok_or(Error::Value { field, value })
}
