use crate::clipboard::Clipboard;
use crate::error::Error;
use std::io::Write;
use tracing::debug;

/// Where the generated password goes. Exactly one destination per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Print,
    Clipboard,
}

impl Destination {
    pub fn from_print_flag(print: bool) -> Self {
        if print {
            Destination::Print
        } else {
            Destination::Clipboard
        }
    }
}

pub fn deliver(
    secret: &[u8],
    destination: Destination,
    out: &mut dyn Write,
    clipboard: &mut dyn Clipboard,
) -> Result<(), Error> {
    debug!(?destination, "delivering password");
    match destination {
        Destination::Print => {
            out.write_all(secret)?;
            out.write_all(b"\n")?;
            out.flush()?;
            Ok(())
        }
        Destination::Clipboard => clipboard.copy(secret),
    }
}
