use crate::error::Error;
use crate::securemem::SecretBuffer;
use std::fs::File;
use std::io::{self, IsTerminal};
use tracing::debug;
use zeroize::Zeroizing;

pub const PROMPT: &str = "Enter Password: ";

/// Where the master password comes from.
pub trait SecretSource {
    fn read_secret(&mut self, prompt: &str, into: &mut SecretBuffer) -> Result<(), Error>;
}

/// Reads from the controlling terminal without echo, or one line from stdin when stdin is not a
/// terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl SecretSource for TerminalPrompt {
    fn read_secret(&mut self, prompt: &str, into: &mut SecretBuffer) -> Result<(), Error> {
        if !io::stdin().is_terminal() {
            debug!("stdin is not a terminal, reading password line from stdin");
            let mut input = unbuffered_stdin().map_err(|e| {
                debug!("cannot open stdin: {e}");
                Error::Password
            })?;
            return into.read_line_from(&mut input);
        }

        let secret = Zeroizing::new(rpassword::prompt_password(prompt).map_err(|e| {
            debug!("password input failed: {e}");
            Error::Password
        })?);
        into.set(secret.as_bytes())
    }
}

/// A second handle on the stdin descriptor that bypasses std's shared `Stdin` buffer, so no
/// copy of the secret is left behind in a buffer this process cannot wipe.
fn unbuffered_stdin() -> io::Result<File> {
    #[cfg(unix)]
    {
        use std::os::fd::AsFd;
        return Ok(File::from(io::stdin().as_fd().try_clone_to_owned()?));
    }
    #[cfg(windows)]
    {
        use std::os::windows::io::AsHandle;
        return Ok(File::from(io::stdin().as_handle().try_clone_to_owned()?));
    }
    #[cfg(not(any(unix, windows)))]
    {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "unbuffered stdin is not available on this platform",
        ))
    }
}
