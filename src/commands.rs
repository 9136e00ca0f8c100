use crate::cli;
use crate::clipboard::Clipboard;
use crate::engine::DerivationEngine;
use crate::error::Error;
use crate::fingerprint::Fingerprint;
use crate::interrupt::Interrupt;
use crate::options::Summary;
use crate::output::{self, Destination};
use crate::prompt::{SecretSource, PROMPT};
use crate::securemem::{SecretStore, WipeOnExit};
use std::io::Write;
use tracing::{debug, info};

/// External services the pipeline talks to.
pub struct Collaborators<'a> {
    pub engine: &'a dyn DerivationEngine,
    pub secrets: &'a mut dyn SecretSource,
    pub clipboard: &'a mut dyn Clipboard,
    pub out: &'a mut dyn Write,
    pub interrupt: &'a Interrupt,
}

/// Parse, validate, read the master password, derive, show the fingerprint and deliver.
///
/// `store` is wiped before this returns, whichever stage ends the run. Once the master password
/// is held, a pending interrupt stops the run at the next stage boundary.
pub fn run<S: AsRef<str>>(
    args: &[S],
    io: &mut Collaborators<'_>,
    store: &mut SecretStore,
) -> Result<(), Error> {
    let _lock = store.lock();
    let mut secrets = WipeOnExit::new(store);

    let options = cli::parse_args(args)?;
    debug!(?options, "parsed command line");

    let request = options.finalize(io.engine, &mut secrets.context)?;
    writeln!(io.out, "Options: {}", Summary(&secrets.context))?;
    io.out.flush()?;

    let SecretStore { master, context } = &mut *secrets;
    io.secrets.read_secret(PROMPT, master)?;
    io.interrupt.arm();
    io.interrupt.check()?;

    io.engine
        .derive(context, &request.site, &request.login, master.expose())
        .map_err(|e| {
            debug!(code = e.code(), "password generation failed: {e}");
            Error::Generate(e.code())
        })?;
    info!("password generated");
    io.interrupt.check()?;

    writeln!(io.out, "{}", Fingerprint::of(master.expose()))?;
    io.out.flush()?;

    output::deliver(
        context.password(),
        Destination::from_print_flag(request.print),
        &mut *io.out,
        &mut *io.clipboard,
    )
}
