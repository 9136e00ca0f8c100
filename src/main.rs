//! Threat model:
//! - The master password never leaves this process except through the derived password.
//! - Anyone watching the screen sees the fingerprint, which identifies the master password
//!   only loosely.
//! - Secret buffers are wiped before exit on every path, including failures and Ctrl+C once the
//!   master password has been entered.

use sitepass::clipboard::SystemClipboard;
use sitepass::commands::{self, Collaborators};
use sitepass::engine::LessPass;
use sitepass::interrupt::{self, Interrupt, EXIT_INTERRUPTED};
use sitepass::prompt::TerminalPrompt;
use sitepass::{cli, Error, SecretStore};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;

fn main() -> ExitCode {
    init_logging();

    // Ctrl+C must unwind through the wipe guard rather than kill the process mid-derivation.
    let interrupt = Arc::new(Interrupt::new());
    if let Err(e) = interrupt::install(Arc::clone(&interrupt)) {
        warn!("failed to install interrupt handler: {e}");
    }

    let args: Vec<String> = match std::env::args_os()
        .skip(1)
        .map(|arg| arg.into_string())
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(args) => args,
        Err(_) => {
            let err = Error::Option {
                reason: "argument is not valid UTF-8",
            };
            eprintln!("Error: {err}");
            return ExitCode::from(1);
        }
    };

    if cli::is_usage_request(&args) {
        eprint!("{}", cli::USAGE);
        return ExitCode::from(1);
    }

    let mut prompt = TerminalPrompt;
    let mut clipboard = SystemClipboard::new();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut store = SecretStore::new();
    let mut io = Collaborators {
        engine: &LessPass,
        secrets: &mut prompt,
        clipboard: &mut clipboard,
        out: &mut out,
        interrupt: &interrupt,
    };

    match commands::run(&args, &mut io, &mut store) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Interrupted) => ExitCode::from(EXIT_INTERRUPTED),
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(1)
        }
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sitepass=warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
