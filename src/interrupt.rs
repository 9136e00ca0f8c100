//! Ctrl+C and termination handling.
//!
//! Until the pipeline holds the master password, an interrupt ends the process at once. After
//! [`Interrupt::arm`], the handler only raises a flag; the pipeline polls it between stages and
//! returns through its wipe guard. A pipeline that does not get there within [`GRACE`] is ended
//! anyway.

use crate::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Exit status after an interrupt, as shells report SIGINT.
pub const EXIT_INTERRUPTED: u8 = 130;

/// How long an armed pipeline gets to reach its next checkpoint.
pub const GRACE: Duration = Duration::from_secs(3);

#[derive(Debug, Default)]
pub struct Interrupt {
    requested: AtomicBool,
    armed: AtomicBool,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interrupt. True when the pipeline is armed and will unwind by itself.
    pub fn request(&self) -> bool {
        self.requested.store(true, Ordering::SeqCst);
        self.armed.load(Ordering::SeqCst)
    }

    /// Secrets are held from here on.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Checkpoint between pipeline stages.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_requested() {
            debug!("stopping at checkpoint after interrupt");
            return Err(Error::Interrupted);
        }
        Ok(())
    }
}

/// Route Ctrl+C, SIGTERM and SIGHUP to `interrupt`. Call once per process.
pub fn install(interrupt: Arc<Interrupt>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        info!("interrupt received");
        if interrupt.request() {
            std::thread::sleep(GRACE);
        }
        std::process::exit(i32::from(EXIT_INTERRUPTED));
    })
}
