use crate::error::Error;
use crate::options::GenerationContext;
use std::io::{self, Read};
use std::ops::{Deref, DerefMut};
use tracing::{debug, trace};
use zeroize::{Zeroize, Zeroizing};

/// Longest master password accepted, in bytes.
pub const SECRET_CAPACITY: usize = 1024;

/// Fixed-capacity holder for the entered master password.
#[derive(Zeroize)]
pub struct SecretBuffer {
    bytes: [u8; SECRET_CAPACITY],
    len: usize,
}

impl SecretBuffer {
    pub fn new() -> Self {
        Self {
            bytes: [0u8; SECRET_CAPACITY],
            len: 0,
        }
    }

    /// Replace the contents. Input longer than the capacity is refused, not truncated.
    pub fn set(&mut self, secret: &[u8]) -> Result<(), Error> {
        if secret.len() > SECRET_CAPACITY {
            return Err(Error::Password);
        }
        self.bytes.zeroize();
        self.bytes[..secret.len()].copy_from_slice(secret);
        self.len = secret.len();
        Ok(())
    }

    /// Fill from `reader` one byte at a time up to a `\n`, dropping a trailing `\r`.
    ///
    /// Bytes go straight into the fixed storage with no intermediate copy. On any failure the
    /// buffer is wiped, partial input included. End of input before the first byte fails.
    pub fn read_line_from(&mut self, reader: &mut impl Read) -> Result<(), Error> {
        self.zeroize();
        let filled = self.fill_line(reader);
        if let Err(e) = &filled {
            debug!("password input failed: {e}");
            self.zeroize();
        }
        filled.map_err(|_| Error::Password)
    }

    fn fill_line(&mut self, reader: &mut impl Read) -> io::Result<()> {
        let mut byte = Zeroizing::new([0u8; 1]);
        let mut seen_any = false;
        loop {
            match reader.read(&mut byte[..]) {
                Ok(0) if !seen_any => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "no password on input",
                    ))
                }
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
            seen_any = true;
            if byte[0] == b'\n' {
                break;
            }
            if self.len == SECRET_CAPACITY {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "password longer than buffer capacity",
                ));
            }
            self.bytes[self.len] = byte[0];
            self.len += 1;
        }
        if self.len > 0 && self.bytes[self.len - 1] == b'\r' {
            self.len -= 1;
            self.bytes[self.len] = 0;
        }
        Ok(())
    }

    pub fn expose(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn is_wiped(&self) -> bool {
        self.len == 0 && self.bytes.iter().all(|b| *b == 0)
    }
}

impl Default for SecretBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Every secret-bearing buffer of one invocation.
///
/// The store is owned by the caller of the pipeline so its contents can still be inspected
/// after the pipeline has wiped it.
#[derive(Default, Zeroize)]
pub struct SecretStore {
    pub master: SecretBuffer,
    pub context: GenerationContext,
}

impl SecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_wiped(&self) -> bool {
        self.master.is_wiped() && self.context.is_wiped()
    }

    /// Pin the whole store, settings and both buffers, for as long as the lock lives.
    pub fn lock(&self) -> MemoryLock {
        MemoryLock::pin(self)
    }
}

/// Scope guard that zeroes the store exactly once, when the guard goes out of scope.
///
/// Holding the store through this guard means early returns and `?` propagation wipe it too.
pub struct WipeOnExit<'a> {
    store: &'a mut SecretStore,
}

impl<'a> WipeOnExit<'a> {
    pub fn new(store: &'a mut SecretStore) -> Self {
        Self { store }
    }
}

impl Deref for WipeOnExit<'_> {
    type Target = SecretStore;

    fn deref(&self) -> &SecretStore {
        self.store
    }
}

impl DerefMut for WipeOnExit<'_> {
    fn deref_mut(&mut self) -> &mut SecretStore {
        self.store
    }
}

impl Drop for WipeOnExit<'_> {
    fn drop(&mut self) {
        self.store.zeroize();
        trace!("secret buffers wiped");
    }
}

/// Best-effort pin of one secret-bearing value in RAM, released on drop.
///
/// Locking covers the value's own bytes only, so it suits fixed-size types such as
/// [`SecretStore`]. The pinned value must stay in place while the lock lives; borrowing it for
/// that long is the caller's job. Refusal by the OS (limits, permissions) is not an error.
pub struct MemoryLock {
    region: Option<(*const u8, usize)>,
}

impl MemoryLock {
    pub fn pin<T>(value: &T) -> Self {
        let len = std::mem::size_of_val(value);
        let addr = (value as *const T).cast::<u8>();
        if len == 0 || !sys::lock(addr, len) {
            trace!(len, "memory lock unavailable");
            return Self { region: None };
        }
        Self {
            region: Some((addr, len)),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.region.is_some()
    }
}

impl Drop for MemoryLock {
    fn drop(&mut self) {
        if let Some((addr, len)) = self.region.take() {
            sys::unlock(addr, len);
        }
    }
}

#[cfg(unix)]
mod sys {
    pub(super) fn lock(addr: *const u8, len: usize) -> bool {
        // SAFETY: mlock only changes the paging state of the range, never its contents.
        unsafe { libc::mlock(addr.cast(), len) == 0 }
    }

    pub(super) fn unlock(addr: *const u8, len: usize) {
        // SAFETY: same range that `lock` accepted.
        unsafe {
            libc::munlock(addr.cast(), len);
        }
    }
}

#[cfg(windows)]
mod sys {
    use windows_sys::Win32::System::Memory::{VirtualLock, VirtualUnlock};

    pub(super) fn lock(addr: *const u8, len: usize) -> bool {
        // SAFETY: VirtualLock only changes the residency of the range, never its contents.
        unsafe { VirtualLock(addr.cast(), len) != 0 }
    }

    pub(super) fn unlock(addr: *const u8, len: usize) {
        // SAFETY: same range that `lock` accepted.
        unsafe {
            VirtualUnlock(addr.cast(), len);
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod sys {
    pub(super) fn lock(_addr: *const u8, _len: usize) -> bool {
        false
    }

    pub(super) fn unlock(_addr: *const u8, _len: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn loaded_store() -> SecretStore {
        let mut store = SecretStore::new();
        store.master.set(b"correcthorse").unwrap();
        store
            .context
            .output_mut(8)
            .unwrap()
            .copy_from_slice(b"Gen3r@t3");
        store
    }

    #[test]
    fn guard_wipes_on_scope_exit() {
        let mut store = loaded_store();
        {
            let guarded = WipeOnExit::new(&mut store);
            assert_eq!(guarded.master.expose(), b"correcthorse");
        }
        assert!(store.is_wiped());
    }

    #[test]
    fn guard_wipes_on_early_error() {
        fn fails(store: &mut SecretStore) -> Result<(), Error> {
            let mut guarded = WipeOnExit::new(store);
            guarded.master.set(b"hunter2")?;
            Err(Error::Clipboard)
        }

        let mut store = loaded_store();
        assert!(fails(&mut store).is_err());
        assert!(store.is_wiped());
    }

    #[test]
    fn oversized_secret_is_refused() {
        let mut buf = SecretBuffer::new();
        buf.set(b"short").unwrap();
        let err = buf.set(&[b'x'; SECRET_CAPACITY + 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Password);
        assert_eq!(buf.expose(), b"short");
    }

    #[test]
    fn shorter_secret_clears_previous_tail() {
        let mut buf = SecretBuffer::new();
        buf.set(b"longer secret").unwrap();
        buf.set(b"abc").unwrap();
        assert_eq!(buf.expose(), b"abc");
        assert!(buf.bytes[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn lock_of_empty_region_is_inert() {
        assert!(!MemoryLock::pin(&()).is_locked());
        let store = SecretStore::new();
        drop(store.lock());
    }

    #[test]
    fn store_lock_spans_the_whole_store() {
        let store = SecretStore::new();
        let lock = store.lock();
        // The OS may refuse; when it does not, one region covers every buffer.
        if let Some((addr, len)) = lock.region {
            assert_eq!(addr, (&store as *const SecretStore).cast::<u8>());
            assert_eq!(len, std::mem::size_of::<SecretStore>());
        }
    }

    /// Yields `data`, then fails instead of reporting end of input.
    struct Failing<'a> {
        data: &'a [u8],
    }

    impl Read for Failing<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "stream broke"));
            }
            let n = buf.len().min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn reads_line_into_storage() {
        let mut buf = SecretBuffer::new();
        buf.read_line_from(&mut &b"correcthorse\nnext line"[..]).unwrap();
        assert_eq!(buf.expose(), b"correcthorse");

        buf.read_line_from(&mut &b"  spaced out \r\n"[..]).unwrap();
        assert_eq!(buf.expose(), b"  spaced out ");
        assert!(buf.bytes[buf.len..].iter().all(|b| *b == 0));

        buf.read_line_from(&mut &b"no newline"[..]).unwrap();
        assert_eq!(buf.expose(), b"no newline");

        buf.read_line_from(&mut &b"\n"[..]).unwrap();
        assert!(buf.expose().is_empty());
    }

    #[test]
    fn read_failure_wipes_partial_input() {
        let mut buf = SecretBuffer::new();
        buf.set(b"previous").unwrap();
        let err = buf
            .read_line_from(&mut Failing { data: b"correct" })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Password);
        assert!(buf.is_wiped());
    }

    #[test]
    fn empty_input_fails_and_stays_wiped() {
        let mut buf = SecretBuffer::new();
        buf.set(b"previous").unwrap();
        let err = buf.read_line_from(&mut &b""[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Password);
        assert!(buf.is_wiped());
    }

    #[test]
    fn overlong_line_is_refused_and_wiped() {
        let mut line = vec![b'x'; SECRET_CAPACITY + 1];
        line.push(b'\n');
        let mut buf = SecretBuffer::new();
        let err = buf.read_line_from(&mut line.as_slice()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Password);
        assert!(buf.is_wiped());

        let mut exact = vec![b'y'; SECRET_CAPACITY];
        exact.push(b'\n');
        buf.read_line_from(&mut exact.as_slice()).unwrap();
        assert_eq!(buf.expose().len(), SECRET_CAPACITY);
    }
}
