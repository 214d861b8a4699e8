//! The diagnostic output stream.
//!
//! Flag dumps and the statistics printed at shutdown go to a single
//! [`Tty`]. It is flushed and closed as the very last teardown action;
//! after that every write is silently discarded.

use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};

enum TtyState {
    Open(Box<dyn Write + Send>),
    Closed,
}

/// Shared diagnostic stream.
pub struct Tty {
    state: Mutex<TtyState>,
}

impl Tty {
    /// Stream backed by an arbitrary writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            state: Mutex::new(TtyState::Open(Box::new(writer))),
        }
    }

    /// Stream backed by the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Runs `f` against the underlying writer.
    ///
    /// Once the stream is closed `f` receives a sink.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut dyn Write) -> R) -> R {
        let mut state = self.state.lock();
        match &mut *state {
            TtyState::Open(writer) => f(writer.as_mut()),
            TtyState::Closed => f(&mut io::sink()),
        }
    }

    /// Writes formatted text.
    pub fn write_fmt(&self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.with_writer(|w| w.write_fmt(args))
    }

    /// Flushes buffered output without closing.
    pub fn flush(&self) -> io::Result<()> {
        self.with_writer(|w| w.flush())
    }

    /// Flushes and closes the stream. Closing twice is a no-op.
    pub fn close(&self) -> io::Result<()> {
        let previous = std::mem::replace(&mut *self.state.lock(), TtyState::Closed);
        match previous {
            TtyState::Open(mut writer) => writer.flush(),
            TtyState::Closed => Ok(()),
        }
    }

    /// True once [`Tty::close`] has run.
    pub fn is_closed(&self) -> bool {
        matches!(*self.state.lock(), TtyState::Closed)
    }
}

impl Default for Tty {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for Tty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tty")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A cloneable in-memory writer, handy for capturing a [`Tty`].
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
