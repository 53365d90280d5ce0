//! Mirrored console output for recorded messages

use std::io::{self, Write};

/// Write target that echoes recorded messages as human-readable lines
///
/// Errors go to a distinct channel from warnings and infos.
pub trait MirrorSink: Send + Sync {
    fn write_error(&self, line: &str) -> io::Result<()>;

    fn write_info(&self, line: &str) -> io::Result<()>;
}

/// Console stream a mirror writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

impl ConsoleStream {
    fn write_line(self, line: &str) -> io::Result<()> {
        match self {
            ConsoleStream::Stdout => writeln!(io::stdout().lock(), "{line}"),
            ConsoleStream::Stderr => writeln!(io::stderr().lock(), "{line}"),
        }
    }
}

/// Errors to stderr, warnings and infos to stdout unless redirected
#[derive(Debug, Clone, Copy)]
pub struct ConsoleMirror {
    info_stream: ConsoleStream,
}

impl ConsoleMirror {
    pub fn new() -> Self {
        Self {
            info_stream: ConsoleStream::Stdout,
        }
    }

    /// Mirror everything to stderr, for hosts that print results on stdout
    pub fn stderr_only() -> Self {
        Self {
            info_stream: ConsoleStream::Stderr,
        }
    }

    pub fn info_stream(&self) -> ConsoleStream {
        self.info_stream
    }
}

impl Default for ConsoleMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorSink for ConsoleMirror {
    fn write_error(&self, line: &str) -> io::Result<()> {
        ConsoleStream::Stderr.write_line(line)
    }

    fn write_info(&self, line: &str) -> io::Result<()> {
        self.info_stream.write_line(line)
    }
}
