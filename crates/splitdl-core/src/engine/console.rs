//! User-facing output of a download: announcement, progress line, completion
//! notice and errors. Cloneable so concurrent downloads share one stdout.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::terminal;

/// Terminal output redraws one bar in place; plain output emits log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Terminal,
    Plain,
}

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

#[derive(Clone)]
pub struct Console {
    mode: OutputMode,
    width: usize,
    out: SharedWriter,
    err: SharedWriter,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("mode", &self.mode)
            .field("width", &self.width)
            .finish()
    }
}

impl Console {
    /// Console on stdout/stderr, mode and width detected once.
    pub fn detect() -> Self {
        let mode = if terminal::stdout_is_terminal() {
            OutputMode::Terminal
        } else {
            OutputMode::Plain
        };
        let width = terminal::stdout_width().unwrap_or(terminal::DEFAULT_WIDTH);
        Self::new(mode, width, io::stdout(), io::stderr())
    }

    pub fn new<O, E>(mode: OutputMode, width: usize, out: O, err: E) -> Self
    where
        O: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        let out: Box<dyn Write + Send> = Box::new(out);
        let err: Box<dyn Write + Send> = Box::new(err);
        Self {
            mode,
            width,
            out: Arc::new(Mutex::new(out)),
            err: Arc::new(Mutex::new(err)),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Write `text` to the output stream as is and flush.
    pub fn print(&self, text: &str) {
        write_flush(&self.out, text);
    }

    pub fn eprint(&self, text: &str) {
        write_flush(&self.err, text);
    }

    pub(crate) fn announce(&self, name: &Path, url: &str, resume_offset: u64, total: u64) {
        let line = match self.mode {
            OutputMode::Terminal if resume_offset > 0 => format!(
                "[*] Resuming {} ({}/{} bytes)\n",
                name.display(),
                resume_offset,
                total
            ),
            OutputMode::Terminal => format!("[*] Downloading {} ({} bytes)\n", name.display(), total),
            OutputMode::Plain => format!("START {} {} {}\n", name.display(), url, total),
        };
        self.print(&line);
    }

    pub(crate) fn complete(&self, name: &Path) {
        let line = match self.mode {
            OutputMode::Terminal => format!("[✓] {} - Download complete!\n", name.display()),
            OutputMode::Plain => format!("DONE {}\n", name.display()),
        };
        self.print(&line);
    }

    pub(crate) fn report_error(&self, url: &str, name: Option<&Path>, error: &dyn fmt::Display) {
        let line = match name {
            Some(name) => format!("Error downloading {} ({}): {}\n", url, name.display(), error),
            None => format!("Error downloading {}: {}\n", url, error),
        };
        self.eprint(&line);
    }

    #[cfg(test)]
    pub(crate) fn capture(mode: OutputMode, width: usize) -> (Self, Captured, Captured) {
        let out = Captured::default();
        let err = Captured::default();
        (Self::new(mode, width, out.clone(), err.clone()), out, err)
    }
}

fn write_flush(writer: &SharedWriter, text: &str) {
    if let Ok(mut w) = writer.lock() {
        if let Err(e) = w.write_all(text.as_bytes()).and_then(|_| w.flush()) {
            tracing::debug!("console write failed: {}", e);
        }
    }
}

/// In-memory writer for assertions on console output.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct Captured(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl Captured {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[cfg(test)]
impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_messages() {
        let (console, out, _) = Console::capture(OutputMode::Terminal, 80);
        console.announce(Path::new("a.iso"), "http://h/a.iso", 0, 100);
        console.announce(Path::new("a.iso"), "http://h/a.iso", 40, 100);
        console.complete(Path::new("a.iso"));
        assert_eq!(
            out.contents(),
            "[*] Downloading a.iso (100 bytes)\n\
             [*] Resuming a.iso (40/100 bytes)\n\
             [✓] a.iso - Download complete!\n"
        );
    }

    #[test]
    fn plain_messages() {
        let (console, out, _) = Console::capture(OutputMode::Plain, 80);
        console.announce(Path::new("a.iso"), "http://h/a.iso", 40, 100);
        console.complete(Path::new("a.iso"));
        assert_eq!(out.contents(), "START a.iso http://h/a.iso 100\nDONE a.iso\n");
    }

    #[test]
    fn errors_go_to_stderr_with_context() {
        let (console, out, err) = Console::capture(OutputMode::Plain, 80);
        console.report_error("http://h/a.iso", Some(Path::new("a.iso")), &"boom");
        console.report_error("http://h/b.iso", None, &"bad");
        assert!(out.contents().is_empty());
        assert_eq!(
            err.contents(),
            "Error downloading http://h/a.iso (a.iso): boom\nError downloading http://h/b.iso: bad\n"
        );
    }
}
