//! Diagnostic trace stream.
//!
//! Each successful case or throws operation emits one human-readable line
//! here, and a labeled builder announces itself with a `-- label` line.
//! External collaborators (a CI log collector, say) may depend on these
//! lines for visibility but never for correctness.

use std::cell::RefCell;
use std::rc::Rc;

/// Destination for trace lines.
pub trait TraceSink {
    fn emit(&mut self, line: &str);
}

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[32m";

/// Default sink: one line per `println!`, with the leading check mark
/// colored green when stdout is a terminal.
pub struct StdoutTrace {
    use_colors: bool,
}

impl StdoutTrace {
    pub fn new() -> Self {
        StdoutTrace {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

impl Default for StdoutTrace {
    fn default() -> Self {
        StdoutTrace::new()
    }
}

impl TraceSink for StdoutTrace {
    fn emit(&mut self, line: &str) {
        match line.strip_prefix(" \u{2713}") {
            Some(rest) if self.use_colors => {
                println!(" {}\u{2713}{}{}", GREEN, RESET, rest);
            }
            _ => println!("{}", line),
        }
    }
}

/// Capturing sink for tests and embedders that collect the trace.
#[derive(Debug, Default)]
pub struct TraceBuffer {
    lines: Vec<String>,
}

impl TraceBuffer {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl TraceSink for TraceBuffer {
    fn emit(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Sink that drops everything, for silent runs.
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn emit(&mut self, _line: &str) {}
}

/// Shared handle to a trace sink, cloned into every operation closure.
#[derive(Clone)]
pub struct SharedTrace(Rc<RefCell<dyn TraceSink>>);

impl SharedTrace {
    pub fn new(sink: impl TraceSink + 'static) -> Self {
        SharedTrace(Rc::new(RefCell::new(sink)))
    }

    pub fn stdout() -> Self {
        SharedTrace::new(StdoutTrace::new())
    }

    /// A capturing trace plus a handle for reading back what was emitted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use thunklet::trace::SharedTrace;
    /// let (trace, captured) = SharedTrace::buffer();
    /// trace.emit("-- suite");
    /// assert_eq!(captured.borrow().lines(), ["-- suite"]);
    /// ```
    pub fn buffer() -> (SharedTrace, Rc<RefCell<TraceBuffer>>) {
        let buffer = Rc::new(RefCell::new(TraceBuffer::default()));
        (SharedTrace(buffer.clone()), buffer)
    }

    pub fn emit(&self, line: &str) {
        self.0.borrow_mut().emit(line);
    }
}

impl Default for SharedTrace {
    fn default() -> Self {
        SharedTrace::stdout()
    }
}
