use core::fmt;

use crate::{ConfigError, ErrorContext, ErrorReporter, config::EnvOptions};

/// Reporter that writes errors and a stack trace to the process log.
///
/// Each notification emits one `tracing` event with the message
/// `Error: <message>`, followed by one event per resolved stack frame with
/// the message `  @ <function> in <file>:<line>`. All events use the `snitch`
/// target at `ERROR` level, so the installed subscriber decides where they
/// end up. Nothing is written when no subscriber is installed.
///
/// The stack walk starts at the caller of [`notify`](ErrorReporter::notify)
/// (of the outermost one when nested in a
/// [`MultiplexingReporter`](crate::MultiplexingReporter)) and covers at most
/// [`stack_trace_depth`](Self::stack_trace_depth) frames. Frames without
/// symbol information are skipped but still count towards the depth.
///
/// # Examples
///
/// ```
/// use snitch::{ErrorContext, ErrorReporter, LogReporter};
///
/// tracing_subscriber::fmt().with_target(false).init();
///
/// LogReporter::new(4).notify(&ErrorContext::new("could not reach payment provider"));
/// ```
///
/// Output:
/// ```text
/// 2025-01-01T00:00:00.000000Z ERROR Error: could not reach payment provider
/// 2025-01-01T00:00:00.000000Z ERROR   @ rust_out::main in src/main.rs:7
/// ...
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LogReporter {
    /// Maximum number of stack frames walked per notification. `0` disables
    /// stack traces.
    pub stack_trace_depth: usize,
}

impl LogReporter {
    /// Stack trace depth used by [`Default`] and by
    /// [`from_env`](Self::from_env) when the environment does not override it.
    pub const DEFAULT_STACK_TRACE_DEPTH: usize = 32;

    /// Creates a reporter walking at most `stack_trace_depth` frames.
    #[must_use]
    pub const fn new(stack_trace_depth: usize) -> Self {
        Self { stack_trace_depth }
    }

    /// Creates a reporter configured from the environment.
    ///
    /// Reads `SNITCH_STACK_TRACE_DEPTH` (see [`config`](crate::config)),
    /// falling back to [`DEFAULT_STACK_TRACE_DEPTH`] when it is unset.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the variable is set to something other
    /// than a non-negative integer.
    ///
    /// [`DEFAULT_STACK_TRACE_DEPTH`]: Self::DEFAULT_STACK_TRACE_DEPTH
    pub fn from_env() -> Result<Self, ConfigError> {
        let depth = EnvOptions::get().stack_trace_depth.clone()?;
        Ok(Self::new(depth.unwrap_or(Self::DEFAULT_STACK_TRACE_DEPTH)))
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STACK_TRACE_DEPTH)
    }
}

impl ErrorReporter for LogReporter {
    fn notify(&self, ectx: &ErrorContext) {
        tracing::error!(target: "snitch", "Error: {}", ectx.error());

        for frame in stack_trace(self.stack_trace_depth) {
            tracing::error!(target: "snitch", "  @ {frame}");
        }
    }
}

/// A resolved stack frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackFrame {
    /// Demangled function name, without the symbol hash.
    pub function: String,
    /// Source file as recorded in the debug information.
    pub file: String,
    /// Line number within [`file`](Self::file).
    pub line: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}:{}", self.function, self.file, self.line)
    }
}

/// Paths of the crates doing the reporting: the stack walker and this crate.
const REPORTER_CRATES: &[&str] = &["backtrace::", concat!(env!("CARGO_CRATE_NAME"), "::")];

/// Plumbing that `MultiplexingReporter` puts between reporters when it
/// isolates them with `catch_unwind`.
const WRAPPER_PATHS: &[&str] = &[
    "core::ops::function::",
    "core::panic::unwind_safe::",
    "std::panicking::",
    "std::panic::",
    "__rust_try",
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FrameKind {
    /// Part of the stack walk or of a reporter in this crate.
    Reporter,
    /// Closure-call or unwinding plumbing.
    Wrapper,
    /// Anything else, including frames without a symbol name.
    Caller,
}

/// Returns `true` if `symbol` names an item of `krate` (a `name::` path),
/// either directly or inside a qualified path such as `<T as krate::Trait>`.
fn names_crate(symbol: &str, krate: &str) -> bool {
    symbol.match_indices(krate).any(|(at, _)| {
        symbol[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })
}

fn classify(symbol_name: Option<&str>) -> FrameKind {
    let Some(name) = symbol_name else {
        return FrameKind::Caller;
    };
    if name.starts_with("_Unwind_")
        || REPORTER_CRATES
            .iter()
            .any(|krate| names_crate(name, krate))
    {
        FrameKind::Reporter
    } else if WRAPPER_PATHS.iter().any(|path| name.contains(path)) {
        FrameKind::Wrapper
    } else {
        FrameKind::Caller
    }
}

/// A frame as returned by the walker, before filtering.
struct RawFrame {
    function: Option<String>,
    location: Option<(String, u32)>,
}

impl RawFrame {
    fn resolve(self) -> Option<StackFrame> {
        let function = self.function?;
        let (file, line) = self.location?;
        Some(StackFrame {
            function,
            file,
            line,
        })
    }
}

/// Splits the walked frames into the reporting prefix and the frames that
/// count towards the depth.
struct Walk {
    /// Wrapper frames seen since the last reporter frame.
    pending: Vec<RawFrame>,
    counted: Vec<RawFrame>,
    in_prefix: bool,
}

impl Walk {
    fn new() -> Self {
        Self {
            pending: Vec::new(),
            counted: Vec::new(),
            in_prefix: true,
        }
    }

    fn push(&mut self, frame: RawFrame) {
        if !self.in_prefix {
            self.counted.push(frame);
            return;
        }
        match classify(frame.function.as_deref()) {
            // Wrappers between two reporter frames belong to the reporter.
            FrameKind::Reporter => self.pending.clear(),
            FrameKind::Wrapper => self.pending.push(frame),
            FrameKind::Caller => {
                self.in_prefix = false;
                self.counted.append(&mut self.pending);
                self.counted.push(frame);
            }
        }
    }
}

/// Captures up to `depth` frames of the current call stack.
///
/// The walk starts at the first frame outside the reporting machinery: the
/// stack walker, every function of this crate, and the closure-call and
/// `catch_unwind` frames sitting between them (as left by
/// [`MultiplexingReporter`](crate::MultiplexingReporter)) are skipped and do
/// not count. Called directly, the first frame is the caller of this
/// function; called from a reporter, it is the caller of the outermost
/// `notify`.
///
/// Every frame after that consumes one slot of `depth`, but only frames with
/// a symbol name, file and line are returned. Inlined functions count as
/// separate frames.
#[must_use]
pub fn stack_trace(depth: usize) -> Vec<StackFrame> {
    if depth == 0 {
        return Vec::new();
    }

    let mut walk = Walk::new();

    backtrace::trace(|frame| {
        let mut resolved = false;

        backtrace::resolve_frame(frame, |symbol| {
            resolved = true;
            walk.push(RawFrame {
                function: symbol.name().map(|sym| format!("{sym:#}")),
                location: symbol
                    .filename()
                    .zip(symbol.lineno())
                    .map(|(file, line)| (file.display().to_string(), line)),
            });
        });

        // Nothing could be resolved for this address.
        if !resolved {
            walk.push(RawFrame {
                function: None,
                location: None,
            });
        }

        walk.counted.len() < depth
    });

    if walk.in_prefix {
        walk.counted.append(&mut walk.pending);
    }

    walk.counted
        .into_iter()
        .take(depth)
        .filter_map(RawFrame::resolve)
        .collect()
}
