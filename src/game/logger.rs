//! Per-match logger
//!
//! Messages go to stdout, to an in-memory buffer, or both. Captured entries
//! keep their level and category so tests and the CLI can filter them later.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// Log an action or choice line. Without the `verbose-logging` feature the
/// formatting is compiled out.
macro_rules! log_verbose {
    ($logger:expr, $method:ident, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $logger.$method(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$logger;
        }
    };
}
pub(crate) use log_verbose;

/// How much the match prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Nothing at all
    Silent = 0,
    /// Scores and the match outcome
    Minimal = 1,
    /// Turn boundaries and key events (default)
    #[default]
    Normal = 2,
    /// Every action, effect and choice
    Verbose = 3,
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    #[default]
    Stdout,
    /// Capture only, nothing printed
    Memory,
    Both,
}

/// Log categories used by the engine
pub mod category {
    pub const TURN: &str = "turn";
    pub const ACTION: &str = "action";
    pub const CHOICE: &str = "choice";
    pub const SCORE: &str = "score";
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    pub category: Option<&'static str>,
}

/// Read-only view of the captured entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl Deref for LogGuard<'_> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

pub struct MatchLogger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,
    log_buffer: RefCell<Vec<LogEntry>>,
}

impl MatchLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        MatchLogger {
            verbosity,
            output_format: OutputFormat::default(),
            output_mode: OutputMode::default(),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Capture to memory only
    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    /// Captured messages of one category, oldest first
    pub fn messages_in(&self, category: &str) -> Vec<String> {
        self.log_buffer
            .borrow()
            .iter()
            .filter(|e| e.category == Some(category))
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn clear_logs(&mut self) {
        self.log_buffer.borrow_mut().clear();
    }

    /// Print the buffered entries allowed by the verbosity, then clear the buffer
    pub fn flush_buffer(&mut self) {
        self.flush_tail(usize::MAX);
    }

    /// Print only the last `tail_lines` buffered entries, then clear the buffer
    pub fn flush_tail(&mut self, tail_lines: usize) {
        {
            let buffer = self.log_buffer.borrow();
            let elided = buffer.len().saturating_sub(tail_lines);
            if elided > 0 {
                println!(
                    ">>> {} LOG LINES ELIDED. PRINTING LAST {} LINES <<<",
                    elided, tail_lines
                );
            }
            for entry in buffer.iter().skip(elided) {
                if entry.level <= self.verbosity {
                    self.print(entry);
                }
            }
        }
        self.clear_logs();
    }

    fn print(&self, entry: &LogEntry) {
        match self.output_format {
            OutputFormat::Json => match serde_json::to_string(entry) {
                Ok(line) => println!("{}", line),
                Err(_) => println!("{}", entry.message),
            },
            OutputFormat::Text if entry.level == VerbosityLevel::Minimal => {
                println!("{}", entry.message)
            }
            OutputFormat::Text => println!("  {}", entry.message),
        }
    }

    fn emit(&self, level: VerbosityLevel, category: Option<&'static str>, message: &str) {
        let capture = self.is_capturing();
        let output = matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both)
            && level <= self.verbosity;
        if !capture && !output {
            return;
        }
        let entry = LogEntry {
            level,
            message: message.to_string(),
            category,
        };
        if output {
            self.print(&entry);
        }
        if capture {
            self.log_buffer.borrow_mut().push(entry);
        }
    }

    pub fn minimal(&self, message: &str) {
        self.emit(VerbosityLevel::Minimal, None, message);
    }

    pub fn normal(&self, message: &str) {
        self.emit(VerbosityLevel::Normal, None, message);
    }

    pub fn verbose(&self, message: &str) {
        self.emit(VerbosityLevel::Verbose, None, message);
    }

    /// Turn boundaries
    pub fn turn(&self, message: &str) {
        self.emit(VerbosityLevel::Normal, Some(category::TURN), message);
    }

    /// Resolver detail
    pub fn action(&self, message: &str) {
        self.emit(VerbosityLevel::Verbose, Some(category::ACTION), message);
    }

    /// A player's decision
    pub fn choice(&self, message: &str) {
        self.emit(VerbosityLevel::Verbose, Some(category::CHOICE), message);
    }

    pub fn score(&self, message: &str) {
        self.emit(VerbosityLevel::Minimal, Some(category::SCORE), message);
    }
}

impl Default for MatchLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MatchLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}
