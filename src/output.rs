//! User-facing console output
//!
//! Lifecycle operations talk to the user through an injected [`OutputSink`]
//! instead of printing directly, so transitions can be exercised in tests and
//! their messages asserted on.

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::errors::{Fix, MobError};

pub trait OutputSink: Send + Sync {
    fn print(&self, text: &str);
}

/// Writes to the process stdout
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn print(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        // a closed stdout (e.g. `mob status | head`) is not worth failing for
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

/// Collects everything in memory
#[derive(Debug, Default)]
pub struct BufferSink {
    buffer: Mutex<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.buffer.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

impl OutputSink for BufferSink {
    fn print(&self, text: &str) {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.push_str(text);
        }
    }
}

/// Formatting helpers on top of a sink
#[derive(Clone)]
pub struct Say {
    sink: Arc<dyn OutputSink>,
}

impl Say {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> Arc<dyn OutputSink> {
        self.sink.clone()
    }

    /// Prints `text` unless it is empty, without trailing whitespace.
    pub fn say(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.sink.print(&format!("{}\n", text.trim_end()));
    }

    pub fn with_prefix(&self, text: &str, prefix: &str) {
        for line in text.trim().lines() {
            self.sink.print(&format!("{prefix}{}\n", line.trim()));
        }
    }

    pub fn info(&self, text: &str) {
        self.with_prefix(text, "> ");
    }

    pub fn info_indented(&self, text: &str) {
        self.with_prefix(text, "    ");
    }

    pub fn indented(&self, text: &str) {
        self.with_prefix(text, "  ");
    }

    pub fn warning(&self, text: &str) {
        self.with_prefix(text, "⚠ ");
    }

    pub fn error(&self, text: &str) {
        self.with_prefix(text, "ERROR ");
    }

    pub fn empty_line(&self) {
        self.sink.print("\n");
    }

    /// Instruction followed by the command that carries it out.
    pub fn fix(&self, instruction: &str, command: &str) {
        self.with_prefix(instruction, "👉 ");
        self.empty_line();
        self.indented(command);
        self.empty_line();
    }

    pub fn next(&self, instruction: &str, command: &str) {
        self.fix(instruction, command);
    }

    /// Report an error the way the user should see it.
    pub fn report(&self, error: &MobError) {
        match error {
            MobError::Precondition { message, fix } => {
                self.error(message);
                if let Some(Fix { instruction, command }) = fix {
                    self.fix(instruction, command);
                }
            }
            MobError::InvariantViolation { .. } => {
                self.error(&error.to_string());
                self.error("this is a bug, please report it together with the output of --debug");
            }
            other => self.error(&other.to_string()),
        }
    }
}
