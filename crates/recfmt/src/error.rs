//! Error types for layout compilation and record conversion.
//!
//! Two kinds cross the converter boundary: [`SyntaxError`] for problems in
//! the layout definition (fatal to the formatter) and [`InvalidDataFormat`]
//! for data that violates a field's encoding rules (fatal to the current
//! record). Their messages are stable strings callers match on.

use std::fmt;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// A layout definition is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Diagnostic)]
#[diagnostic(
    code(recfmt::syntax_error),
    help("check the layout definition file")
)]
pub struct SyntaxError {
    message: String,
    file_path: Option<PathBuf>,
    line: Option<usize>,
}

impl SyntaxError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file_path: None,
            line: None,
        }
    }

    /// Attach the layout file path, keeping one already set.
    pub fn with_file_path(mut self, path: impl AsRef<Path>) -> Self {
        if self.file_path.is_none() {
            self.file_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Attach the 1-based line number, keeping one already set.
    pub fn with_line(mut self, line: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }

    /// The stable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Path of the layout file the error was found in.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Line of the layout file the error was found on.
    pub fn line(&self) -> Option<usize> {
        self.line
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SyntaxError {}

/// Field data cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq, Diagnostic)]
#[diagnostic(code(recfmt::invalid_data_format))]
pub struct InvalidDataFormat {
    message: String,
    field_name: Option<String>,
    record_number: Option<u64>,
}

impl InvalidDataFormat {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_name: None,
            record_number: None,
        }
    }

    /// Attach the field name, keeping one already set.
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        if self.field_name.is_none() {
            self.field_name = Some(name.into());
        }
        self
    }

    /// Attach the 1-based record number.
    pub fn with_record_number(mut self, record_number: u64) -> Self {
        self.record_number = Some(record_number);
        self
    }

    /// The message without field/record context.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Name of the field being converted.
    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    /// Record the error occurred in.
    pub fn record_number(&self) -> Option<u64> {
        self.record_number
    }
}

impl fmt::Display for InvalidDataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(name) = &self.field_name {
            write!(f, " field name=[{name}].")?;
        }
        if let Some(number) = self.record_number {
            write!(f, " record number=[{number}].")?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidDataFormat {}

/// Errors surfaced by the record formatter.
#[derive(Debug, Error, Diagnostic)]
pub enum FormatError {
    /// Layout definition problem.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    /// Record data problem.
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidData(#[from] InvalidDataFormat),

    /// Underlying stream failure.
    #[error("I/O error: {0}")]
    #[diagnostic(code(recfmt::io_error))]
    Io(#[from] std::io::Error),

    /// Read or write attempted before `initialize`.
    #[error("formatter was not initialized. initialize() must be called before reading or writing.")]
    #[diagnostic(code(recfmt::not_initialized))]
    NotInitialized,

    /// No stream bound for the requested direction.
    #[error("{direction} stream was not set.")]
    #[diagnostic(code(recfmt::stream_not_set))]
    StreamNotSet {
        /// "input" or "output".
        direction: &'static str,
    },
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, FormatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display_is_message_only() {
        let err = SyntaxError::new("parameter was not specified.")
            .with_file_path("layout/format.fmt")
            .with_line(10);
        assert_eq!(err.to_string(), "parameter was not specified.");
        assert!(err.file_path().unwrap().ends_with("format.fmt"));
        assert_eq!(err.line(), Some(10));
    }

    #[test]
    fn test_syntax_error_keeps_first_location() {
        let err = SyntaxError::new("x").with_line(3).with_line(7);
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_invalid_data_format_display() {
        let err = InvalidDataFormat::new("too large data.")
            .with_field_name("name")
            .with_record_number(2);
        assert_eq!(
            err.to_string(),
            "too large data. field name=[name]. record number=[2]."
        );
        assert_eq!(err.message(), "too large data.");
    }

    #[test]
    fn test_format_error_is_transparent() {
        let err: FormatError = InvalidDataFormat::new("bad").into();
        assert_eq!(err.to_string(), "bad");
    }
}
