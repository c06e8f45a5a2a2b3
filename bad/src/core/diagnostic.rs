//! Compile-time diagnostics.
//!
//! Every problem found in a B source gets a stable code, printed as
//! `B0-xxxx`. Codes are grouped by stage: `00xx` input, `01xx` lexing, `02xx`
//! parsing and `03xx` checks.

use std::fmt;

use serde::Serialize;

use super::context::{Context, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum ErrorCode {
    MissingFile = 0x0000,
    UnreadableFile = 0x0001,

    UnexpectedCharacter = 0x0100,
    UnterminatedComment = 0x0101,
    UnterminatedString = 0x0102,
    UnterminatedChar = 0x0103,
    InvalidEscape = 0x0104,
    IntegerOverflow = 0x0105,
    CharTooLong = 0x0106,
    EmptyChar = 0x0107,

    UnexpectedToken = 0x0200,
    UnexpectedEof = 0x0201,
    InvalidArraySize = 0x0202,
    NestingTooDeep = 0x0203,

    Redefinition = 0x0300,
    Undeclared = 0x0301,
    DuplicateLabel = 0x0302,
    CaseOutsideSwitch = 0x0303,
    TooManyInitializers = 0x0304,
    DuplicateLocal = 0x0305,
    UnusedLocal = 0x0306,
}

impl ErrorCode {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::MissingFile => "Missing file",
            ErrorCode::UnreadableFile => "Unable to read file",
            ErrorCode::UnexpectedCharacter => "Unexpected character",
            ErrorCode::UnterminatedComment => "Unterminated comment",
            ErrorCode::UnterminatedString => "Unterminated string",
            ErrorCode::UnterminatedChar => "Unterminated character constant",
            ErrorCode::InvalidEscape => "Invalid escape sequence",
            ErrorCode::IntegerOverflow => "Integer constant too large",
            ErrorCode::CharTooLong => "Character constant does not fit in a word",
            ErrorCode::EmptyChar => "Empty character constant",
            ErrorCode::UnexpectedToken => "Unexpected token",
            ErrorCode::UnexpectedEof => "Unexpected end of file",
            ErrorCode::InvalidArraySize => "Invalid vector size",
            ErrorCode::NestingTooDeep => "Nesting too deep",
            ErrorCode::Redefinition => "Redefinition",
            ErrorCode::Undeclared => "Undeclared name",
            ErrorCode::DuplicateLabel => "Duplicate label",
            ErrorCode::CaseOutsideSwitch => "Case label outside of switch",
            ErrorCode::TooManyInitializers => "Too many initializers",
            ErrorCode::DuplicateLocal => "Duplicate local declaration",
            ErrorCode::UnusedLocal => "Unused local",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B0-{:04x} - {}", self.code(), self.description())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A problem found in a source file.
///
/// The span is only meaningful together with the [`Context`] the diagnostic
/// was produced for, so rendering takes one.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn warning(code: ErrorCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Renders as `path[line:col]: error: B0-0102 - Unterminated string: message`.
    pub fn render(&self, ctx: &Context) -> String {
        format!(
            "{}: {}: {}: {}",
            self.span.display(ctx),
            self.severity,
            self.code,
            self.message
        )
    }
}
