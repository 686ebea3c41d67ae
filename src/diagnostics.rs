//! Fatal-error and warning surface.
//!
//! Every failure the core can produce is either fatal (propagated via
//! `Result<_, Fatal>` and intended to abort compilation of the current
//! translation unit) or a warning (buffered in a [`Warnings`] sink and
//! drained by the embedder at the end of compilation). There is no
//! recovery: a single fatal error ends the walk.

use crate::loc::SourceLocation;
use crate::token::Tag;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Fatal {
    #[error("{loc}: error: unterminated {kind}")]
    UnterminatedLiteral { loc: SourceLocation, kind: &'static str },

    #[error("{loc}: error: invalid escape sequence")]
    InvalidEscape { loc: SourceLocation },

    #[error("{loc}: error: invalid byte in source")]
    InvalidByte { loc: SourceLocation },

    #[error("{loc}: error: expected {expected:?}, found {found:?}")]
    UnexpectedToken { loc: SourceLocation, expected: Vec<Tag>, found: Tag },

    #[error("{loc}: error: {message}")]
    Declaration { loc: SourceLocation, message: String },

    #[error("{loc}: error: {message}")]
    ExpressionType { loc: SourceLocation, message: String },

    #[error("{loc}: error: {message}")]
    Initializer { loc: SourceLocation, message: String },

    #[error("{loc}: error: {message}")]
    ConstantFold { loc: SourceLocation, message: String },

    #[error("{loc}: error: {message}")]
    Scope { loc: SourceLocation, message: String },
}

impl Fatal {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Fatal::UnterminatedLiteral { loc, .. }
            | Fatal::InvalidEscape { loc }
            | Fatal::InvalidByte { loc }
            | Fatal::UnexpectedToken { loc, .. }
            | Fatal::Declaration { loc, .. }
            | Fatal::ExpressionType { loc, .. }
            | Fatal::Initializer { loc, .. }
            | Fatal::ConstantFold { loc, .. }
            | Fatal::Scope { loc, .. } => loc,
        }
    }

    pub fn declaration(loc: SourceLocation, message: impl Into<String>) -> Self {
        Fatal::Declaration { loc, message: message.into() }
    }

    pub fn expr_type(loc: SourceLocation, message: impl Into<String>) -> Self {
        Fatal::ExpressionType { loc, message: message.into() }
    }

    pub fn initializer(loc: SourceLocation, message: impl Into<String>) -> Self {
        Fatal::Initializer { loc, message: message.into() }
    }

    pub fn constant_fold(loc: SourceLocation, message: impl Into<String>) -> Self {
        Fatal::ConstantFold { loc, message: message.into() }
    }

    pub fn scope(loc: SourceLocation, message: impl Into<String>) -> Self {
        Fatal::Scope { loc, message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, Fatal>;

/// A non-fatal diagnostic, buffered for the embedder to print at exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub loc: SourceLocation,
    pub message: String,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: warning: {}", self.loc, self.message)
    }
}

/// Accumulates warnings for the lifetime of one translation unit.
#[derive(Debug, Default)]
pub struct Warnings {
    buffered: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, loc: SourceLocation, message: impl Into<String>) {
        let warning = Warning { loc, message: message.into() };
        log::warn!("{warning}");
        self.buffered.push(warning);
    }

    pub fn drain(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.buffered)
    }

    pub fn is_empty(&self) -> bool {
        self.buffered.is_empty()
    }
}
