//! Core of a C17 compiler frontend: scanner, type system, scope
//! hierarchy, recursive-descent parser, constant-expression evaluator,
//! and initializer elaborator.
//!
//! Out of scope: preprocessor, backend IR builder/object emission,
//! optimization, linking, and CLI/driver orchestration. An embedder
//! owns preprocessing the source text before it reaches [`compile`] and
//! owns everything from the returned [`ast::TranslationUnit`] onward.

pub mod ast;
pub mod backend;
pub mod builtins;
pub mod constant;
pub mod constfold;
pub mod diagnostics;
pub mod init;
pub mod loc;
mod parser;
pub mod scanner;
pub mod scope;
pub mod token;
pub mod ty;

use ast::TranslationUnit;
use diagnostics::{Result, Warnings};
use parser::Parser;
use std::rc::Rc;
use ty::TargetOptions;

/// Per-translation-unit compilation state, per the "lift global mutable
/// state into an explicit context" design note: a [`CompilationContext`]
/// owns nothing but the target configuration, but is the single thing
/// an embedder constructs once per worker to compile translation units
/// concurrently, each against its own scope/type graph.
#[derive(Debug, Clone, Default)]
pub struct CompilationContext {
    pub target: TargetOptions,
}

impl CompilationContext {
    pub fn new(target: TargetOptions) -> CompilationContext {
        CompilationContext { target }
    }

    /// Scans and parses `src` as one translation unit, returning the
    /// typed AST plus any buffered warnings. `file_name` is attached to
    /// every [`loc::SourceLocation`] produced while scanning `src`.
    pub fn compile(&self, src: &[u8], file_name: impl Into<Rc<str>>) -> Result<(TranslationUnit, Warnings)> {
        log::debug!("compiling translation unit with target {:?}", self.target);
        let tokens = scanner::tokenize(src, file_name)?;
        Parser::new(tokens, self.target.clone()).parse_translation_unit()
    }
}

/// Convenience entry point equivalent to
/// `CompilationContext::new(TargetOptions::default()).compile(..)`.
pub fn compile(src: &[u8], file_name: impl Into<Rc<str>>) -> Result<(TranslationUnit, Warnings)> {
    CompilationContext::default().compile(src, file_name)
}
