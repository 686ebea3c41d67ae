//! Source locations.
//!
//! A [`SourceLocation`] identifies a byte in a translation unit's
//! preprocessed source buffer by file name, 1-based row and column, and
//! the byte offset of the start of that row within the buffer (used to
//! recover a whole source line for diagnostics without rescanning).

use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file_name: Rc<str>,
    pub row: u32,
    pub column: u32,
    pub line_start: u32,
}

impl SourceLocation {
    pub fn new(file_name: Rc<str>) -> Self {
        SourceLocation { file_name, row: 1, column: 1, line_start: 0 }
    }

    /// Location used for compiler-synthesized nodes (builtins, implicit
    /// conversions) that have no corresponding source text.
    pub fn synthetic() -> Self {
        SourceLocation { file_name: Rc::from("<builtin>"), row: 0, column: 0, line_start: 0 }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file_name, self.row, self.column)
    }
}
