//! A dialect-erased wrapper so the validator and extractor can operate on
//! either tree shape without the caller branching first.

use crate::cnab240::Cnab240File;
use crate::cnab400::Cnab400File;
use crate::diagnostics::Diagnostic;
use crate::options::Dialect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParsedTree {
    Cnab240(Cnab240File),
    Cnab400(Cnab400File),
}

impl ParsedTree {
    pub fn dialect(&self) -> Dialect {
        match self {
            ParsedTree::Cnab240(_) => Dialect::Cnab240,
            ParsedTree::Cnab400(_) => Dialect::Cnab400,
        }
    }
}

/// Output of a parser: the best-effort tree plus every diagnostic collected
/// along the way. The tree is always present — parsers never throw for
/// field- or record-level issues (§4.C, §4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOutcome<T> {
    pub tree: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> ParseOutcome<T> {
    pub fn new(tree: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { tree, diagnostics }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}
