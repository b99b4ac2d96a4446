use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Everything needed to point a user at the offending source: the file it
/// came from, the line within that file, an optional ±10-character window
/// around the offending position, and the instruction's docstring if one
/// is registered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: usize,
    pub context: Option<String>,
    pub docstring: Option<String>,
}

impl Diagnostic {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Diagnostic {
            file: file.into(),
            line,
            context: None,
            docstring: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_docstring(mut self, docstring: Option<String>) -> Self {
        self.docstring = docstring;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n{ctx}")?;
        }
        if let Some(doc) = &self.docstring {
            write!(f, "\n{doc}")?;
        }
        Ok(())
    }
}

/// Taxonomy from spec.md §7: Lex, Parse, Include/language, Type, Layout, I/O.
#[derive(Error, Debug, PartialEq)]
pub enum AsmError {
    #[error("lex error: {reason} ({diagnostic})")]
    Lex { reason: String, diagnostic: Diagnostic },

    #[error("parse error: {reason} ({diagnostic})")]
    Parse { reason: String, diagnostic: Diagnostic },

    #[error("include/language error: {reason} ({diagnostic})")]
    Include { reason: String, diagnostic: Diagnostic },

    #[error("type error: {reason} ({diagnostic})")]
    Type { reason: String, diagnostic: Diagnostic },

    #[error("layout error: {reason}")]
    Layout { reason: String },

    #[error("I/O error: {reason}")]
    Io { reason: String },
}

impl AsmError {
    pub fn lex(file: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        AsmError::Lex {
            reason: reason.into(),
            diagnostic: Diagnostic::new(file, line),
        }
    }

    pub fn parse(diagnostic: Diagnostic, reason: impl Into<String>) -> Self {
        AsmError::Parse {
            reason: reason.into(),
            diagnostic,
        }
    }

    pub fn include(diagnostic: Diagnostic, reason: impl Into<String>) -> Self {
        AsmError::Include {
            reason: reason.into(),
            diagnostic,
        }
    }

    pub fn typ(diagnostic: Diagnostic, reason: impl Into<String>) -> Self {
        AsmError::Type {
            reason: reason.into(),
            diagnostic,
        }
    }

    pub fn layout(reason: impl Into<String>) -> Self {
        AsmError::Layout { reason: reason.into() }
    }
}

impl From<std::io::Error> for AsmError {
    fn from(err: std::io::Error) -> Self {
        AsmError::Io { reason: err.to_string() }
    }
}

/// Builds the ±10-character context window spec.md §4.2 requires for
/// tokenizer diagnostics.
pub fn context_window(source: &[char], pos: usize) -> String {
    let start = pos.saturating_sub(10);
    let end = (pos + 10).min(source.len());
    let pre: String = source[start..pos.min(source.len())].iter().collect();
    let post: String = source[pos.min(source.len())..end].iter().collect();
    let pre = pre.replace('\n', "\\n");
    let post = post.replace('\n', "\\n");
    format!("{pre} ^ {post}")
}
