use thiserror::Error;

use crate::expr::Rule;

/// All fatal error kinds a VCP assembly run can produce: syntax,
/// resolution, expression, structural, encoding and I/O failures. Every
/// variant tied to a statement carries the originating source line
/// number so the CLI can print a line-tagged diagnostic.
#[derive(Error, Debug)]
pub enum AssemblerError {
    #[error("line {line}: unrecognized command: {cmd}")]
    UnrecognizedCommand { line: usize, cmd: String },

    #[error("line {line}: unrecognized directive: {directive}")]
    UnrecognizedDirective { line: usize, directive: String },

    #[error("line {line}: malformed operand list for {cmd}")]
    MalformedOperands { line: usize, cmd: String },

    #[error("line {line}: undefined symbol: {name}")]
    UndefinedSymbol { line: usize, name: String },

    #[error("line {line}: duplicate label definition: {name}")]
    DuplicateLabel { line: usize, name: String },

    #[error("line {line}: expression error: {reason}")]
    Expression { line: usize, reason: String },

    #[error("line {line}: syntax error in expression")]
    ExpressionSyntax {
        line: usize,
        #[source]
        source: Box<pest::error::Error<Rule>>,
    },

    #[error("line {line}: .endr without .rept is not allowed")]
    EndrWithoutRept { line: usize },

    #[error("line {line}: nested .rept statements are not allowed")]
    NestedRept { line: usize },

    #[error("line {line}: invalid .rept count: {count}")]
    InvalidReptCount { line: usize, count: i64 },

    #[error("line {line}: labels are not allowed inside a .rept block: {name}")]
    LabelInRept { line: usize, name: String },

    #[error("line {line}: .rept block has no matching .endr")]
    UnterminatedRept { line: usize },

    #[error("line {line}: include cycle detected: {path}")]
    IncludeCycle { line: usize, path: String },

    #[error("line {line}: include nesting too deep (> {max}): {path}")]
    IncludeTooDeep {
        line: usize,
        path: String,
        max: usize,
    },

    #[error("line {line}: {directive} is not available in the {dialect} dialect")]
    DialectMismatch {
        line: usize,
        directive: String,
        dialect: &'static str,
    },

    #[error("unrecognized output format: \"{0}\"")]
    UnrecognizedFormat(String),

    #[error("failed to read \"{path}\": {message}")]
    Io { path: String, message: String },
}

/// A non-fatal condition surfaced alongside a successful assembly, such
/// as a masked operand or a zero-padded `.incbin` tail word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub line: usize,
    pub message: String,
}

impl Warning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: warning: {}", self.line, self.message)
    }
}
