use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unterminated {what}")]
    Unterminated { what: &'static str, line: usize },
    #[error("line {line}: expected {expected}")]
    Expected { expected: &'static str, line: usize },
    #[error("unexpected end of file while reading {0}")]
    UnexpectedEof(&'static str),
}

pub type Result<T> = std::result::Result<T, ParseError>;
