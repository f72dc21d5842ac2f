use thiserror::Error;

/// Errors raised while assembling a buffer with [`crate::Builder`].
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("object of size {size} exceeds the maximum buffer size of {max}")]
    BufferTooLarge { size: usize, max: usize },

    #[error("fields were tracked for a new info while a previous one was still open")]
    UnfinishedNesting,

    #[error("string or vector byte length {0} overflows a 32-bit length field")]
    LengthOverflow(usize),
}

/// Errors raised while lexing or parsing a schema.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{line}: unexpected character '{ch}'")]
    UnexpectedChar { line: usize, ch: char },

    #[error("{line}: unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("{line}: expected {expected}, found {found:?}")]
    UnexpectedToken {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("{line}: unknown type '{name}'")]
    UnknownType { line: usize, name: String },

    #[error("{line}: symbol '{name}' is already defined")]
    DuplicateSymbol { line: usize, name: String },

    #[error("{line}: '{name}' is not declared")]
    UndeclaredSymbol { line: usize, name: String },

    #[error("a struct field cannot have type '{0}', structs may only hold scalars and other structs")]
    InvalidStructField(String),

    #[error("enum '{name}' has no values")]
    EmptyEnum { name: String },
}

/// Errors raised while lowering a parsed schema into generated source.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("codegen does not support union field '{0}' without a discriminator")]
    MissingUnionDiscriminator(String),

    #[error("failed to write generated file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by the `megrezc` command line driver.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to read schema file {path}: {source}")]
    ReadSchema {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}
