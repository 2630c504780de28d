//! World-generation errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("unknown tile name: {0:?}")]
    UnknownTile(String),

    #[error("unknown world shape: {0:?}")]
    UnknownShape(String),

    #[error("unknown world theme: {0:?}")]
    UnknownTheme(String),

    #[error("malformed structure legend entry: {entry:?}")]
    MalformedLegend { entry: String },

    #[error("ragged structure pattern: row {row} has {found} columns, expected {expected}")]
    RaggedTemplate {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("structure pattern uses undeclared glyph {glyph:?} at row {row}, column {column}")]
    UndeclaredGlyph {
        glyph: char,
        row: usize,
        column: usize,
    },

    #[error("structure pattern is empty")]
    EmptyTemplate,

    #[error("level depth {depth} is not a valid level")]
    InvalidLevel { depth: i32 },
}
