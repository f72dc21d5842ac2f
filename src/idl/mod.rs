//! Schema front end: lexing, the symbol model and the recursive-descent parser.
//!
//! This mirrors the `Parser`/`StructDef`/`EnumDef`/`Type`/`Value` model of a
//! traditional IDL compiler, adapted to own its symbols by name instead of by
//! raw pointer so that forward references resolve naturally through Rust's
//! ownership rules.

mod lexer;
mod parser;
mod symbol;

pub use lexer::{Lexer, Token};
pub use parser::Parser;
pub use symbol::{
    BaseType, EnumDef, EnumVal, FieldDef, SchemaDef, StructDef, SymbolTable, Type, Value,
};
