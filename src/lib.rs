mod scalar;
mod string;
mod info;
mod vector;

pub mod buffer;
pub mod builder;
pub mod codegen;
pub mod error;
pub mod idl;
pub mod io;
pub mod le;
pub mod position;
pub mod types;
pub mod varint;

pub use builder::{Builder, Offset, UnionMarker};
pub use error::{BuilderError, CliError, CodegenError, ParseError};
pub use info::{get_root, Info, InfoWithVTable};
pub use scalar::Scalar;
pub use string::String;
pub use vector::Vector;
