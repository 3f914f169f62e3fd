pub mod arena;
mod clazz;
mod code;
mod intern;
mod lattice;
mod position;
mod program;
mod query;

#[cfg(test)]
mod tests;

pub use arena::{Arena, Id, Identifier};
pub use clazz::{Clazz, ClazzKind, SpecialClazz};
pub use code::{Access, CodeBlock, ConstData, Expr, MatchCase, Site};
pub use intern::InternTable;
pub use lattice::{HasBottom, Lattice};
pub use position::SourcePos;
pub use program::{ClazzInfo, CodeInfo, Program, ProgramError};
pub use query::Ir;
