mod data;
mod id;

pub use data::Arena;
pub use id::{Id, Identifier};
