pub mod lattice;
pub mod programs;
