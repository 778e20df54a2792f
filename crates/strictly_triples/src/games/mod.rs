//! Game implementations.

pub mod triples;
