//! Admin mutation services.

pub mod audit;
pub mod categories;
pub mod tools;
