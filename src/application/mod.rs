//! Application services layer.

pub mod admin;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod ratings;
pub mod repos;
