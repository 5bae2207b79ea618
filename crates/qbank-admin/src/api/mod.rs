//! Typed bindings for the domain endpoints.

pub mod problems;
