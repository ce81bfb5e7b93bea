//! Core business logic - framework-agnostic services over the `SeaORM` store.
//!
//! Every function takes the database connection and, where access depends on
//! the caller, an explicit [`identity::Requester`].

pub mod cart;
pub mod catalog;
pub mod identity;
pub mod line_source;
pub mod order;
pub mod report;
pub mod user;
