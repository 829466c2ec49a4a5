//! Use-case handlers, one struct per command or query.

pub mod catalog;
pub mod purchase;
