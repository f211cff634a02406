//! Shared expense tracking for groups: who paid what, who owes whom, and the
//! payments that settle everything.

pub mod balance;
pub mod code;
pub mod config;
pub mod errors;
pub mod exchange;
pub mod money;
pub mod repository;
pub mod routes;
pub mod schemas;
#[cfg(test)]
mod test_utils;
pub mod validation;
