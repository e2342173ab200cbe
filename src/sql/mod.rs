//! SQL output layer.
//!
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations and paging strategies
//! - [`command`] - Parameterized command text and its builder

pub mod command;
pub mod dialect;
pub mod token;

#[cfg(test)]
pub mod test_utils;

pub use command::{CommandParameter, SqlCommand, SqlCommandBuilder};
pub use dialect::{Dialect, PagingStrategy, SqlDialect};
pub use token::{Token, TokenStream};
