//! Database access for encore-rank
//!
//! Query functions are generic over the sqlx executor so the same code runs
//! against the pool for plain reads and against a held connection inside
//! the ranking update transaction.

pub mod performance;
pub mod sessions;
pub mod songs;
pub mod users;
pub mod week_selections;
