//! # Encore Common Library
//!
//! Shared code for the Encore practice-ranking services including:
//! - Database initialization and row models
//! - Configuration loading and root folder resolution
//! - Week window arithmetic for the song-of-the-week rotation
//! - Play time formatting and score rounding

pub mod config;
pub mod db;
pub mod error;
pub mod human_time;
pub mod score;
pub mod time;

pub use error::{Error, Result};
