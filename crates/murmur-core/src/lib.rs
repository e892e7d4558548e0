//! murmur-core - Core library for Murmur
//!
//! Feedback posts and support tickets stored as JSON documents in a
//! versioned content store, with optimistic-concurrency saves that reconcile
//! concurrent edits instead of losing them. Front ends (the `murmur` CLI)
//! sit on top of [`services::Board`].

pub mod auth;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod models;
pub mod normalize;
pub mod retention;
pub mod save;
pub mod search;
pub mod services;
pub mod store;
pub mod util;

pub use error::{Error, Result};
pub use models::{CollectionKind, Record, RecordId};
