//! # teamroute API
//!
//! HTTP surface of the resolver: the REST server over a [`StorageManager`]
//! and [`HttpTeamResolver`], a client that resolves addresses against a
//! remote server through the same [`TeamResolver`] trait.
//!
//! [`StorageManager`]: teamroute_storage::StorageManager
//! [`TeamResolver`]: teamroute_core::TeamResolver

pub mod client;
pub mod rest;

pub use client::HttpTeamResolver;
pub use rest::{ApiResponse, AppState, RestApi};
