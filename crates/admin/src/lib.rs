//! Bình Vương Admin library.
//!
//! This crate provides the JSON API server as a library, allowing it to be
//! tested in-process and reused by the CLI.
//!
//! # Layers
//!
//! - [`routes`] - axum handlers, one module per entity
//! - [`services`] - applies domain actions and persists them
//! - [`db`] - Postgres document store and the in-memory store
//! - [`state`] - the shared factory snapshot
//!
//! All business rules live in `binh-vuong-core`; this crate only resolves
//! the acting user, serializes requests into actions and commits the
//! resulting changes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
