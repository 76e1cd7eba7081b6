//! Bazaar API library.
//!
//! This crate provides the REST backend as a library, allowing it to be
//! tested and reused. The binary in `main.rs` wires the MongoDB store and
//! SMTP mailer into [`state::AppState`] and serves [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
