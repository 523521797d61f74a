//! Patient Registry server.
//!
//! REST API for registering patients with a document photo, browsing them
//! with search and pagination, and removing them. A confirmation email is
//! sent after each registration without holding up the response.
//!
//! # Architecture
//!
//! - Axum web framework
//! - `PostgreSQL` via sqlx behind the [`db::PatientStore`] port
//! - Photos on the local filesystem, served under `/uploads`
//! - Registration events fanned out to listeners (SMTP via lettre)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
