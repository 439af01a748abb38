//! EvoTrack - multi-tenant time tracking backend
//!
//! This library provides the core functionality for the EvoTrack backend,
//! including database operations, role-based access control, and the
//! cursor-paginated organization user search with live aggregate statistics.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rbac;
pub mod search;
pub mod util;
