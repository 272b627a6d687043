//! Person registry: an authoritative SQLite store with a best-effort
//! full-text index kept in step by [`service::PersonService`].

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod models;
pub mod service;
