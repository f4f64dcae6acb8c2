//! Core business logic: configuration, authentication and the credential store

pub mod auth;
pub mod config;
pub mod db;
