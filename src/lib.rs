//! Library crate for play-queue-back, exposing modules for the binary and
//! integration tests.

pub mod auth;
pub mod client;
mod config;
pub mod dao;
mod dto;
mod error;
mod http;
pub mod routes;
pub mod services;
pub mod state;

pub use config::AppConfig;
