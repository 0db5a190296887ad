// src/lib.rs
pub mod config;
pub mod generator;
pub mod server;
pub mod telemetry;
