// src/lib.rs
pub mod cli;
pub mod client;
pub mod config;
pub mod health;
pub mod logging;
pub mod mdm;
