// src/client/mod.rs
mod joget;

pub use joget::{ClientError, InstanceHealth, JogetClient};
