//! # TaskHub Worker Library
//!
//! Background jobs that run beside the API server.
//!
//! ## Modules
//!
//! - `dispatcher`: Periodic VIP notification dispatcher
//! - `config`: Worker configuration from the environment

pub mod config;
pub mod dispatcher;
