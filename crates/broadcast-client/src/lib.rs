//! Per-partner HTTP transport: request shaping, authentication, response
//! field extraction, and circuit breaker integration.

mod body;
mod client;
mod extract;

pub use client::PartnerHttpClient;
