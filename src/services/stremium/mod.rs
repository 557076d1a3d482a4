//! Stremium Integration
//!
//! Client for the Stremium live TV backend. All calls are GraphQL POSTs
//! against a single endpoint:
//!
//! ```text
//! POST https://api.stremium.com/graphql
//! Authorization: Bearer <token>
//! ```
//!
//! The client implements [`ChannelSource`](crate::services::source::ChannelSource),
//! which is all the rest of the server depends on.

pub mod client;
pub mod types;

pub use client::{StremiumClient, StremiumError};
