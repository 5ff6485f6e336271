//! HTTP transport layer for the adapter
//!
//! Routes the `/mcp` endpoint through the adapter and serves health and discovery metadata.

pub mod handlers;
