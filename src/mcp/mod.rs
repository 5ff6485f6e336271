//! Model Context Protocol (MCP) message model and reference server
//!
//! Provides JSON-RPC message validation, reply helpers and the `RpcServer` seam the adapter
//! dispatches through.

pub mod message;
pub mod rpc;
pub mod server;
