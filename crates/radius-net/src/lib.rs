//! Async RADIUS transports: a request/response client and a multi-tenant
//! server, both over UDP and TCP.
//!
//! The [`Client`] correlates replies by packet identifier through a
//! pending-request table and reconnects with Fibonacci backoff. The
//! [`Server`] dispatches per-peer (shared secrets and dictionaries keyed by
//! the peer's IP literal, with a `*default` fallback) to asynchronous
//! per-code handlers.
//!
//! The protocol engine itself (packets, attributes, dictionaries,
//! authenticators) lives in [`radius_proto`] and is re-exported where it
//! appears in this crate's API.

pub mod client;
pub mod config;
pub mod server;

pub use client::{Client, ClientError};
pub use server::{
    handler_fn, peer_identifier, Dictionaries, HandlerError, RequestHandler, Secrets, Server,
    ServerError, META_DEFAULT,
};
