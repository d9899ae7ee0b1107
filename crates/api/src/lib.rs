//! Async client for the cloud-storage service.
//!
//! Covers the calls the transfer engine needs: range probing and fetching
//! on download links, the precreate / chunk upload / create handshake, and
//! the account and metadata lookups.

pub mod client;

pub use client::{Client, Endpoints, Error, RangeProbe};
