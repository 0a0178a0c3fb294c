// relay-api: raw async client for the smart relay device's HTTP surface.
//
// The device is an embedded switch reachable over plain HTTP with Basic
// Auth. This crate knows the wire formats and nothing else -- connection
// lifecycle, polling, and state live in relay-core.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::DeviceClient;
pub use error::Error;
pub use models::{DeviceStatus, RelayMode, TimeSlot};
pub use transport::TransportConfig;
