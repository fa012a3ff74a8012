//! Application layer — port traits, domain events, and the service that
//! wires the usage store to the cloud protocol.

pub mod events;
pub mod ports;
pub mod service;
