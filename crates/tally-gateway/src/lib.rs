//! tally gateway library entry.
//!
//! Wires configuration, store backends, the counter service, and the HTTP
//! surface (counter endpoints plus operational endpoints) into one stack. It
//! is consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod service;
pub mod store;
pub mod transport;
