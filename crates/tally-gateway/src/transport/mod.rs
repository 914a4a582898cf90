//! HTTP transport: the counter endpoint and the host failure surface.

pub mod http;
