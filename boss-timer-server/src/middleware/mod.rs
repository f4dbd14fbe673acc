//! HTTP middleware stack: permissive CORS and per-request trace IDs.

pub mod cors;
pub mod trace;
