//! Inbound adapters translating external requests into driving-port calls.
//!
//! Only HTTP exists today; see [`http`].

pub mod http;
