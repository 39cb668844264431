//! Zap gateway wire protocol - EGWTTP framing and endpoint catalog
//!
//! This crate has no dependencies so that MCU ports can use it directly.
//! The daemon and controller crates build on top of it.

pub mod ble;
pub mod egwttp;
pub mod endpoint;

pub use egwttp::{
    encode_request, encode_response, parse_request, parse_response, EncodeError, ParseError,
    Request, ResponseHead,
};
pub use endpoint::{Endpoint, EndpointRequest, EndpointResponse, Method};
