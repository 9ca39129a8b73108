//! Inbound requests, as seen by the grant flows.
//!
//! The transport in front of the grant types is out of reach of this crate. Whatever it receives
//! is normalized once into a [`Request`], which every grant type then reads its parameters from.
pub mod request;

pub use self::request::{RawRequest, Request};
