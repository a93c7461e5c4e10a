//! Background acquisition and decoding.

pub mod decode;
pub mod store;
