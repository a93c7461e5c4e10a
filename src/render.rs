//! Canvas allocation and background compositing.

pub mod composite;
