//! Font loading and label drawing.

pub mod face;
pub mod label;
