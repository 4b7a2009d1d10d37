//! Render pipeline construction.

pub mod figure;
