//! Core domain types
//!
//! These types describe a single batch job from the moment its script is
//! written until its transient files are removed again.

pub mod job;
pub mod script;
