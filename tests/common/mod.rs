#![allow(dead_code)]

pub mod actions;
pub mod fixtures;

pub use actions::*;
pub use fixtures::*;
