//! Common utility functions

pub mod contact;

pub use contact::*;
