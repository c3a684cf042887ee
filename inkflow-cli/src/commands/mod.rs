//! CLI command implementations.

pub mod bench;
pub mod common;
pub mod recommend;
pub mod smooth;
