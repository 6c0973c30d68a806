//! Resolution passes.
//!
//! Each pass is one module with a `run` entry point (or a set of
//! binding functions); [`pipeline`] sequences them into the fixed-point
//! loop and turns the survivors into diagnostics.

pub mod augment;
pub mod copy;
pub mod expand;
pub mod identity;
pub mod pipeline;
pub mod refine;
pub mod types;

pub use pipeline::{resolve, ResolveOptions};
