//! Segmentation of superpixel graphs into connected segments around master nodes,
//! solved by column generation on top of an LP/MIP engine.

pub mod algorithm;
pub mod column_generation;
pub mod config;
pub mod connectivity;
pub mod errors;
pub mod graph;
pub mod io;
pub mod log;
pub mod lp;
pub mod master;
pub mod pricing;
pub mod segment;

pub use column_generation::{SegmentationResult, segment};

pub mod prelude {
    pub use super::algorithm::*;
    pub use super::column_generation::*;
    pub use super::config::*;
    pub use super::errors::*;
    pub use super::graph::*;
    pub use super::io::*;
    pub use super::segment::*;
}

#[cfg(test)]
mod testing;
