pub mod blocks;
pub mod connectors;
pub mod geometry;

pub use blocks::*;
pub use connectors::*;
pub use geometry::*;
