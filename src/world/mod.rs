//! World storage seen from the protocol's side: regions of blocks and biomes.
pub mod extent;

pub use extent::{BiomeArea, BlockVolume, ImmutableVolume, MutableVolume, ViewExt, Volume};
