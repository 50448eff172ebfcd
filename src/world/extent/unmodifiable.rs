use crate::prelude::*;
use super::{ImmutableVolume, Volume};

/// Hides the setters of the wrapped volume. Whoever owns the backing store can still change it.
#[derive(Debug, Clone)]
pub struct Unmodifiable<V>(V);
impl<V: Volume> Unmodifiable<V> {
    pub fn new(inner: V) -> Self {
        Self(inner)
    }
}
impl<V: Volume> Volume for Unmodifiable<V> {
    type Pos = V::Pos;
    type Cell = V::Cell;
    fn min(&self) -> V::Pos {
        self.0.min()
    }
    fn max(&self) -> V::Pos {
        self.0.max()
    }
    fn get(&self, position: V::Pos) -> Result<V::Cell, OutOfBounds<V::Pos>> {
        self.0.get(position)
    }
}
impl<V: ImmutableVolume> ImmutableVolume for Unmodifiable<V> {}
