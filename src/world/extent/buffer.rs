use crate::prelude::*;
use super::{check, Coord, ImmutableVolume, MutableVolume, Volume};
use std::sync::Arc;

/// Dense storage for every cell in `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayVolume<P, C> {
    min: P,
    max: P,
    cells: Vec<C>,
}
impl<P: Coord, C: Copy + Default> ArrayVolume<P, C> {
    /// Filled with `C::default()`. `min` must not exceed `max` on any axis.
    pub fn new(min: P, max: P) -> Result<Self, OutOfBounds<P>> {
        check(min, min, max)?;
        Ok(Self { min, max, cells: vec![C::default(); P::cell_count(min, max)] })
    }
    pub fn copy_of<V: Volume<Pos = P, Cell = C> + ?Sized>(volume: &V) -> Self {
        let (min, max) = (volume.min(), volume.max());
        let cells = volume
            .cells()
            .map(|p| volume.get(p).unwrap_or_default())
            .collect();
        Self { min, max, cells }
    }
    pub fn into_immutable(self) -> ImmutableArrayVolume<P, C> {
        ImmutableArrayVolume { min: self.min, max: self.max, cells: self.cells.into() }
    }
    /// The cells in buffer order.
    pub fn as_slice(&self) -> &[C] {
        &self.cells
    }
}
impl<P: Coord, C> Volume for ArrayVolume<P, C>
where
    C: Copy + std::fmt::Debug + PartialEq + Default + Send + Sync + 'static,
{
    type Pos = P;
    type Cell = C;
    fn min(&self) -> P {
        self.min
    }
    fn max(&self) -> P {
        self.max
    }
    fn get(&self, position: P) -> Result<C, OutOfBounds<P>> {
        check(position, self.min, self.max)?;
        Ok(self.cells[position.index(self.min, self.max)])
    }
}
impl<P: Coord, C> MutableVolume for ArrayVolume<P, C>
where
    C: Copy + std::fmt::Debug + PartialEq + Default + Send + Sync + 'static,
{
    fn set(&mut self, position: P, cell: C) -> Result<(), OutOfBounds<P>> {
        check(position, self.min, self.max)?;
        self.cells[position.index(self.min, self.max)] = cell;
        Ok(())
    }
}

/// A frozen buffer. Clones share the cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ImmutableArrayVolume<P, C> {
    min: P,
    max: P,
    cells: Arc<[C]>,
}
impl<P: Coord, C> Volume for ImmutableArrayVolume<P, C>
where
    C: Copy + std::fmt::Debug + PartialEq + Default + Send + Sync + 'static,
{
    type Pos = P;
    type Cell = C;
    fn min(&self) -> P {
        self.min
    }
    fn max(&self) -> P {
        self.max
    }
    fn get(&self, position: P) -> Result<C, OutOfBounds<P>> {
        check(position, self.min, self.max)?;
        Ok(self.cells[position.index(self.min, self.max)])
    }
}
impl<P: Coord, C> ImmutableVolume for ImmutableArrayVolume<P, C> where
    C: Copy + std::fmt::Debug + PartialEq + Default + Send + Sync + 'static
{
}
