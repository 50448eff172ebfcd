//! Bounded regions of blocks or biomes, and cheap views over them.
//!
//! A view wraps its parent by value, so it can own a volume, borrow it, or borrow it mutably.
//! Views never copy cells. [`ViewExt::mutable_copy`] and [`ViewExt::immutable_copy`] do.
use crate::prelude::*;
use std::fmt::{Debug, Display};
use std::ops::{Add, Sub};

mod buffer;
mod downsize;
mod transform;
mod unmodifiable;
mod worker;

pub use buffer::{ArrayVolume, ImmutableArrayVolume};
pub use downsize::Downsize;
pub use transform::{Axis, DiscreteTransform, DiscreteTransform2, DiscreteTransform3, TransformView};
pub use unmodifiable::Unmodifiable;
pub use worker::{Worker, WorkerMut};

/// An integer position in a volume's coordinate system.
pub trait Coord: Copy + Eq + Debug + Display + Add<Output = Self> + Sub<Output = Self> + Send + Sync + 'static {
    type Transform: DiscreteTransform<Self>;

    const ZERO: Self;
    const ONE: Self;

    /// Componentwise minimum.
    fn lower(self, other: Self) -> Self;
    /// Componentwise maximum.
    fn upper(self, other: Self) -> Self;
    fn within(self, min: Self, max: Self) -> bool {
        self.lower(min) == min && self.upper(max) == max
    }
    /// Number of cells in `[min, max]`.
    fn cell_count(min: Self, max: Self) -> usize;
    /// Position of `self` in a dense buffer spanning `[min, max]`. Y varies slowest.
    fn index(self, min: Self, max: Self) -> usize;
    /// The position after `self` in buffer order.
    fn step(self, min: Self, max: Self) -> Option<Self>;
}

impl Coord for V3<i32> {
    type Transform = DiscreteTransform3;
    const ZERO: Self = V3(0, 0, 0);
    const ONE: Self = V3(1, 1, 1);

    fn lower(self, other: Self) -> Self {
        self.min(other)
    }
    fn upper(self, other: Self) -> Self {
        self.max(other)
    }
    fn cell_count(min: Self, max: Self) -> usize {
        let size = max - min + Self::ONE;
        size.x as usize * size.y as usize * size.z as usize
    }
    fn index(self, min: Self, max: Self) -> usize {
        let size = max - min + Self::ONE;
        let rel = self - min;
        ((rel.y as usize * size.z as usize) + rel.z as usize) * size.x as usize + rel.x as usize
    }
    fn step(self, min: Self, max: Self) -> Option<Self> {
        if self.x < max.x {
            Some(V3(self.x + 1, self.y, self.z))
        } else if self.z < max.z {
            Some(V3(min.x, self.y, self.z + 1))
        } else if self.y < max.y {
            Some(V3(min.x, self.y + 1, min.z))
        } else {
            None
        }
    }
}

impl Coord for V2<i32> {
    type Transform = DiscreteTransform2;
    const ZERO: Self = V2(0, 0);
    const ONE: Self = V2(1, 1);

    fn lower(self, other: Self) -> Self {
        self.min(other)
    }
    fn upper(self, other: Self) -> Self {
        self.max(other)
    }
    fn cell_count(min: Self, max: Self) -> usize {
        let size = max - min + Self::ONE;
        size.x as usize * size.z as usize
    }
    fn index(self, min: Self, max: Self) -> usize {
        let size = max - min + Self::ONE;
        let rel = self - min;
        rel.z as usize * size.x as usize + rel.x as usize
    }
    fn step(self, min: Self, max: Self) -> Option<Self> {
        if self.x < max.x {
            Some(V2(self.x + 1, self.z))
        } else if self.z < max.z {
            Some(V2(min.x, self.z + 1))
        } else {
            None
        }
    }
}

/// Every position in `[min, max]`, in buffer order.
#[derive(Debug, Clone)]
pub struct Cells<P> {
    next: Option<P>,
    min: P,
    max: P,
}
impl<P: Coord> Cells<P> {
    pub fn new(min: P, max: P) -> Self {
        Self { next: min.within(min, max).then_some(min), min, max }
    }
}
impl<P: Coord> Iterator for Cells<P> {
    type Item = P;
    fn next(&mut self) -> Option<P> {
        let current = self.next?;
        self.next = current.step(self.min, self.max);
        Some(current)
    }
}

pub(crate) fn check<P: Coord>(position: P, min: P, max: P) -> Result<(), OutOfBounds<P>> {
    if position.within(min, max) {
        Ok(())
    } else {
        Err(OutOfBounds { position, min, max })
    }
}

/// A bounded, readable region. Both corners are inclusive.
pub trait Volume {
    type Pos: Coord;
    type Cell: Copy + Debug + PartialEq + Default + Send + Sync + 'static;

    fn min(&self) -> Self::Pos;
    fn max(&self) -> Self::Pos;
    fn size(&self) -> Self::Pos {
        self.max() - self.min() + Self::Pos::ONE
    }
    fn contains(&self, position: Self::Pos) -> bool {
        position.within(self.min(), self.max())
    }
    fn get(&self, position: Self::Pos) -> Result<Self::Cell, OutOfBounds<Self::Pos>>;

    fn cells(&self) -> Cells<Self::Pos> {
        Cells::new(self.min(), self.max())
    }
}

pub trait MutableVolume: Volume {
    fn set(&mut self, position: Self::Pos, cell: Self::Cell) -> Result<(), OutOfBounds<Self::Pos>>;
}

/// The cells behind this volume never change while it is alive.
pub trait ImmutableVolume: Volume {}

pub trait BlockVolume: Volume<Pos = V3<i32>, Cell = BlockState> {}
impl<V: Volume<Pos = V3<i32>, Cell = BlockState> + ?Sized> BlockVolume for V {}

/// Biomes only vary horizontally.
pub trait BiomeArea: Volume<Pos = V2<i32>, Cell = BiomeType> {}
impl<V: Volume<Pos = V2<i32>, Cell = BiomeType> + ?Sized> BiomeArea for V {}

impl<V: Volume + ?Sized> Volume for &V {
    type Pos = V::Pos;
    type Cell = V::Cell;
    fn min(&self) -> V::Pos {
        (**self).min()
    }
    fn max(&self) -> V::Pos {
        (**self).max()
    }
    fn get(&self, position: V::Pos) -> Result<V::Cell, OutOfBounds<V::Pos>> {
        (**self).get(position)
    }
}
impl<V: ImmutableVolume + ?Sized> ImmutableVolume for &V {}

impl<V: Volume + ?Sized> Volume for &mut V {
    type Pos = V::Pos;
    type Cell = V::Cell;
    fn min(&self) -> V::Pos {
        (**self).min()
    }
    fn max(&self) -> V::Pos {
        (**self).max()
    }
    fn get(&self, position: V::Pos) -> Result<V::Cell, OutOfBounds<V::Pos>> {
        (**self).get(position)
    }
}
impl<V: MutableVolume + ?Sized> MutableVolume for &mut V {
    fn set(&mut self, position: V::Pos, cell: V::Cell) -> Result<(), OutOfBounds<V::Pos>> {
        (**self).set(position, cell)
    }
}

/// Views and copies, for every volume.
pub trait ViewExt: Volume + Sized {
    /// Restricts this volume to `[min, max]`.
    fn view(self, min: Self::Pos, max: Self::Pos) -> Result<Downsize<Self>, OutOfBounds<Self::Pos>> {
        Downsize::new(self, min, max)
    }
    fn transformed(self, transform: <Self::Pos as Coord>::Transform) -> TransformView<Self> {
        TransformView::new(self, transform)
    }
    /// Moves `min` to the origin.
    fn relative(self) -> TransformView<Self> {
        let offset = Self::Pos::ZERO - self.min();
        TransformView::new(self, <Self::Pos as Coord>::Transform::translation(offset))
    }
    fn unmodifiable(self) -> Unmodifiable<Self> {
        Unmodifiable::new(self)
    }
    fn worker(&self) -> Worker<'_, Self> {
        Worker::new(self)
    }
    fn worker_mut(&mut self) -> WorkerMut<'_, Self>
    where
        Self: MutableVolume,
    {
        WorkerMut::new(self)
    }
    fn mutable_copy(&self) -> ArrayVolume<Self::Pos, Self::Cell> {
        ArrayVolume::copy_of(self)
    }
    fn immutable_copy(&self) -> ImmutableArrayVolume<Self::Pos, Self::Cell> {
        ArrayVolume::copy_of(self).into_immutable()
    }
}
impl<V: Volume> ViewExt for V {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_is_the_slowest_axis() {
        let (min, max) = (V3(-1, 10, 4), V3(2, 12, 5));
        assert_eq!(V3(-1, 10, 4).index(min, max), 0);
        assert_eq!(V3(0, 10, 4).index(min, max), 1);
        assert_eq!(V3(-1, 10, 5).index(min, max), 4);
        assert_eq!(V3(-1, 11, 4).index(min, max), 8);
        assert_eq!(V3::cell_count(min, max), 24);
        assert_eq!(V3(2, 12, 5).index(min, max), 23);
    }

    #[test]
    fn cells_follow_buffer_order() {
        let (min, max) = (V3(0, 0, 0), V3(1, 2, 3));
        let cells: Vec<_> = Cells::new(min, max).collect();
        assert_eq!(cells.len(), V3::cell_count(min, max));
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.index(min, max), i);
        }
        let area: Vec<_> = Cells::new(V2(0, 0), V2(1, 1)).collect();
        assert_eq!(area, [V2(0, 0), V2(1, 0), V2(0, 1), V2(1, 1)]);
    }

    #[test]
    fn inverted_bounds_have_no_cells() {
        assert_eq!(Cells::new(V2(1, 1), V2(0, 1)).count(), 0);
    }
}
