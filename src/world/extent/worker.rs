use crate::prelude::*;
use super::{check, MutableVolume, Volume};

/// Bulk reads over every cell of a volume, in buffer order.
#[derive(Debug)]
pub struct Worker<'a, V: ?Sized> {
    volume: &'a V,
}
impl<'a, V: Volume + ?Sized> Worker<'a, V> {
    pub fn new(volume: &'a V) -> Self {
        Self { volume }
    }

    pub fn iterate(&self, mut visit: impl FnMut(V::Pos, V::Cell)) -> Result<(), OutOfBounds<V::Pos>> {
        for p in self.volume.cells() {
            visit(p, self.volume.get(p)?);
        }
        Ok(())
    }

    pub fn reduce<A>(&self, init: A, mut fold: impl FnMut(A, V::Pos, V::Cell) -> A) -> Result<A, OutOfBounds<V::Pos>> {
        let mut acc = init;
        for p in self.volume.cells() {
            acc = fold(acc, p, self.volume.get(p)?);
        }
        Ok(acc)
    }

    /// Writes `f(p, cell)` to `dest` at the same positions. `dest` must cover this volume.
    pub fn map<D>(&self, dest: &mut D, mut f: impl FnMut(V::Pos, V::Cell) -> D::Cell) -> Result<(), OutOfBounds<V::Pos>>
    where
        D: MutableVolume<Pos = V::Pos> + ?Sized,
    {
        self.covers(dest.min(), dest.max())?;
        for p in self.volume.cells() {
            dest.set(p, f(p, self.volume.get(p)?))?;
        }
        Ok(())
    }

    /// Combines this volume with `other` cell by cell into `dest`. Both must cover this volume.
    pub fn merge<O, D>(
        &self,
        other: &O,
        dest: &mut D,
        mut f: impl FnMut(V::Pos, V::Cell, O::Cell) -> D::Cell,
    ) -> Result<(), OutOfBounds<V::Pos>>
    where
        O: Volume<Pos = V::Pos> + ?Sized,
        D: MutableVolume<Pos = V::Pos> + ?Sized,
    {
        self.covers(other.min(), other.max())?;
        self.covers(dest.min(), dest.max())?;
        for p in self.volume.cells() {
            dest.set(p, f(p, self.volume.get(p)?, other.get(p)?))?;
        }
        Ok(())
    }

    fn covers(&self, min: V::Pos, max: V::Pos) -> Result<(), OutOfBounds<V::Pos>> {
        check(self.volume.min(), min, max)?;
        check(self.volume.max(), min, max)
    }
}

/// Bulk writes over every cell of a volume.
#[derive(Debug)]
pub struct WorkerMut<'a, V: ?Sized> {
    volume: &'a mut V,
}
impl<'a, V: MutableVolume + ?Sized> WorkerMut<'a, V> {
    pub fn new(volume: &'a mut V) -> Self {
        Self { volume }
    }

    pub fn fill(&mut self, mut f: impl FnMut(V::Pos) -> V::Cell) -> Result<(), OutOfBounds<V::Pos>> {
        for p in self.volume.cells() {
            self.volume.set(p, f(p))?;
        }
        Ok(())
    }

    pub fn map_in_place(&mut self, mut f: impl FnMut(V::Pos, V::Cell) -> V::Cell) -> Result<(), OutOfBounds<V::Pos>> {
        for p in self.volume.cells() {
            let cell = self.volume.get(p)?;
            self.volume.set(p, f(p, cell))?;
        }
        Ok(())
    }
}
