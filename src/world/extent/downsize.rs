use crate::prelude::*;
use super::{check, Coord, ImmutableVolume, MutableVolume, Volume};

/// A sub-box of its parent. Positions keep the parent's coordinates.
#[derive(Debug, Clone)]
pub struct Downsize<V: Volume> {
    parent: V,
    min: V::Pos,
    max: V::Pos,
}
impl<V: Volume> Downsize<V> {
    /// Both corners must lie inside the parent, with `min` not above `max`.
    pub fn new(parent: V, min: V::Pos, max: V::Pos) -> Result<Self, OutOfBounds<V::Pos>> {
        check(min, parent.min(), parent.max())?;
        check(max, min, parent.max())?;
        Ok(Self { parent, min, max })
    }
    /// Narrows further. The result wraps the original parent rather than this view.
    pub fn view(self, min: V::Pos, max: V::Pos) -> Result<Self, OutOfBounds<V::Pos>> {
        check(min, self.min, self.max)?;
        check(max, min, self.max)?;
        Ok(Self { parent: self.parent, min, max })
    }
    pub fn parent(&self) -> &V {
        &self.parent
    }
    pub fn into_parent(self) -> V {
        self.parent
    }
}
impl<V: Volume> Volume for Downsize<V> {
    type Pos = V::Pos;
    type Cell = V::Cell;
    fn min(&self) -> V::Pos {
        self.min
    }
    fn max(&self) -> V::Pos {
        self.max
    }
    fn get(&self, position: V::Pos) -> Result<V::Cell, OutOfBounds<V::Pos>> {
        check(position, self.min, self.max)?;
        self.parent.get(position)
    }
}
impl<V: MutableVolume> MutableVolume for Downsize<V> {
    fn set(&mut self, position: V::Pos, cell: V::Cell) -> Result<(), OutOfBounds<V::Pos>> {
        check(position, self.min, self.max)?;
        self.parent.set(position, cell)
    }
}
impl<V: ImmutableVolume> ImmutableVolume for Downsize<V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::extent::{ArrayVolume, ViewExt};

    fn blocks() -> ArrayVolume<V3<i32>, BlockState> {
        let mut blocks = ArrayVolume::new(V3(0, 0, 0), V3(15, 15, 15)).unwrap();
        for p in blocks.cells() {
            blocks.set(p, BlockState((p.x + p.y * 16) as u16)).unwrap();
        }
        blocks
    }

    #[test]
    fn bounds_are_the_requested_box() {
        let parent = blocks();
        let view = (&parent).view(V3(2, 3, 4), V3(5, 6, 7)).unwrap();
        assert_eq!(view.min(), V3(2, 3, 4));
        assert_eq!(view.max(), V3(5, 6, 7));
        assert_eq!(view.size(), V3(4, 4, 4));
        assert_eq!(view.get(V3(5, 6, 7)), parent.get(V3(5, 6, 7)));
    }

    #[test]
    fn outside_the_box_fails_even_inside_the_parent() {
        let parent = blocks();
        let view = (&parent).view(V3(2, 3, 4), V3(5, 6, 7)).unwrap();
        assert!(parent.get(V3(1, 3, 4)).is_ok());
        let err = view.get(V3(1, 3, 4)).unwrap_err();
        assert_eq!((err.min, err.max), (V3(2, 3, 4), V3(5, 6, 7)));
    }

    #[test]
    fn corners_must_fit_the_parent() {
        let parent = blocks();
        assert!((&parent).view(V3(0, 0, 0), V3(16, 1, 1)).is_err());
        assert!((&parent).view(V3(4, 4, 4), V3(3, 4, 4)).is_err());
    }

    #[test]
    fn nested_views_retarget_the_parent() {
        let mut parent = blocks();
        let view = (&mut parent).view(V3(0, 0, 0), V3(7, 7, 7)).unwrap().view(V3(1, 1, 1), V3(2, 2, 2)).unwrap();
        assert!(view.view(V3(0, 0, 0), V3(2, 2, 2)).is_err());
        let mut view = (&mut parent).view(V3(1, 1, 1), V3(2, 2, 2)).unwrap();
        view.set(V3(2, 2, 2), BlockState(99)).unwrap();
        assert!(view.set(V3(3, 2, 2), BlockState(99)).is_err());
        assert_eq!(parent.get(V3(2, 2, 2)), Ok(BlockState(99)));
    }
}
