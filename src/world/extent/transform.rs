use crate::prelude::*;
use super::{check, Coord, ImmutableVolume, MutableVolume, Volume};
use std::fmt::Debug;

/// An invertible integer map: quarter turns, mirrors and translations.
pub trait DiscreteTransform<P>: Copy + Debug + PartialEq + Send + Sync + 'static {
    fn identity() -> Self;
    fn translation(offset: P) -> Self;
    fn apply(&self, position: P) -> P;
    fn invert(&self) -> Self;
    /// Applies `self`, then `next`.
    fn then(&self, next: &Self) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

type M3 = [[i32; 3]; 3];

fn mul3(a: &M3, b: &M3) -> M3 {
    let mut out = [[0; 3]; 3];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[r][k] * b[k][c]).sum();
        }
    }
    out
}
fn transpose3(m: &M3) -> M3 {
    let mut out = [[0; 3]; 3];
    for (r, row) in m.iter().enumerate() {
        for (c, v) in row.iter().enumerate() {
            out[c][r] = *v;
        }
    }
    out
}
fn apply3(m: &M3, p: V3<i32>) -> V3<i32> {
    let v = [p.x, p.y, p.z];
    let row = |r: usize| (0..3).map(|k| m[r][k] * v[k]).sum::<i32>();
    V3(row(0), row(1), row(2))
}

/// Affine map over block positions. The linear part is always a signed permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscreteTransform3 {
    matrix: M3,
    offset: V3<i32>,
}
impl DiscreteTransform3 {
    pub const IDENTITY: Self = Self { matrix: [[1, 0, 0], [0, 1, 0], [0, 0, 1]], offset: V3(0, 0, 0) };

    /// Counter-clockwise when looking down `axis` towards the origin.
    pub fn rotation(quarter_turns: i32, axis: Axis) -> Self {
        let step: M3 = match axis {
            Axis::X => [[1, 0, 0], [0, 0, -1], [0, 1, 0]],
            Axis::Y => [[0, 0, 1], [0, 1, 0], [-1, 0, 0]],
            Axis::Z => [[0, -1, 0], [1, 0, 0], [0, 0, 1]],
        };
        let mut matrix = Self::IDENTITY.matrix;
        for _ in 0..quarter_turns.rem_euclid(4) {
            matrix = mul3(&step, &matrix);
        }
        Self { matrix, offset: V3(0, 0, 0) }
    }
    /// Rotates so that `center` stays put.
    pub fn rotation_around(quarter_turns: i32, axis: Axis, center: V3<i32>) -> Self {
        Self::translation(-center)
            .then(&Self::rotation(quarter_turns, axis))
            .then(&Self::translation(center))
    }
    /// Flips the sign of one axis.
    pub fn mirror(axis: Axis) -> Self {
        let mut matrix = Self::IDENTITY.matrix;
        let i = match axis {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        };
        matrix[i][i] = -1;
        Self { matrix, offset: V3(0, 0, 0) }
    }
}
impl DiscreteTransform<V3<i32>> for DiscreteTransform3 {
    fn identity() -> Self {
        Self::IDENTITY
    }
    fn translation(offset: V3<i32>) -> Self {
        Self { offset, ..Self::IDENTITY }
    }
    fn apply(&self, position: V3<i32>) -> V3<i32> {
        apply3(&self.matrix, position) + self.offset
    }
    fn invert(&self) -> Self {
        let matrix = transpose3(&self.matrix);
        Self { matrix, offset: -apply3(&matrix, self.offset) }
    }
    fn then(&self, next: &Self) -> Self {
        Self {
            matrix: mul3(&next.matrix, &self.matrix),
            offset: apply3(&next.matrix, self.offset) + next.offset,
        }
    }
}

/// Affine map over horizontal positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscreteTransform2 {
    matrix: [[i32; 2]; 2],
    offset: V2<i32>,
}
impl DiscreteTransform2 {
    pub const IDENTITY: Self = Self { matrix: [[1, 0], [0, 1]], offset: V2(0, 0) };

    /// Matches [`DiscreteTransform3::rotation`] about [`Axis::Y`].
    pub fn rotation(quarter_turns: i32) -> Self {
        let matrix = match quarter_turns.rem_euclid(4) {
            0 => [[1, 0], [0, 1]],
            1 => [[0, 1], [-1, 0]],
            2 => [[-1, 0], [0, -1]],
            _ => [[0, -1], [1, 0]],
        };
        Self { matrix, offset: V2(0, 0) }
    }
    pub fn rotation_around(quarter_turns: i32, center: V2<i32>) -> Self {
        Self::translation(-center)
            .then(&Self::rotation(quarter_turns))
            .then(&Self::translation(center))
    }
    pub fn mirror_x() -> Self {
        Self { matrix: [[-1, 0], [0, 1]], offset: V2(0, 0) }
    }
    pub fn mirror_z() -> Self {
        Self { matrix: [[1, 0], [0, -1]], offset: V2(0, 0) }
    }
    fn linear(matrix: &[[i32; 2]; 2], p: V2<i32>) -> V2<i32> {
        V2(matrix[0][0] * p.x + matrix[0][1] * p.z, matrix[1][0] * p.x + matrix[1][1] * p.z)
    }
}
impl DiscreteTransform<V2<i32>> for DiscreteTransform2 {
    fn identity() -> Self {
        Self::IDENTITY
    }
    fn translation(offset: V2<i32>) -> Self {
        Self { offset, ..Self::IDENTITY }
    }
    fn apply(&self, position: V2<i32>) -> V2<i32> {
        Self::linear(&self.matrix, position) + self.offset
    }
    fn invert(&self) -> Self {
        let m = self.matrix;
        let matrix = [[m[0][0], m[1][0]], [m[0][1], m[1][1]]];
        Self { matrix, offset: -Self::linear(&matrix, self.offset) }
    }
    fn then(&self, next: &Self) -> Self {
        let (a, b) = (&next.matrix, &self.matrix);
        let matrix = [
            [a[0][0] * b[0][0] + a[0][1] * b[1][0], a[0][0] * b[0][1] + a[0][1] * b[1][1]],
            [a[1][0] * b[0][0] + a[1][1] * b[1][0], a[1][0] * b[0][1] + a[1][1] * b[1][1]],
        ];
        Self { matrix, offset: Self::linear(a, self.offset) + next.offset }
    }
}

type TransformOf<V> = <<V as Volume>::Pos as Coord>::Transform;

/// The parent seen through a transform. Reads and writes at `p` go to the parent at `inverse(p)`.
#[derive(Debug, Clone)]
pub struct TransformView<V: Volume> {
    parent: V,
    transform: TransformOf<V>,
    inverse: TransformOf<V>,
    min: V::Pos,
    max: V::Pos,
}
impl<V: Volume> TransformView<V> {
    pub fn new(parent: V, transform: TransformOf<V>) -> Self {
        let a = transform.apply(parent.min());
        let b = transform.apply(parent.max());
        Self { inverse: transform.invert(), transform, min: a.lower(b), max: a.upper(b), parent }
    }
    pub fn transform(&self) -> &TransformOf<V> {
        &self.transform
    }
    pub fn into_parent(self) -> V {
        self.parent
    }
    /// Applies `next` after the current transform, without nesting views.
    pub fn transformed(self, next: TransformOf<V>) -> Self {
        let transform = self.transform.then(&next);
        let a = next.apply(self.min);
        let b = next.apply(self.max);
        Self { inverse: transform.invert(), transform, min: a.lower(b), max: a.upper(b), parent: self.parent }
    }
    pub fn relative(self) -> Self {
        let offset = V::Pos::ZERO - self.min;
        self.transformed(<TransformOf<V> as DiscreteTransform<V::Pos>>::translation(offset))
    }
    /// Restricts to `[min, max]` in this view's coordinates. Repeated calls narrow the same view.
    pub fn view(self, min: V::Pos, max: V::Pos) -> Result<Self, OutOfBounds<V::Pos>> {
        check(min, self.min, self.max)?;
        check(max, min, self.max)?;
        Ok(Self { min, max, ..self })
    }
}
impl<V: Volume> Volume for TransformView<V> {
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
        self.parent.get(self.inverse.apply(position))
    }
}
impl<V: MutableVolume> MutableVolume for TransformView<V> {
    fn set(&mut self, position: V::Pos, cell: V::Cell) -> Result<(), OutOfBounds<V::Pos>> {
        check(position, self.min, self.max)?;
        self.parent.set(self.inverse.apply(position), cell)
    }
}
impl<V: ImmutableVolume> ImmutableVolume for TransformView<V> {}
