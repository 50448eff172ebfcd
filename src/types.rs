use std::fmt;
use std::ops::{Add, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct V3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}
#[allow(non_snake_case)]
pub const fn V3<T>(x: T, y: T, z: T) -> V3<T> {
    V3 { x, y, z }
}

/// Horizontal coordinate, used for biome areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct V2<T> {
    pub x: T,
    pub z: T,
}
#[allow(non_snake_case)]
pub const fn V2<T>(x: T, z: T) -> V2<T> {
    V2 { x, z }
}

macro_rules! impl_ops {
    ($v:ident { $($f:ident)* }) => {
        impl<T: Add<Output = T>> Add for $v<T> {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                $v { $($f: self.$f + rhs.$f),* }
            }
        }
        impl<T: Sub<Output = T>> Sub for $v<T> {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                $v { $($f: self.$f - rhs.$f),* }
            }
        }
        impl<T: Neg<Output = T>> Neg for $v<T> {
            type Output = Self;
            fn neg(self) -> Self {
                $v { $($f: -self.$f),* }
            }
        }
        impl<T: Ord> $v<T> {
            pub fn min(self, other: Self) -> Self {
                $v { $($f: self.$f.min(other.$f)),* }
            }
            pub fn max(self, other: Self) -> Self {
                $v { $($f: self.$f.max(other.$f)),* }
            }
        }
    };
}
impl_ops!(V3 { x y z });
impl_ops!(V2 { x z });

impl<T: fmt::Display> fmt::Display for V3<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
impl<T: fmt::Display> fmt::Display for V2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}
impl V3<f32> {
    pub const ZERO: Self = V3(0.0, 0.0, 0.0);
}
impl V3<f64> {
    pub fn to_f32(self) -> V3<f32> {
        V3(self.x as f32, self.y as f32, self.z as f32)
    }
}

/// Network id of a block state, `type_id << 4 | data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockState(pub u16);
impl BlockState {
    pub const AIR: Self = Self(0);
    pub const fn new(type_id: u16, data: u8) -> Self {
        Self(type_id << 4 | (data as u16 & 0xF))
    }
    pub const fn type_id(self) -> u16 {
        self.0 >> 4
    }
    pub const fn data(self) -> u8 {
        (self.0 & 0xF) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BiomeType(pub u8);
impl BiomeType {
    pub const OCEAN: Self = Self(0);
    pub const PLAINS: Self = Self(1);
    pub const DESERT: Self = Self(2);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}
impl GameMode {
    pub fn net_id(self) -> u8 {
        match self {
            GameMode::Survival => 0,
            GameMode::Creative => 1,
            GameMode::Adventure => 2,
            GameMode::Spectator => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}
impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// An item stack as it travels in a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub id: i16,
    pub count: i8,
    pub damage: i16,
    pub nbt: Option<fastnbt::Value>,
}
impl ItemStack {
    pub const MAX_STACK: i8 = 64;

    pub fn new(id: i16, count: i8) -> Self {
        Self { id, count, damage: 0, nbt: None }
    }
    pub fn with_count(&self, count: i8) -> Self {
        Self { count, ..self.clone() }
    }
    /// Same item, ignoring the quantity.
    pub fn is_similar(&self, other: &ItemStack) -> bool {
        self.id == other.id && self.damage == other.damage && self.nbt == other.nbt
    }
}
