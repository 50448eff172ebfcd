//! Particle effects, and their expansion into the client's `SpawnParticle` packets.
//!
//! The client can only vary a particle through three floats and a single `data` value,
//! so how an effect is spelled on the wire depends on which of those it actually uses.
use crate::prelude::*;
use crate::network::wire::{var, ToWire};
use crate::network::{Codec, CodecContext, Message, Processor};
use bytes::BytesMut;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hash::{Hash, Hasher};

macro_rules! particles {
    {$($name:ident = $id:literal,)*} => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ParticleKind {
            $($name,)*
        }
        impl ParticleKind {
            pub const ALL: &'static [ParticleKind] = &[$(ParticleKind::$name,)*];
            pub fn net_id(self) -> i32 {
                match self {
                    $(ParticleKind::$name => $id,)*
                }
            }
        }
    };
}
particles! {
    Explosion = 0,
    LargeExplosion = 1,
    HugeExplosion = 2,
    FireworksSpark = 3,
    WaterBubble = 4,
    WaterSplash = 5,
    WaterWake = 6,
    Suspended = 7,
    SuspendedDepth = 8,
    Crit = 9,
    MagicCrit = 10,
    Smoke = 11,
    LargeSmoke = 12,
    Spell = 13,
    InstantSpell = 14,
    MobSpell = 15,
    AmbientMobSpell = 16,
    WitchSpell = 17,
    DripWater = 18,
    DripLava = 19,
    AngryVillager = 20,
    HappyVillager = 21,
    TownAura = 22,
    Note = 23,
    Portal = 24,
    EnchantmentTable = 25,
    Flame = 26,
    Lava = 27,
    Footstep = 28,
    Cloud = 29,
    Redstone = 30,
    Snowball = 31,
    SnowShovel = 32,
    Slime = 33,
    Heart = 34,
    Barrier = 35,
    ItemCrack = 36,
    BlockCrack = 37,
    BlockDust = 38,
    WaterDrop = 39,
    ItemTake = 40,
    MobAppearance = 41,
    DragonBreath = 42,
    EndRod = 43,
    DamageIndicator = 44,
    SweepAttack = 45,
    FallingDust = 46,
}

impl ParticleKind {
    /// The color the client uses when none is given.
    pub fn default_color(self) -> Option<Color> {
        match self {
            ParticleKind::Redstone => Some(Color::rgb(255, 0, 0)),
            ParticleKind::MobSpell | ParticleKind::AmbientMobSpell => Some(Color::rgb(0, 0, 0)),
            _ => None,
        }
    }
    pub fn default_size(self) -> Option<f32> {
        match self {
            ParticleKind::LargeExplosion | ParticleKind::SweepAttack => Some(1.0),
            _ => None,
        }
    }
    pub fn has_motion(self) -> bool {
        use ParticleKind::*;
        matches!(
            self,
            Explosion | FireworksSpark | WaterBubble | WaterSplash | WaterWake | Crit | MagicCrit
                | Smoke | LargeSmoke | Spell | InstantSpell | Portal | EnchantmentTable | Flame
                | Cloud | SnowShovel | DragonBreath | EndRod | DamageIndicator
                | ItemCrack | BlockCrack | BlockDust
        )
    }
    pub fn takes_item(self) -> bool {
        matches!(self, ParticleKind::ItemCrack | ParticleKind::BlockCrack | ParticleKind::BlockDust | ParticleKind::FallingDust)
    }
    pub fn takes_note(self) -> bool {
        self == ParticleKind::Note
    }
}

/// Highest note block pitch, two octaves up.
pub const MAX_NOTE: u8 = 24;

/// What an effect carries beyond its kind. Which variants make sense depends on the kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleOptions {
    None,
    Motion(V3<f32>),
    Resizable { size: f32 },
    Colored(Color),
    /// A note block pitch, 0 to 24.
    Note(u8),
    /// The item to show. Block particles read `id` as a block type.
    Item { id: i32, data: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleEffect {
    pub kind: ParticleKind,
    /// Spread of the positions, per axis.
    pub offset: V3<f32>,
    pub count: i32,
    pub options: ParticleOptions,
}
impl ParticleEffect {
    /// An effect with the kind's default options.
    pub fn new(kind: ParticleKind) -> Self {
        let options = if let Some(color) = kind.default_color() {
            ParticleOptions::Colored(color)
        } else if let Some(size) = kind.default_size() {
            ParticleOptions::Resizable { size }
        } else if kind.takes_note() {
            ParticleOptions::Note(0)
        } else if kind.has_motion() {
            ParticleOptions::Motion(V3::ZERO)
        } else {
            ParticleOptions::None
        };
        Self { kind, offset: V3::ZERO, count: 1, options }
    }
    pub fn offset(self, offset: V3<f32>) -> Self {
        Self { offset, ..self }
    }
    pub fn count(self, count: i32) -> Self {
        Self { count, ..self }
    }
    pub fn options(self, options: ParticleOptions) -> Self {
        Self { options, ..self }
    }
}

/// The logical message game code sends. Expanded by [`ParticleProcessor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleEffectMessage {
    pub effect: ParticleEffect,
    pub position: V3<f64>,
}

/// The wire packet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnParticle {
    pub particle_id: i32,
    pub long_distance: bool,
    pub position: V3<f32>,
    pub offset: V3<f32>,
    pub data: f32,
    pub count: i32,
    pub extra: Vec<i32>,
}
crate::impl_message!(ParticleEffectMessage, SpawnParticle);

#[derive(Debug, Default, Clone, Copy)]
pub struct SpawnParticleCodec;
impl Codec for SpawnParticleCodec {
    type Message = SpawnParticle;
    const CACHING: bool = true;
    fn encode(&self, _: &CodecContext, msg: &SpawnParticle, buf: &mut BytesMut) -> Result<(), CodecError> {
        (msg.particle_id, msg.long_distance, msg.position, msg.offset, msg.data, msg.count).encode(buf);
        for extra in &msg.extra {
            var(*extra).encode(buf);
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ParticleProcessor;
impl Processor for ParticleProcessor {
    type Message = ParticleEffectMessage;
    const CACHING: bool = true;

    fn process(&self, _: &CodecContext, msg: &ParticleEffectMessage, out: &mut Vec<Box<dyn Message>>) -> Result<(), CodecError> {
        out.extend(expand(msg)?.into_iter().map(|p| Box::new(p) as Box<dyn Message>));
        Ok(())
    }
}

/// One effect as the packets the client needs to draw it.
pub fn expand(msg: &ParticleEffectMessage) -> Result<Vec<SpawnParticle>, CodecError> {
    let effect = &msg.effect;
    let kind = effect.kind;
    let count = effect.count;
    if count <= 0 {
        return Ok(vec![]);
    }
    let position = msg.position.to_f32();
    let offset = effect.offset;
    let packet = |position, offset, data, count, extra: &[i32]| SpawnParticle {
        particle_id: kind.net_id(),
        long_distance: false,
        position,
        offset,
        data,
        count,
        extra: extra.to_vec(),
    };

    let mut extra = vec![];
    if kind.takes_item() {
        let id = match effect.options {
            ParticleOptions::Item { id, data } => match kind {
                ParticleKind::ItemCrack => id,
                _ => data << 12 | id,
            },
            _ => 0,
        };
        if id == 0 {
            return Ok(vec![]);
        }
        extra.push(id);
    }
    // no variance at all: let the client spread `count` particles itself
    let single = |extra: &[i32]| vec![packet(position, offset, 0.0, count, extra)];

    let (mut f0, mut f1, mut f2) = (0.0f32, 0.0f32, 0.0f32);
    match effect.options {
        ParticleOptions::Resizable { size } => {
            if kind.default_size().is_none() {
                return Err(CodecError::Invalid(format!("{kind:?} cannot be resized")));
            }
            // the client shows large explosions at 1 - size / 2
            let size = if kind == ParticleKind::LargeExplosion { -size * 2.0 + 2.0 } else { size };
            if size == 0.0 {
                return Ok(single(&extra));
            }
            f0 = size;
        }
        ParticleOptions::Colored(color) => {
            let default = kind
                .default_color()
                .ok_or_else(|| CodecError::Invalid(format!("{kind:?} cannot be colored")))?;
            if color == default {
                return Ok(single(&extra));
            }
            f0 = color.r as f32 / 255.0;
            f1 = color.g as f32 / 255.0;
            f2 = color.b as f32 / 255.0;
            // redstone treats a red of 0 as "use the default"
            if f0 == 0.0 && kind == ParticleKind::Redstone {
                f0 = 0.00001;
            }
        }
        ParticleOptions::Note(note) => {
            if !kind.takes_note() {
                return Err(CodecError::Invalid(format!("{kind:?} has no note")));
            }
            if note > MAX_NOTE {
                return Err(CodecError::InvalidValue { field: "note", value: note as i64 });
            }
            if note == 0 {
                return Ok(single(&extra));
            }
            f0 = note as f32 / MAX_NOTE as f32;
        }
        ParticleOptions::Motion(motion) => {
            if !kind.has_motion() {
                return Err(CodecError::Invalid(format!("{kind:?} has no motion")));
            }
            let mut motion = motion;
            // any vertical motion stops splashes moving at all
            if kind == ParticleKind::WaterSplash {
                motion.y = 0.0;
            }
            if motion == V3::ZERO {
                return Ok(single(&extra));
            }
            (f0, f1, f2) = (motion.x, motion.y, motion.z);
        }
        ParticleOptions::Item { .. } | ParticleOptions::None => {}
    }

    if f0 == 0.0 && f1 == 0.0 && f2 == 0.0 {
        return Ok(single(&extra));
    }
    let value = V3(f0, f1, f2);
    if offset == V3::ZERO {
        return Ok((0..count).map(|_| packet(position, value, 1.0, 0, &extra)).collect());
    }

    let mut rng = StdRng::seed_from_u64(seed(msg));
    Ok((0..count)
        .map(|_| {
            let jitter = V3(
                (rng.gen::<f32>() * 2.0 - 1.0) * offset.x,
                (rng.gen::<f32>() * 2.0 - 1.0) * offset.y,
                (rng.gen::<f32>() * 2.0 - 1.0) * offset.z,
            );
            packet(position + jitter, value, 1.0, 0, &extra)
        })
        .collect())
}

/// Same message, same jitter. Keeps the processor's output cacheable.
fn seed(msg: &ParticleEffectMessage) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    msg.effect.kind.hash(&mut hasher);
    msg.effect.count.hash(&mut hasher);
    for f in [msg.position.x, msg.position.y, msg.position.z] {
        f.to_bits().hash(&mut hasher);
    }
    for f in [msg.effect.offset.x, msg.effect.offset.y, msg.effect.offset.z] {
        f.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}
