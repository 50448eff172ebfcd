use crate::prelude::*;
use bytes::{BufMut, BytesMut};

pub const MAX_STRING_LEN: usize = 32767;
const VARINT_MAX_BYTES: usize = 5;
const VARLONG_MAX_BYTES: usize = 10;
const CONTINUE_BIT: u8 = 0b1000_0000;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct var<T>(pub T);

pub trait Wire<'a>: Sized {
    fn decode(pkt: &'a [u8]) -> Result<(Self, &'a [u8]), CodecError>;
}
pub trait ToWire {
    fn encode(&self, buf: &mut BytesMut);
}

/// Decodes a value and discards whatever follows it.
pub fn decode<'a, T: Wire<'a>>(pkt: &'a [u8]) -> Result<T, CodecError> {
    Ok(T::decode(pkt)?.0)
}

macro_rules! impl_wire {
    {} => {};
    {$t:ident $($rt:ident)*} => {
        impl<'a, $t: Wire<'a>, $($rt: Wire<'a>),*> Wire<'a> for ($t,$($rt,)*) {
            #[allow(non_snake_case)]
            fn decode(pkt: &'a [u8]) -> Result<(Self, &'a [u8]), CodecError> {
                let ($t, pkt) = $t::decode(pkt)?;
                $(let ($rt, pkt) = $rt::decode(pkt)?;)*
                Ok((($t, $($rt,)*), pkt))
            }
        }
        #[allow(non_snake_case)]
        impl<$t: ToWire, $($rt: ToWire),*> ToWire for ($t,$($rt,)*) {
            fn encode(&self, buf: &mut BytesMut) {
                let ($t, $($rt,)*) = self;
                $t.encode(buf);
                $($rt.encode(buf);)*
            }
        }
        impl_wire!($($rt)*);
    }
}
impl_wire!(A B C D E F G H);

fn take(buf: &[u8], n: usize) -> Result<(&[u8], &[u8]), CodecError> {
    if buf.len() < n {
        return Err(CodecError::Truncated { needed: n, available: buf.len() });
    }
    Ok(buf.split_at(n))
}

macro_rules! be {
    { $($i:ident)* } => {
        $(
            pub fn $i(buf: &[u8]) -> Result<($i, &[u8]), CodecError> {
                let (n, rem) = take(buf, core::mem::size_of::<$i>())?;
                let mut bytes = [0; core::mem::size_of::<$i>()];
                bytes.copy_from_slice(n);
                Ok(($i::from_be_bytes(bytes), rem))
            }
            impl Wire<'_> for $i {
                fn decode(pkt: &[u8]) -> Result<(Self, &[u8]), CodecError> {
                    $i(pkt)
                }
            }
            impl ToWire for $i {
                fn encode(&self, buf: &mut BytesMut) {
                    buf.put_slice(&self.to_be_bytes());
                }
            }
        )*
    }
}
be! { u8 i8 u16 i16 i32 i64 u64 f32 f64 }

pub fn bool(buf: &[u8]) -> Result<(bool, &[u8]), CodecError> {
    match u8(buf)? {
        (0, rem) => Ok((false, rem)),
        (1, rem) => Ok((true, rem)),
        (b, _) => Err(CodecError::InvalidValue { field: "bool", value: b as i64 }),
    }
}
impl Wire<'_> for bool {
    fn decode(pkt: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        bool(pkt)
    }
}
impl ToWire for bool {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(*self as u8);
    }
}
impl ToWire for () {
    fn encode(&self, _: &mut BytesMut) {}
}

pub fn varint(buf: &[u8]) -> Result<(i32, &[u8]), CodecError> {
    let (n, rem) = varnum(buf, VARINT_MAX_BYTES)?;
    Ok((n as u32 as i32, rem))
}
pub fn varlong(buf: &[u8]) -> Result<(i64, &[u8]), CodecError> {
    let (n, rem) = varnum(buf, VARLONG_MAX_BYTES)?;
    Ok((n as i64, rem))
}
fn varnum(buf: &[u8], max: usize) -> Result<(u64, &[u8]), CodecError> {
    let mut n = 0u64;
    for i in 0..max {
        let b = *buf.get(i).ok_or(CodecError::Truncated { needed: i + 1, available: buf.len() })?;
        n |= ((b & !CONTINUE_BIT) as u64) << (7 * i);
        if b & CONTINUE_BIT == 0 {
            return Ok((n, &buf[i + 1..]));
        }
    }
    Err(CodecError::VarNumTooLong { max })
}
fn put_varnum(buf: &mut BytesMut, mut n: u64) {
    while n & !((!CONTINUE_BIT) as u64) != 0 {
        buf.put_u8(n as u8 & !CONTINUE_BIT | CONTINUE_BIT);
        n >>= 7;
    }
    buf.put_u8(n as u8);
}
/// Encoded size of a varint, without encoding it.
pub fn var_len(n: i32) -> usize {
    let mut n = n as u32;
    let mut i = 1;
    while n & !((!CONTINUE_BIT) as u32) != 0 {
        i += 1;
        n >>= 7;
    }
    i
}
impl Wire<'_> for var<i32> {
    fn decode(pkt: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        varint(pkt).map(|(n, rem)| (Self(n), rem))
    }
}
impl Wire<'_> for var<i64> {
    fn decode(pkt: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        varlong(pkt).map(|(n, rem)| (Self(n), rem))
    }
}
impl ToWire for var<i32> {
    fn encode(&self, buf: &mut BytesMut) {
        put_varnum(buf, self.0 as u32 as u64);
    }
}
impl ToWire for var<i64> {
    fn encode(&self, buf: &mut BytesMut) {
        put_varnum(buf, self.0 as u64);
    }
}
impl ToWire for var<usize> {
    fn encode(&self, buf: &mut BytesMut) {
        var(self.0 as i32).encode(buf);
    }
}

/// Length-prefixed byte string, refusing anything longer than `max`.
pub fn bytes_limited(buf: &[u8], max: usize) -> Result<(&[u8], &[u8]), CodecError> {
    let (l, rem) = varint(buf)?;
    if l < 0 {
        return Err(CodecError::NegativeLength(l as i64));
    }
    let l = l as usize;
    if l > max {
        return Err(CodecError::TooLong { length: l, max });
    }
    take(rem, l)
}
pub fn str_limited(buf: &[u8], max: usize) -> Result<(&str, &[u8]), CodecError> {
    let (s, rem) = bytes_limited(buf, max)?;
    Ok((core::str::from_utf8(s)?, rem))
}
pub fn str(buf: &[u8]) -> Result<(&str, &[u8]), CodecError> {
    str_limited(buf, MAX_STRING_LEN)
}
impl<'a> Wire<'a> for &'a str {
    fn decode(pkt: &'a [u8]) -> Result<(Self, &'a [u8]), CodecError> {
        str(pkt)
    }
}
impl Wire<'_> for String {
    fn decode(pkt: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        str(pkt).map(|(s, rem)| (s.to_owned(), rem))
    }
}
impl ToWire for str {
    fn encode(&self, buf: &mut BytesMut) {
        var(self.len()).encode(buf);
        buf.put_slice(self.as_bytes());
    }
}
impl ToWire for String {
    fn encode(&self, buf: &mut BytesMut) {
        self.as_str().encode(buf)
    }
}
impl<T: ToWire + ?Sized> ToWire for &'_ T {
    fn encode(&self, buf: &mut BytesMut) {
        (**self).encode(buf)
    }
}
impl<T: ToWire> ToWire for Option<T> {
    fn encode(&self, buf: &mut BytesMut) {
        match self {
            None => false.encode(buf),
            Some(v) => (true, v).encode(buf),
        }
    }
}
impl<'a, T: Wire<'a>> Wire<'a> for Option<T> {
    fn decode(pkt: &'a [u8]) -> Result<(Self, &'a [u8]), CodecError> {
        let (present, pkt) = bool(pkt)?;
        if present {
            let (value, pkt) = T::decode(pkt)?;
            Ok((Some(value), pkt))
        } else {
            Ok((None, pkt))
        }
    }
}

impl<'a, T: Wire<'a>> Wire<'a> for V3<T> {
    fn decode(pkt: &'a [u8]) -> Result<(Self, &'a [u8]), CodecError> {
        let ((x, y, z), pkt) = Wire::decode(pkt)?;
        Ok((V3(x, y, z), pkt))
    }
}
impl<T: ToWire> ToWire for V3<T> {
    fn encode(&self, buf: &mut BytesMut) {
        (&self.x, &self.y, &self.z).encode(buf)
    }
}

impl Wire<'_> for Uuid {
    fn decode(pkt: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        let (n, rem) = take(pkt, 16)?;
        let mut bytes = [0; 16];
        bytes.copy_from_slice(n);
        Ok((Uuid::from_bytes(bytes), rem))
    }
}
impl ToWire for Uuid {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(self.as_bytes());
    }
}

/// A block position packed into one long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(pub V3<i32>);
impl Wire<'_> for Position {
    fn decode(pkt: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        pos(pkt).map(|(pos, rem)| (Self(pos), rem))
    }
}
impl ToWire for Position {
    fn encode(&self, buf: &mut BytesMut) {
        let V3 { x, y, z } = self.0;
        let packed = (x as i64 & 0x3FFFFFF) << 38 | (y as i64 & 0xFFF) << 26 | (z as i64 & 0x3FFFFFF);
        packed.encode(buf)
    }
}
pub fn pos(buf: &[u8]) -> Result<(V3<i32>, &[u8]), CodecError> {
    let (position, rem) = u64(buf)?;
    let mut x = (position >> 38) as i32;
    let mut y = ((position >> 26) & 0xFFF) as i32;
    let mut z = (position & 0x3FFFFFF) as i32;
    if x >= 1 << 25 { x -= 1 << 26 }
    if y >= 1 << 11 { y -= 1 << 12 }
    if z >= 1 << 25 { z -= 1 << 26 }
    Ok((V3(x, y, z), rem))
}

/// An inventory slot: `None` for empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot(pub Option<ItemStack>);
impl Wire<'_> for Slot {
    fn decode(pkt: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        let (id, pkt) = i16(pkt)?;
        if id < 0 {
            return Ok((Slot(None), pkt));
        }
        let ((count, damage), pkt) = <(i8, i16)>::decode(pkt)?;
        let (nbt, pkt) = nbt(pkt)?;
        Ok((Slot(Some(ItemStack { id, count, damage, nbt })), pkt))
    }
}
impl ToWire for Slot {
    fn encode(&self, buf: &mut BytesMut) {
        match &self.0 {
            None => (-1i16).encode(buf),
            Some(item) => {
                (item.id, item.count, item.damage).encode(buf);
                match item.nbt.as_ref().map(fastnbt::to_bytes) {
                    Some(Ok(bytes)) => buf.put_slice(&bytes),
                    Some(Err(e)) => {
                        log::warn!("dropping unserializable item nbt: {e}");
                        buf.put_u8(0);
                    }
                    None => buf.put_u8(0),
                }
            }
        }
    }
}

const NBT_MAX_DEPTH: usize = 512;
/// An optional root compound. A lone `TAG_End` means no tag.
pub fn nbt(buf: &[u8]) -> Result<(Option<fastnbt::Value>, &[u8]), CodecError> {
    match buf.first() {
        None => Err(CodecError::Truncated { needed: 1, available: 0 }),
        Some(0) => Ok((None, &buf[1..])),
        Some(10) => {
            let (_, after_name) = nbt_name(&buf[1..])?;
            let rem = skip_nbt_payload(10, after_name, 0)?;
            let len = buf.len() - rem.len();
            let value = fastnbt::from_bytes(&buf[..len])?;
            Ok((Some(value), rem))
        }
        Some(&tag) => Err(CodecError::InvalidValue { field: "root nbt tag", value: tag as i64 }),
    }
}
fn nbt_name(buf: &[u8]) -> Result<(&[u8], &[u8]), CodecError> {
    let (len, rem) = u16(buf)?;
    take(rem, len as usize)
}
fn skip_nbt_payload(tag: u8, buf: &[u8], depth: usize) -> Result<&[u8], CodecError> {
    if depth > NBT_MAX_DEPTH {
        return Err(CodecError::Invalid("nbt nested too deeply".into()));
    }
    Ok(match tag {
        1 => take(buf, 1)?.1,
        2 => take(buf, 2)?.1,
        3 | 5 => take(buf, 4)?.1,
        4 | 6 => take(buf, 8)?.1,
        7 => nbt_array(buf, 1)?,
        8 => nbt_name(buf)?.1,
        9 => {
            let ((inner, n), mut rem) = <(u8, i32)>::decode(buf)?;
            for _ in 0..n.max(0) {
                rem = skip_nbt_payload(inner, rem, depth + 1)?;
            }
            rem
        }
        10 => {
            let mut rem = buf;
            loop {
                let (inner, after) = u8(rem)?;
                if inner == 0 {
                    break after;
                }
                let (_, after) = nbt_name(after)?;
                rem = skip_nbt_payload(inner, after, depth + 1)?;
            }
        }
        11 => nbt_array(buf, 4)?,
        12 => nbt_array(buf, 8)?,
        _ => return Err(CodecError::InvalidValue { field: "nbt tag", value: tag as i64 }),
    })
}
fn nbt_array(buf: &[u8], width: usize) -> Result<&[u8], CodecError> {
    let (n, rem) = i32(buf)?;
    if n < 0 {
        return Err(CodecError::NegativeLength(n as i64));
    }
    Ok(take(rem, n as usize * width)?.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<T: ToWire + ?Sized>(value: &T) -> Vec<u8> {
        let mut buf = BytesMut::new();
        value.encode(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn varint_known_encodings() {
        assert_eq!(encoded(&var(0)), [0x00]);
        assert_eq!(encoded(&var(1)), [0x01]);
        assert_eq!(encoded(&var(127)), [0x7F]);
        assert_eq!(encoded(&var(128)), [0x80, 0x01]);
        assert_eq!(encoded(&var(25565)), [0xDD, 0xC7, 0x01]);
        assert_eq!(encoded(&var(i32::MAX)), [0xFF, 0xFF, 0xFF, 0xFF, 0x07]);
        assert_eq!(encoded(&var(-1)), [0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(encoded(&var(-1i64)).len(), 10);
    }

    #[test]
    fn var_len_matches_encoding() {
        for n in [0, 1, 127, 128, 16383, 16384, 2097151, 2097152, i32::MAX, -1, i32::MIN] {
            assert_eq!(var_len(n), encoded(&var(n)).len(), "{n}");
        }
    }

    #[test]
    fn varint_rejects_sixth_byte() {
        let err = varint(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]).unwrap_err();
        assert!(matches!(err, CodecError::VarNumTooLong { max: 5 }));
    }

    #[test]
    fn varlong_rejects_eleventh_byte() {
        let mut bytes = vec![0xFF; 10];
        bytes.push(0x01);
        let err = varlong(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::VarNumTooLong { max: 10 }));
    }

    #[test]
    fn varint_incomplete_is_truncated() {
        assert!(varint(&[0x80, 0x80]).unwrap_err().is_incomplete());
        assert!(varint(&[]).unwrap_err().is_incomplete());
    }

    #[test]
    fn string_declared_length_overrun() {
        let err = str(&[0x05, b'a', b'b']).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { needed: 5, available: 2 }));
    }

    #[test]
    fn string_negative_length() {
        let err = str(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]).unwrap_err();
        assert!(matches!(err, CodecError::NegativeLength(-1)));
    }

    #[test]
    fn string_limit_is_checked_before_reading() {
        let mut buf = BytesMut::new();
        "a much too long name".encode(&mut buf);
        let err = str_limited(&buf, 16).unwrap_err();
        assert!(matches!(err, CodecError::TooLong { length: 20, max: 16 }));
    }

    #[test]
    fn string_leaves_remainder() {
        let mut buf = BytesMut::new();
        ("héllo", 7u8).encode(&mut buf);
        let (s, rem) = str(&buf).unwrap();
        assert_eq!(s, "héllo");
        assert_eq!(rem, [7]);
    }

    #[test]
    fn bool_rejects_other_bytes() {
        assert!(bool(&[2]).is_err());
        assert_eq!(bool(&[1]).unwrap().0, true);
    }

    #[test]
    fn position_packing() {
        for p in [V3(0, 0, 0), V3(-1, 255, -1), V3(33554431, -2048, -33554432), V3(12, 64, -300)] {
            let bytes = encoded(&Position(p));
            assert_eq!(decode::<Position>(&bytes).unwrap().0, p);
        }
        assert_eq!(encoded(&Position(V3(1, 0, 0))), (1u64 << 38).to_be_bytes());
        assert_eq!(encoded(&Position(V3(0, 1, 0))), (1u64 << 26).to_be_bytes());
    }

    #[test]
    fn empty_slot() {
        assert_eq!(encoded(&Slot(None)), [0xFF, 0xFF]);
        assert_eq!(decode::<Slot>(&[0xFF, 0xFF]).unwrap(), Slot(None));
    }

    #[test]
    fn slot_without_nbt() {
        let item = ItemStack { id: 1, count: 12, damage: 3, nbt: None };
        let bytes = encoded(&Slot(Some(item.clone())));
        assert_eq!(bytes, [0x00, 0x01, 12, 0x00, 0x03, 0x00]);
        assert_eq!(decode::<Slot>(&bytes).unwrap(), Slot(Some(item)));
    }

    #[test]
    fn nbt_skipper_measures_compound() {
        // {"": {"a": byte 1, "l": list of 2 shorts}} followed by a trailing byte
        let bytes = [
            10, 0, 0,
            1, 0, 1, b'a', 1,
            9, 0, 1, b'l', 2, 0, 0, 0, 2, 0, 5, 0, 6,
            0,
            0xAB,
        ];
        let rem = skip_nbt_payload(10, &bytes[3..], 0).unwrap();
        assert_eq!(rem, [0xAB]);
    }

    #[test]
    fn nbt_skipper_rejects_truncation() {
        let bytes = [10, 0, 0, 8, 0, 1, b's', 0, 9, b'x'];
        assert!(skip_nbt_payload(10, &bytes[3..], 0).is_err());
    }
}
