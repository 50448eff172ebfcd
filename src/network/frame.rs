//! Length-prefixed framing, with the optional zlib layer enabled by `SetCompression`.
//!
//! Uncompressed: `[var len][payload]`.
//! Compressed:   `[var len][var data_len][data]`, where `data_len` is 0 when the payload
//! was too small to compress and `data` is then the raw payload.
use crate::prelude::*;
use super::wire::{self, var, var_len, ToWire};
use bytes::{BufMut, Bytes, BytesMut};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use std::io::{Read, Write};

#[derive(Debug, Clone)]
pub struct FrameCodec {
    threshold: Option<usize>,
    max_frame_length: usize,
}
impl FrameCodec {
    pub fn new(max_frame_length: usize) -> Self {
        Self { threshold: None, max_frame_length }
    }
    /// Negative thresholds turn compression back off.
    pub fn set_compression(&mut self, threshold: i32) {
        self.threshold = usize::try_from(threshold).ok();
    }
    pub fn compression(&self) -> Option<usize> {
        self.threshold
    }

    pub fn encode(&self, payload: &[u8]) -> Result<Bytes, CodecError> {
        let mut frame = BytesMut::with_capacity(payload.len() + 10);
        match self.threshold {
            None => {
                var(payload.len()).encode(&mut frame);
                frame.put_slice(payload);
            }
            // a data_len of 0 means raw, so empty payloads can't be deflated
            Some(threshold) if payload.len() < threshold || payload.is_empty() => {
                var(payload.len() + 1).encode(&mut frame);
                frame.put_u8(0);
                frame.put_slice(payload);
            }
            Some(_) => {
                let mut encoder = ZlibEncoder::new(Vec::with_capacity(payload.len() / 2), Compression::default());
                encoder.write_all(payload).map_err(|e| CodecError::Compression(e.to_string()))?;
                let data = encoder.finish().map_err(|e| CodecError::Compression(e.to_string()))?;
                let data_len = payload.len() as i32;
                var(var_len(data_len) + data.len()).encode(&mut frame);
                var(data_len).encode(&mut frame);
                frame.put_slice(&data);
            }
        }
        Ok(frame.freeze())
    }

    /// Splits the next complete frame off `buf`, returning its payload.
    ///
    /// `Ok(None)` means more bytes are needed; `buf` is left untouched.
    pub fn decode(&self, buf: &mut BytesMut) -> Result<Option<Bytes>, CodecError> {
        let (len, rem) = match wire::varint(buf) {
            Ok(v) => v,
            Err(e) if e.is_incomplete() => return Ok(None),
            Err(e) => return Err(e),
        };
        if len < 0 {
            return Err(CodecError::NegativeLength(len as i64));
        }
        let len = len as usize;
        if len > self.max_frame_length {
            return Err(CodecError::FrameTooLarge { length: len, max: self.max_frame_length });
        }
        if rem.len() < len {
            return Ok(None);
        }
        let header = buf.len() - rem.len();
        let _ = buf.split_to(header);
        let frame = buf.split_to(len).freeze();

        let threshold = match self.threshold {
            None => return Ok(Some(frame)),
            Some(threshold) => threshold,
        };
        let (data_len, data) = wire::varint(&frame)?;
        if data_len == 0 {
            return Ok(Some(frame.slice(frame.len() - data.len()..)));
        }
        if data_len < 0 {
            return Err(CodecError::NegativeLength(data_len as i64));
        }
        let data_len = data_len as usize;
        if data_len < threshold {
            return Err(CodecError::Compression(format!(
                "{data_len} byte payload is below the threshold of {threshold} but was compressed"
            )));
        }
        if data_len > self.max_frame_length {
            return Err(CodecError::FrameTooLarge { length: data_len, max: self.max_frame_length });
        }
        let mut inflated = Vec::with_capacity(data_len);
        ZlibDecoder::new(data)
            .take(data_len as u64 + 1)
            .read_to_end(&mut inflated)
            .map_err(|e| CodecError::Compression(e.to_string()))?;
        if inflated.len() != data_len {
            return Err(CodecError::Compression(format!(
                "declared {data_len} bytes, inflated to {}",
                inflated.len()
            )));
        }
        Ok(Some(Bytes::from(inflated)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_frame() {
        let codec = FrameCodec::new(1024);
        let frame = codec.encode(&[0x01, 0xAA]).unwrap();
        assert_eq!(&frame[..], [0x02, 0x01, 0xAA]);
        let mut buf = BytesMut::from(&frame[..]);
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], [0x01, 0xAA]);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_frame_waits() {
        let codec = FrameCodec::new(1024);
        let mut buf = BytesMut::from(&[0x03, 0x00, 0x01][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 3);
        buf.put_u8(0x02);
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], [0x00, 0x01, 0x02]);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let codec = FrameCodec::new(16);
        let mut buf = BytesMut::new();
        var(17).encode(&mut buf);
        assert!(matches!(codec.decode(&mut buf), Err(CodecError::FrameTooLarge { length: 17, max: 16 })));
    }

    #[test]
    fn small_payload_below_threshold() {
        let mut codec = FrameCodec::new(1024);
        codec.set_compression(64);
        let payload = [7u8; 10];
        let frame = codec.encode(&payload).unwrap();
        assert_eq!(frame[0], 11);
        assert_eq!(frame[1], 0);
        assert_eq!(&frame[2..], payload);
        let mut buf = BytesMut::from(&frame[..]);
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], payload);
    }

    #[test]
    fn large_payload_is_deflated() {
        let mut codec = FrameCodec::new(4096);
        codec.set_compression(64);
        let payload: Vec<u8> = (0..200u32).map(|i| (i % 7) as u8).collect();
        let frame = codec.encode(&payload).unwrap();
        let (packet_len, rem) = wire::varint(&frame).unwrap();
        assert_eq!(packet_len as usize, rem.len());
        let (data_len, _) = wire::varint(rem).unwrap();
        assert_eq!(data_len, 200);
        let mut buf = BytesMut::from(&frame[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), payload);
    }

    #[test]
    fn lying_data_length_is_rejected() {
        let mut codec = FrameCodec::new(4096);
        codec.set_compression(8);
        let payload = vec![1u8; 100];
        let frame = codec.encode(&payload).unwrap();
        // patch the declared inflated size from 100 to 99
        let mut bytes = frame.to_vec();
        assert_eq!(bytes[1], 100);
        bytes[1] = 99;
        let mut buf = BytesMut::from(&bytes[..]);
        assert!(matches!(codec.decode(&mut buf), Err(CodecError::Compression(_))));
    }

    #[test]
    fn negative_threshold_disables() {
        let mut codec = FrameCodec::new(1024);
        codec.set_compression(64);
        codec.set_compression(-1);
        assert_eq!(codec.compression(), None);
        assert_eq!(&codec.encode(&[5]).unwrap()[..], [1, 5]);
    }
}
