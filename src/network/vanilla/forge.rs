//! The Forge handshake rides on the `FML|HS` plugin channel.
use crate::prelude::*;
use crate::network::wire::{var, ToWire};
use crate::network::{CodecContext, Message, Processor};
use super::play::ChannelPayload;
use bytes::{BufMut, BytesMut};

pub const HANDSHAKE_CHANNEL: &str = "FML|HS";
const REGISTRY_DATA_DISCRIMINATOR: u8 = 3;

/// One game registry's id assignments, in the FML 1.10 `RegistryData` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: String,
    pub ids: Vec<(String, i32)>,
    pub substitutions: Vec<String>,
    pub dummied: Vec<String>,
}

/// Every registry the client has to agree on. Sent as one payload per registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryData {
    pub entries: Vec<RegistryEntry>,
}
crate::impl_message!(RegistryData);

#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryDataProcessor;
impl Processor for RegistryDataProcessor {
    type Message = RegistryData;
    const CACHING: bool = false;

    fn process(&self, _: &CodecContext, msg: &RegistryData, out: &mut Vec<Box<dyn Message>>) -> Result<(), CodecError> {
        if msg.entries.is_empty() {
            return Err(CodecError::Invalid("registry data needs at least one entry".into()));
        }
        let mut entries = msg.entries.iter().peekable();
        while let Some(entry) = entries.next() {
            let mut buf = BytesMut::new();
            buf.put_u8(REGISTRY_DATA_DISCRIMINATOR);
            // whether more registries follow this one
            (entries.peek().is_some(), &entry.name).encode(&mut buf);
            var(entry.ids.len()).encode(&mut buf);
            for (name, id) in &entry.ids {
                (name, var(*id)).encode(&mut buf);
            }
            for list in [&entry.substitutions, &entry.dummied] {
                var(list.len()).encode(&mut buf);
                for name in list {
                    name.encode(&mut buf);
                }
            }
            out.push(Box::new(ChannelPayload { channel: HANDSHAKE_CHANNEL.into(), data: buf.to_vec() }));
        }
        Ok(())
    }
}
