use crate::prelude::*;
use super::message::erased::{ErasedCodec, ErasedHandler, ErasedProcessor, HandlerBinding};
use super::message::{Codec, Handler, Message, Processor};
use super::ProtocolState;
use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Inbound,
    Outbound,
}

pub(super) struct Entry {
    pub opcode: i32,
    pub type_name: &'static str,
    pub codec: Box<dyn ErasedCodec>,
    pub handler: Option<Box<dyn ErasedHandler>>,
    pub caching: bool,
}
impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("opcode", &format_args!("0x{:02X}", self.opcode))
            .field("type", &self.type_name)
            .field("handled", &self.handler.is_some())
            .field("caching", &self.caching)
            .finish()
    }
}

/// The bindings for one state in one direction.
///
/// Built once, then only read. Opcodes and message types are both unique.
pub struct MessageRegistry {
    state: ProtocolState,
    direction: Direction,
    by_opcode: HashMap<i32, usize>,
    by_type: HashMap<TypeId, usize>,
    entries: Vec<Entry>,
    processors: HashMap<TypeId, (&'static str, Vec<Box<dyn ErasedProcessor>>)>,
}
impl MessageRegistry {
    pub fn new(state: ProtocolState, direction: Direction) -> Self {
        Self {
            state,
            direction,
            by_opcode: HashMap::new(),
            by_type: HashMap::new(),
            entries: vec![],
            processors: HashMap::new(),
        }
    }
    pub fn state(&self) -> ProtocolState {
        self.state
    }
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn bind<C: Codec>(&mut self, opcode: i32, codec: C) -> Result<&mut Self, RegistryError> {
        self.insert(opcode, codec, None)
    }
    pub fn bind_handler<C, H>(&mut self, opcode: i32, codec: C, handler: H) -> Result<&mut Self, RegistryError>
    where
        C: Codec,
        H: Handler<C::Message>,
    {
        let handler = HandlerBinding::<C::Message, H> { handler, _message: PhantomData };
        self.insert(opcode, codec, Some(Box::new(handler)))
    }
    fn insert<C: Codec>(
        &mut self,
        opcode: i32,
        codec: C,
        handler: Option<Box<dyn ErasedHandler>>,
    ) -> Result<&mut Self, RegistryError> {
        let type_name = std::any::type_name::<C::Message>();
        if let Some(&existing) = self.by_opcode.get(&opcode) {
            return Err(RegistryError::DuplicateOpcode {
                state: self.state,
                direction: self.direction,
                opcode,
                existing: self.entries[existing].type_name,
                message: type_name,
            });
        }
        let ty = TypeId::of::<C::Message>();
        if self.by_type.contains_key(&ty) {
            return Err(RegistryError::DuplicateType { state: self.state, direction: self.direction, message: type_name });
        }
        let idx = self.entries.len();
        self.entries.push(Entry { opcode, type_name, codec: Box::new(codec), handler, caching: C::CACHING });
        self.by_opcode.insert(opcode, idx);
        self.by_type.insert(ty, idx);
        Ok(self)
    }
    /// Processors for one message type run in the order they were bound.
    pub fn bind_processor<P: Processor>(&mut self, processor: P) -> &mut Self {
        self.processors
            .entry(TypeId::of::<P::Message>())
            .or_insert_with(|| (std::any::type_name::<P::Message>(), vec![]))
            .1
            .push(Box::new(processor));
        self
    }

    pub(super) fn by_opcode(&self, opcode: i32) -> Option<&Entry> {
        self.by_opcode.get(&opcode).map(|&i| &self.entries[i])
    }
    pub(super) fn by_type_id(&self, ty: TypeId) -> Option<&Entry> {
        self.by_type.get(&ty).map(|&i| &self.entries[i])
    }
    pub fn opcode_of<M: Message>(&self) -> Option<i32> {
        self.by_type_id(TypeId::of::<M>()).map(|e| e.opcode)
    }
    /// The message type bound to an opcode.
    pub fn type_at(&self, opcode: i32) -> Option<&'static str> {
        self.by_opcode(opcode).map(|e| e.type_name)
    }
    pub fn contains<M: Message>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<M>())
    }
    pub(super) fn processors_for(&self, ty: TypeId) -> &[Box<dyn ErasedProcessor>] {
        self.processors.get(&ty).map_or(&[], |(_, p)| p.as_slice())
    }
    pub fn has_processors(&self, ty: TypeId) -> bool {
        !self.processors_for(ty).is_empty()
    }
    pub fn is_caching(&self, ty: TypeId) -> bool {
        self.by_type_id(ty).map_or(false, |e| e.caching)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
impl std::fmt::Debug for MessageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRegistry")
            .field("state", &self.state)
            .field("direction", &self.direction)
            .field("entries", &self.entries)
            .field("processed", &self.processors.values().map(|(name, p)| (*name, p.len())).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{wire, CodecContext};
    use bytes::{BufMut, BytesMut};

    #[derive(Debug, PartialEq)]
    struct Ping(i64);
    #[derive(Debug, PartialEq)]
    struct Pong(i64);
    crate::impl_message!(Ping, Pong);

    struct PingCodec;
    impl Codec for PingCodec {
        type Message = Ping;
        fn encode(&self, _: &CodecContext, msg: &Ping, buf: &mut BytesMut) -> Result<(), CodecError> {
            buf.put_i64(msg.0);
            Ok(())
        }
        fn decode(&self, _: &CodecContext, buf: &[u8]) -> Result<Ping, CodecError> {
            Ok(Ping(wire::i64(buf)?.0))
        }
    }
    struct PongCodec;
    impl Codec for PongCodec {
        type Message = Pong;
        const CACHING: bool = true;
        fn encode(&self, _: &CodecContext, msg: &Pong, buf: &mut BytesMut) -> Result<(), CodecError> {
            buf.put_i64(msg.0);
            Ok(())
        }
    }

    #[test]
    fn duplicate_opcode_fails() {
        let mut registry = MessageRegistry::new(ProtocolState::Status, Direction::Inbound);
        registry.bind(0x01, PingCodec).unwrap();
        let err = registry.bind(0x01, PongCodec).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateOpcode { opcode: 0x01, .. }));
    }

    #[test]
    fn duplicate_type_fails() {
        let mut registry = MessageRegistry::new(ProtocolState::Status, Direction::Outbound);
        registry.bind(0x01, PingCodec).unwrap();
        let err = registry.bind(0x02, PingCodec).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateType { .. }));
    }

    #[test]
    fn lookups_are_inverse() {
        let mut registry = MessageRegistry::new(ProtocolState::Play, Direction::Outbound);
        registry.bind(0x05, PingCodec).unwrap().bind(0x09, PongCodec).unwrap();
        assert_eq!(registry.opcode_of::<Ping>(), Some(0x05));
        assert_eq!(registry.opcode_of::<Pong>(), Some(0x09));
        assert_eq!(registry.type_at(0x05), Some(std::any::type_name::<Ping>()));
        assert_eq!(registry.type_at(0x09), Some(std::any::type_name::<Pong>()));
        assert!(registry.is_caching(TypeId::of::<Pong>()));
        assert!(!registry.is_caching(TypeId::of::<Ping>()));
        assert_eq!(registry.type_at(0x06), None);
    }

    #[test]
    fn erased_codec_round_trip() {
        let mut registry = MessageRegistry::new(ProtocolState::Status, Direction::Inbound);
        registry.bind(0x01, PingCodec).unwrap();
        let entry = registry.by_opcode(0x01).unwrap();
        let ctx = CodecContext::default();
        let mut buf = BytesMut::new();
        entry.codec.encode(&ctx, &Ping(42), &mut buf).unwrap();
        let decoded = entry.codec.decode(&ctx, &buf).unwrap();
        assert_eq!(decoded.as_any().downcast_ref::<Ping>(), Some(&Ping(42)));
    }

    #[test]
    fn decode_only_if_supported() {
        let mut registry = MessageRegistry::new(ProtocolState::Status, Direction::Outbound);
        registry.bind(0x01, PongCodec).unwrap();
        let entry = registry.by_opcode(0x01).unwrap();
        let err = entry.codec.decode(&CodecContext::default(), &[0; 8]).unwrap_err();
        assert!(matches!(err, CodecError::DecodeUnsupported(_)));
    }

    #[test]
    fn wrong_message_is_rejected_by_codec() {
        let mut registry = MessageRegistry::new(ProtocolState::Status, Direction::Outbound);
        registry.bind(0x01, PongCodec).unwrap();
        let entry = registry.by_opcode(0x01).unwrap();
        let mut buf = BytesMut::new();
        assert!(entry.codec.encode(&CodecContext::default(), &Ping(1), &mut buf).is_err());
    }
}
