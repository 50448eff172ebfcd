use crate::prelude::*;
use super::message::{CodecContext, Message};
use super::registry::{Direction, MessageRegistry};
use super::wire::{var, ToWire};
use bytes::{Bytes, BytesMut};
use std::any::Any;
use std::sync::Arc;

/// The sub-protocol a connection is speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolState {
    Handshake,
    Status,
    Login,
    Play,
}
impl ProtocolState {
    pub const ALL: [ProtocolState; 4] = [Self::Handshake, Self::Status, Self::Login, Self::Play];

    /// The `next state` field of a handshake.
    pub fn from_handshake(next: i32) -> Option<Self> {
        match next {
            1 => Some(Self::Status),
            2 => Some(Self::Login),
            _ => None,
        }
    }
    pub fn can_transition_to(self, next: ProtocolState) -> bool {
        use ProtocolState::*;
        matches!((self, next), (Handshake, Status) | (Handshake, Login) | (Login, Play) | (Play, Play))
    }
    fn idx(self) -> usize {
        self as usize
    }
}

#[derive(Debug)]
pub struct Protocol {
    pub inbound: MessageRegistry,
    pub outbound: MessageRegistry,
}
impl Protocol {
    pub fn new(state: ProtocolState) -> Self {
        Self {
            inbound: MessageRegistry::new(state, Direction::Inbound),
            outbound: MessageRegistry::new(state, Direction::Outbound),
        }
    }
    pub fn state(&self) -> ProtocolState {
        self.inbound.state()
    }

    /// Opcode and body of one registered outbound message.
    pub fn encode_payload(&self, ctx: &CodecContext, msg: &dyn Message) -> Result<Bytes, CodecError> {
        let entry = self
            .outbound
            .by_type_id(msg.as_any().type_id())
            .ok_or(CodecError::Unregistered { message: msg.type_name(), state: self.state() })?;
        let mut buf = BytesMut::new();
        var(entry.opcode).encode(&mut buf);
        entry.codec.encode(ctx, msg, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Runs the processors bound to the message's type, if any, and encodes the result.
    ///
    /// A failing processor drops this message only. It is logged, not returned.
    pub fn encode_outbound(&self, ctx: &CodecContext, msg: &dyn Message) -> Result<Vec<Bytes>, CodecError> {
        let processors = self.outbound.processors_for(msg.as_any().type_id());
        if processors.is_empty() {
            return Ok(vec![self.encode_payload(ctx, msg)?]);
        }
        let mut produced = vec![];
        for processor in processors {
            if let Err(e) = processor.process(ctx, msg, &mut produced) {
                log::warn!("dropping {}: processor failed: {e}", msg.type_name());
                return Ok(vec![]);
            }
        }
        produced.iter().map(|out| self.encode_payload(ctx, &**out)).collect()
    }

    /// Whether the message encodes the same way for every connection.
    fn is_cacheable(&self, msg: &dyn Message) -> bool {
        let ty = msg.as_any().type_id();
        let processors = self.outbound.processors_for(ty);
        if processors.is_empty() {
            self.outbound.is_caching(ty)
        } else {
            processors.iter().all(|p| p.caching())
        }
    }
}

/// An outbound message encoded once for many recipients.
#[derive(Debug, Clone)]
pub struct CachedMessage {
    pub state: ProtocolState,
    pub payloads: Arc<[Bytes]>,
}

#[derive(Debug, Clone)]
pub enum Broadcast {
    Cached(CachedMessage),
    PerConnection(ProtocolState, Arc<dyn Message>),
}

/// Every state's protocol. Built once at startup, read-only after.
#[derive(Debug)]
pub struct Protocols {
    states: [Protocol; 4],
}
impl Protocols {
    pub fn new() -> Self {
        Self { states: ProtocolState::ALL.map(Protocol::new) }
    }
    pub fn get(&self, state: ProtocolState) -> &Protocol {
        &self.states[state.idx()]
    }
    pub fn get_mut(&mut self, state: ProtocolState) -> &mut Protocol {
        &mut self.states[state.idx()]
    }

    pub fn prepare_broadcast(&self, state: ProtocolState, msg: Box<dyn Message>) -> Result<Broadcast, CodecError> {
        let protocol = self.get(state);
        if !protocol.is_cacheable(&*msg) {
            return Ok(Broadcast::PerConnection(state, Arc::from(msg)));
        }
        let ctx = CodecContext::default();
        let ty = msg.as_any().type_id();
        if protocol.outbound.has_processors(ty) {
            let mut produced = vec![];
            for processor in protocol.outbound.processors_for(ty) {
                processor.process(&ctx, &*msg, &mut produced)?;
            }
            if !produced.iter().all(|out| protocol.outbound.is_caching(Any::type_id(out.as_any()))) {
                return Ok(Broadcast::PerConnection(state, Arc::from(msg)));
            }
            let payloads = produced
                .iter()
                .map(|out| protocol.encode_payload(&ctx, &**out))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Broadcast::Cached(CachedMessage { state, payloads: payloads.into() }));
        }
        let payload = protocol.encode_payload(&ctx, &*msg)?;
        Ok(Broadcast::Cached(CachedMessage { state, payloads: Arc::from(vec![payload]) }))
    }
}
impl Default for Protocols {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Codec, Processor};
    use bytes::BufMut;

    #[derive(Debug)]
    struct Shout(String);
    #[derive(Debug)]
    struct Whisper(String);
    #[derive(Debug)]
    struct Burst(u8);
    #[derive(Debug)]
    struct Spark(u8);
    crate::impl_message!(Shout, Whisper, Burst, Spark);

    struct ShoutCodec;
    impl Codec for ShoutCodec {
        type Message = Shout;
        const CACHING: bool = true;
        fn encode(&self, _: &CodecContext, msg: &Shout, buf: &mut BytesMut) -> Result<(), CodecError> {
            msg.0.encode(buf);
            Ok(())
        }
    }
    struct WhisperCodec;
    impl Codec for WhisperCodec {
        type Message = Whisper;
        fn encode(&self, _: &CodecContext, msg: &Whisper, buf: &mut BytesMut) -> Result<(), CodecError> {
            msg.0.encode(buf);
            Ok(())
        }
    }
    struct SparkCodec;
    impl Codec for SparkCodec {
        type Message = Spark;
        const CACHING: bool = true;
        fn encode(&self, _: &CodecContext, msg: &Spark, buf: &mut BytesMut) -> Result<(), CodecError> {
            buf.put_u8(msg.0);
            Ok(())
        }
    }
    struct Split;
    impl Processor for Split {
        type Message = Burst;
        const CACHING: bool = true;
        fn process(&self, _: &CodecContext, msg: &Burst, out: &mut Vec<Box<dyn Message>>) -> Result<(), CodecError> {
            if msg.0 == 0 {
                return Err(CodecError::Invalid("empty burst".into()));
            }
            out.extend((0..msg.0).map(|i| Box::new(Spark(i)) as Box<dyn Message>));
            Ok(())
        }
    }

    fn protocols() -> Protocols {
        let mut protocols = Protocols::new();
        let play = &mut protocols.get_mut(ProtocolState::Play).outbound;
        play.bind(0x0F, ShoutCodec).unwrap().bind(0x10, WhisperCodec).unwrap().bind(0x22, SparkCodec).unwrap();
        play.bind_processor(Split);
        protocols
    }

    #[test]
    fn transitions() {
        use ProtocolState::*;
        assert_eq!(ProtocolState::from_handshake(1), Some(Status));
        assert_eq!(ProtocolState::from_handshake(2), Some(Login));
        assert_eq!(ProtocolState::from_handshake(3), None);
        assert!(Handshake.can_transition_to(Login));
        assert!(Login.can_transition_to(Play));
        assert!(!Status.can_transition_to(Play));
        assert!(!Play.can_transition_to(Login));
    }

    #[test]
    fn payload_starts_with_opcode() {
        let protocols = protocols();
        let payload = protocols.get(ProtocolState::Play).encode_payload(&CodecContext::default(), &Shout("hi".into())).unwrap();
        assert_eq!(&payload[..], [0x0F, 2, b'h', b'i']);
    }

    #[test]
    fn unregistered_message() {
        let protocols = protocols();
        let err = protocols.get(ProtocolState::Status).encode_payload(&CodecContext::default(), &Shout("hi".into())).unwrap_err();
        assert!(matches!(err, CodecError::Unregistered { state: ProtocolState::Status, .. }));
    }

    #[test]
    fn processor_fans_out() {
        let protocols = protocols();
        let payloads = protocols.get(ProtocolState::Play).encode_outbound(&CodecContext::default(), &Burst(3)).unwrap();
        assert_eq!(payloads.len(), 3);
        assert_eq!(&payloads[2][..], [0x22, 2]);
    }

    #[test]
    fn failing_processor_drops_only_that_message() {
        let protocols = protocols();
        let play = protocols.get(ProtocolState::Play);
        assert!(play.encode_outbound(&CodecContext::default(), &Burst(0)).unwrap().is_empty());
        assert_eq!(play.encode_outbound(&CodecContext::default(), &Burst(1)).unwrap().len(), 1);
    }

    #[test]
    fn caching_messages_are_encoded_once() {
        let protocols = protocols();
        match protocols.prepare_broadcast(ProtocolState::Play, Box::new(Shout("all".into()))).unwrap() {
            Broadcast::Cached(cached) => {
                assert_eq!(cached.payloads.len(), 1);
                assert_eq!(cached.payloads[0][0], 0x0F);
            }
            other => panic!("expected a cached broadcast, got {other:?}"),
        }
        match protocols.prepare_broadcast(ProtocolState::Play, Box::new(Burst(2))).unwrap() {
            Broadcast::Cached(cached) => assert_eq!(cached.payloads.len(), 2),
            other => panic!("expected a cached broadcast, got {other:?}"),
        }
        assert!(matches!(
            protocols.prepare_broadcast(ProtocolState::Play, Box::new(Whisper("me".into()))).unwrap(),
            Broadcast::PerConnection(ProtocolState::Play, _)
        ));
    }
}
