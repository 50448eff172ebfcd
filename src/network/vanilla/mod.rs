//! The 1.10 protocol: which messages exist in which state, and how they look on the wire.
use crate::prelude::*;
use super::{Codec, CodecContext, Protocols, ProtocolState};
use super::wire::ToWire;
use bytes::BytesMut;

pub mod handshake;
pub mod status;
pub mod login;
pub mod play;
pub mod particle;
pub mod forge;

/// Encode-only codecs whose body is a single `ToWire` expression.
macro_rules! outbound {
    {$($codec:ident($msg:ident $m:ident, caching = $caching:literal): $e:expr;)*} => {
        $(
            #[derive(Debug, Default, Clone, Copy)]
            pub struct $codec;
            impl $crate::network::Codec for $codec {
                type Message = $msg;
                const CACHING: bool = $caching;
                #[allow(unused_parens)]
                fn encode(
                    &self,
                    _: &$crate::network::CodecContext,
                    $m: &$msg,
                    buf: &mut ::bytes::BytesMut,
                ) -> Result<(), $crate::error::CodecError> {
                    $crate::network::wire::ToWire::encode(&$e, buf);
                    Ok(())
                }
            }
        )*
    };
}
pub(crate) use outbound;

/// Codecs for messages that are both read and written in the same shape.
macro_rules! symmetric {
    {$($codec:ident($msg:ident $m:ident): $e:expr, |$buf:ident| $d:expr;)*} => {
        $(
            #[derive(Debug, Default, Clone, Copy)]
            pub struct $codec;
            impl $crate::network::Codec for $codec {
                type Message = $msg;
                #[allow(unused_parens)]
                fn encode(
                    &self,
                    _: &$crate::network::CodecContext,
                    $m: &$msg,
                    buf: &mut ::bytes::BytesMut,
                ) -> Result<(), $crate::error::CodecError> {
                    $crate::network::wire::ToWire::encode(&$e, buf);
                    Ok(())
                }
                fn decode(&self, _: &$crate::network::CodecContext, $buf: &[u8]) -> Result<$msg, $crate::error::CodecError> {
                    $d
                }
            }
        )*
    };
}
pub(crate) use symmetric;

/// Decode-only codecs.
macro_rules! inbound {
    {$($codec:ident($msg:ident) |$buf:ident| $d:expr;)*} => {
        $(
            #[derive(Debug, Default, Clone, Copy)]
            pub struct $codec;
            impl $crate::network::Codec for $codec {
                type Message = $msg;
                fn encode(
                    &self,
                    _: &$crate::network::CodecContext,
                    _: &$msg,
                    _: &mut ::bytes::BytesMut,
                ) -> Result<(), $crate::error::CodecError> {
                    Err($crate::error::CodecError::Invalid(format!("{} is never sent", stringify!($msg))))
                }
                fn decode(&self, _: &$crate::network::CodecContext, $buf: &[u8]) -> Result<$msg, $crate::error::CodecError> {
                    $d
                }
            }
        )*
    };
}
pub(crate) use inbound;

/// A JSON chat component.
pub fn text_component(text: &str) -> String {
    serde_json::json!({ "text": text }).to_string()
}

/// Closes the connection with a reason. Exists in Login and Play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    pub reason: String,
}
impl Disconnect {
    pub fn text(reason: &str) -> Self {
        Self { reason: text_component(reason) }
    }
}
crate::impl_message!(Disconnect);

#[derive(Debug, Default, Clone, Copy)]
pub struct DisconnectCodec;
impl Codec for DisconnectCodec {
    type Message = Disconnect;
    fn encode(&self, _: &CodecContext, msg: &Disconnect, buf: &mut BytesMut) -> Result<(), CodecError> {
        msg.reason.encode(buf);
        Ok(())
    }
}

/// Builds every state's registries. Fails on wiring mistakes, which should abort startup.
pub fn protocols() -> Result<Protocols, RegistryError> {
    let mut protocols = Protocols::new();
    handshake::register(protocols.get_mut(ProtocolState::Handshake))?;
    status::register(protocols.get_mut(ProtocolState::Status))?;
    login::register(protocols.get_mut(ProtocolState::Login))?;
    play::register(protocols.get_mut(ProtocolState::Play))?;
    Ok(protocols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanilla_protocols_build() {
        let protocols = protocols().unwrap();
        let play = protocols.get(ProtocolState::Play);
        assert_eq!(play.outbound.opcode_of::<Disconnect>(), Some(0x1A));
        assert_eq!(protocols.get(ProtocolState::Login).outbound.opcode_of::<Disconnect>(), Some(0x00));
        assert!(!protocols.get(ProtocolState::Status).outbound.contains::<Disconnect>());
        assert_eq!(play.outbound.opcode_of::<particle::SpawnParticle>(), Some(0x22));
        assert_eq!(play.inbound.opcode_of::<play::ClickWindow>(), Some(0x07));
    }

    #[test]
    fn disconnect_reason_is_json() {
        assert_eq!(Disconnect::text("bye \"now\"").reason, r#"{"text":"bye \"now\""}"#);
    }
}
