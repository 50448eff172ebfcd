use crate::prelude::*;
use crate::network::wire::{self, var, Wire};
use crate::network::{Protocol, ProtocolState, Session, PROTOCOL_VERSION};
use super::inbound;

/// Marks the server address of a handshake sent by a Forge client.
pub const FML_MARKER: &str = "\0FML\0";
const MAX_ADDRESS_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub protocol_version: i32,
    pub address: String,
    pub port: u16,
    pub next_state: i32,
}
crate::impl_message!(Handshake);

inbound! {
    HandshakeCodec(Handshake) |buf| {
        let (var(protocol_version), buf) = <var<i32>>::decode(buf)?;
        // forge appends its marker to the address, so allow for it
        let (address, buf) = wire::str_limited(buf, MAX_ADDRESS_LEN + FML_MARKER.len())?;
        let ((port, var(next_state)), _) = <(u16, var<i32>)>::decode(buf)?;
        Ok(Handshake { protocol_version, address: address.to_owned(), port, next_state })
    };
}

pub(super) fn register(protocol: &mut Protocol) -> Result<(), RegistryError> {
    protocol.inbound.bind_handler(0x00, HandshakeCodec, handle_handshake)?;
    Ok(())
}

fn handle_handshake(session: &mut Session, msg: Handshake) -> Result<(), Disconnection> {
    let next = ProtocolState::from_handshake(msg.next_state)
        .ok_or(CodecError::InvalidValue { field: "next state", value: msg.next_state as i64 })?;
    let ctx = session.ctx_mut();
    ctx.protocol_version = msg.protocol_version;
    ctx.forge = msg.address.contains(FML_MARKER);
    if ctx.forge {
        log::debug!("forge client connecting");
    }
    session.set_state(next)?;
    if next == ProtocolState::Login && msg.protocol_version != PROTOCOL_VERSION {
        return Err(Disconnection::kick(if msg.protocol_version < PROTOCOL_VERSION {
            "Outdated client! I'm still on 1.10.2"
        } else {
            "Outdated server! I'm still on 1.10.2"
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Codec, CodecContext};
    use crate::network::wire::ToWire;
    use bytes::BytesMut;

    fn handshake_bytes(version: i32, address: &str, next: i32) -> BytesMut {
        let mut buf = BytesMut::new();
        (var(version), address, 25565u16, var(next)).encode(&mut buf);
        buf
    }

    #[test]
    fn decodes_forge_address() {
        let buf = handshake_bytes(210, "localhost\0FML\0", 2);
        let msg = HandshakeCodec.decode(&CodecContext::default(), &buf).unwrap();
        assert_eq!(msg.protocol_version, 210);
        assert!(msg.address.contains(FML_MARKER));
        assert_eq!(msg.port, 25565);
        assert_eq!(msg.next_state, 2);
    }

    #[test]
    fn truncated_handshake() {
        let buf = handshake_bytes(210, "localhost", 1);
        let err = HandshakeCodec.decode(&CodecContext::default(), &buf[..buf.len() - 2]).unwrap_err();
        assert!(err.is_incomplete());
    }
}
