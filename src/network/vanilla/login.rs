use crate::prelude::*;
use crate::event::PlayerJoinEvent;
use crate::network::wire::{self, var};
use crate::network::{Player, Protocol, ProtocolState, Session};
use super::play::{JoinGame, PlayerPositionAndLook};
use super::{inbound, outbound, Disconnect, DisconnectCodec};
use md5::{Digest, Md5};

const MAX_NAME_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStart {
    pub name: String,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub uuid: Uuid,
    pub name: String,
}
/// Sent uncompressed. Every frame after it uses the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetCompression {
    pub threshold: i32,
}
crate::impl_message!(LoginStart, LoginSuccess, SetCompression);

inbound! {
    LoginStartCodec(LoginStart) |buf| {
        let (name, _) = wire::str_limited(buf, MAX_NAME_LEN)?;
        Ok(LoginStart { name: name.to_owned() })
    };
}
outbound! {
    LoginSuccessCodec(LoginSuccess msg, caching = false): (msg.uuid.hyphenated().to_string(), &msg.name);
    SetCompressionCodec(SetCompression msg, caching = false): var(msg.threshold);
}

pub(super) fn register(protocol: &mut Protocol) -> Result<(), RegistryError> {
    protocol.inbound.bind_handler(0x00, LoginStartCodec, handle_login_start)?;
    protocol.outbound
        .bind(0x00, DisconnectCodec)?
        .bind(0x02, LoginSuccessCodec)?
        .bind(0x03, SetCompressionCodec)?;
    Ok(())
}

/// The uuid an unauthenticated player gets: name based, so it is stable across joins.
///
/// Matches vanilla: the MD5 of `OfflinePlayer:<name>` with no namespace, stamped as version 3.
pub fn offline_uuid(name: &str) -> Uuid {
    let digest = Md5::digest(format!("OfflinePlayer:{name}").as_bytes());
    let mut bytes = [0; 16];
    bytes.copy_from_slice(&digest);
    uuid::Builder::from_md5_bytes(bytes).into_uuid()
}

fn handle_login_start(session: &mut Session, msg: LoginStart) -> Result<(), Disconnection> {
    let server = std::sync::Arc::clone(session.server());
    let config = &server.config;
    if server.online() >= config.max_players as usize {
        return Err(Disconnection::kick("The server is full!"));
    }
    if msg.name.is_empty() || !msg.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Disconnection::kick("Invalid username"));
    }
    let uuid = offline_uuid(&msg.name);
    if config.compression_threshold >= 0 {
        session.set_compression(config.compression_threshold)?;
    }
    session.send(LoginSuccess { uuid, name: msg.name.clone() })?;
    session.set_state(ProtocolState::Play)?;

    let entity_id = server.next_entity_id();
    let mut player = Player::new(msg.name, uuid, entity_id, session.now());
    player.game_mode = GameMode::Survival;
    let join_game = JoinGame {
        entity_id,
        game_mode: player.game_mode,
        dimension: 0,
        difficulty: 1,
        max_players: config.max_players.min(u8::MAX as u32) as u8,
        level_type: "default".into(),
        reduced_debug_info: false,
    };
    let position = PlayerPositionAndLook {
        position: player.position,
        yaw: player.look.0,
        pitch: player.look.1,
        flags: 0,
        teleport_id: 1,
    };
    let mut event = PlayerJoinEvent { name: player.name.clone(), uuid, entity_id };
    log::info!("{} ({uuid}) joined as entity {entity_id}", player.name);
    session.join(player);
    session.send(join_game)?;
    session.send(position)?;
    server.events().post(&mut event);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Codec, CodecContext};
    use bytes::BytesMut;

    #[test]
    fn offline_uuid_matches_vanilla() {
        let notch = offline_uuid("Notch");
        assert_eq!(notch.to_string(), "b50ad385-829d-3141-a216-7e7d7539ba7f");
        assert_eq!(notch.get_version_num(), 3);
        assert_eq!(notch.get_variant(), uuid::Variant::RFC4122);
        assert_ne!(notch, offline_uuid("notch"));
    }

    #[test]
    fn login_success_writes_hyphenated_uuid() {
        let uuid = offline_uuid("Steve");
        let mut buf = BytesMut::new();
        LoginSuccessCodec.encode(&CodecContext::default(), &LoginSuccess { uuid, name: "Steve".into() }, &mut buf).unwrap();
        assert_eq!(buf[0], 36);
        assert_eq!(&buf[1..37], uuid.hyphenated().to_string().as_bytes());
        assert_eq!(&buf[37..], b"\x05Steve");
    }

    #[test]
    fn overlong_names_are_rejected() {
        let mut buf = BytesMut::new();
        crate::network::wire::ToWire::encode("a_name_that_is_too_long", &mut buf);
        assert!(LoginStartCodec.decode(&CodecContext::default(), &buf).is_err());
    }

    #[test]
    fn login_disconnect_is_bound() {
        let mut protocol = Protocol::new(ProtocolState::Login);
        register(&mut protocol).unwrap();
        assert!(protocol.outbound.contains::<Disconnect>());
    }
}
