use crate::prelude::*;
use crate::event::ChatEvent;
use crate::inventory::InventoryReply;
use crate::network::wire::{self, var, Position, Slot, Wire};
use crate::network::{Protocol, Session};
use super::particle::{ParticleProcessor, SpawnParticleCodec};
use super::forge::RegistryDataProcessor;
use super::{inbound, outbound, symmetric, DisconnectCodec};
use bytes::{BufMut, BytesMut};
use std::sync::Arc;

const MAX_CHAT_LEN: usize = 256;
const MAX_CHANNEL_LEN: usize = 20;
const MAX_PAYLOAD_LEN: usize = 32767;

// serverbound

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeleportConfirm {
    pub teleport_id: i32,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingChat {
    pub message: String,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub locale: String,
    pub view_distance: i8,
    pub chat_mode: i32,
    pub chat_colors: bool,
    pub skin_parts: u8,
    pub main_hand: i32,
}
#[derive(Debug, Clone, PartialEq)]
pub struct ClickWindow {
    pub window_id: u8,
    pub slot: i16,
    pub button: i8,
    pub action: i16,
    pub mode: i32,
    pub item: Slot,
}
#[derive(Debug, Clone, PartialEq)]
pub struct CreativeInventoryAction {
    pub slot: i16,
    pub item: Slot,
}
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPosition {
    pub position: V3<f64>,
    pub on_ground: bool,
}
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPositionRotation {
    pub position: V3<f64>,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerRotation {
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerOnGround {
    pub on_ground: bool,
}

// both ways

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    pub id: i32,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmTransaction {
    pub window_id: i8,
    pub action: i16,
    pub accepted: bool,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseWindow {
    pub window_id: u8,
}
/// Plugin channel traffic. The data runs to the end of the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPayload {
    pub channel: String,
    pub data: Vec<u8>,
}

// clientbound

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBreakAnimation {
    pub entity_id: i32,
    pub position: V3<i32>,
    pub stage: i32,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Chat,
    System,
    ActionBar,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub json: String,
    pub kind: ChatKind,
}
impl ChatMessage {
    pub fn text(text: &str) -> Self {
        Self { json: super::text_component(text), kind: ChatKind::System }
    }
    pub fn player(sender: &str, message: &str) -> Self {
        let json = serde_json::json!({ "translate": "chat.type.text", "with": [sender, message] });
        Self { json: json.to_string(), kind: ChatKind::Chat }
    }
}
#[derive(Debug, Clone, PartialEq)]
pub struct SetSlot {
    pub window_id: i8,
    pub slot: i16,
    pub item: Slot,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinGame {
    pub entity_id: i32,
    pub game_mode: GameMode,
    pub dimension: i32,
    pub difficulty: u8,
    pub max_players: u8,
    pub level_type: String,
    pub reduced_debug_info: bool,
}
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPositionAndLook {
    pub position: V3<f64>,
    pub yaw: f32,
    pub pitch: f32,
    /// Bits set here make the matching field relative.
    pub flags: u8,
    pub teleport_id: i32,
}
/// A potion effect applied to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityEffect {
    pub entity_id: i32,
    pub effect_id: i8,
    pub amplifier: i8,
    pub duration: i32,
    pub ambient: bool,
    pub show_particles: bool,
}

crate::impl_message!(
    TeleportConfirm, IncomingChat, ClientSettings, ClickWindow, CreativeInventoryAction,
    PlayerPosition, PlayerPositionRotation, PlayerRotation, PlayerOnGround,
    KeepAlive, ConfirmTransaction, CloseWindow, ChannelPayload,
    BlockBreakAnimation, ChatMessage, SetSlot, JoinGame, PlayerPositionAndLook, EntityEffect,
);

inbound! {
    TeleportConfirmCodec(TeleportConfirm) |buf| Ok(TeleportConfirm { teleport_id: wire::varint(buf)?.0 });
    IncomingChatCodec(IncomingChat) |buf| Ok(IncomingChat { message: wire::str_limited(buf, MAX_CHAT_LEN)?.0.to_owned() });
    ClientSettingsCodec(ClientSettings) |buf| {
        let (locale, buf) = wire::str_limited(buf, 16)?;
        let ((view_distance, var(chat_mode), chat_colors, skin_parts, var(main_hand)), _) =
            <(i8, var<i32>, bool, u8, var<i32>)>::decode(buf)?;
        Ok(ClientSettings { locale: locale.to_owned(), view_distance, chat_mode, chat_colors, skin_parts, main_hand })
    };
    ClickWindowCodec(ClickWindow) |buf| {
        let ((window_id, slot, button, action, var(mode), item), _) =
            <(u8, i16, i8, i16, var<i32>, Slot)>::decode(buf)?;
        Ok(ClickWindow { window_id, slot, button, action, mode, item })
    };
    CreativeInventoryActionCodec(CreativeInventoryAction) |buf| {
        let ((slot, item), _) = <(i16, Slot)>::decode(buf)?;
        Ok(CreativeInventoryAction { slot, item })
    };
    PlayerPositionCodec(PlayerPosition) |buf| {
        let ((position, on_ground), _) = <(V3<f64>, bool)>::decode(buf)?;
        Ok(PlayerPosition { position, on_ground })
    };
    PlayerPositionRotationCodec(PlayerPositionRotation) |buf| {
        let ((position, yaw, pitch, on_ground), _) = <(V3<f64>, f32, f32, bool)>::decode(buf)?;
        Ok(PlayerPositionRotation { position, yaw, pitch, on_ground })
    };
    PlayerRotationCodec(PlayerRotation) |buf| {
        let ((yaw, pitch, on_ground), _) = <(f32, f32, bool)>::decode(buf)?;
        Ok(PlayerRotation { yaw, pitch, on_ground })
    };
    PlayerOnGroundCodec(PlayerOnGround) |buf| Ok(PlayerOnGround { on_ground: wire::bool(buf)?.0 });
}

symmetric! {
    KeepAliveCodec(KeepAlive msg): var(msg.id), |buf| Ok(KeepAlive { id: wire::varint(buf)?.0 });
    ConfirmTransactionCodec(ConfirmTransaction msg): (msg.window_id, msg.action, msg.accepted), |buf| {
        let ((window_id, action, accepted), _) = <(i8, i16, bool)>::decode(buf)?;
        Ok(ConfirmTransaction { window_id, action, accepted })
    };
    CloseWindowCodec(CloseWindow msg): msg.window_id, |buf| Ok(CloseWindow { window_id: wire::u8(buf)?.0 });
}

outbound! {
    ChatMessageCodec(ChatMessage msg, caching = true): (&msg.json, match msg.kind {
        ChatKind::Chat => 0u8,
        ChatKind::System => 1,
        ChatKind::ActionBar => 2,
    });
    SetSlotCodec(SetSlot msg, caching = false): (msg.window_id, msg.slot, &msg.item);
    JoinGameCodec(JoinGame msg, caching = false): (
        msg.entity_id,
        msg.game_mode.net_id(),
        msg.dimension,
        msg.difficulty,
        msg.max_players,
        &msg.level_type,
        msg.reduced_debug_info,
    );
    PlayerPositionAndLookCodec(PlayerPositionAndLook msg, caching = false): (
        msg.position,
        msg.yaw,
        msg.pitch,
        msg.flags,
        var(msg.teleport_id),
    );
    EntityEffectCodec(EntityEffect msg, caching = false): (
        var(msg.entity_id),
        msg.effect_id,
        msg.amplifier,
        var(msg.duration),
        msg.ambient as u8 | (msg.show_particles as u8) << 1,
    );
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelPayloadCodec;
impl crate::network::Codec for ChannelPayloadCodec {
    type Message = ChannelPayload;
    fn encode(&self, _: &crate::network::CodecContext, msg: &ChannelPayload, buf: &mut BytesMut) -> Result<(), CodecError> {
        if msg.data.len() > MAX_PAYLOAD_LEN * 32 {
            return Err(CodecError::TooLong { length: msg.data.len(), max: MAX_PAYLOAD_LEN * 32 });
        }
        wire::ToWire::encode(&msg.channel, buf);
        buf.put_slice(&msg.data);
        Ok(())
    }
    fn decode(&self, _: &crate::network::CodecContext, buf: &[u8]) -> Result<ChannelPayload, CodecError> {
        let (channel, data) = wire::str_limited(buf, MAX_CHANNEL_LEN)?;
        if data.len() > MAX_PAYLOAD_LEN {
            return Err(CodecError::TooLong { length: data.len(), max: MAX_PAYLOAD_LEN });
        }
        Ok(ChannelPayload { channel: channel.to_owned(), data: data.to_vec() })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BlockBreakAnimationCodec;
impl crate::network::Codec for BlockBreakAnimationCodec {
    type Message = BlockBreakAnimation;
    const CACHING: bool = true;
    fn encode(&self, _: &crate::network::CodecContext, msg: &BlockBreakAnimation, buf: &mut BytesMut) -> Result<(), CodecError> {
        // anything outside the crack stages resets the animation
        let stage = if (0..=9).contains(&msg.stage) { msg.stage as i8 } else { 10 };
        wire::ToWire::encode(&(var(msg.entity_id), Position(msg.position), stage), buf);
        Ok(())
    }
}

pub(super) fn register(protocol: &mut Protocol) -> Result<(), RegistryError> {
    protocol.inbound
        .bind_handler(0x00, TeleportConfirmCodec, handle_teleport_confirm)?
        .bind_handler(0x02, IncomingChatCodec, handle_chat)?
        .bind_handler(0x04, ClientSettingsCodec, handle_settings)?
        .bind(0x05, ConfirmTransactionCodec)?
        .bind_handler(0x07, ClickWindowCodec, handle_click)?
        .bind_handler(0x08, CloseWindowCodec, handle_close)?
        .bind_handler(0x09, ChannelPayloadCodec, handle_payload)?
        .bind_handler(0x0B, KeepAliveCodec, handle_keep_alive)?
        .bind_handler(0x0C, PlayerPositionCodec, |session: &mut Session, msg: PlayerPosition| -> Result<(), Disconnection> {
            moved(session, Some(msg.position), None, msg.on_ground);
            Ok(())
        })?
        .bind_handler(0x0D, PlayerPositionRotationCodec, |session: &mut Session, msg: PlayerPositionRotation| -> Result<(), Disconnection> {
            moved(session, Some(msg.position), Some((msg.yaw, msg.pitch)), msg.on_ground);
            Ok(())
        })?
        .bind_handler(0x0E, PlayerRotationCodec, |session: &mut Session, msg: PlayerRotation| -> Result<(), Disconnection> {
            moved(session, None, Some((msg.yaw, msg.pitch)), msg.on_ground);
            Ok(())
        })?
        .bind_handler(0x0F, PlayerOnGroundCodec, |session: &mut Session, msg: PlayerOnGround| -> Result<(), Disconnection> {
            moved(session, None, None, msg.on_ground);
            Ok(())
        })?
        .bind_handler(0x18, CreativeInventoryActionCodec, handle_creative)?;

    protocol.outbound
        .bind(0x08, BlockBreakAnimationCodec)?
        .bind(0x0F, ChatMessageCodec)?
        .bind(0x11, ConfirmTransactionCodec)?
        .bind(0x12, CloseWindowCodec)?
        .bind(0x16, SetSlotCodec)?
        .bind(0x18, ChannelPayloadCodec)?
        .bind(0x1A, DisconnectCodec)?
        .bind(0x1F, KeepAliveCodec)?
        .bind(0x22, SpawnParticleCodec)?
        .bind(0x23, JoinGameCodec)?
        .bind(0x2E, PlayerPositionAndLookCodec)?
        .bind(0x4B, EntityEffectCodec)?
        .bind_processor(ParticleProcessor)
        .bind_processor(RegistryDataProcessor);
    Ok(())
}

fn handle_teleport_confirm(_: &mut Session, msg: TeleportConfirm) -> Result<(), Disconnection> {
    log::trace!("teleport {} confirmed", msg.teleport_id);
    Ok(())
}

fn handle_keep_alive(session: &mut Session, msg: KeepAlive) -> Result<(), Disconnection> {
    session.acknowledge_keep_alive(msg.id);
    Ok(())
}

fn handle_chat(session: &mut Session, msg: IncomingChat) -> Result<(), Disconnection> {
    let Some(player) = session.player() else { return Ok(()) };
    let message = msg.message.trim();
    if message.is_empty() {
        return Ok(());
    }
    if message.chars().any(|c| c == '\u{a7}' || c.is_control()) {
        return Err(Disconnection::kick("Illegal characters in chat"));
    }
    let mut event = ChatEvent { sender: player.name.clone(), message: message.to_owned(), cancelled: false };
    let server = Arc::clone(session.server());
    server.events().post(&mut event);
    if !event.cancelled {
        log::info!("<{}> {}", event.sender, event.message);
        server.broadcast(ChatMessage::player(&event.sender, &event.message));
    }
    Ok(())
}

fn handle_settings(session: &mut Session, msg: ClientSettings) -> Result<(), Disconnection> {
    if let Some(player) = session.player_mut() {
        player.view_distance = msg.view_distance.clamp(2, 32) as u8;
    }
    Ok(())
}

fn moved(session: &mut Session, position: Option<V3<f64>>, look: Option<(f32, f32)>, on_ground: bool) {
    let Some(player) = session.player_mut() else { return };
    if let Some(position) = position {
        player.position = position;
    }
    if let Some(look) = look {
        player.look = look;
    }
    player.on_ground = on_ground;
}

fn send_replies(session: &mut Session, replies: Vec<InventoryReply>) -> Result<(), Disconnection> {
    for reply in replies {
        match reply {
            InventoryReply::SetSlot(msg) => session.send(msg)?,
            InventoryReply::Confirm(msg) => session.send(msg)?,
        }
    }
    Ok(())
}

fn handle_click(session: &mut Session, msg: ClickWindow) -> Result<(), Disconnection> {
    let server = Arc::clone(session.server());
    let Some(player) = session.player_mut() else { return Ok(()) };
    let creative = player.game_mode == GameMode::Creative;
    let replies = player.inventory.handle_click(&msg, server.events(), creative)?;
    send_replies(session, replies)
}

fn handle_creative(session: &mut Session, msg: CreativeInventoryAction) -> Result<(), Disconnection> {
    let server = Arc::clone(session.server());
    let Some(player) = session.player_mut() else { return Ok(()) };
    if player.game_mode != GameMode::Creative {
        return Err(Disconnection::kick("Creative inventory actions outside of creative mode"));
    }
    let replies = player.inventory.handle_creative(&msg, server.events())?;
    send_replies(session, replies)
}

fn handle_close(session: &mut Session, msg: CloseWindow) -> Result<(), Disconnection> {
    if let Some(player) = session.player_mut() {
        if let Some(dropped) = player.inventory.close(msg.window_id) {
            log::debug!("{} dropped {dropped:?} from the cursor", player.name);
        }
    }
    Ok(())
}

fn handle_payload(session: &mut Session, msg: ChannelPayload) -> Result<(), Disconnection> {
    match msg.channel.as_str() {
        "MC|Brand" => {
            let brand = wire::str(&msg.data).map(|(b, _)| b).unwrap_or("<invalid>");
            log::debug!("client brand: {brand}");
        }
        super::forge::HANDSHAKE_CHANNEL => {
            log::debug!("forge handshake ({} bytes, forge client: {})", msg.data.len(), session.ctx().forge);
        }
        channel => log::trace!("ignoring {} bytes on {channel}", msg.data.len()),
    }
    Ok(())
}
