use crate::prelude::*;
use crate::inventory::ContainerSession;
use crate::server::ServerContext;
use super::frame::FrameCodec;
use super::message::{CodecContext, Message};
use super::protocol::{CachedMessage, Protocols};
use super::vanilla::{login::SetCompression, play::KeepAlive, Disconnect};
use super::wire;
use super::ProtocolState;
use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;
use std::sync::Arc;

/// A logged in player, as far as the connection is concerned.
#[derive(Debug)]
pub struct Player {
    pub name: String,
    pub uuid: Uuid,
    pub entity_id: i32,
    pub game_mode: GameMode,
    pub position: V3<f64>,
    pub look: (f32, f32),
    pub on_ground: bool,
    pub view_distance: u8,
    pub inventory: ContainerSession,
    keep_alive: KeepAliveState,
}
#[derive(Debug, Clone, Copy)]
struct KeepAliveState {
    last_sent: u64,
    pending: Option<i32>,
    // tick on which we acked
    last_ack: u64,
}
impl Player {
    pub fn new(name: String, uuid: Uuid, entity_id: i32, now: u64) -> Self {
        Self {
            name,
            uuid,
            entity_id,
            game_mode: GameMode::Survival,
            position: V3(0.0, 64.0, 0.0),
            look: (0.0, 0.0),
            on_ground: false,
            view_distance: 8,
            inventory: ContainerSession::player_inventory(),
            keep_alive: KeepAliveState { last_sent: now, pending: None, last_ack: now },
        }
    }
    pub fn last_keep_alive_ack(&self) -> u64 {
        self.keep_alive.last_ack
    }
}

/// One connection's protocol state, independent of the socket it arrives on.
///
/// Bytes go in through [`Session::receive`], framed bytes come out of [`Session::poll_outbound`].
pub struct Session {
    state: ProtocolState,
    frames: FrameCodec,
    inbound: BytesMut,
    outbound: VecDeque<Bytes>,
    ctx: CodecContext,
    closing: bool,
    now: u64,
    player: Option<Player>,
    protocols: Arc<Protocols>,
    server: Arc<ServerContext>,
}
impl Session {
    pub fn new(protocols: Arc<Protocols>, server: Arc<ServerContext>) -> Self {
        Self {
            state: ProtocolState::Handshake,
            frames: FrameCodec::new(server.config.max_frame_length),
            inbound: BytesMut::new(),
            outbound: VecDeque::new(),
            ctx: CodecContext::default(),
            closing: false,
            now: 0,
            player: None,
            protocols,
            server,
        }
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }
    pub fn server(&self) -> &Arc<ServerContext> {
        &self.server
    }
    pub fn protocols(&self) -> &Arc<Protocols> {
        &self.protocols
    }
    pub fn ctx(&self) -> &CodecContext {
        &self.ctx
    }
    pub fn ctx_mut(&mut self) -> &mut CodecContext {
        &mut self.ctx
    }
    pub fn now(&self) -> u64 {
        self.now
    }
    pub fn is_closing(&self) -> bool {
        self.closing
    }
    /// Stop reading. Whatever is queued is still flushed.
    pub fn close(&mut self) {
        self.closing = true;
    }
    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }
    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }
    pub fn join(&mut self, player: Player) {
        if self.player.is_none() {
            self.server.joined();
        }
        self.player = Some(player);
    }

    /// Appends bytes read from the peer and dispatches every complete frame, in order.
    ///
    /// A frame that switches state is followed by frames decoded in the new state.
    /// On error a textual disconnect is queued where the state allows one.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<(), Disconnection> {
        self.inbound.extend_from_slice(bytes);
        while !self.closing {
            let result = match self.frames.decode(&mut self.inbound) {
                Ok(Some(frame)) => self.dispatch(&frame),
                Ok(None) => break,
                Err(e) => Err(e.into()),
            };
            if let Err(e) = result {
                log::debug!("dropping connection in {:?}: {e}", self.state);
                let reason = match &e {
                    Disconnection::Kicked(reason) => reason.clone(),
                    e => e.to_string(),
                };
                self.disconnect(&reason);
                return Err(e);
            }
        }
        Ok(())
    }
    fn dispatch(&mut self, frame: &[u8]) -> Result<(), Disconnection> {
        let protocols = Arc::clone(&self.protocols);
        let registry = &protocols.get(self.state).inbound;
        let (opcode, body) = wire::varint(frame)?;
        let entry = registry
            .by_opcode(opcode)
            .ok_or(CodecError::UnknownOpcode { state: self.state, opcode })?;
        let msg = entry.codec.decode(&self.ctx, body)?;
        log::trace!("received {msg:?}");
        match &entry.handler {
            Some(handler) => handler.handle(self, msg),
            None => {
                log::debug!("no handler for {} in {:?}", entry.type_name, self.state);
                Ok(())
            }
        }
    }

    pub fn send(&mut self, msg: impl Message) -> Result<(), CodecError> {
        self.send_dyn(&msg)
    }
    pub fn send_dyn(&mut self, msg: &dyn Message) -> Result<(), CodecError> {
        let payloads = self.protocols.get(self.state).encode_outbound(&self.ctx, msg)?;
        log::trace!("forwarding {msg:?} as {} frame(s)", payloads.len());
        for payload in payloads {
            self.queue_payload(&payload)?;
        }
        Ok(())
    }
    /// Frames payloads that were encoded once for every recipient.
    pub fn send_cached(&mut self, msg: &CachedMessage) -> Result<(), CodecError> {
        if msg.state != self.state {
            log::debug!("skipping {:?} broadcast for a {:?} connection", msg.state, self.state);
            return Ok(());
        }
        for payload in msg.payloads.iter() {
            self.queue_payload(payload)?;
        }
        Ok(())
    }
    fn queue_payload(&mut self, payload: &[u8]) -> Result<(), CodecError> {
        let frame = self.frames.encode(payload)?;
        self.outbound.push_back(frame);
        Ok(())
    }

    pub fn set_state(&mut self, next: ProtocolState) -> Result<(), CodecError> {
        if !self.state.can_transition_to(next) {
            return Err(CodecError::Invalid(format!("cannot move from {:?} to {:?}", self.state, next)));
        }
        log::debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }
    /// Announces the threshold, then frames everything after it with compression.
    pub fn set_compression(&mut self, threshold: i32) -> Result<(), CodecError> {
        self.send(SetCompression { threshold })?;
        self.frames.set_compression(threshold);
        Ok(())
    }
    pub fn compression(&self) -> Option<usize> {
        self.frames.compression()
    }

    /// Sends the reason where this state has a way to, then closes.
    pub fn disconnect(&mut self, reason: &str) {
        if self.protocols.get(self.state).outbound.contains::<Disconnect>() {
            if let Err(e) = self.send(Disconnect::text(reason)) {
                log::warn!("unable to send disconnect: {e}");
            }
        }
        self.closing = true;
    }

    /// Keep-alive bookkeeping. `now` counts server ticks.
    pub fn tick(&mut self, now: u64) -> Result<(), CodecError> {
        self.now = now;
        if self.state != ProtocolState::Play || self.closing {
            return Ok(());
        }
        let (interval, timeout) = (self.server.config.keep_alive_interval, self.server.config.keep_alive_timeout);
        let Some(player) = &mut self.player else { return Ok(()) };
        let keep_alive = &mut player.keep_alive;
        // the next ping goes out `interval` after an ack, then gets `timeout` to be answered
        if now.saturating_sub(keep_alive.last_ack) > interval + timeout {
            log::warn!("{} timed out", player.name);
            self.disconnect("Timed out");
            return Ok(());
        }
        if now.saturating_sub(keep_alive.last_sent) >= interval && keep_alive.pending.is_none() {
            let id = now as i32;
            keep_alive.last_sent = now;
            keep_alive.pending = Some(id);
            self.send(KeepAlive { id })?;
        }
        Ok(())
    }
    pub fn acknowledge_keep_alive(&mut self, id: i32) {
        let now = self.now;
        if let Some(player) = &mut self.player {
            if player.keep_alive.pending == Some(id) {
                player.keep_alive.pending = None;
                player.keep_alive.last_ack = now;
            } else {
                log::debug!("{} answered unknown keep-alive {id}", player.name);
            }
        }
    }

    pub fn poll_outbound(&mut self) -> Option<Bytes> {
        self.outbound.pop_front()
    }
    /// Puts back the unwritten tail of a frame.
    pub fn unpoll_outbound(&mut self, rest: Bytes) {
        self.outbound.push_front(rest);
    }
    pub fn has_outbound(&self) -> bool {
        !self.outbound.is_empty()
    }
    pub fn take_outbound(&mut self) -> Vec<Bytes> {
        self.outbound.drain(..).collect()
    }
}
impl Drop for Session {
    fn drop(&mut self) {
        if let Some(player) = &self.player {
            log::debug!("{} left", player.name);
            self.server.left();
        }
    }
}
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("compression", &self.frames.compression())
            .field("queued", &self.outbound.len())
            .field("closing", &self.closing)
            .field("player", &self.player.as_ref().map(|p| &p.name))
            .finish()
    }
}
