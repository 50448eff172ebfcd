use crate::prelude::*;
use crate::server::ServerContext;
use std::net::TcpListener;
use std::sync::Arc;

mod inboxes;
mod message;
mod protocol;
mod registry;
mod session;
pub mod client;
pub mod frame;
pub mod vanilla;
pub mod wire;

pub use inboxes::Inboxes;
pub use message::{Codec, CodecContext, Handler, Message, Processor};
pub use protocol::{Broadcast, CachedMessage, Protocol, ProtocolState, Protocols};
pub use registry::{Direction, MessageRegistry};
pub use session::{Player, Session};

/// Minecraft 1.10.x
pub const PROTOCOL_VERSION: i32 = 210;

pub struct Network {
    pub(super) listener: TcpListener,
    pub(super) scratch_buffer: Vec<u8>,

    pub(super) poller: polling::Poller,
    pub(super) events: Vec<polling::Event>,

    pub(super) clients: SlotMap<client::Client>,
    protocols: Arc<Protocols>,
    server: Arc<ServerContext>,
    tick: u64,
}

const LISTENER: usize = usize::MAX - 1;
impl Network {
    pub fn new(protocols: Arc<Protocols>, server: Arc<ServerContext>) -> io::Result<Self> {
        let poller = polling::Poller::new()?;

        let listener = TcpListener::bind(&server.config.bind)?;
        listener.set_nonblocking(true)?;
        poller.add(&listener, polling::Event::readable(LISTENER))?;
        log::info!("listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            scratch_buffer: vec![0; 64 * 1024],

            poller,
            events: vec![],

            clients: SlotMap::new(),
            protocols,
            server,
            tick: 0,
        })
    }
    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    pub fn process_packets_until(&mut self, deadline: time::Instant) -> io::Result<()> {
        loop {
            let timeout = match deadline.checked_duration_since(time::Instant::now()) {
                Some(v) => v,
                None => return Ok(()),
            };
            match self.poller.wait(&mut self.events, Some(timeout)) {
                Ok(0) => return Ok(()),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
            while let Some(event) = self.events.pop() {
                if event.key == LISTENER {
                    self.poller.modify(&self.listener, polling::Event::readable(LISTENER))?;
                    self.accept_players()?;
                    continue;
                }
                let Some(client) = self.clients.get(event.key) else {
                    log::trace!("event for departed client {}", event.key);
                    continue;
                };
                let mut alive = true;
                if event.readable {
                    if let Err(e) = client.read(&mut self.scratch_buffer) {
                        log::debug!("client {} disconnected: {e}", event.key);
                        // best effort, so the peer may see why
                        let _ = client.write();
                        alive = false;
                    }
                }
                let wants_write = if alive {
                    match client.write() {
                        Ok(wants_write) => wants_write,
                        Err(e) => {
                            log::debug!("client {} write failed: {e}", event.key);
                            alive = false;
                            false
                        }
                    }
                } else {
                    false
                };
                if !alive || client.is_done() {
                    self.drop_client(event.key);
                    continue;
                }
                self.poller.modify(client.conn(), polling::Event {
                    key: event.key,
                    readable: true,
                    writable: wants_write,
                })?;
            }
        }
    }
    fn accept_players(&mut self) -> io::Result<()> {
        loop {
            match self.listener.accept() {
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("unable to accept a connection: {e}");
                    break Ok(());
                }
                Ok((conn, addr)) => {
                    let session = Session::new(Arc::clone(&self.protocols), Arc::clone(&self.server));
                    let client = match client::Client::accept(conn, session) {
                        Ok(client) => client,
                        Err(e) => {
                            log::warn!("dropping connection from {addr}: {e}");
                            continue;
                        }
                    };
                    self.poller.add(client.conn(), polling::Event::readable(self.clients.next_idx()))?;
                    let idx = self.clients.insert(client);
                    log::debug!("new connection from {addr} as {idx}");
                }
            };
        }
    }
    fn drop_client(&mut self, key: usize) {
        if let Some(client) = self.clients.release(key) {
            if let Err(e) = self.poller.delete(client.conn()) {
                log::warn!("unable to deregister client {key}: {e}");
            }
        }
    }

    /// Sends queued broadcasts and keep-alives. Called once per game tick.
    pub fn tick(&mut self) {
        self.tick += 1;
        let tick = self.tick;
        let broadcasts: Vec<Broadcast> = self
            .server
            .pending_broadcasts()
            .filter_map(|msg| match self.protocols.prepare_broadcast(ProtocolState::Play, msg) {
                Ok(broadcast) => Some(broadcast),
                Err(e) => {
                    log::warn!("dropping broadcast: {e}");
                    None
                }
            })
            .collect();
        self.inboxes().retain(|idx, session| {
            for broadcast in &broadcasts {
                let sent = match broadcast {
                    Broadcast::Cached(cached) => session.send_cached(cached),
                    Broadcast::PerConnection(state, msg) if *state == session.state() => session.send_dyn(&**msg),
                    Broadcast::PerConnection(..) => Ok(()),
                };
                if let Err(e) = sent {
                    log::warn!("unable to broadcast to {idx}: {e}");
                }
            }
            if let Err(e) = session.tick(tick) {
                log::debug!("client {idx} failed its tick: {e}");
                return false;
            }
            true
        });
    }
}
impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("listener", &self.listener.local_addr().ok())
            .field("tick", &self.tick)
            .finish()
    }
}
