use cubeserv::event::NoListeners;
use cubeserv::network::vanilla;
use cubeserv::{Config, Network, ServerContext};
use std::sync::Arc;
use std::time::*;

const TICK: Duration = Duration::from_millis(50);

/// Advertises the server to clients on the same network, the way "Open to LAN" does.
struct Announcer {
    next_due: Instant,
    socket: std::net::UdpSocket,
    announcement: String,
}
impl Announcer {
    fn new(motd: &str, port: u16) -> std::io::Result<Self> {
        let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            next_due: Instant::now(),
            socket,
            announcement: format!("[MOTD]{motd}[/MOTD][AD]{port}[/AD]"),
        })
    }
    fn announce(&mut self) {
        let now = Instant::now();
        if self.next_due < now {
            self.next_due = now + Duration::from_secs(2);
            match self.socket.send_to(self.announcement.as_bytes(), "224.0.2.60:4445") {
                Ok(n) if n == self.announcement.len() => {}
                Ok(_) => log::warn!("network too busy to announce on LAN"),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => log::debug!("LAN announcement failed: {e}"),
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = match std::env::args_os().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if config.online_mode {
        log::warn!("online mode is not supported, players will join unauthenticated");
    }

    let server = Arc::new(ServerContext::new(config, NoListeners));
    let protocols = Arc::new(vanilla::protocols()?);
    let mut network = Network::new(protocols, Arc::clone(&server))?;
    let port = network.local_addr()?.port();
    match local_ip_address::local_ip() {
        Ok(ip) => log::info!("reachable on the LAN at {ip}:{port}"),
        Err(e) => log::debug!("no LAN address: {e}"),
    }

    let mut announcer = match Announcer::new(&server.config.motd, port) {
        Ok(announcer) => Some(announcer),
        Err(e) => {
            log::warn!("not announcing on LAN: {e}");
            None
        }
    };
    let mut next_tick = Instant::now() + TICK;
    loop {
        if let Some(announcer) = &mut announcer {
            announcer.announce();
        }
        network.process_packets_until(next_tick)?;
        network.tick();
        next_tick += TICK;
        // don't try to catch up after a stall
        let now = Instant::now();
        if next_tick < now {
            log::warn!("running {}ms behind", (now - next_tick).as_millis());
            next_tick = now + TICK;
        }
    }
}
