use crate::prelude::*;
use super::Session;
use std::io::{Read, Write};

/// A socket and the session speaking over it.
pub struct Client {
    conn: TcpStream,
    session: Session,
}
impl Client {
    pub fn accept(conn: TcpStream, session: Session) -> io::Result<Self> {
        conn.set_nonblocking(true)?;
        conn.set_nodelay(true)?;
        Ok(Self { conn, session })
    }
    pub(super) fn conn(&self) -> &TcpStream {
        &self.conn
    }
    pub fn session(&mut self) -> &mut Session {
        &mut self.session
    }
    /// Closed, and nothing left to flush.
    pub fn is_done(&self) -> bool {
        self.session.is_closing() && !self.session.has_outbound()
    }

    /// Reads until the socket would block, feeding the session as bytes arrive.
    pub fn read(&mut self, scratch: &mut [u8]) -> Result<(), Disconnection> {
        while !self.session.is_closing() {
            match self.conn.read(scratch) {
                Ok(0) => return Err(Disconnection::Closed),
                Ok(n) => self.session.receive(&scratch[..n])?,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Flushes queued frames. Returns whether some are still waiting for the socket.
    pub fn write(&mut self) -> io::Result<bool> {
        while let Some(mut sending) = self.session.poll_outbound() {
            while !sending.is_empty() {
                match self.conn.write(&sending) {
                    Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                    Ok(n) => {
                        let _ = sending.split_to(n);
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        self.session.unpoll_outbound(sending);
                        return Ok(true);
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(false)
    }
}
impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fields = f.debug_struct("Client");
        if let Ok(addr) = self.conn.peer_addr() {
            fields.field("conn", &addr);
        }
        fields.field("session", &self.session);
        fields.finish()
    }
}
