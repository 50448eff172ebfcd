use crate::prelude::*;
use crate::network::wire;
use crate::network::{Protocol, Session, PROTOCOL_VERSION};
use super::{inbound, outbound, symmetric};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRequest;
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub json: String,
}
/// Opaque payload, echoed back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping(pub i64);
crate::impl_message!(StatusRequest, StatusResponse, Ping);

inbound! {
    StatusRequestCodec(StatusRequest) |_buf| Ok(StatusRequest);
}
outbound! {
    StatusResponseCodec(StatusResponse msg, caching = false): &msg.json;
}
symmetric! {
    PingCodec(Ping msg): msg.0, |buf| Ok(Ping(wire::i64(buf)?.0));
}

pub(super) fn register(protocol: &mut Protocol) -> Result<(), RegistryError> {
    protocol.inbound
        .bind_handler(0x00, StatusRequestCodec, handle_request)?
        .bind_handler(0x01, PingCodec, handle_ping)?;
    protocol.outbound
        .bind(0x00, StatusResponseCodec)?
        .bind(0x01, PingCodec)?;
    Ok(())
}

pub fn status_json(session: &Session) -> String {
    let server = session.server();
    let mut status = serde_json::json!({
        "version": { "name": "1.10.2", "protocol": PROTOCOL_VERSION },
        "players": {
            "max": server.config.max_players,
            "online": server.online(),
            "sample": [],
        },
        "description": { "text": server.config.motd },
    });
    if session.ctx().forge {
        status["modinfo"] = serde_json::json!({ "type": "FML", "modList": [] });
    }
    status.to_string()
}

fn handle_request(session: &mut Session, _: StatusRequest) -> Result<(), Disconnection> {
    let json = status_json(session);
    session.send(StatusResponse { json })?;
    Ok(())
}

fn handle_ping(session: &mut Session, ping: Ping) -> Result<(), Disconnection> {
    session.send(ping)?;
    session.close();
    Ok(())
}
