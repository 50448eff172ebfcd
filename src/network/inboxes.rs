use super::*;

pub struct Inboxes<'a>(pub(super) &'a mut Network);

impl Network {
    /// Every connected session, for pushing updates outside of packet handling.
    pub fn inboxes(&mut self) -> Inboxes<'_> {
        Inboxes(self)
    }
}

impl Inboxes<'_> {
    pub fn get(&mut self, idx: usize) -> Option<&mut Session> {
        self.0.clients.get(idx).map(|c| c.session())
    }
    /// Visits every session, then flushes it.
    ///
    /// Sessions `keep` rejects are closed, as are those that have finished or fail to flush.
    pub fn retain(self, mut keep: impl FnMut(usize, &mut Session) -> bool) {
        let network = self.0;
        let poller = &network.poller;
        network.clients.retain(|idx, client| {
            if !keep(idx, client.session()) {
                client.session().close();
            }
            let outcome = match client.write() {
                Ok(_) if client.is_done() => Ok(false),
                Ok(wants_write) => poller
                    .modify(client.conn(), polling::Event { key: idx, readable: true, writable: wants_write })
                    .map(|()| true),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(true) => true,
                Ok(false) => {
                    if let Err(e) = poller.delete(client.conn()) {
                        log::warn!("unable to deregister client {idx}: {e}");
                    }
                    false
                }
                Err(e) => {
                    log::debug!("dropping client {idx}: {e}");
                    let _ = poller.delete(client.conn());
                    false
                }
            }
        });
    }
}
