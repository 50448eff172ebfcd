//! Server side bookkeeping for window clicks.
//!
//! Every click becomes a [`ClickInventoryEvent`] describing what would change. Listeners may veto
//! it, in which case the client is told to put everything back.
use crate::prelude::*;
use crate::event::EventBus;
use crate::network::vanilla::play::{ClickWindow, ConfirmTransaction, CreativeInventoryAction, SetSlot};
use crate::network::wire::Slot;

mod click;
mod container;
mod events;

pub use container::Container;
pub use events::{ClickInventoryEvent, ClickKind, CreativeInventoryEvent, CreativeKind, SlotTransaction, Transaction};

/// What the client needs to hear after a click.
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryReply {
    SetSlot(SetSlot),
    Confirm(ConfirmTransaction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragKind {
    Primary,
    Secondary,
}
#[derive(Debug, Clone, PartialEq, Eq)]
struct Drag {
    kind: DragKind,
    slots: Vec<usize>,
}

/// A player's view of their windows. The cursor item survives switching between them.
#[derive(Debug, Clone)]
pub struct ContainerSession {
    player: Container,
    open: Option<Container>,
    cursor: Option<ItemStack>,
    drag: Option<Drag>,
}
impl ContainerSession {
    pub fn player_inventory() -> Self {
        Self { player: Container::player(), open: None, cursor: None, drag: None }
    }
    pub fn player(&self) -> &Container {
        &self.player
    }
    pub fn player_mut(&mut self) -> &mut Container {
        &mut self.player
    }
    /// The window clicks currently apply to.
    pub fn container(&self) -> &Container {
        self.open.as_ref().unwrap_or(&self.player)
    }
    fn container_mut(&mut self) -> &mut Container {
        match &mut self.open {
            Some(open) => open,
            None => &mut self.player,
        }
    }
    pub fn cursor(&self) -> Option<&ItemStack> {
        self.cursor.as_ref()
    }
    pub fn set_cursor(&mut self, item: Option<ItemStack>) {
        self.cursor = item;
    }

    /// Shows another window on top of the player's inventory, closing whatever was open.
    pub fn open(&mut self, window_id: u8, size: usize) {
        if let Some(previous) = self.open.take() {
            previous.return_shared(&mut self.player);
        }
        self.drag = None;
        self.open = Some(Container::window(window_id, size, &self.player));
    }
    /// Closes `window_id` and hands back the cursor item, which the caller should drop.
    pub fn close(&mut self, window_id: u8) -> Option<ItemStack> {
        match &self.open {
            Some(open) if open.window_id == window_id => {
                open.return_shared(&mut self.player);
                self.open = None;
            }
            None if window_id == 0 => {}
            _ => {
                log::debug!("ignoring close of window {window_id}, which isn't open");
                return None;
            }
        }
        self.drag = None;
        self.cursor.take()
    }

    pub fn handle_click(&mut self, msg: &ClickWindow, events: &dyn EventBus, creative: bool) -> Result<Vec<InventoryReply>, CodecError> {
        let window_id = self.container().window_id;
        if msg.window_id != window_id {
            log::debug!("click for window {} while {window_id} is open", msg.window_id);
            return Ok(vec![]);
        }
        let Some((kind, cursor, slots)) = self.plan_click(msg, creative)? else {
            return Ok(vec![]);
        };
        let mut event = ClickInventoryEvent { window_id, kind, cursor, slots, cancelled: false };
        events.post(&mut event);
        Ok(self.finish(event, msg.action))
    }

    fn finish(&mut self, event: ClickInventoryEvent, action: i16) -> Vec<InventoryReply> {
        let window = event.window_id as i8;
        let accepted = !event.cancelled;
        let mut replies = vec![];
        if accepted {
            self.cursor = event.cursor.replacement;
            for transaction in event.slots {
                if !self.container_mut().set(transaction.slot, transaction.replacement.clone()) {
                    log::warn!("listener targeted missing slot {}", transaction.slot);
                    continue;
                }
                replies.push(set_slot(window, transaction.slot, transaction.replacement));
            }
        } else {
            for transaction in &event.slots {
                replies.push(set_slot(window, transaction.slot, self.container().get(transaction.slot).cloned()));
            }
        }
        replies.insert(0, InventoryReply::SetSlot(SetSlot { window_id: -1, slot: -1, item: Slot(self.cursor.clone()) }));
        replies.push(InventoryReply::Confirm(ConfirmTransaction { window_id: window, action, accepted }));
        replies
    }

    /// Creative mode writes slots of the player's inventory directly. A negative slot throws the item away.
    pub fn handle_creative(&mut self, msg: &CreativeInventoryAction, events: &dyn EventBus) -> Result<Vec<InventoryReply>, CodecError> {
        let item = msg.item.0.clone();
        let mut event = if msg.slot < 0 {
            CreativeInventoryEvent { kind: CreativeKind::Drop, item, slots: vec![], cancelled: false }
        } else {
            let slot = self
                .player
                .index(msg.slot)
                .ok_or(CodecError::InvalidValue { field: "creative slot", value: msg.slot.into() })?;
            let original = self.player.get(slot).cloned();
            let slots = vec![SlotTransaction { slot, original, replacement: item.clone() }];
            CreativeInventoryEvent { kind: CreativeKind::Click, item, slots, cancelled: false }
        };
        events.post(&mut event);
        let mut replies = vec![];
        for transaction in event.slots {
            let item = if event.cancelled {
                self.player.get(transaction.slot).cloned()
            } else {
                self.player.set(transaction.slot, transaction.replacement.clone());
                transaction.replacement
            };
            replies.push(set_slot(0, transaction.slot, item));
        }
        Ok(replies)
    }
}

fn set_slot(window_id: i8, slot: usize, item: Option<ItemStack>) -> InventoryReply {
    InventoryReply::SetSlot(SetSlot { window_id, slot: slot as i16, item: Slot(item) })
}
