use crate::prelude::*;

/// A change to one item holder, before it happens.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub original: Option<ItemStack>,
    pub replacement: Option<ItemStack>,
}
impl Transaction {
    pub fn new(original: Option<ItemStack>, replacement: Option<ItemStack>) -> Self {
        Self { original, replacement }
    }
    /// Leaves the holder as it is.
    pub fn unchanged(item: Option<ItemStack>) -> Self {
        Self { original: item.clone(), replacement: item }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotTransaction {
    pub slot: usize,
    pub original: Option<ItemStack>,
    pub replacement: Option<ItemStack>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Primary,
    Secondary,
    ShiftPrimary,
    ShiftSecondary,
    /// Hotbar key 0 through 8.
    NumberPress(u8),
    Middle,
    DropOutsidePrimary,
    DropOutsideSecondary,
    DropSingle,
    DropFull,
    DragPrimary,
    DragSecondary,
    Double,
}

/// A player clicked in a window. Listeners may rewrite the transactions or cancel them.
#[derive(Debug, Clone)]
pub struct ClickInventoryEvent {
    pub window_id: u8,
    pub kind: ClickKind,
    pub cursor: Transaction,
    pub slots: Vec<SlotTransaction>,
    pub cancelled: bool,
}
crate::impl_event!(ClickInventoryEvent, cancellable);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreativeKind {
    Click,
    Drop,
}

/// The creative inventory set a slot, or threw an item out of it.
#[derive(Debug, Clone)]
pub struct CreativeInventoryEvent {
    pub kind: CreativeKind,
    pub item: Option<ItemStack>,
    pub slots: Vec<SlotTransaction>,
    pub cancelled: bool,
}
crate::impl_event!(CreativeInventoryEvent, cancellable);
