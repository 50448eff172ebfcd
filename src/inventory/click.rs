use crate::prelude::*;
use crate::network::vanilla::play::ClickWindow;
use super::{ContainerSession, Drag, DragKind, SlotTransaction, Transaction, ClickKind};

const OUTSIDE: i16 = -999;

type Plan = Option<(ClickKind, Transaction, Vec<SlotTransaction>)>;

fn count_of(item: &Option<ItemStack>) -> i8 {
    item.as_ref().map_or(0, |i| i.count)
}
/// `item` with `count` items, or nothing when that leaves none.
fn resized(item: &ItemStack, count: i8) -> Option<ItemStack> {
    (count > 0).then(|| item.with_count(count))
}

impl ContainerSession {
    pub(super) fn plan_click(&mut self, msg: &ClickWindow, creative: bool) -> Result<Plan, CodecError> {
        if msg.mode == 5 {
            return Ok(self.plan_drag(msg));
        }
        if self.drag.take().is_some() {
            log::debug!("drag interrupted by a mode {} click", msg.mode);
            return Ok(None);
        }
        let button = msg.button;
        let plan = match msg.mode {
            0 | 4 if msg.slot == OUTSIDE => self.plan_drop_outside(button),
            0 => self.plan_primary_or_secondary(msg.slot, button),
            1 => self.plan_shift(msg.slot, button),
            2 => self.plan_number_press(msg.slot, button),
            3 => self.plan_middle(msg.slot, creative),
            4 => self.plan_drop(msg.slot, button),
            6 => self.plan_double(msg.slot, button),
            mode => return Err(CodecError::InvalidValue { field: "click mode", value: mode.into() }),
        };
        Ok(plan)
    }

    fn slot(&self, slot: i16) -> Option<(usize, Option<ItemStack>)> {
        let container = self.container();
        match container.index(slot) {
            Some(index) => Some((index, container.get(index).cloned())),
            None => {
                log::debug!("unknown slot {slot} in window {}", container.window_id);
                None
            }
        }
    }

    fn plan_drop_outside(&self, button: i8) -> Plan {
        let kind = match button {
            0 => ClickKind::DropOutsidePrimary,
            1 => ClickKind::DropOutsideSecondary,
            _ => return None,
        };
        let cursor = match (&self.cursor, kind) {
            (Some(held), ClickKind::DropOutsideSecondary) => Transaction::new(self.cursor.clone(), resized(held, held.count - 1)),
            (held, _) => Transaction::new(held.clone(), None),
        };
        Some((kind, cursor, vec![]))
    }

    fn plan_primary_or_secondary(&self, slot: i16, button: i8) -> Plan {
        let (index, current) = self.slot(slot)?;
        let cursor = self.cursor.clone();
        let change = |replacement: Option<ItemStack>| vec![SlotTransaction { slot: index, original: current.clone(), replacement }];
        let (kind, cursor_after, slots) = match (button, &cursor, &current) {
            (0, None, None) | (1, None, None) => (if button == 0 { ClickKind::Primary } else { ClickKind::Secondary }, None, vec![]),
            // pick up everything
            (0, None, Some(item)) => (ClickKind::Primary, Some(item.clone()), change(None)),
            // pick up half, rounding in favour of the cursor
            (1, None, Some(item)) => {
                let taken = item.count - item.count / 2;
                (ClickKind::Secondary, Some(item.with_count(taken)), change(resized(item, item.count - taken)))
            }
            (0, Some(held), None) => {
                let placed = held.count.min(ItemStack::MAX_STACK);
                (ClickKind::Primary, resized(held, held.count - placed), change(Some(held.with_count(placed))))
            }
            (0, Some(held), Some(item)) if held.is_similar(item) => {
                let placed = held.count.min(ItemStack::MAX_STACK - item.count).max(0);
                (ClickKind::Primary, resized(held, held.count - placed), change(Some(item.with_count(item.count + placed))))
            }
            (1, Some(held), None) => (ClickKind::Secondary, resized(held, held.count - 1), change(Some(held.with_count(1)))),
            (1, Some(held), Some(item)) if held.is_similar(item) => {
                if item.count >= ItemStack::MAX_STACK {
                    (ClickKind::Secondary, cursor.clone(), vec![])
                } else {
                    (ClickKind::Secondary, resized(held, held.count - 1), change(Some(item.with_count(item.count + 1))))
                }
            }
            // different items trade places
            (0 | 1, Some(held), Some(item)) => {
                let kind = if button == 0 { ClickKind::Primary } else { ClickKind::Secondary };
                (kind, Some(item.clone()), change(Some(held.clone())))
            }
            _ => return None,
        };
        Some((kind, Transaction::new(cursor, cursor_after), slots))
    }

    fn plan_shift(&self, slot: i16, button: i8) -> Plan {
        let kind = match button {
            0 => ClickKind::ShiftPrimary,
            1 => ClickKind::ShiftSecondary,
            _ => return None,
        };
        let (index, current) = self.slot(slot)?;
        let cursor = Transaction::unchanged(self.cursor.clone());
        let Some(item) = current else { return Some((kind, cursor, vec![])) };
        let container = self.container();
        let targets: Vec<usize> = container.shift_targets(index).into_iter().filter(|&t| t != index).collect();
        let (mut slots, rest) = container.peek_offer(&targets, &item);
        if count_of(&rest) < item.count {
            slots.push(SlotTransaction { slot: index, original: Some(item), replacement: rest });
        }
        Some((kind, cursor, slots))
    }

    fn plan_number_press(&self, slot: i16, button: i8) -> Plan {
        let key = u8::try_from(button).ok()?;
        let (index, current) = self.slot(slot)?;
        let Some(hotbar) = self.container().hotbar(key) else {
            log::debug!("unknown hotbar key {button}");
            return None;
        };
        let kind = ClickKind::NumberPress(key);
        let cursor = Transaction::unchanged(self.cursor.clone());
        if self.cursor.is_some() || hotbar == index {
            return Some((kind, cursor, vec![]));
        }
        let in_hotbar = self.container().get(hotbar).cloned();
        let slots = vec![
            SlotTransaction { slot: index, original: current.clone(), replacement: in_hotbar.clone() },
            SlotTransaction { slot: hotbar, original: in_hotbar, replacement: current },
        ];
        Some((kind, cursor, slots))
    }

    fn plan_middle(&self, slot: i16, creative: bool) -> Plan {
        let held = self.cursor.clone();
        let mut cursor = Transaction::unchanged(held.clone());
        if creative && held.is_none() {
            if let Some((_, Some(item))) = self.slot(slot) {
                cursor.replacement = Some(item.with_count(ItemStack::MAX_STACK));
            }
        }
        Some((ClickKind::Middle, cursor, vec![]))
    }

    fn plan_drop(&self, slot: i16, button: i8) -> Plan {
        let kind = match button {
            0 => ClickKind::DropSingle,
            1 => ClickKind::DropFull,
            _ => return None,
        };
        let (index, current) = self.slot(slot)?;
        let cursor = Transaction::unchanged(self.cursor.clone());
        let Some(item) = current else { return Some((kind, cursor, vec![])) };
        let replacement = match kind {
            ClickKind::DropSingle => resized(&item, item.count - 1),
            _ => None,
        };
        Some((kind, cursor, vec![SlotTransaction { slot: index, original: Some(item), replacement }]))
    }

    /// Tops the cursor up from similar stacks, partial ones first.
    fn plan_double(&self, slot: i16, button: i8) -> Plan {
        if button != 0 {
            return None;
        }
        self.slot(slot)?;
        let held = self.cursor.clone();
        let Some(target) = held.clone().filter(|h| h.count < ItemStack::MAX_STACK) else {
            return Some((ClickKind::Double, Transaction::unchanged(held), vec![]));
        };
        let container = self.container();
        let mut count = target.count;
        let mut slots = vec![];
        for full in [false, true] {
            for index in 0..container.len() {
                if count >= ItemStack::MAX_STACK {
                    break;
                }
                let Some(item) = container.get(index) else { continue };
                if !item.is_similar(&target) || (item.count >= ItemStack::MAX_STACK) != full {
                    continue;
                }
                let taken = item.count.min(ItemStack::MAX_STACK - count);
                count += taken;
                slots.push(SlotTransaction { slot: index, original: Some(item.clone()), replacement: resized(item, item.count - taken) });
            }
        }
        Some((ClickKind::Double, Transaction::new(held, Some(target.with_count(count))), slots))
    }

    /// Mode 5: buttons 0/4 start a primary/secondary drag, 1/5 add a slot, 2/6 finish.
    fn plan_drag(&mut self, msg: &ClickWindow) -> Plan {
        let Some(held) = self.cursor.clone() else {
            self.drag = None;
            return None;
        };
        let kind = self.drag.as_ref().map(|d| d.kind);
        match (kind, msg.button) {
            (None, 0) => self.drag = Some(Drag { kind: DragKind::Primary, slots: vec![] }),
            (None, 4) => self.drag = Some(Drag { kind: DragKind::Secondary, slots: vec![] }),
            (Some(DragKind::Primary), 1) | (Some(DragKind::Secondary), 5) => self.add_drag_slot(msg.slot, &held),
            (Some(DragKind::Primary), 2) | (Some(DragKind::Secondary), 6) => {
                let drag = self.drag.take()?;
                return Some(self.finish_drag(drag, held));
            }
            _ => {
                log::debug!("drag button {} out of sequence", msg.button);
                self.drag = None;
            }
        }
        None
    }
    fn add_drag_slot(&mut self, slot: i16, held: &ItemStack) {
        let container = self.container();
        let Some(index) = container.index(slot) else { return };
        let fits = container.get(index).map_or(true, |item| item.is_similar(held));
        if let Some(drag) = &mut self.drag {
            if fits && !drag.slots.contains(&index) {
                drag.slots.push(index);
            }
        }
    }
    fn finish_drag(&self, drag: Drag, held: ItemStack) -> (ClickKind, Transaction, Vec<SlotTransaction>) {
        let container = self.container();
        let (kind, per_slot) = match drag.kind {
            DragKind::Primary if !drag.slots.is_empty() => (ClickKind::DragPrimary, (held.count.max(0) as usize / drag.slots.len()) as i8),
            DragKind::Primary => (ClickKind::DragPrimary, 0),
            DragKind::Secondary => (ClickKind::DragSecondary, 1),
        };
        let mut remaining = held.count;
        let mut slots = vec![];
        for index in drag.slots {
            if remaining <= 0 || per_slot <= 0 {
                break;
            }
            let current = container.get(index).cloned();
            let room = ItemStack::MAX_STACK - count_of(&current);
            let placed = per_slot.min(room).min(remaining);
            if placed <= 0 {
                continue;
            }
            remaining -= placed;
            let replacement = held.with_count(count_of(&current) + placed);
            slots.push(SlotTransaction { slot: index, original: current, replacement: Some(replacement) });
        }
        let cursor = Transaction::new(Some(held.clone()), resized(&held, remaining));
        (kind, cursor, slots)
    }
}
