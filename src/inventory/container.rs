use crate::prelude::*;
use super::events::SlotTransaction;
use std::ops::Range;

/// Crafting output, crafting grid, armor.
const PLAYER_UPPER: Range<usize> = 0..9;
const PLAYER_MAIN: Range<usize> = 9..36;
const PLAYER_HOTBAR: Range<usize> = 36..45;
const PLAYER_OFFHAND: usize = 45;
const PLAYER_SLOTS: usize = 46;
/// Main inventory and hotbar, as every other window shows them after its own slots.
const PLAYER_SHARED: Range<usize> = 9..45;

/// The slots of one window, numbered the way the client numbers them.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub window_id: u8,
    slots: Vec<Option<ItemStack>>,
    /// Slots that belong to the window itself. The rest mirror the player's inventory.
    own: usize,
}
impl Container {
    /// Window 0: crafting, armor, main inventory, hotbar and offhand.
    pub fn player() -> Self {
        Self { window_id: 0, slots: vec![None; PLAYER_SLOTS], own: PLAYER_SLOTS }
    }
    /// A window with `size` slots of its own, followed by the player's main inventory and hotbar.
    pub fn window(window_id: u8, size: usize, player: &Container) -> Self {
        let mut slots = vec![None; size];
        slots.extend(player.slots[PLAYER_SHARED].iter().cloned());
        Self { window_id, slots, own: size }
    }
    /// Hands the mirrored player slots back to `player`.
    pub(super) fn return_shared(&self, player: &mut Container) {
        player.slots[PLAYER_SHARED].clone_from_slice(&self.slots[self.own..]);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(Option::as_ref)
    }
    pub fn set(&mut self, slot: usize, item: Option<ItemStack>) -> bool {
        match self.slots.get_mut(slot) {
            Some(s) => {
                *s = item.filter(|i| i.count > 0);
                true
            }
            None => false,
        }
    }
    /// Validates a slot number from the wire.
    pub fn index(&self, slot: i16) -> Option<usize> {
        usize::try_from(slot).ok().filter(|&s| s < self.slots.len())
    }
    /// Where hotbar key `n` lands in this window.
    pub fn hotbar(&self, n: u8) -> Option<usize> {
        let n = n as usize;
        if n >= PLAYER_HOTBAR.len() {
            return None;
        }
        if self.window_id == 0 {
            Some(PLAYER_HOTBAR.start + n)
        } else {
            Some(self.own + PLAYER_MAIN.len() + n)
        }
    }

    /// Slots a shift-click on `from` moves items into, in the order they are tried.
    pub fn shift_targets(&self, from: usize) -> Vec<usize> {
        if self.window_id == 0 {
            if PLAYER_MAIN.contains(&from) {
                PLAYER_HOTBAR.collect()
            } else if PLAYER_HOTBAR.contains(&from) {
                PLAYER_MAIN.collect()
            } else if PLAYER_UPPER.contains(&from) || from == PLAYER_OFFHAND {
                PLAYER_SHARED.collect()
            } else {
                vec![]
            }
        } else if from < self.own {
            (self.own..self.slots.len()).rev().collect()
        } else {
            (0..self.own).collect()
        }
    }

    /// Plans storing `item` in `targets`: topping up similar stacks first, then empty slots.
    ///
    /// Returns the transactions and whatever did not fit.
    pub fn peek_offer(&self, targets: &[usize], item: &ItemStack) -> (Vec<SlotTransaction>, Option<ItemStack>) {
        let mut remaining = item.count;
        let mut transactions = vec![];
        for fill_empty in [false, true] {
            for &slot in targets {
                if remaining <= 0 {
                    break;
                }
                let (current, placed) = match self.slots.get(slot) {
                    Some(Some(current)) if !fill_empty && current.is_similar(item) && current.count < ItemStack::MAX_STACK => {
                        let placed = remaining.min(ItemStack::MAX_STACK - current.count);
                        (Some(current.clone()), current.with_count(current.count + placed))
                    }
                    Some(None) if fill_empty => {
                        let placed = remaining.min(ItemStack::MAX_STACK);
                        (None, item.with_count(placed))
                    }
                    _ => continue,
                };
                remaining -= placed.count - current.as_ref().map_or(0, |c| c.count);
                transactions.push(SlotTransaction { slot, original: current, replacement: Some(placed) });
            }
        }
        let rest = (remaining > 0).then(|| item.with_count(remaining));
        (transactions, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offers_top_up_before_filling_empty_slots() {
        let mut player = Container::player();
        player.set(36, Some(ItemStack::new(1, 60)));
        player.set(38, Some(ItemStack::new(1, 10)));
        let targets: Vec<usize> = PLAYER_HOTBAR.collect();
        let (transactions, rest) = player.peek_offer(&targets, &ItemStack::new(1, 20));
        assert_eq!(rest, None);
        let touched: Vec<(usize, i8)> = transactions
            .iter()
            .map(|t| (t.slot, t.replacement.as_ref().map_or(0, |i| i.count)))
            .collect();
        assert_eq!(touched, [(36, 64), (38, 26)]);
    }

    #[test]
    fn offers_report_what_did_not_fit() {
        let mut player = Container::player();
        for slot in PLAYER_HOTBAR {
            player.set(slot, Some(ItemStack::new(2, 64)));
        }
        player.set(40, Some(ItemStack::new(1, 63)));
        let targets: Vec<usize> = PLAYER_HOTBAR.collect();
        let (transactions, rest) = player.peek_offer(&targets, &ItemStack::new(1, 5));
        assert_eq!(transactions.len(), 1);
        assert_eq!(rest, Some(ItemStack::new(1, 4)));
    }

    #[test]
    fn windows_mirror_the_player_inventory() {
        let mut player = Container::player();
        player.set(36, Some(ItemStack::new(3, 1)));
        let mut chest = Container::window(1, 27, &player);
        assert_eq!(chest.len(), 27 + 36);
        assert_eq!(chest.hotbar(0), Some(27 + 27));
        assert_eq!(chest.get(27 + 27), Some(&ItemStack::new(3, 1)));

        chest.set(27, Some(ItemStack::new(4, 2)));
        chest.return_shared(&mut player);
        assert_eq!(player.get(9), Some(&ItemStack::new(4, 2)));
    }

    #[test]
    fn shift_targets_cross_sections() {
        let player = Container::player();
        assert_eq!(player.shift_targets(10), PLAYER_HOTBAR.collect::<Vec<_>>());
        assert_eq!(player.shift_targets(40), PLAYER_MAIN.collect::<Vec<_>>());
        let chest = Container::window(2, 27, &player);
        assert_eq!(chest.shift_targets(30), (0..27).collect::<Vec<_>>());
        assert_eq!(chest.shift_targets(0).first(), Some(&62));
    }
}
