/// Stable indices into a vector, reusing freed slots.
///
/// Free slots form a linked list through `Err(next)`, headed by `head`.
#[derive(Debug)]
pub struct SlotMap<T> {
    head: u32,
    entries: Vec<Result<T, u32>>,
}
impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> SlotMap<T> {
    pub fn new() -> Self {
        Self {
            head: u32::MAX,
            entries: vec![],
        }
    }
    pub fn get(&mut self, i: usize) -> Option<&mut T> {
        self.entries.get_mut(i).and_then(|r| r.as_mut().ok())
    }
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_ok()).count()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// The index the next [`SlotMap::insert`] will use.
    pub fn next_idx(&self) -> usize {
        if self.head == u32::MAX {
            self.entries.len()
        } else {
            self.head as usize
        }
    }
    pub fn insert(&mut self, value: T) -> usize {
        let id = self.next_idx();
        match self.entries.get_mut(id) {
            None => self.entries.push(Ok(value)),
            Some(slot) => {
                if let Err(next) = core::mem::replace(slot, Ok(value)) {
                    self.head = next;
                }
            }
        }
        id
    }
    pub fn release(&mut self, i: usize) -> Option<T> {
        self.entries.get_mut(i).and_then(|r| {
            match core::mem::replace(r, Err(self.head)) {
                Ok(v) => {
                    self.head = i as u32;
                    Some(v)
                }
                Err(i) => {
                    *r = Err(i);
                    None
                }
            }
        })
    }
    pub fn retain(&mut self, mut f: impl FnMut(usize, &mut T) -> bool) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if let Ok(item) = entry {
                if !f(i, item) {
                    *entry = Err(core::mem::replace(&mut self.head, i as u32));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_slots_are_reused() {
        let mut map = SlotMap::new();
        let a = map.insert("a");
        let b = map.insert("b");
        assert_eq!(map.release(a), Some("a"));
        assert_eq!(map.release(a), None);
        assert_eq!(map.next_idx(), a);
        assert_eq!(map.insert("c"), a);
        assert_eq!(map.get(b), Some(&mut "b"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn retain_frees_rejected_entries() {
        let mut map = SlotMap::new();
        for i in 0..4 {
            map.insert(i);
        }
        map.retain(|_, v| *v % 2 == 0);
        assert_eq!(map.len(), 2);
        assert!(map.get(1).is_none());
        let reused = map.insert(10);
        assert!(reused == 1 || reused == 3);
        assert_eq!(map.insert(11), 4 - reused);
    }
}
