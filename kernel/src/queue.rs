use std::collections::VecDeque;

/// Index of a record in the simulation's process arena.
pub type Slot = usize;

/// An insertion-ordered list of arena slots, one per lifecycle collection.
#[derive(Debug, Default, Clone)]
pub struct ProcessQueue {
    slots: VecDeque<Slot>,
}

impl ProcessQueue {
    pub fn new() -> Self {
        ProcessQueue {
            slots: VecDeque::new(),
        }
    }

    pub fn push_back(&mut self, slot: Slot) {
        self.slots.push_back(slot);
    }

    /// Removes `slot` wherever it is, keeping the order of its neighbours.
    pub fn remove(&mut self, slot: Slot) -> Option<Slot> {
        let pos = self.slots.iter().position(|&s| s == slot)?;
        self.slots.remove(pos)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.slots.contains(&slot)
    }

    /// A copy of the current order; scans that move records iterate over this.
    pub fn snapshot(&self) -> Vec<Slot> {
        self.slots.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_keeps_neighbour_order() {
        let mut q = ProcessQueue::new();
        for slot in [4, 1, 7, 3] {
            q.push_back(slot);
        }
        assert_eq!(q.remove(7), Some(7));
        assert_eq!(q.snapshot(), vec![4, 1, 3]);
        assert_eq!(q.remove(9), None);
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn keeps_insertion_order() {
        let mut q = ProcessQueue::new();
        q.push_back(2);
        q.push_back(0);
        assert_eq!(q.iter().collect::<Vec<_>>(), vec![2, 0]);
        assert!(q.contains(0));
        q.remove(2);
        q.remove(0);
        assert!(q.is_empty());
    }
}
