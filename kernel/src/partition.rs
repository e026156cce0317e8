use crate::error::SimError;
use crate::process::Pid;

pub const PARTITION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub capacity: usize,
    pub used: usize,
    pub owner: Option<Pid>,
}

impl Partition {
    fn new(capacity: usize) -> Partition {
        Partition {
            capacity,
            used: 0,
            owner: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }

    pub fn free_bytes(&self) -> usize {
        self.capacity - self.used
    }
}

/// Occupancy of the whole table at one instant, as written to the memory trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub used: usize,
    pub free: usize,
    /// total capacity of partitions nobody is bound to
    pub usable: usize,
    pub used_partitions: Vec<usize>,
    pub free_partitions: Vec<usize>,
}

/// Four fixed partitions. Each one holds at most one process, however small.
#[derive(Debug, Clone)]
pub struct PartitionTable {
    partitions: [Partition; PARTITION_COUNT],
}

impl PartitionTable {
    pub fn new(capacities: [usize; PARTITION_COUNT]) -> PartitionTable {
        PartitionTable {
            partitions: capacities.map(Partition::new),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Partition> {
        self.partitions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter()
    }

    /// First-fit: the first free partition, in index order, large enough for `demand`.
    pub fn first_fit(&self, demand: usize) -> Option<usize> {
        self.partitions
            .iter()
            .position(|p| p.is_free() && demand <= p.capacity)
    }

    /// Binds `index` to `pid`. The caller must have checked the partition with
    /// `first_fit`; anything else is a logic error.
    pub fn allocate(&mut self, index: usize, pid: Pid, demand: usize) -> Result<(), SimError> {
        let partition = self
            .partitions
            .get_mut(index)
            .ok_or_else(|| SimError::invariant(format!("no partition {}", index)))?;
        if let Some(owner) = partition.owner {
            return Err(SimError::invariant(format!(
                "partition {} already bound to process {}",
                index, owner
            )));
        }
        if demand > partition.capacity {
            return Err(SimError::invariant(format!(
                "process {} needs {} but partition {} holds {}",
                pid, demand, index, partition.capacity
            )));
        }
        partition.owner = Some(pid);
        partition.used = demand;
        Ok(())
    }

    /// Returns `index` to the free state.
    pub fn deallocate(&mut self, index: usize) -> Result<(), SimError> {
        let partition = self
            .partitions
            .get_mut(index)
            .ok_or_else(|| SimError::invariant(format!("no partition {}", index)))?;
        if partition.is_free() {
            return Err(SimError::invariant(format!(
                "partition {} released while free",
                index
            )));
        }
        partition.owner = None;
        partition.used = 0;
        Ok(())
    }

    pub fn total_capacity(&self) -> usize {
        self.partitions.iter().map(|p| p.capacity).sum()
    }

    pub fn largest(&self) -> usize {
        self.partitions.iter().map(|p| p.capacity).max().unwrap_or(0)
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        let mut snapshot = MemorySnapshot {
            used: 0,
            free: 0,
            usable: 0,
            used_partitions: Vec::new(),
            free_partitions: Vec::new(),
        };
        for (idx, p) in self.partitions.iter().enumerate() {
            snapshot.free += p.free_bytes();
            if p.is_free() {
                snapshot.usable += p.capacity;
                snapshot.free_partitions.push(idx);
            } else {
                snapshot.used += p.used;
                snapshot.used_partitions.push(idx);
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fit_ignores_better_fit_later() {
        let table = PartitionTable::new([500, 250, 150, 100]);
        // 100 fits partition 3 exactly, but 0 is scanned first
        assert_eq!(table.first_fit(100), Some(0));
        assert_eq!(table.first_fit(501), None);
    }

    #[test]
    fn first_fit_skips_bound_partitions() {
        let mut table = PartitionTable::new([300, 300, 350, 50]);
        table.allocate(0, 1, 200).unwrap();
        assert_eq!(table.first_fit(200), Some(1));
        table.allocate(1, 2, 10).unwrap();
        assert_eq!(table.first_fit(200), Some(2));
        assert_eq!(table.first_fit(40), Some(2));
    }

    #[test]
    fn allocate_twice_is_an_invariant_violation() {
        let mut table = PartitionTable::new([100, 100, 100, 100]);
        table.allocate(2, 1, 50).unwrap();
        assert!(matches!(
            table.allocate(2, 9, 50),
            Err(SimError::Invariant(_))
        ));
        assert!(matches!(
            table.allocate(3, 9, 150),
            Err(SimError::Invariant(_))
        ));
    }

    #[test]
    fn deallocate_resets_partition() {
        let mut table = PartitionTable::new([100, 100, 100, 100]);
        table.allocate(1, 4, 60).unwrap();
        table.deallocate(1).unwrap();
        let p = table.get(1).unwrap();
        assert!(p.is_free());
        assert_eq!(p.used, 0);
        assert_eq!(p.free_bytes(), 100);
        assert!(table.deallocate(1).is_err());
    }

    #[test]
    fn snapshot_reports_internal_fragmentation() {
        let mut table = PartitionTable::new([500, 250, 150, 100]);
        table.allocate(0, 1, 120).unwrap();
        table.allocate(2, 2, 150).unwrap();
        let snap = table.snapshot();
        assert_eq!(snap.used, 270);
        assert_eq!(snap.free, 380 + 250 + 0 + 100);
        assert_eq!(snap.usable, 350);
        assert_eq!(snap.used_partitions, vec![0, 2]);
        assert_eq!(snap.free_partitions, vec![1, 3]);
    }
}
