//! A small generational arena used for the factor graph's factor nodes.
//!
//! Factors are inserted and removed frequently during variable elimination,
//! so indices must stay stable across removals and must not silently alias
//! a freed-then-reused slot. Removal marks a slot free and pushes it onto a
//! free list; the next insert reuses it with a bumped generation. Any
//! iteration that removes entries as it goes must snapshot the key list
//! before it starts removing.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArenaKey {
    index: usize,
    generation: u32,
}

impl AsRef<ArenaKey> for ArenaKey {
    fn as_ref(&self) -> &ArenaKey {
        self
    }
}

enum Slot<T> {
    Occupied { value: T, generation: u32 },
    Free { next_free: Option<usize>, generation: u32 },
}

pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, item: T) -> ArenaKey {
        self.len += 1;
        if let Some(index) = self.free_head {
            let (next_free, generation) = match &self.slots[index] {
                Slot::Free {
                    next_free,
                    generation,
                } => (*next_free, *generation),
                Slot::Occupied { .. } => unreachable!("free_head must point at a free slot"),
            };
            self.free_head = next_free;
            self.slots[index] = Slot::Occupied {
                value: item,
                generation,
            };
            ArenaKey { index, generation }
        } else {
            let index = self.slots.len();
            self.slots.push(Slot::Occupied {
                value: item,
                generation: 0,
            });
            ArenaKey {
                index,
                generation: 0,
            }
        }
    }

    pub fn remove(&mut self, key: impl AsRef<ArenaKey>) -> Option<T> {
        let key = key.as_ref();
        match self.slots.get(key.index) {
            Some(Slot::Occupied { generation, .. }) if *generation == key.generation => {}
            _ => return None,
        }

        let slot = std::mem::replace(
            &mut self.slots[key.index],
            Slot::Free {
                next_free: self.free_head,
                generation: key.generation.wrapping_add(1),
            },
        );
        self.free_head = Some(key.index);
        self.len -= 1;
        match slot {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Free { .. } => None,
        }
    }

    pub fn get(&self, key: impl AsRef<ArenaKey>) -> Option<&T> {
        let key = key.as_ref();
        match self.slots.get(key.index) {
            Some(Slot::Occupied { value, generation }) if *generation == key.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: impl AsRef<ArenaKey>) -> Option<&mut T> {
        let key = key.as_ref();
        match self.slots.get_mut(key.index) {
            Some(Slot::Occupied { value, generation }) if *generation == key.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// A snapshot of the keys currently occupied, safe to iterate while
    /// mutating/removing from the arena.
    pub fn keys(&self) -> Vec<ArenaKey> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, .. } => Some(ArenaKey {
                    index,
                    generation: *generation,
                }),
                Slot::Free { .. } => None,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArenaKey, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| match slot {
            Slot::Occupied { value, generation } => Some((
                ArenaKey {
                    index,
                    generation: *generation,
                },
                value,
            )),
            Slot::Free { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Arena;

    #[test]
    fn insert_and_get() {
        let mut arena = Arena::new();
        let key1 = arena.insert(10);
        let key2 = arena.insert(20);

        assert_eq!(arena.get(key1), Some(&10));
        assert_eq!(arena.get(key2), Some(&20));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn remove_frees_slot_and_bumps_generation() {
        let mut arena = Arena::new();
        let key1 = arena.insert(10);
        assert_eq!(arena.remove(key1), Some(10));
        assert_eq!(arena.get(key1), None);
        assert_eq!(arena.len(), 0);

        let key2 = arena.insert(20);
        assert_eq!(arena.get(key2), Some(&20));
        // Stale key from before the removal must not alias the new value.
        assert_eq!(arena.get(key1), None);
    }

    #[test]
    fn snapshot_keys_survive_concurrent_removal() {
        let mut arena = Arena::new();
        let keys: Vec<_> = (0..5).map(|i| arena.insert(i)).collect();
        let snapshot = arena.keys();
        assert_eq!(snapshot.len(), 5);

        arena.remove(keys[2]);
        // The snapshot taken before removal still lists the removed key;
        // looking it up now correctly yields nothing.
        assert!(snapshot.contains(&keys[2]));
        assert_eq!(arena.get(keys[2]), None);
    }
}
