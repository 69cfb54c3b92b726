//! Generational slot storage behind surface and context handles.
//!
//! A freed slot bumps its generation, so a handle kept past `remove` no
//! longer resolves instead of aliasing whatever reuses the slot.

use alloc::vec::Vec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct RawHandle {
    index: u32,
    generation: u32,
}

pub(crate) trait ArenaKey: Copy {
    fn from_raw(raw: RawHandle) -> Self;
    fn raw(self) -> RawHandle;
}

macro_rules! arena_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(crate::arena::RawHandle);

        impl crate::arena::ArenaKey for $name {
            fn from_raw(raw: crate::arena::RawHandle) -> Self {
                Self(raw)
            }
            fn raw(self) -> crate::arena::RawHandle {
                self.0
            }
        }
    };
}
pub(crate) use arena_key;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub(crate) struct Arena<K, T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    _key: core::marker::PhantomData<K>,
}

impl<K: ArenaKey, T> Arena<K, T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            _key: core::marker::PhantomData,
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> K {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return K::from_raw(RawHandle {
                index,
                generation: slot.generation,
            });
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        K::from_raw(RawHandle {
            index,
            generation: 0,
        })
    }

    pub(crate) fn get(&self, key: K) -> Option<&T> {
        let raw = key.raw();
        self.slots
            .get(raw.index as usize)
            .filter(|slot| slot.generation == raw.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, key: K) -> Option<&mut T> {
        let raw = key.raw();
        self.slots
            .get_mut(raw.index as usize)
            .filter(|slot| slot.generation == raw.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Shared access to `a` and exclusive access to `b`. Fails when the keys
    /// name the same slot.
    pub(crate) fn get_pair(&mut self, a: K, b: K) -> Option<(&T, &mut T)> {
        let (ra, rb) = (a.raw(), b.raw());
        if ra.index == rb.index {
            return None;
        }
        self.get(a)?;
        self.get(b)?;
        let (ia, ib) = (ra.index as usize, rb.index as usize);
        if ia < ib {
            let (lo, hi) = self.slots.split_at_mut(ib);
            Some((lo[ia].value.as_ref()?, hi[0].value.as_mut()?))
        } else {
            let (lo, hi) = self.slots.split_at_mut(ia);
            Some((hi[0].value.as_ref()?, lo[ib].value.as_mut()?))
        }
    }

    pub(crate) fn remove(&mut self, key: K) -> Option<T> {
        let raw = key.raw();
        let slot = self.slots.get_mut(raw.index as usize)?;
        if slot.generation != raw.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(raw.index);
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
