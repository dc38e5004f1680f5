//! Puddle entities and the fixed-capacity arena that owns them
//!
//! Ids are `(slot, generation)` pairs. Vacating a slot bumps its generation,
//! so an id held past its puddle's lifetime can never resolve to whatever
//! occupies that slot next.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_POOL_SIZE;

/// Generational handle to a puddle in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HazardId {
    pub slot: u8,
    pub generation: u32,
}

impl std::fmt::Display for HazardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "puddle#{}v{}", self.slot, self.generation)
    }
}

/// A puddle on the ground
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: HazardId,
    /// Top-left corner
    pub position: Vec2,
    /// Width and height, strictly positive while active
    pub extents: Vec2,
    /// Visual rotation in radians (does not affect the circular fall zone)
    pub rotation: f32,
    pub active: bool,
}

impl Hazard {
    /// Center of the puddle's bounding rectangle
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.position + self.extents / 2.0
    }

    /// Euclidean distance from a point to the puddle center
    #[inline]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        point.distance(self.center())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    hazard: Option<Hazard>,
}

/// Fixed-capacity slot array owning every live puddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardArena {
    slots: [Slot; MAX_POOL_SIZE],
    /// Live puddles in slot order, rebuilt on every insert/remove
    live: Vec<Hazard>,
}

impl Default for HazardArena {
    fn default() -> Self {
        Self::new()
    }
}

impl HazardArena {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
            live: Vec::with_capacity(MAX_POOL_SIZE),
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.live.len() >= MAX_POOL_SIZE
    }

    /// Place a puddle in the first free slot. Returns `None` when full or
    /// when the extents are not strictly positive.
    pub fn insert(&mut self, position: Vec2, extents: Vec2, rotation: f32) -> Option<HazardId> {
        if !(extents.x > 0.0 && extents.y > 0.0) {
            log::warn!("Refusing puddle with non-positive extents {:?}", extents);
            return None;
        }
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.hazard.is_none())?;

        let id = HazardId {
            slot: index as u8,
            generation: slot.generation,
        };
        slot.hazard = Some(Hazard {
            id,
            position,
            extents,
            rotation,
            active: true,
        });
        self.rebuild_live();
        Some(id)
    }

    /// Retire a puddle, bumping the slot generation. Stale ids are ignored.
    pub fn remove(&mut self, id: HazardId) -> Option<Hazard> {
        let slot = self.slots.get_mut(id.slot as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let mut hazard = slot.hazard.take()?;
        hazard.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.rebuild_live();
        Some(hazard)
    }

    /// Retire every live puddle, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let mut retired = 0;
        for slot in &mut self.slots {
            if slot.hazard.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                retired += 1;
            }
        }
        self.live.clear();
        retired
    }

    /// Resolve an id to its puddle if it is still live
    pub fn get(&self, id: HazardId) -> Option<&Hazard> {
        let slot = self.slots.get(id.slot as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.hazard.as_ref()
    }

    /// Live puddles in slot order
    pub fn as_slice(&self) -> &[Hazard] {
        &self.live
    }

    fn rebuild_live(&mut self) {
        self.live.clear();
        self.live.extend(self.slots.iter().filter_map(|s| s.hazard));
    }
}
