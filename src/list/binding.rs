//! Per-row presentation state with stale-result protection.
//!
//! Each visible row owns a [`RowSlot`]. Binding an entity to a slot applies
//! the seeded fallback color immediately and hands back a [`BindTicket`];
//! artwork and palette results are applied only if they carry the ticket of
//! the slot's current binding. Rebinding or clearing a slot bumps its
//! generation, so late results for the old entity are dropped.

use super::{CompositeList, ListItem, Themed};
use crate::color::{derive_background_color, fallback_color, ColorCandidateSet, Rgba};
use image::RgbaImage;
use std::sync::Arc;

/// Identifies one binding of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindTicket {
    pub slot: usize,
    pub generation: u64,
    pub entity_id: i64,
}

/// Artwork load to start for a freshly bound row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    pub ticket: BindTicket,
    pub artwork: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RowSlot {
    entity_id: Option<i64>,
    generation: u64,
    seed: String,
    artwork: Option<String>,
    color: Option<Rgba>,
    cover: Option<Arc<RgbaImage>>,
    palette_applied: bool,
}

impl RowSlot {
    fn empty(generation: u64) -> Self {
        Self {
            entity_id: None,
            generation,
            seed: String::new(),
            artwork: None,
            color: None,
            cover: None,
            palette_applied: false,
        }
    }

    pub fn entity_id(&self) -> Option<i64> {
        self.entity_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this slot already shows `entity` as it is now.
    fn shows<E: Themed>(&self, entity: &E) -> bool {
        self.entity_id == Some(entity.id())
            && self.seed == entity.color_seed()
            && self.artwork.as_deref() == entity.artwork()
    }

    /// Background for the bound entity; `None` for unbound rows.
    pub fn color(&self) -> Option<Rgba> {
        self.color
    }

    pub fn cover(&self) -> Option<&Arc<RgbaImage>> {
        self.cover.as_ref()
    }

    /// Whether a palette result (present or absent) has landed.
    pub fn palette_applied(&self) -> bool {
        self.palette_applied
    }
}

/// Row slots for one list.
#[derive(Debug, Default)]
pub struct RowSlots {
    slots: Vec<RowSlot>,
    next_generation: u64,
}

impl RowSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&RowSlot> {
        self.slots.get(slot)
    }

    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn ensure(&mut self, slot: usize) {
        while self.slots.len() <= slot {
            let generation = self.bump();
            self.slots.push(RowSlot::empty(generation));
        }
    }

    /// Bind `entity_id` to `slot`, painting the seeded fallback color now.
    pub fn bind(&mut self, slot: usize, entity_id: i64, seed: &str) -> BindTicket {
        self.bind_with_artwork(slot, entity_id, seed, None)
    }

    fn bind_with_artwork(
        &mut self,
        slot: usize,
        entity_id: i64,
        seed: &str,
        artwork: Option<&str>,
    ) -> BindTicket {
        self.ensure(slot);
        let generation = self.bump();
        self.slots[slot] = RowSlot {
            entity_id: Some(entity_id),
            generation,
            seed: seed.to_owned(),
            artwork: artwork.map(str::to_owned),
            color: Some(fallback_color(seed)),
            cover: None,
            palette_applied: false,
        };
        tracing::trace!(slot, generation, entity_id, "Row bound");
        BindTicket {
            slot,
            generation,
            entity_id,
        }
    }

    /// Unbind `slot`. Outstanding tickets for it become stale.
    pub fn clear(&mut self, slot: usize) {
        self.ensure(slot);
        let generation = self.bump();
        self.slots[slot] = RowSlot::empty(generation);
    }

    /// Unbind every slot so the next [`sync`](Self::sync) rebinds all rows.
    pub fn reset(&mut self) {
        for slot in 0..self.slots.len() {
            self.clear(slot);
        }
    }

    pub fn is_current(&self, ticket: &BindTicket) -> bool {
        self.slots
            .get(ticket.slot)
            .is_some_and(|s| s.generation == ticket.generation)
    }

    /// Show decoded artwork. Returns `false` for a stale ticket.
    pub fn attach_cover(&mut self, ticket: &BindTicket, cover: Arc<RgbaImage>) -> bool {
        let Some(slot) = self.current_mut(ticket, "artwork") else {
            return false;
        };
        slot.cover = Some(cover);
        true
    }

    /// Apply a palette result. `None` keeps the seeded fallback. Returns
    /// `false` for a stale ticket.
    pub fn apply_candidates(
        &mut self,
        ticket: &BindTicket,
        candidates: Option<&ColorCandidateSet>,
    ) -> bool {
        let Some(slot) = self.current_mut(ticket, "palette") else {
            return false;
        };
        slot.color = Some(derive_background_color(candidates, &slot.seed));
        slot.palette_applied = true;
        true
    }

    fn current_mut(&mut self, ticket: &BindTicket, what: &'static str) -> Option<&mut RowSlot> {
        match self.slots.get_mut(ticket.slot) {
            Some(slot) if slot.generation == ticket.generation => Some(slot),
            current => {
                tracing::debug!(
                    slot = ticket.slot,
                    ticket_generation = ticket.generation,
                    current_generation = current.map(|s| s.generation),
                    what,
                    "Ignoring stale row result (generation mismatch)"
                );
                None
            }
        }
    }

    /// Bring slots in line with `list`.
    ///
    /// Rows whose entity, seed or artwork changed are rebound and returned
    /// as loads to start.
    /// Rows that are no longer real are cleared; surplus slots are dropped.
    pub fn sync<E: Themed>(&mut self, list: &CompositeList<E>) -> Vec<PendingLoad> {
        let mut loads = Vec::new();
        for (position, item) in list.iter().enumerate() {
            match item {
                ListItem::Real(entity) => {
                    if self.slots.get(position).is_some_and(|s| s.shows(entity)) {
                        continue;
                    }
                    let ticket = self.bind_with_artwork(
                        position,
                        entity.id(),
                        entity.color_seed(),
                        entity.artwork(),
                    );
                    loads.push(PendingLoad {
                        ticket,
                        artwork: entity.artwork().map(str::to_owned),
                    });
                }
                ListItem::Placeholder | ListItem::TrailingAction(_) => {
                    let bound = self.slots.get(position).map(RowSlot::entity_id);
                    if bound != Some(None) {
                        self.clear(position);
                    }
                }
            }
        }
        self.slots.truncate(list.len());
        loads
    }
}
