use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OcrdeskError;

use super::region::Region;

/// Owns a page's regions and maintains their reading order.
///
/// Invariant: the `order` values of the stored regions are exactly
/// `0..len()`, each used once. Every mutation re-establishes this before
/// returning, so a crash between operations can never persist a gap or a
/// duplicate.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegionStore {
    regions: Vec<Region>,
}

impl RegionStore {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Inserts a region, returning its id.
    ///
    /// With `order: None` the region is appended at the end of the reading
    /// order. An explicit order takes that position and shifts the region
    /// previously holding it, and everything after, one step back.
    pub fn insert(&mut self, mut region: Region, order: Option<usize>) -> Uuid {
        let target = order.unwrap_or(self.regions.len()).min(self.regions.len());
        for existing in &mut self.regions {
            if existing.order >= target {
                existing.order += 1;
            }
        }
        region.order = target;
        let id = region.id;
        self.regions.push(region);
        id
    }

    /// Removes a region by id, re-packing the remaining orders densely.
    pub fn remove(&mut self, id: Uuid) -> Option<Region> {
        let index = self.regions.iter().position(|r| r.id == id)?;
        let removed = self.regions.remove(index);
        self.renumber();
        Some(removed)
    }

    /// Swaps the reading-order positions of two regions.
    pub fn swap_orders(&mut self, a: Uuid, b: Uuid) -> Result<(), OcrdeskError> {
        let order_a = self
            .get(a)
            .ok_or(OcrdeskError::RegionNotFound { id: a })?
            .order;
        let order_b = self
            .get(b)
            .ok_or(OcrdeskError::RegionNotFound { id: b })?
            .order;

        for region in &mut self.regions {
            if region.id == a {
                region.order = order_b;
            } else if region.id == b {
                region.order = order_a;
            }
        }
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    pub fn by_order(&self, order: usize) -> Option<&Region> {
        self.regions.iter().find(|r| r.order == order)
    }

    /// Iterates regions in storage order, not reading order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Regions sorted by reading order.
    pub fn ordered(&self) -> Vec<&Region> {
        let mut regions: Vec<&Region> = self.regions.iter().collect();
        regions.sort_by_key(|r| r.order);
        regions
    }

    /// Topmost region containing `point`, where topmost means latest in
    /// reading order.
    pub fn region_at(&self, point: glam::Vec2) -> Option<&Region> {
        self.regions
            .iter()
            .filter(|r| r.bbox.contains_point(point))
            .max_by_key(|r| r.order)
    }

    fn renumber(&mut self) {
        let mut indices: Vec<usize> = (0..self.regions.len()).collect();
        indices.sort_by_key(|&i| self.regions[i].order);
        for (order, index) in indices.into_iter().enumerate() {
            self.regions[index].order = order;
        }
    }
}
