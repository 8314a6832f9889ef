use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use glam::Mat4;
use tracing::debug;

use crate::attributes::{hash_f32, AttrDomain, AttributeSet};
use crate::geometry_set::GeometrySet;

const MAX_ID_PROBES: u32 = 100;

/// What an instance points at. A relation to the instanced geometry, never
/// ownership of it.
#[derive(Debug, Clone)]
pub enum InstanceRef {
    Geometry(Arc<GeometrySet>),
}

impl PartialEq for InstanceRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (InstanceRef::Geometry(a), InstanceRef::Geometry(b)) => {
                Arc::ptr_eq(a, b) || **a == **b
            }
        }
    }
}

impl Hash for InstanceRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            InstanceRef::Geometry(set) => set.hash(state),
        }
    }
}

/// Instance list: per-instance reference, transform, and optional ids, plus
/// custom per-instance attributes. The id list is either empty (no id
/// attribute) or one entry per instance with -1 marking unset slots.
#[derive(Debug, Default)]
pub struct InstancesComponent {
    references: Vec<InstanceRef>,
    transforms: Vec<Mat4>,
    ids: Vec<i32>,
    pub attributes: AttributeSet,
    // Derived from `ids`; recomputed by whichever reader arrives first.
    almost_unique_cache: Mutex<Option<Arc<[i32]>>>,
}

impl InstancesComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.references.clear();
        self.transforms.clear();
        self.ids.clear();
        self.attributes = AttributeSet::default();
        self.invalidate_id_cache();
    }

    pub fn add_instance(&mut self, reference: InstanceRef, transform: Mat4, id: Option<i32>) {
        if self.ids.is_empty() && id.is_some() {
            self.ids.resize(self.references.len(), -1);
        }
        self.references.push(reference);
        self.transforms.push(transform);
        if !self.ids.is_empty() || id.is_some() {
            self.ids.push(id.unwrap_or(-1));
        }
        self.invalidate_id_cache();
    }

    pub fn instances_count(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn references(&self) -> &[InstanceRef] {
        &self.references
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn transforms_mut(&mut self) -> &mut [Mat4] {
        &mut self.transforms
    }

    pub fn ids(&self) -> &[i32] {
        &self.ids
    }

    pub fn has_ids(&self) -> bool {
        !self.ids.is_empty()
    }

    pub(crate) fn ids_mut(&mut self) -> &mut [i32] {
        self.invalidate_id_cache();
        &mut self.ids
    }

    pub(crate) fn set_ids(&mut self, ids: Vec<i32>) -> bool {
        if ids.len() != self.references.len() {
            return false;
        }
        self.ids = ids;
        self.invalidate_id_cache();
        true
    }

    pub(crate) fn clear_ids(&mut self) -> bool {
        if self.ids.is_empty() {
            return false;
        }
        self.ids.clear();
        self.invalidate_id_cache();
        true
    }

    pub fn attribute_domain_len(&self, domain: AttrDomain) -> usize {
        match domain {
            AttrDomain::Point => self.references.len(),
            AttrDomain::Detail => 1,
            AttrDomain::Vertex | AttrDomain::Primitive => 0,
        }
    }

    /// Ids derived from the raw id list (instance index where unset),
    /// deduplicated by bounded hash probing. Best-effort only: consumers must
    /// tolerate the rare surviving collision.
    pub fn almost_unique_ids(&self) -> Arc<[i32]> {
        let mut cache = self
            .almost_unique_cache
            .lock()
            .expect("instance id cache lock");
        if let Some(ids) = cache.as_ref() {
            return Arc::clone(ids);
        }
        let computed: Arc<[i32]> =
            compute_almost_unique_ids(&self.ids, self.references.len()).into();
        *cache = Some(Arc::clone(&computed));
        computed
    }

    fn invalidate_id_cache(&self) {
        *self
            .almost_unique_cache
            .lock()
            .expect("instance id cache lock") = None;
    }
}

impl Clone for InstancesComponent {
    fn clone(&self) -> Self {
        Self {
            references: self.references.clone(),
            transforms: self.transforms.clone(),
            ids: self.ids.clone(),
            attributes: self.attributes.clone(),
            almost_unique_cache: Mutex::new(None),
        }
    }
}

impl PartialEq for InstancesComponent {
    fn eq(&self, other: &Self) -> bool {
        self.references == other.references
            && self.transforms == other.transforms
            && self.ids == other.ids
            && self.attributes == other.attributes
    }
}

impl Hash for InstancesComponent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.references.len());
        for reference in &self.references {
            reference.hash(state);
        }
        for transform in &self.transforms {
            for component in transform.to_cols_array() {
                hash_f32(component, state);
            }
        }
        self.ids.hash(state);
        self.attributes.hash(state);
    }
}

fn compute_almost_unique_ids(ids: &[i32], count: usize) -> Vec<i32> {
    let mut used = std::collections::HashSet::with_capacity(count);
    let mut out = vec![0; count];
    for (index, slot) in out.iter_mut().enumerate() {
        let raw = ids.get(index).copied().unwrap_or(index as i32);
        let seed = if raw == -1 { index as i32 } else { raw };
        let mut candidate = seed;
        let mut attempt = 0;
        while !used.insert(candidate) {
            attempt += 1;
            if attempt > MAX_ID_PROBES {
                debug!("instance id {seed} kept non-unique after {MAX_ID_PROBES} probes");
                break;
            }
            candidate = scramble_id(seed, attempt);
        }
        *slot = candidate;
    }
    out
}

fn scramble_id(id: i32, attempt: u32) -> i32 {
    let mut x = (id as u32)
        .wrapping_mul(0x9E37_79B9)
        .wrapping_add(attempt.wrapping_mul(0x85EB_CA6B));
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry_ref() -> InstanceRef {
        InstanceRef::Geometry(Arc::new(GeometrySet::new()))
    }

    #[test]
    fn unique_raw_ids_pass_through() {
        let mut instances = InstancesComponent::new();
        for id in [10, 20, 30] {
            instances.add_instance(geometry_ref(), Mat4::IDENTITY, Some(id));
        }
        assert_eq!(&*instances.almost_unique_ids(), &[10, 20, 30]);
    }

    #[test]
    fn duplicate_ids_get_probed_apart() {
        let mut instances = InstancesComponent::new();
        for _ in 0..3 {
            instances.add_instance(geometry_ref(), Mat4::IDENTITY, Some(7));
        }
        let ids = instances.almost_unique_ids();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], 7);
        assert_ne!(ids[1], ids[0]);
        assert_ne!(ids[2], ids[0]);
        assert_ne!(ids[2], ids[1]);
    }

    #[test]
    fn missing_ids_fall_back_to_index() {
        let mut instances = InstancesComponent::new();
        instances.add_instance(geometry_ref(), Mat4::IDENTITY, None);
        instances.add_instance(geometry_ref(), Mat4::IDENTITY, None);
        assert!(!instances.has_ids());
        assert_eq!(&*instances.almost_unique_ids(), &[0, 1]);
    }

    #[test]
    fn mutation_invalidates_the_cache() {
        let mut instances = InstancesComponent::new();
        instances.add_instance(geometry_ref(), Mat4::IDENTITY, Some(1));
        let before = instances.almost_unique_ids();
        assert_eq!(&*before, &[1]);
        instances.add_instance(geometry_ref(), Mat4::IDENTITY, Some(2));
        assert_eq!(&*instances.almost_unique_ids(), &[1, 2]);
    }

    #[test]
    fn late_first_id_backfills_unset_slots() {
        let mut instances = InstancesComponent::new();
        instances.add_instance(geometry_ref(), Mat4::IDENTITY, None);
        instances.add_instance(geometry_ref(), Mat4::IDENTITY, Some(5));
        assert_eq!(instances.ids(), &[-1, 5]);
        // Unset slot falls back to its index.
        assert_eq!(&*instances.almost_unique_ids(), &[0, 5]);
    }
}
