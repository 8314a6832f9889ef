use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::component::{GeometryComponent, GeometryComponentKind, GeometryOwnership};
use crate::mesh::{Aabb, Mesh};
use crate::point_cloud::PointCloud;
use crate::volume::Volume;

/// A set of geometry components, at most one per kind. Components are shared
/// between sets by reference count; write access clones shared components
/// first, so copying a set is O(kinds present), never O(data size).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometrySet {
    components: BTreeMap<GeometryComponentKind, Arc<GeometryComponent>>,
}

impl GeometrySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, kind: GeometryComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get_component_for_read(
        &self,
        kind: GeometryComponentKind,
    ) -> Option<&GeometryComponent> {
        self.components.get(&kind).map(Arc::as_ref)
    }

    /// Mutable component of the kind, created empty on first access. A
    /// shared entry is privately cloned before it is returned.
    pub fn get_component_for_write(
        &mut self,
        kind: GeometryComponentKind,
    ) -> &mut GeometryComponent {
        let entry = self
            .components
            .entry(kind)
            .or_insert_with(|| Arc::new(GeometryComponent::new(kind)));
        Arc::make_mut(entry)
    }

    /// Inserts the component, replacing any existing entry of its kind. The
    /// caller's handle stays valid; the data is shared until written.
    pub fn add(&mut self, component: Arc<GeometryComponent>) {
        self.components.insert(component.kind(), component);
    }

    pub fn remove(&mut self, kind: GeometryComponentKind) {
        self.components.remove(&kind);
    }

    pub fn clear(&mut self) {
        self.components.clear();
    }

    /// Whether the stored component of this kind is uniquely referenced and
    /// therefore mutable in place.
    pub fn component_is_mutable(&self, kind: GeometryComponentKind) -> bool {
        self.components
            .get(&kind)
            .is_some_and(|component| Arc::strong_count(component) == 1)
    }

    pub fn components_for_read(&self) -> Vec<&GeometryComponent> {
        self.components.values().map(Arc::as_ref).collect()
    }

    /// Deep-copies every borrowed payload so the set stays valid after the
    /// context that produced it ends. Instance components are exempt: they
    /// reference geometry, they do not own it.
    pub fn ensure_owns_direct_data(&mut self) {
        for entry in self.components.values_mut() {
            if entry.owns_direct_data() {
                continue;
            }
            Arc::make_mut(entry).ensure_owns_direct_data();
        }
    }

    pub fn compute_bounds_without_instances(&self) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        let mut merge = |other: Option<Aabb>| {
            if let Some(other) = other {
                bounds = Some(match bounds {
                    Some(current) => current.union(other),
                    None => other,
                });
            }
        };
        merge(self.get_mesh_for_read().and_then(Mesh::bounds));
        merge(self.get_pointcloud_for_read().and_then(PointCloud::bounds));
        merge(
            self.get_volume_for_read()
                .filter(|volume| !volume.is_empty())
                .map(Volume::world_bounds),
        );
        bounds
    }

    pub fn create_with_mesh(mesh: Arc<Mesh>, ownership: GeometryOwnership) -> Self {
        let mut set = Self::new();
        set.replace_mesh(mesh, ownership);
        set
    }

    pub fn create_with_pointcloud(
        pointcloud: Arc<PointCloud>,
        ownership: GeometryOwnership,
    ) -> Self {
        let mut set = Self::new();
        set.replace_pointcloud(pointcloud, ownership);
        set
    }

    pub fn create_with_volume(volume: Arc<Volume>, ownership: GeometryOwnership) -> Self {
        let mut set = Self::new();
        set.replace_volume(volume, ownership);
        set
    }

    pub fn replace_mesh(&mut self, mesh: Arc<Mesh>, ownership: GeometryOwnership) {
        if let Some(component) = self
            .get_component_for_write(GeometryComponentKind::Mesh)
            .as_mesh_mut()
        {
            component.replace(mesh, ownership);
        }
    }

    pub fn replace_pointcloud(&mut self, pointcloud: Arc<PointCloud>, ownership: GeometryOwnership) {
        if let Some(component) = self
            .get_component_for_write(GeometryComponentKind::PointCloud)
            .as_point_cloud_mut()
        {
            component.replace(pointcloud, ownership);
        }
    }

    pub fn replace_volume(&mut self, volume: Arc<Volume>, ownership: GeometryOwnership) {
        if let Some(component) = self
            .get_component_for_write(GeometryComponentKind::Volume)
            .as_volume_mut()
        {
            component.replace(volume, ownership);
        }
    }

    pub fn has_mesh(&self) -> bool {
        self.get_mesh_for_read().is_some()
    }

    pub fn has_pointcloud(&self) -> bool {
        self.get_pointcloud_for_read().is_some()
    }

    pub fn has_volume(&self) -> bool {
        self.get_volume_for_read().is_some()
    }

    pub fn has_instances(&self) -> bool {
        self.get_component_for_read(GeometryComponentKind::Instances)
            .is_some_and(|component| !component.is_empty())
    }

    pub fn get_mesh_for_read(&self) -> Option<&Mesh> {
        self.get_component_for_read(GeometryComponentKind::Mesh)?
            .as_mesh()?
            .get_for_read()
    }

    pub fn get_pointcloud_for_read(&self) -> Option<&PointCloud> {
        self.get_component_for_read(GeometryComponentKind::PointCloud)?
            .as_point_cloud()?
            .get_for_read()
    }

    pub fn get_volume_for_read(&self) -> Option<&Volume> {
        self.get_component_for_read(GeometryComponentKind::Volume)?
            .as_volume()?
            .get_for_read()
    }

    pub fn get_mesh_for_write(&mut self) -> Option<&mut Mesh> {
        self.get_component_for_write(GeometryComponentKind::Mesh)
            .as_mesh_mut()?
            .get_for_write()
    }

    pub fn get_pointcloud_for_write(&mut self) -> Option<&mut PointCloud> {
        self.get_component_for_write(GeometryComponentKind::PointCloud)
            .as_point_cloud_mut()?
            .get_for_write()
    }

    pub fn get_volume_for_write(&mut self) -> Option<&mut Volume> {
        self.get_component_for_write(GeometryComponentKind::Volume)
            .as_volume_mut()?
            .get_for_write()
    }
}

impl Hash for GeometrySet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.components.len());
        for (kind, component) in &self.components {
            kind.hash(state);
            component.hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttrDomain, AttrStorage, AttributeInit};
    use crate::varray::VArray;
    use geoset_types::{AttrType, AttrValue};
    use std::collections::hash_map::DefaultHasher;

    fn mesh_set() -> GeometrySet {
        let mesh = Mesh::with_positions_indices(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        );
        GeometrySet::create_with_mesh(Arc::new(mesh), GeometryOwnership::Owned)
    }

    fn hash_of(set: &GeometrySet) -> u64 {
        let mut hasher = DefaultHasher::new();
        set.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn write_access_creates_empty_component() {
        let mut set = GeometrySet::new();
        assert!(!set.has(GeometryComponentKind::PointCloud));
        let component = set.get_component_for_write(GeometryComponentKind::PointCloud);
        assert!(component.is_empty());
        assert!(set.has(GeometryComponentKind::PointCloud));
    }

    #[test]
    fn copies_share_components_until_written() {
        let set_a = mesh_set();
        let set_b = set_a.clone();
        assert!(!set_a.component_is_mutable(GeometryComponentKind::Mesh));
        assert!(!set_b.component_is_mutable(GeometryComponentKind::Mesh));
        drop(set_b);
        assert!(set_a.component_is_mutable(GeometryComponentKind::Mesh));
    }

    #[test]
    fn mutating_a_copy_leaves_the_original_unchanged() {
        let mut set_a = mesh_set();
        {
            let component = set_a.get_component_for_write(GeometryComponentKind::Mesh);
            assert!(component.attribute_try_create(
                "mass",
                AttrDomain::Point,
                AttrType::Float,
                AttributeInit::FromView(VArray::Owned(AttrStorage::Float(vec![1.0, 2.0, 3.0]))),
            ));
        }

        let mut set_b = set_a.clone();
        {
            let component = set_b.get_component_for_write(GeometryComponentKind::Mesh);
            let mut output = component
                .attribute_try_get_for_output("mass", AttrDomain::Point, AttrType::Float, None)
                .unwrap();
            output.fill(AttrValue::Float(9.0));
            output.save();
        }

        let read = |set: &GeometrySet| {
            let component = set
                .get_component_for_read(GeometryComponentKind::Mesh)
                .unwrap();
            let (varray, _) = component.attribute_try_get_for_read("mass").unwrap();
            varray.materialize()
        };
        assert_eq!(read(&set_a), AttrStorage::Float(vec![1.0, 2.0, 3.0]));
        assert_eq!(read(&set_b), AttrStorage::Float(vec![9.0, 9.0, 9.0]));
    }

    #[test]
    fn add_replaces_and_shares() {
        let mut set_a = mesh_set();
        let mut set_b = GeometrySet::new();
        let component = set_a.components.get(&GeometryComponentKind::Mesh).unwrap();
        set_b.add(Arc::clone(component));
        assert_eq!(set_a, set_b);
        assert!(!set_b.component_is_mutable(GeometryComponentKind::Mesh));

        set_a.remove(GeometryComponentKind::Mesh);
        assert!(!set_a.has(GeometryComponentKind::Mesh));
        assert!(set_b.component_is_mutable(GeometryComponentKind::Mesh));
    }

    #[test]
    fn equal_sets_hash_alike() {
        let set_a = mesh_set();
        let set_b = set_a.clone();
        assert_eq!(set_a, set_b);
        assert_eq!(hash_of(&set_a), hash_of(&set_b));

        let mut set_c = set_b.clone();
        if let Some(mesh) = set_c.get_mesh_for_write() {
            mesh.positions[0] = [5.0, 5.0, 5.0];
        }
        assert_ne!(set_a, set_c);
    }

    #[test]
    fn ensure_owns_direct_data_copies_borrowed_payloads() {
        let producer_mesh = Arc::new(Mesh::with_positions_indices(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        ));
        let mut set =
            GeometrySet::create_with_mesh(Arc::clone(&producer_mesh), GeometryOwnership::ReadOnly);
        let component = set
            .get_component_for_read(GeometryComponentKind::Mesh)
            .unwrap();
        assert!(!component.owns_direct_data());

        set.ensure_owns_direct_data();
        let component = set
            .get_component_for_read(GeometryComponentKind::Mesh)
            .unwrap();
        assert!(component.owns_direct_data());

        // The producer's copy is untouched by later writes.
        if let Some(mesh) = set.get_mesh_for_write() {
            mesh.positions[0] = [7.0, 7.0, 7.0];
        }
        assert_eq!(producer_mesh.positions[0], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn bounds_skip_instances() {
        use crate::instances::{InstanceRef, InstancesComponent};
        use glam::Mat4;

        let mut set = mesh_set();
        let mut instances = InstancesComponent::new();
        instances.add_instance(
            InstanceRef::Geometry(Arc::new(mesh_set())),
            Mat4::from_translation(glam::Vec3::splat(100.0)),
            None,
        );
        set.add(Arc::new(GeometryComponent::Instances(instances)));

        let bounds = set.compute_bounds_without_instances().unwrap();
        assert_eq!(bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(bounds.max, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn replace_swaps_the_payload() {
        let mut set = mesh_set();
        assert!(set.has_mesh());
        let other = Arc::new(Mesh::with_positions_indices(
            vec![[2.0, 0.0, 0.0], [3.0, 0.0, 0.0], [2.0, 1.0, 0.0]],
            vec![0, 1, 2],
        ));
        set.replace_mesh(other, GeometryOwnership::Owned);
        assert_eq!(set.get_mesh_for_read().unwrap().positions[0], [2.0, 0.0, 0.0]);
        assert!(!set.has_pointcloud());
        assert!(set.get_pointcloud_for_read().is_none());
    }
}
