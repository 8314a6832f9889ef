use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use geoset_types::{AttrType, AttrValue};

use crate::access::{AttributeAccess, OutputAttribute};
use crate::adapt::{adapt_mesh_domain, adapt_trivial};
use crate::attributes::{AttrDomain, AttributeInit, AttributeMetaData, AttributeSet};
use crate::instances::InstancesComponent;
use crate::mesh::Mesh;
use crate::point_cloud::PointCloud;
use crate::providers::{
    ComponentProviders, INSTANCES_PROVIDERS, MESH_PROVIDERS, POINT_CLOUD_PROVIDERS,
    VOLUME_PROVIDERS,
};
use crate::varray::VArray;
use crate::volume::Volume;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeometryComponentKind {
    Mesh,
    PointCloud,
    Volume,
    Instances,
}

impl GeometryComponentKind {
    pub const ALL: [GeometryComponentKind; 4] = [
        GeometryComponentKind::Mesh,
        GeometryComponentKind::PointCloud,
        GeometryComponentKind::Volume,
        GeometryComponentKind::Instances,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GeometryComponentKind::Mesh => "mesh",
            GeometryComponentKind::PointCloud => "point_cloud",
            GeometryComponentKind::Volume => "volume",
            GeometryComponentKind::Instances => "instances",
        }
    }
}

/// How a component relates to its bulk data. `Owned` data dies with the last
/// reference; `Editable` data may be mutated in place but is freed elsewhere;
/// `ReadOnly` data must never be mutated, a write deep-copies first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryOwnership {
    Owned,
    Editable,
    ReadOnly,
}

/// A geometry component that can store a mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshComponent {
    mesh: Option<Arc<Mesh>>,
    ownership: Option<GeometryOwnership>,
}

impl MeshComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mesh: Arc<Mesh>, ownership: GeometryOwnership) -> Self {
        Self {
            mesh: Some(mesh),
            ownership: Some(ownership),
        }
    }

    pub fn clear(&mut self) {
        self.mesh = None;
        self.ownership = None;
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn replace(&mut self, mesh: Arc<Mesh>, ownership: GeometryOwnership) {
        self.mesh = Some(mesh);
        self.ownership = Some(ownership);
    }

    pub fn release(&mut self) -> Option<Arc<Mesh>> {
        self.ownership = None;
        self.mesh.take()
    }

    pub fn get_for_read(&self) -> Option<&Mesh> {
        self.mesh.as_deref()
    }

    /// Write access to the mesh. ReadOnly data is deep-copied first; a
    /// shared handle is privately cloned (copy-on-write).
    pub fn get_for_write(&mut self) -> Option<&mut Mesh> {
        let mesh = self.mesh.as_mut()?;
        if self.ownership == Some(GeometryOwnership::ReadOnly) {
            *mesh = Arc::new((**mesh).clone());
            self.ownership = Some(GeometryOwnership::Owned);
        } else if Arc::strong_count(mesh) > 1 {
            // make_mut clones below, leaving a private copy.
            self.ownership = Some(GeometryOwnership::Owned);
        }
        Some(Arc::make_mut(mesh))
    }

    pub fn owns_direct_data(&self) -> bool {
        self.mesh.is_none() || self.ownership == Some(GeometryOwnership::Owned)
    }

    pub fn ensure_owns_direct_data(&mut self) {
        if self.owns_direct_data() {
            return;
        }
        if let Some(mesh) = self.mesh.as_mut() {
            *mesh = Arc::new((**mesh).clone());
        }
        self.ownership = Some(GeometryOwnership::Owned);
    }

    pub fn is_empty(&self) -> bool {
        self.get_for_read().map_or(true, Mesh::is_empty)
    }
}

// Ownership mode is bookkeeping, not data: equality and hashing look at the
// payload only.
impl PartialEq for MeshComponent {
    fn eq(&self, other: &Self) -> bool {
        self.get_for_read() == other.get_for_read()
    }
}

impl Hash for MeshComponent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get_for_read().hash(state);
    }
}

/// A geometry component that stores a point cloud.
#[derive(Debug, Clone, Default)]
pub struct PointCloudComponent {
    pointcloud: Option<Arc<PointCloud>>,
    ownership: Option<GeometryOwnership>,
}

impl PointCloudComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pointcloud(pointcloud: Arc<PointCloud>, ownership: GeometryOwnership) -> Self {
        Self {
            pointcloud: Some(pointcloud),
            ownership: Some(ownership),
        }
    }

    pub fn clear(&mut self) {
        self.pointcloud = None;
        self.ownership = None;
    }

    pub fn has_pointcloud(&self) -> bool {
        self.pointcloud.is_some()
    }

    pub fn replace(&mut self, pointcloud: Arc<PointCloud>, ownership: GeometryOwnership) {
        self.pointcloud = Some(pointcloud);
        self.ownership = Some(ownership);
    }

    pub fn release(&mut self) -> Option<Arc<PointCloud>> {
        self.ownership = None;
        self.pointcloud.take()
    }

    pub fn get_for_read(&self) -> Option<&PointCloud> {
        self.pointcloud.as_deref()
    }

    pub fn get_for_write(&mut self) -> Option<&mut PointCloud> {
        let pointcloud = self.pointcloud.as_mut()?;
        if self.ownership == Some(GeometryOwnership::ReadOnly) {
            *pointcloud = Arc::new((**pointcloud).clone());
            self.ownership = Some(GeometryOwnership::Owned);
        } else if Arc::strong_count(pointcloud) > 1 {
            self.ownership = Some(GeometryOwnership::Owned);
        }
        Some(Arc::make_mut(pointcloud))
    }

    pub fn owns_direct_data(&self) -> bool {
        self.pointcloud.is_none() || self.ownership == Some(GeometryOwnership::Owned)
    }

    pub fn ensure_owns_direct_data(&mut self) {
        if self.owns_direct_data() {
            return;
        }
        if let Some(pointcloud) = self.pointcloud.as_mut() {
            *pointcloud = Arc::new((**pointcloud).clone());
        }
        self.ownership = Some(GeometryOwnership::Owned);
    }

    pub fn is_empty(&self) -> bool {
        self.get_for_read().map_or(true, PointCloud::is_empty)
    }
}

impl PartialEq for PointCloudComponent {
    fn eq(&self, other: &Self) -> bool {
        self.get_for_read() == other.get_for_read()
    }
}

impl Hash for PointCloudComponent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get_for_read().hash(state);
    }
}

/// A geometry component that stores a voxel grid.
#[derive(Debug, Clone, Default)]
pub struct VolumeComponent {
    volume: Option<Arc<Volume>>,
    ownership: Option<GeometryOwnership>,
}

impl VolumeComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_volume(volume: Arc<Volume>, ownership: GeometryOwnership) -> Self {
        Self {
            volume: Some(volume),
            ownership: Some(ownership),
        }
    }

    pub fn clear(&mut self) {
        self.volume = None;
        self.ownership = None;
    }

    pub fn has_volume(&self) -> bool {
        self.volume.is_some()
    }

    pub fn replace(&mut self, volume: Arc<Volume>, ownership: GeometryOwnership) {
        self.volume = Some(volume);
        self.ownership = Some(ownership);
    }

    pub fn release(&mut self) -> Option<Arc<Volume>> {
        self.ownership = None;
        self.volume.take()
    }

    pub fn get_for_read(&self) -> Option<&Volume> {
        self.volume.as_deref()
    }

    pub fn get_for_write(&mut self) -> Option<&mut Volume> {
        let volume = self.volume.as_mut()?;
        if self.ownership == Some(GeometryOwnership::ReadOnly) {
            *volume = Arc::new((**volume).clone());
            self.ownership = Some(GeometryOwnership::Owned);
        } else if Arc::strong_count(volume) > 1 {
            self.ownership = Some(GeometryOwnership::Owned);
        }
        Some(Arc::make_mut(volume))
    }

    pub fn owns_direct_data(&self) -> bool {
        self.volume.is_none() || self.ownership == Some(GeometryOwnership::Owned)
    }

    pub fn ensure_owns_direct_data(&mut self) {
        if self.owns_direct_data() {
            return;
        }
        if let Some(volume) = self.volume.as_mut() {
            *volume = Arc::new((**volume).clone());
        }
        self.ownership = Some(GeometryOwnership::Owned);
    }

    pub fn is_empty(&self) -> bool {
        self.get_for_read().map_or(true, Volume::is_empty)
    }
}

impl PartialEq for VolumeComponent {
    fn eq(&self, other: &Self) -> bool {
        self.get_for_read() == other.get_for_read()
    }
}

impl Hash for VolumeComponent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get_for_read().hash(state);
    }
}

impl AttributeAccess for MeshComponent {
    fn providers() -> &'static ComponentProviders<Self> {
        &MESH_PROVIDERS
    }

    fn custom_attributes(&self) -> Option<&AttributeSet> {
        self.get_for_read().map(|mesh| &mesh.attributes)
    }

    fn custom_attributes_mut(&mut self) -> Option<&mut AttributeSet> {
        self.get_for_write().map(|mesh| &mut mesh.attributes)
    }

    fn attribute_domain_size(&self, domain: AttrDomain) -> usize {
        self.get_for_read()
            .map_or(0, |mesh| mesh.attribute_domain_len(domain))
    }

    fn attribute_try_adapt_domain<'a>(
        &self,
        varray: VArray<'a>,
        from: AttrDomain,
        to: AttrDomain,
    ) -> Option<VArray<'a>> {
        let mesh = self.get_for_read()?;
        adapt_mesh_domain(mesh, varray, from, to)
    }
}

impl AttributeAccess for PointCloudComponent {
    fn providers() -> &'static ComponentProviders<Self> {
        &POINT_CLOUD_PROVIDERS
    }

    fn custom_attributes(&self) -> Option<&AttributeSet> {
        self.get_for_read().map(|cloud| &cloud.attributes)
    }

    fn custom_attributes_mut(&mut self) -> Option<&mut AttributeSet> {
        self.get_for_write().map(|cloud| &mut cloud.attributes)
    }

    fn attribute_domain_size(&self, domain: AttrDomain) -> usize {
        self.get_for_read()
            .map_or(0, |cloud| cloud.attribute_domain_len(domain))
    }

    fn attribute_try_adapt_domain<'a>(
        &self,
        varray: VArray<'a>,
        from: AttrDomain,
        to: AttrDomain,
    ) -> Option<VArray<'a>> {
        adapt_trivial(varray, from, to, self.attribute_domain_size(to))
    }
}

impl AttributeAccess for VolumeComponent {
    fn providers() -> &'static ComponentProviders<Self> {
        &VOLUME_PROVIDERS
    }

    fn custom_attributes(&self) -> Option<&AttributeSet> {
        self.get_for_read().map(|volume| &volume.attributes)
    }

    fn custom_attributes_mut(&mut self) -> Option<&mut AttributeSet> {
        self.get_for_write().map(|volume| &mut volume.attributes)
    }

    fn attribute_domain_size(&self, domain: AttrDomain) -> usize {
        self.get_for_read()
            .map_or(0, |volume| volume.attribute_domain_len(domain))
    }

    fn attribute_try_adapt_domain<'a>(
        &self,
        varray: VArray<'a>,
        from: AttrDomain,
        to: AttrDomain,
    ) -> Option<VArray<'a>> {
        adapt_trivial(varray, from, to, self.attribute_domain_size(to))
    }
}

impl AttributeAccess for InstancesComponent {
    fn providers() -> &'static ComponentProviders<Self> {
        &INSTANCES_PROVIDERS
    }

    fn custom_attributes(&self) -> Option<&AttributeSet> {
        Some(&self.attributes)
    }

    fn custom_attributes_mut(&mut self) -> Option<&mut AttributeSet> {
        Some(&mut self.attributes)
    }

    fn attribute_domain_size(&self, domain: AttrDomain) -> usize {
        self.attribute_domain_len(domain)
    }

    fn attribute_try_adapt_domain<'a>(
        &self,
        varray: VArray<'a>,
        from: AttrDomain,
        to: AttrDomain,
    ) -> Option<VArray<'a>> {
        adapt_trivial(varray, from, to, self.attribute_domain_size(to))
    }
}

/// The uniform, kind-erased component surface. One variant per geometry
/// kind; every attribute call dispatches to the variant's capability
/// implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryComponent {
    Mesh(MeshComponent),
    PointCloud(PointCloudComponent),
    Volume(VolumeComponent),
    Instances(InstancesComponent),
}

impl GeometryComponent {
    pub fn new(kind: GeometryComponentKind) -> Self {
        match kind {
            GeometryComponentKind::Mesh => GeometryComponent::Mesh(MeshComponent::new()),
            GeometryComponentKind::PointCloud => {
                GeometryComponent::PointCloud(PointCloudComponent::new())
            }
            GeometryComponentKind::Volume => GeometryComponent::Volume(VolumeComponent::new()),
            GeometryComponentKind::Instances => {
                GeometryComponent::Instances(InstancesComponent::new())
            }
        }
    }

    pub fn kind(&self) -> GeometryComponentKind {
        match self {
            GeometryComponent::Mesh(_) => GeometryComponentKind::Mesh,
            GeometryComponent::PointCloud(_) => GeometryComponentKind::PointCloud,
            GeometryComponent::Volume(_) => GeometryComponentKind::Volume,
            GeometryComponent::Instances(_) => GeometryComponentKind::Instances,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GeometryComponent::Mesh(component) => component.is_empty(),
            GeometryComponent::PointCloud(component) => component.is_empty(),
            GeometryComponent::Volume(component) => component.is_empty(),
            GeometryComponent::Instances(component) => component.is_empty(),
        }
    }

    pub fn owns_direct_data(&self) -> bool {
        match self {
            GeometryComponent::Mesh(component) => component.owns_direct_data(),
            GeometryComponent::PointCloud(component) => component.owns_direct_data(),
            GeometryComponent::Volume(component) => component.owns_direct_data(),
            // Instance data references other geometry; the relation itself
            // is always owned.
            GeometryComponent::Instances(_) => true,
        }
    }

    pub fn ensure_owns_direct_data(&mut self) {
        match self {
            GeometryComponent::Mesh(component) => component.ensure_owns_direct_data(),
            GeometryComponent::PointCloud(component) => component.ensure_owns_direct_data(),
            GeometryComponent::Volume(component) => component.ensure_owns_direct_data(),
            GeometryComponent::Instances(_) => {}
        }
    }

    pub fn as_mesh(&self) -> Option<&MeshComponent> {
        match self {
            GeometryComponent::Mesh(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut MeshComponent> {
        match self {
            GeometryComponent::Mesh(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_point_cloud(&self) -> Option<&PointCloudComponent> {
        match self {
            GeometryComponent::PointCloud(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_point_cloud_mut(&mut self) -> Option<&mut PointCloudComponent> {
        match self {
            GeometryComponent::PointCloud(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_volume(&self) -> Option<&VolumeComponent> {
        match self {
            GeometryComponent::Volume(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_volume_mut(&mut self) -> Option<&mut VolumeComponent> {
        match self {
            GeometryComponent::Volume(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_instances(&self) -> Option<&InstancesComponent> {
        match self {
            GeometryComponent::Instances(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_instances_mut(&mut self) -> Option<&mut InstancesComponent> {
        match self {
            GeometryComponent::Instances(component) => Some(component),
            _ => None,
        }
    }

    pub fn attribute_exists(&self, name: &str) -> bool {
        match self {
            GeometryComponent::Mesh(component) => component.attribute_exists(name),
            GeometryComponent::PointCloud(component) => component.attribute_exists(name),
            GeometryComponent::Volume(component) => component.attribute_exists(name),
            GeometryComponent::Instances(component) => component.attribute_exists(name),
        }
    }

    pub fn attribute_is_builtin(&self, name: &str) -> bool {
        match self {
            GeometryComponent::Mesh(component) => component.attribute_is_builtin(name),
            GeometryComponent::PointCloud(component) => component.attribute_is_builtin(name),
            GeometryComponent::Volume(component) => component.attribute_is_builtin(name),
            GeometryComponent::Instances(component) => component.attribute_is_builtin(name),
        }
    }

    pub fn attribute_get_meta_data(&self, name: &str) -> Option<AttributeMetaData> {
        match self {
            GeometryComponent::Mesh(component) => component.attribute_get_meta_data(name),
            GeometryComponent::PointCloud(component) => component.attribute_get_meta_data(name),
            GeometryComponent::Volume(component) => component.attribute_get_meta_data(name),
            GeometryComponent::Instances(component) => component.attribute_get_meta_data(name),
        }
    }

    pub fn attribute_domain_supported(&self, domain: AttrDomain) -> bool {
        match self {
            GeometryComponent::Mesh(component) => component.attribute_domain_supported(domain),
            GeometryComponent::PointCloud(component) => {
                component.attribute_domain_supported(domain)
            }
            GeometryComponent::Volume(component) => component.attribute_domain_supported(domain),
            GeometryComponent::Instances(component) => {
                component.attribute_domain_supported(domain)
            }
        }
    }

    pub fn attribute_domain_size(&self, domain: AttrDomain) -> usize {
        match self {
            GeometryComponent::Mesh(component) => component.attribute_domain_size(domain),
            GeometryComponent::PointCloud(component) => component.attribute_domain_size(domain),
            GeometryComponent::Volume(component) => component.attribute_domain_size(domain),
            GeometryComponent::Instances(component) => component.attribute_domain_size(domain),
        }
    }

    pub fn attribute_try_get_for_read(
        &self,
        name: &str,
    ) -> Option<(VArray<'_>, AttributeMetaData)> {
        match self {
            GeometryComponent::Mesh(component) => component.attribute_try_get_for_read(name),
            GeometryComponent::PointCloud(component) => {
                component.attribute_try_get_for_read(name)
            }
            GeometryComponent::Volume(component) => component.attribute_try_get_for_read(name),
            GeometryComponent::Instances(component) => component.attribute_try_get_for_read(name),
        }
    }

    pub fn attribute_try_get_for_read_as(
        &self,
        name: &str,
        domain: AttrDomain,
        data_type: AttrType,
    ) -> Option<VArray<'_>> {
        match self {
            GeometryComponent::Mesh(component) => {
                component.attribute_try_get_for_read_as(name, domain, data_type)
            }
            GeometryComponent::PointCloud(component) => {
                component.attribute_try_get_for_read_as(name, domain, data_type)
            }
            GeometryComponent::Volume(component) => {
                component.attribute_try_get_for_read_as(name, domain, data_type)
            }
            GeometryComponent::Instances(component) => {
                component.attribute_try_get_for_read_as(name, domain, data_type)
            }
        }
    }

    pub fn attribute_get_for_read(
        &self,
        name: &str,
        domain: AttrDomain,
        data_type: AttrType,
        default: Option<AttrValue>,
    ) -> VArray<'_> {
        match self {
            GeometryComponent::Mesh(component) => {
                component.attribute_get_for_read(name, domain, data_type, default)
            }
            GeometryComponent::PointCloud(component) => {
                component.attribute_get_for_read(name, domain, data_type, default)
            }
            GeometryComponent::Volume(component) => {
                component.attribute_get_for_read(name, domain, data_type, default)
            }
            GeometryComponent::Instances(component) => {
                component.attribute_get_for_read(name, domain, data_type, default)
            }
        }
    }

    pub fn attribute_try_adapt_domain<'a>(
        &self,
        varray: VArray<'a>,
        from: AttrDomain,
        to: AttrDomain,
    ) -> Option<VArray<'a>> {
        match self {
            GeometryComponent::Mesh(component) => {
                component.attribute_try_adapt_domain(varray, from, to)
            }
            GeometryComponent::PointCloud(component) => {
                component.attribute_try_adapt_domain(varray, from, to)
            }
            GeometryComponent::Volume(component) => {
                component.attribute_try_adapt_domain(varray, from, to)
            }
            GeometryComponent::Instances(component) => {
                component.attribute_try_adapt_domain(varray, from, to)
            }
        }
    }

    pub fn attribute_try_create(
        &mut self,
        name: &str,
        domain: AttrDomain,
        data_type: AttrType,
        init: AttributeInit<'_>,
    ) -> bool {
        match self {
            GeometryComponent::Mesh(component) => {
                component.attribute_try_create(name, domain, data_type, init)
            }
            GeometryComponent::PointCloud(component) => {
                component.attribute_try_create(name, domain, data_type, init)
            }
            GeometryComponent::Volume(component) => {
                component.attribute_try_create(name, domain, data_type, init)
            }
            GeometryComponent::Instances(component) => {
                component.attribute_try_create(name, domain, data_type, init)
            }
        }
    }

    pub fn attribute_try_delete(&mut self, name: &str) -> bool {
        match self {
            GeometryComponent::Mesh(component) => component.attribute_try_delete(name),
            GeometryComponent::PointCloud(component) => component.attribute_try_delete(name),
            GeometryComponent::Volume(component) => component.attribute_try_delete(name),
            GeometryComponent::Instances(component) => component.attribute_try_delete(name),
        }
    }

    pub fn attribute_foreach(
        &self,
        callback: impl FnMut(&str, AttributeMetaData) -> bool,
    ) -> bool {
        match self {
            GeometryComponent::Mesh(component) => component.attribute_foreach(callback),
            GeometryComponent::PointCloud(component) => component.attribute_foreach(callback),
            GeometryComponent::Volume(component) => component.attribute_foreach(callback),
            GeometryComponent::Instances(component) => component.attribute_foreach(callback),
        }
    }

    pub fn attribute_names(&self) -> BTreeSet<String> {
        match self {
            GeometryComponent::Mesh(component) => component.attribute_names(),
            GeometryComponent::PointCloud(component) => component.attribute_names(),
            GeometryComponent::Volume(component) => component.attribute_names(),
            GeometryComponent::Instances(component) => component.attribute_names(),
        }
    }

    pub fn attribute_try_get_for_output(
        &mut self,
        name: &str,
        domain: AttrDomain,
        data_type: AttrType,
        default: Option<AttrValue>,
    ) -> Option<OutputAttribute<'_>> {
        match self {
            GeometryComponent::Mesh(component) => {
                component.attribute_try_get_for_output(name, domain, data_type, default)
            }
            GeometryComponent::PointCloud(component) => {
                component.attribute_try_get_for_output(name, domain, data_type, default)
            }
            GeometryComponent::Volume(component) => {
                component.attribute_try_get_for_output(name, domain, data_type, default)
            }
            GeometryComponent::Instances(component) => {
                component.attribute_try_get_for_output(name, domain, data_type, default)
            }
        }
    }
}

impl Hash for GeometryComponent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            GeometryComponent::Mesh(component) => component.hash(state),
            GeometryComponent::PointCloud(component) => component.hash(state),
            GeometryComponent::Volume(component) => component.hash(state),
            GeometryComponent::Instances(component) => component.hash(state),
        }
    }
}

impl From<MeshComponent> for GeometryComponent {
    fn from(component: MeshComponent) -> Self {
        GeometryComponent::Mesh(component)
    }
}

impl From<PointCloudComponent> for GeometryComponent {
    fn from(component: PointCloudComponent) -> Self {
        GeometryComponent::PointCloud(component)
    }
}

impl From<VolumeComponent> for GeometryComponent {
    fn from(component: VolumeComponent) -> Self {
        GeometryComponent::Volume(component)
    }
}

impl From<InstancesComponent> for GeometryComponent {
    fn from(component: InstancesComponent) -> Self {
        GeometryComponent::Instances(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttrStorage;
    use crate::instances::InstanceRef;
    use crate::geometry_set::GeometrySet;
    use glam::Mat4;

    fn quad_component() -> MeshComponent {
        let mesh = Mesh::with_positions_indices(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![0, 1, 2, 0, 2, 3],
        );
        MeshComponent::with_mesh(Arc::new(mesh), GeometryOwnership::Owned)
    }

    #[test]
    fn missing_attribute_reads_as_nothing_or_default() {
        let component = quad_component();
        assert!(!component.attribute_exists("mass"));
        assert!(component.attribute_try_get_for_read("mass").is_none());
        assert!(component
            .attribute_try_get_for_read_as("mass", AttrDomain::Point, AttrType::Float)
            .is_none());

        let varray = component.attribute_get_for_read(
            "mass",
            AttrDomain::Point,
            AttrType::Float,
            Some(AttrValue::Float(2.5)),
        );
        assert_eq!(varray.len(), 4);
        for index in 0..4 {
            assert_eq!(varray.get(index), Some(AttrValue::Float(2.5)));
        }

        // No default given: the type's zero value.
        let varray =
            component.attribute_get_for_read("mass", AttrDomain::Primitive, AttrType::Int, None);
        assert_eq!(varray.len(), 2);
        assert_eq!(varray.get(0), Some(AttrValue::Int(0)));
    }

    #[test]
    fn create_then_read_round_trips() {
        let mut component = quad_component();
        let source = AttrStorage::Float(vec![1.0, 2.0, 3.0, 4.0]);
        assert!(component.attribute_try_create(
            "mass",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::FromView(VArray::Owned(source.clone())),
        ));
        let (varray, meta) = component.attribute_try_get_for_read("mass").unwrap();
        assert_eq!(meta.domain, AttrDomain::Point);
        assert_eq!(meta.data_type, AttrType::Float);
        assert_eq!(varray.materialize(), source);
    }

    #[test]
    fn create_rejects_collisions_and_bad_inputs() {
        let mut component = quad_component();
        assert!(component.attribute_try_create(
            "mass",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::Default,
        ));
        // Existing name, compatible or not: delete first.
        assert!(!component.attribute_try_create(
            "mass",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::Default,
        ));
        // Built-in names share the namespace and have fixed signatures.
        assert!(!component.attribute_try_create(
            "P",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::Default,
        ));
        // Length mismatch fails with no partial state.
        assert!(!component.attribute_try_create(
            "speed",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::FromView(VArray::Owned(AttrStorage::Float(vec![1.0]))),
        ));
        assert!(!component.attribute_exists("speed"));
        // Empty names are invalid.
        assert!(!component.attribute_try_create(
            "",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::Default,
        ));

        let mut cloud = PointCloudComponent::with_pointcloud(
            Arc::new(PointCloud::with_len(3)),
            GeometryOwnership::Owned,
        );
        assert!(!cloud.attribute_domain_supported(AttrDomain::Vertex));
        assert!(!cloud.attribute_try_create(
            "mass",
            AttrDomain::Vertex,
            AttrType::Float,
            AttributeInit::Default,
        ));
    }

    #[test]
    fn builtin_create_and_delete() {
        let mut component = quad_component();
        assert!(!component.attribute_exists("N"));
        assert!(component.attribute_try_create(
            "N",
            AttrDomain::Point,
            AttrType::Vec3,
            AttributeInit::Default,
        ));
        assert!(component.attribute_exists("N"));
        assert!(component.attribute_is_builtin("N"));
        let meta = component.attribute_get_meta_data("N").unwrap();
        assert_eq!(meta.domain, AttrDomain::Point);
        assert_eq!(meta.data_type, AttrType::Vec3);

        // Wrong signature for a built-in name.
        assert!(!component.attribute_try_create(
            "uv",
            AttrDomain::Point,
            AttrType::Vec2,
            AttributeInit::Default,
        ));

        assert!(component.attribute_try_delete("N"));
        assert!(!component.attribute_exists("N"));
        // P is protected.
        assert!(component.attribute_exists("P"));
        assert!(!component.attribute_try_delete("P"));
        assert!(component.attribute_exists("P"));
    }

    #[test]
    fn delete_is_idempotent_and_isolated() {
        let mut component = quad_component();
        assert!(component.attribute_try_create(
            "mass",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::Default,
        ));
        assert!(!component.attribute_try_delete("missing"));
        assert!(!component.attribute_try_delete("missing"));
        assert!(component.attribute_exists("mass"));
        assert!(component.attribute_try_delete("mass"));
        assert!(!component.attribute_try_delete("mass"));
    }

    #[test]
    fn foreach_stops_early_when_asked() {
        let mut component = quad_component();
        assert!(component.attribute_try_create(
            "mass",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::Default,
        ));
        assert!(component.attribute_try_create(
            "speed",
            AttrDomain::Primitive,
            AttrType::Vec3,
            AttributeInit::Default,
        ));

        let mut visited = Vec::new();
        let finished = component.attribute_foreach(|name, _| {
            visited.push(name.to_string());
            false
        });
        assert!(!finished);
        assert_eq!(visited.len(), 1);

        let mut all = Vec::new();
        let finished = component.attribute_foreach(|name, _| {
            all.push(name.to_string());
            true
        });
        assert!(finished);
        assert_eq!(all, vec!["P", "mass", "speed"]);
        assert_eq!(
            component.attribute_names().into_iter().collect::<Vec<_>>(),
            vec!["P", "mass", "speed"]
        );
    }

    #[test]
    fn output_handle_direct_path_writes_in_place() {
        let mut component = quad_component();
        assert!(component.attribute_try_create(
            "mass",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::Default,
        ));
        let mut output = component
            .attribute_try_get_for_output("mass", AttrDomain::Point, AttrType::Float, None)
            .unwrap();
        assert!(!output.is_buffered());
        assert!(output.set(1, AttrValue::Float(4.0)));
        output.save();

        let (varray, _) = component.attribute_try_get_for_read("mass").unwrap();
        assert_eq!(varray.get(1), Some(AttrValue::Float(4.0)));
    }

    #[test]
    fn output_handle_replaces_incompatible_attribute_on_release() {
        let mut component = quad_component();
        assert!(component.attribute_try_create(
            "sel",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::FromView(VArray::Owned(AttrStorage::Float(vec![1.0, 2.0, 3.0, 4.0]))),
        ));

        let mut output = component
            .attribute_try_get_for_output("sel", AttrDomain::Point, AttrType::Int, None)
            .unwrap();
        assert!(output.is_buffered());
        // The buffer starts from the old values, converted.
        assert_eq!(output.get(1), Some(AttrValue::Int(2)));
        assert!(output.fill(AttrValue::Int(7)));
        output.save();

        let (varray, meta) = component.attribute_try_get_for_read("sel").unwrap();
        assert_eq!(meta.data_type, AttrType::Int);
        assert_eq!(varray.materialize(), AttrStorage::Int(vec![7; 4]));
    }

    #[test]
    fn output_handle_old_values_visible_until_release() {
        let mut component = quad_component();
        assert!(component.attribute_try_create(
            "sel",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::FromView(VArray::Owned(AttrStorage::Float(vec![1.0, 2.0, 3.0, 4.0]))),
        ));
        {
            let mut output = component
                .attribute_try_get_for_output("sel", AttrDomain::Point, AttrType::Int, None)
                .unwrap();
            output.fill(AttrValue::Int(7));
            // Handle dropped without an explicit save: still committed,
            // exactly once.
        }
        let (_, meta) = component.attribute_try_get_for_read("sel").unwrap();
        assert_eq!(meta.data_type, AttrType::Int);
    }

    #[test]
    fn output_handle_creates_missing_attribute() {
        let mut component = quad_component();
        let mut output = component
            .attribute_try_get_for_output(
                "weight",
                AttrDomain::Primitive,
                AttrType::Float,
                Some(AttrValue::Float(1.0)),
            )
            .unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output.get(0), Some(AttrValue::Float(1.0)));
        assert!(output.set(1, AttrValue::Float(3.0)));
        output.save();

        {
            let (varray, _) = component.attribute_try_get_for_read("weight").unwrap();
            assert_eq!(varray.materialize(), AttrStorage::Float(vec![1.0, 3.0]));
        }

        // A built-in requested at a foreign signature cannot exist.
        assert!(component
            .attribute_try_get_for_output("P", AttrDomain::Primitive, AttrType::Vec3, None)
            .is_none());
    }

    #[test]
    fn move_initializer_adopts_or_converts() {
        let mut component = quad_component();
        assert!(component.attribute_try_create(
            "mass",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::Move(AttrStorage::Float(vec![1.0, 2.0, 3.0, 4.0])),
        ));
        {
            let (varray, _) = component.attribute_try_get_for_read("mass").unwrap();
            assert_eq!(
                varray.materialize(),
                AttrStorage::Float(vec![1.0, 2.0, 3.0, 4.0])
            );
        }

        // Type mismatch: converted copy, buffer dropped, no leak either way.
        assert!(component.attribute_try_create(
            "count",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::Move(AttrStorage::Int(vec![1, 2, 3, 4])),
        ));
        {
            let (varray, meta) = component.attribute_try_get_for_read("count").unwrap();
            assert_eq!(meta.data_type, AttrType::Float);
            assert_eq!(
                varray.materialize(),
                AttrStorage::Float(vec![1.0, 2.0, 3.0, 4.0])
            );
        }

        // Length mismatch fails outright.
        assert!(!component.attribute_try_create(
            "bad",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::Move(AttrStorage::Float(vec![1.0])),
        ));
    }

    #[test]
    fn read_as_adapts_domain_and_converts_type() {
        let mut component = quad_component();
        assert!(component.attribute_try_create(
            "mass",
            AttrDomain::Point,
            AttrType::Float,
            AttributeInit::FromView(VArray::Owned(AttrStorage::Float(vec![0.0, 3.0, 6.0, 9.0]))),
        ));
        let varray = component
            .attribute_try_get_for_read_as("mass", AttrDomain::Primitive, AttrType::Vec2)
            .unwrap();
        assert_eq!(varray.len(), 2);
        assert_eq!(varray.get(0), Some(AttrValue::Vec2([3.0, 3.0])));
        assert_eq!(varray.get(1), Some(AttrValue::Vec2([5.0, 5.0])));

        // Vec -> scalar conversion is not registered.
        assert!(component
            .attribute_try_get_for_read_as("P", AttrDomain::Point, AttrType::Float)
            .is_none());
    }

    #[test]
    fn empty_component_answers_with_zero_sizes() {
        let component = MeshComponent::new();
        assert_eq!(component.attribute_domain_size(AttrDomain::Point), 0);
        assert!(!component.attribute_exists("P"));
        let varray =
            component.attribute_get_for_read("P", AttrDomain::Point, AttrType::Vec3, None);
        assert!(varray.is_empty());
    }

    #[test]
    fn payload_plumbing_replace_release_clear() {
        let mut component = quad_component();
        assert!(component.has_mesh());
        let released = component.release().unwrap();
        assert!(!component.has_mesh());
        assert!(component.release().is_none());

        component.replace(released, GeometryOwnership::Editable);
        assert!(component.has_mesh());
        assert!(!component.owns_direct_data());
        // Editable data mutates in place while uniquely held.
        component.get_for_write().unwrap().positions[0] = [9.0, 0.0, 0.0];
        assert!(!component.owns_direct_data());
        component.ensure_owns_direct_data();
        assert!(component.owns_direct_data());

        component.clear();
        assert!(component.is_empty());
        assert!(component.get_for_read().is_none());
    }

    #[test]
    fn readonly_payload_copies_before_write() {
        let shared = Arc::new(Mesh::with_positions_indices(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        ));
        let mut component =
            MeshComponent::with_mesh(Arc::clone(&shared), GeometryOwnership::ReadOnly);
        assert!(!component.owns_direct_data());
        component.get_for_write().unwrap().positions[0] = [5.0, 0.0, 0.0];
        // The producer's buffer is never touched.
        assert_eq!(shared.positions[0], [0.0, 0.0, 0.0]);
        assert!(component.owns_direct_data());
    }

    #[test]
    fn instance_ids_through_the_generic_surface() {
        let mut component = GeometryComponent::new(GeometryComponentKind::Instances);
        {
            let instances = component.as_instances_mut().unwrap();
            for _ in 0..3 {
                instances.add_instance(
                    InstanceRef::Geometry(Arc::new(GeometrySet::new())),
                    Mat4::IDENTITY,
                    None,
                );
            }
        }
        assert!(!component.attribute_exists("id"));
        assert!(component.attribute_try_create(
            "id",
            AttrDomain::Point,
            AttrType::Int,
            AttributeInit::FromView(VArray::Owned(AttrStorage::Int(vec![5, 6, 7]))),
        ));
        let (varray, meta) = component.attribute_try_get_for_read("id").unwrap();
        assert_eq!(meta.data_type, AttrType::Int);
        assert_eq!(varray.materialize(), AttrStorage::Int(vec![5, 6, 7]));
        drop(varray);

        assert_eq!(
            &*component.as_instances().unwrap().almost_unique_ids(),
            &[5, 6, 7]
        );
        assert!(component.attribute_try_delete("id"));
        assert!(!component.attribute_exists("id"));
    }
}
