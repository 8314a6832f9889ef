use geoset_types::AttrType;

use crate::attributes::{AttrDomain, AttrRef, AttrRefMut, AttrStorage};
use crate::component::{MeshComponent, PointCloudComponent, VolumeComponent};
use crate::instances::InstancesComponent;
use crate::varray::VArray;

/// One built-in attribute of a component type: fixed name, domain, and type,
/// physically backed by a dedicated payload field. All callbacks are plain
/// `fn` pointers so the tables below are immutable statics, shared across
/// threads without locking.
pub struct BuiltinProvider<G: 'static> {
    pub name: &'static str,
    pub domain: AttrDomain,
    pub data_type: AttrType,
    pub deletable: bool,
    pub exists: fn(&G) -> bool,
    pub read: for<'a> fn(&'a G) -> Option<VArray<'a>>,
    pub write: for<'a> fn(&'a mut G) -> Option<AttrRefMut<'a>>,
    pub create: fn(&mut G, AttrStorage) -> bool,
    pub remove: fn(&mut G) -> bool,
}

pub struct ComponentProviders<G: 'static> {
    pub builtins: &'static [BuiltinProvider<G>],
    pub supported_domains: &'static [AttrDomain],
}

impl<G> ComponentProviders<G> {
    pub fn builtin(&self, name: &str) -> Option<&BuiltinProvider<G>> {
        self.builtins.iter().find(|provider| provider.name == name)
    }
}

fn never_create<G>(_component: &mut G, _storage: AttrStorage) -> bool {
    false
}

fn never_remove<G>(_component: &mut G) -> bool {
    false
}

// Mesh built-ins.

fn mesh_exists(component: &MeshComponent) -> bool {
    component.has_mesh()
}

fn mesh_position_read(component: &MeshComponent) -> Option<VArray<'_>> {
    component
        .get_for_read()
        .map(|mesh| VArray::Span(AttrRef::Vec3(&mesh.positions)))
}

fn mesh_position_write(component: &mut MeshComponent) -> Option<AttrRefMut<'_>> {
    component
        .get_for_write()
        .map(|mesh| AttrRefMut::Vec3(&mut mesh.positions))
}

fn mesh_normal_exists(component: &MeshComponent) -> bool {
    component
        .get_for_read()
        .is_some_and(|mesh| mesh.normals.is_some())
}

fn mesh_normal_read(component: &MeshComponent) -> Option<VArray<'_>> {
    let mesh = component.get_for_read()?;
    mesh.normals
        .as_ref()
        .map(|normals| VArray::Span(AttrRef::Vec3(normals.as_slice())))
}

fn mesh_normal_write(component: &mut MeshComponent) -> Option<AttrRefMut<'_>> {
    if !mesh_normal_exists(component) {
        return None;
    }
    let mesh = component.get_for_write()?;
    mesh.normals
        .as_mut()
        .map(|normals| AttrRefMut::Vec3(normals.as_mut_slice()))
}

fn mesh_normal_create(component: &mut MeshComponent, storage: AttrStorage) -> bool {
    let Some(mesh) = component.get_for_write() else {
        return false;
    };
    match storage {
        AttrStorage::Vec3(values) if values.len() == mesh.positions.len() => {
            mesh.normals = Some(values);
            true
        }
        _ => false,
    }
}

fn mesh_normal_remove(component: &mut MeshComponent) -> bool {
    if !mesh_normal_exists(component) {
        return false;
    }
    component
        .get_for_write()
        .is_some_and(|mesh| mesh.normals.take().is_some())
}

fn mesh_uv_exists(component: &MeshComponent) -> bool {
    component
        .get_for_read()
        .is_some_and(|mesh| mesh.uvs.is_some())
}

fn mesh_uv_read(component: &MeshComponent) -> Option<VArray<'_>> {
    let mesh = component.get_for_read()?;
    mesh.uvs
        .as_ref()
        .map(|uvs| VArray::Span(AttrRef::Vec2(uvs.as_slice())))
}

fn mesh_uv_write(component: &mut MeshComponent) -> Option<AttrRefMut<'_>> {
    if !mesh_uv_exists(component) {
        return None;
    }
    let mesh = component.get_for_write()?;
    mesh.uvs
        .as_mut()
        .map(|uvs| AttrRefMut::Vec2(uvs.as_mut_slice()))
}

fn mesh_uv_create(component: &mut MeshComponent, storage: AttrStorage) -> bool {
    let Some(mesh) = component.get_for_write() else {
        return false;
    };
    match storage {
        AttrStorage::Vec2(values) if values.len() == mesh.indices.len() => {
            mesh.uvs = Some(values);
            true
        }
        _ => false,
    }
}

fn mesh_uv_remove(component: &mut MeshComponent) -> bool {
    if !mesh_uv_exists(component) {
        return false;
    }
    component
        .get_for_write()
        .is_some_and(|mesh| mesh.uvs.take().is_some())
}

pub static MESH_PROVIDERS: ComponentProviders<MeshComponent> = ComponentProviders {
    builtins: &[
        BuiltinProvider {
            name: "P",
            domain: AttrDomain::Point,
            data_type: AttrType::Vec3,
            deletable: false,
            exists: mesh_exists,
            read: mesh_position_read,
            write: mesh_position_write,
            create: never_create,
            remove: never_remove,
        },
        BuiltinProvider {
            name: "N",
            domain: AttrDomain::Point,
            data_type: AttrType::Vec3,
            deletable: true,
            exists: mesh_normal_exists,
            read: mesh_normal_read,
            write: mesh_normal_write,
            create: mesh_normal_create,
            remove: mesh_normal_remove,
        },
        BuiltinProvider {
            name: "uv",
            domain: AttrDomain::Vertex,
            data_type: AttrType::Vec2,
            deletable: true,
            exists: mesh_uv_exists,
            read: mesh_uv_read,
            write: mesh_uv_write,
            create: mesh_uv_create,
            remove: mesh_uv_remove,
        },
    ],
    supported_domains: &AttrDomain::ALL,
};

// Point cloud built-ins.

fn cloud_exists(component: &PointCloudComponent) -> bool {
    component.has_pointcloud()
}

fn cloud_position_read(component: &PointCloudComponent) -> Option<VArray<'_>> {
    component
        .get_for_read()
        .map(|cloud| VArray::Span(AttrRef::Vec3(&cloud.positions)))
}

fn cloud_position_write(component: &mut PointCloudComponent) -> Option<AttrRefMut<'_>> {
    component
        .get_for_write()
        .map(|cloud| AttrRefMut::Vec3(&mut cloud.positions))
}

fn cloud_radius_exists(component: &PointCloudComponent) -> bool {
    component
        .get_for_read()
        .is_some_and(|cloud| cloud.radius.is_some())
}

fn cloud_radius_read(component: &PointCloudComponent) -> Option<VArray<'_>> {
    let cloud = component.get_for_read()?;
    cloud
        .radius
        .as_ref()
        .map(|radius| VArray::Span(AttrRef::Float(radius.as_slice())))
}

fn cloud_radius_write(component: &mut PointCloudComponent) -> Option<AttrRefMut<'_>> {
    if !cloud_radius_exists(component) {
        return None;
    }
    let cloud = component.get_for_write()?;
    cloud
        .radius
        .as_mut()
        .map(|radius| AttrRefMut::Float(radius.as_mut_slice()))
}

fn cloud_radius_create(component: &mut PointCloudComponent, storage: AttrStorage) -> bool {
    let Some(cloud) = component.get_for_write() else {
        return false;
    };
    match storage {
        AttrStorage::Float(values) if values.len() == cloud.positions.len() => {
            cloud.radius = Some(values);
            true
        }
        _ => false,
    }
}

fn cloud_radius_remove(component: &mut PointCloudComponent) -> bool {
    if !cloud_radius_exists(component) {
        return false;
    }
    component
        .get_for_write()
        .is_some_and(|cloud| cloud.radius.take().is_some())
}

pub static POINT_CLOUD_PROVIDERS: ComponentProviders<PointCloudComponent> = ComponentProviders {
    builtins: &[
        BuiltinProvider {
            name: "P",
            domain: AttrDomain::Point,
            data_type: AttrType::Vec3,
            deletable: false,
            exists: cloud_exists,
            read: cloud_position_read,
            write: cloud_position_write,
            create: never_create,
            remove: never_remove,
        },
        BuiltinProvider {
            name: "radius",
            domain: AttrDomain::Point,
            data_type: AttrType::Float,
            deletable: true,
            exists: cloud_radius_exists,
            read: cloud_radius_read,
            write: cloud_radius_write,
            create: cloud_radius_create,
            remove: cloud_radius_remove,
        },
    ],
    supported_domains: &[AttrDomain::Point, AttrDomain::Detail],
};

// Volume built-ins.

fn volume_exists(component: &VolumeComponent) -> bool {
    component.has_volume()
}

fn volume_density_read(component: &VolumeComponent) -> Option<VArray<'_>> {
    component
        .get_for_read()
        .map(|volume| VArray::Span(AttrRef::Float(&volume.values)))
}

fn volume_density_write(component: &mut VolumeComponent) -> Option<AttrRefMut<'_>> {
    component
        .get_for_write()
        .map(|volume| AttrRefMut::Float(&mut volume.values))
}

pub static VOLUME_PROVIDERS: ComponentProviders<VolumeComponent> = ComponentProviders {
    builtins: &[BuiltinProvider {
        name: "density",
        domain: AttrDomain::Point,
        data_type: AttrType::Float,
        deletable: false,
        exists: volume_exists,
        read: volume_density_read,
        write: volume_density_write,
        create: never_create,
        remove: never_remove,
    }],
    supported_domains: &[AttrDomain::Point, AttrDomain::Detail],
};

// Instance built-ins.

fn instances_id_exists(component: &InstancesComponent) -> bool {
    component.has_ids()
}

fn instances_id_read(component: &InstancesComponent) -> Option<VArray<'_>> {
    component
        .has_ids()
        .then(|| VArray::Span(AttrRef::Int(component.ids())))
}

fn instances_id_write(component: &mut InstancesComponent) -> Option<AttrRefMut<'_>> {
    if !component.has_ids() {
        return None;
    }
    Some(AttrRefMut::Int(component.ids_mut()))
}

fn instances_id_create(component: &mut InstancesComponent, storage: AttrStorage) -> bool {
    match storage {
        AttrStorage::Int(values) => component.set_ids(values),
        _ => false,
    }
}

fn instances_id_remove(component: &mut InstancesComponent) -> bool {
    component.clear_ids()
}

pub static INSTANCES_PROVIDERS: ComponentProviders<InstancesComponent> = ComponentProviders {
    builtins: &[BuiltinProvider {
        name: "id",
        domain: AttrDomain::Point,
        data_type: AttrType::Int,
        deletable: true,
        exists: instances_id_exists,
        read: instances_id_read,
        write: instances_id_write,
        create: instances_id_create,
        remove: instances_id_remove,
    }],
    supported_domains: &[AttrDomain::Point, AttrDomain::Detail],
};
