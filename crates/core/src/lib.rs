mod access;
mod adapt;
mod attributes;
mod component;
mod geometry_set;
mod instances;
mod mesh;
mod parallel;
mod point_cloud;
mod providers;
mod varray;
mod volume;

pub use access::{AttributeAccess, OutputAttribute};
pub use attributes::{
    AttrDomain, AttrError, AttrRef, AttrRefMut, AttrStorage, AttributeInit, AttributeMetaData,
    AttributeSet, CustomAttribute,
};
pub use component::{
    GeometryComponent, GeometryComponentKind, GeometryOwnership, MeshComponent,
    PointCloudComponent, VolumeComponent,
};
pub use geometry_set::GeometrySet;
pub use geoset_types::{converter, AttrType, AttrValue, ConvertFn};
pub use instances::{InstanceRef, InstancesComponent};
pub use mesh::{Aabb, Mesh};
pub use point_cloud::PointCloud;
pub use providers::{BuiltinProvider, ComponentProviders};
pub use varray::{DerivedView, VArray};
pub use volume::{Volume, VolumeKind};
