use std::hash::{Hash, Hasher};

use glam::{Mat4, Vec3};

use crate::attributes::{hash_f32, hash_f32_slice, AttrDomain, AttributeSet};
use crate::mesh::Aabb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeKind {
    Density,
    Sdf,
}

/// Dense voxel grid bulk data. `values` is the grid in x-fastest order; the
/// point domain of a volume is its voxel count.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub kind: VolumeKind,
    pub origin: [f32; 3],
    pub dims: [u32; 3],
    pub voxel_size: f32,
    pub values: Vec<f32>,
    pub transform: Mat4,
    pub attributes: AttributeSet,
}

impl Volume {
    pub fn new(
        kind: VolumeKind,
        origin: [f32; 3],
        dims: [u32; 3],
        voxel_size: f32,
        values: Vec<f32>,
    ) -> Self {
        Self {
            kind,
            origin,
            dims,
            voxel_size,
            values,
            transform: Mat4::IDENTITY,
            attributes: AttributeSet::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn attribute_domain_len(&self, domain: AttrDomain) -> usize {
        match domain {
            AttrDomain::Point => self.values.len(),
            AttrDomain::Detail => 1,
            AttrDomain::Vertex | AttrDomain::Primitive => 0,
        }
    }

    pub fn value_index(&self, x: u32, y: u32, z: u32) -> usize {
        let nx = self.dims[0].max(1);
        let ny = self.dims[1].max(1);
        (z * nx * ny + y * nx + x) as usize
    }

    pub fn local_bounds(&self) -> (Vec3, Vec3) {
        let min = Vec3::from(self.origin);
        let size = Vec3::new(
            self.dims[0].saturating_sub(1) as f32 * self.voxel_size,
            self.dims[1].saturating_sub(1) as f32 * self.voxel_size,
            self.dims[2].saturating_sub(1) as f32 * self.voxel_size,
        );
        (min, min + size)
    }

    pub fn world_bounds(&self) -> Aabb {
        let (min, max) = self.local_bounds();
        let corners = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ];
        let mut world_min = Vec3::splat(f32::INFINITY);
        let mut world_max = Vec3::splat(f32::NEG_INFINITY);
        for corner in corners {
            let world = self.transform.transform_point3(corner);
            world_min = world_min.min(world);
            world_max = world_max.max(world);
        }
        Aabb {
            min: world_min.to_array(),
            max: world_max.to_array(),
        }
    }
}

impl Hash for Volume {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        for component in self.origin {
            hash_f32(component, state);
        }
        self.dims.hash(state);
        hash_f32(self.voxel_size, state);
        hash_f32_slice(&self.values, state);
        for component in self.transform.to_cols_array() {
            hash_f32(component, state);
        }
        self.attributes.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voxel_count_is_the_point_domain() {
        let volume = Volume::new(VolumeKind::Density, [0.0; 3], [2, 2, 2], 0.5, vec![0.0; 8]);
        assert_eq!(volume.attribute_domain_len(AttrDomain::Point), 8);
        assert_eq!(volume.attribute_domain_len(AttrDomain::Detail), 1);
        assert_eq!(volume.value_index(1, 1, 1), 7);
    }

    #[test]
    fn world_bounds_follow_transform() {
        let mut volume =
            Volume::new(VolumeKind::Sdf, [0.0; 3], [3, 3, 3], 1.0, vec![0.0; 27]);
        volume.transform = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let bounds = volume.world_bounds();
        assert_eq!(bounds.min, [10.0, 0.0, 0.0]);
        assert_eq!(bounds.max, [12.0, 2.0, 2.0]);
    }
}
