use std::hash::{Hash, Hasher};

use crate::attributes::{hash_f32_arrays, hash_f32_slice, AttrDomain, AttributeSet};
use crate::mesh::{bounds_of_points, Aabb};

/// Point cloud bulk data: one position per point, an optional per-point
/// radius, and the custom attribute side table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<[f32; 3]>,
    pub radius: Option<Vec<f32>>,
    pub attributes: AttributeSet,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_len(count: usize) -> Self {
        Self {
            positions: vec![[0.0, 0.0, 0.0]; count],
            radius: None,
            attributes: AttributeSet::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn attribute_domain_len(&self, domain: AttrDomain) -> usize {
        match domain {
            AttrDomain::Point => self.positions.len(),
            AttrDomain::Detail => 1,
            AttrDomain::Vertex | AttrDomain::Primitive => 0,
        }
    }

    pub fn bounds(&self) -> Option<Aabb> {
        bounds_of_points(&self.positions)
    }
}

impl Hash for PointCloud {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_f32_arrays(&self.positions, state);
        if let Some(radius) = &self.radius {
            hash_f32_slice(radius, state);
        }
        self.attributes.hash(state);
    }
}
