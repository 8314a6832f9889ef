use std::hash::{Hash, Hasher};

use geoset_types::AttrType;

use crate::attributes::{
    hash_f32_arrays, AttrDomain, AttrError, AttrStorage, AttributeSet,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min: [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            max: [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        }
    }
}

pub(crate) fn bounds_of_points(points: &[[f32; 3]]) -> Option<Aabb> {
    let mut iter = points.iter();
    let first = iter.next()?;
    let mut min = *first;
    let mut max = *first;
    for point in iter {
        for axis in 0..3 {
            min[axis] = min[axis].min(point[axis]);
            max[axis] = max[axis].max(point[axis]);
        }
    }
    Some(Aabb { min, max })
}

/// Triangle mesh bulk data. `indices` is a flat triangle list; `uvs` lives on
/// the corner (vertex) domain, `normals` on the point domain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub attributes: AttributeSet,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_positions_indices(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            normals: None,
            uvs: None,
            attributes: AttributeSet::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn attribute_domain_len(&self, domain: AttrDomain) -> usize {
        match domain {
            AttrDomain::Point => self.positions.len(),
            AttrDomain::Vertex => self.indices.len(),
            AttrDomain::Primitive => self.triangle_count(),
            AttrDomain::Detail => 1,
        }
    }

    /// Installs an attribute column, routing the dedicated built-in names
    /// into their backing fields. Lengths are validated against the domain.
    pub fn set_attribute(
        &mut self,
        domain: AttrDomain,
        name: impl Into<String>,
        storage: AttrStorage,
    ) -> Result<(), AttrError> {
        let name = name.into();
        let expected = self.attribute_domain_len(domain);
        if storage.len() != expected {
            return Err(AttrError::InvalidLength {
                expected,
                actual: storage.len(),
            });
        }

        match (name.as_str(), domain) {
            ("P", AttrDomain::Point) => {
                if let AttrStorage::Vec3(values) = storage {
                    self.positions = values;
                    Ok(())
                } else {
                    Err(AttrError::InvalidType {
                        expected: AttrType::Vec3,
                        actual: storage.data_type(),
                    })
                }
            }
            ("P", _) => Err(AttrError::InvalidDomain),
            ("N", AttrDomain::Point) => {
                if let AttrStorage::Vec3(values) = storage {
                    self.normals = Some(values);
                    Ok(())
                } else {
                    Err(AttrError::InvalidType {
                        expected: AttrType::Vec3,
                        actual: storage.data_type(),
                    })
                }
            }
            ("N", _) => Err(AttrError::InvalidDomain),
            ("uv", AttrDomain::Vertex) => {
                if let AttrStorage::Vec2(values) = storage {
                    self.uvs = Some(values);
                    Ok(())
                } else {
                    Err(AttrError::InvalidType {
                        expected: AttrType::Vec2,
                        actual: storage.data_type(),
                    })
                }
            }
            ("uv", _) => Err(AttrError::InvalidDomain),
            _ => {
                self.attributes.insert(name, domain, storage);
                Ok(())
            }
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> bool {
        match name {
            "P" => false,
            "N" => self.normals.take().is_some(),
            "uv" => self.uvs.take().is_some(),
            _ => self.attributes.remove(name).is_some(),
        }
    }

    pub fn bounds(&self) -> Option<Aabb> {
        bounds_of_points(&self.positions)
    }
}

impl Hash for Mesh {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_f32_arrays(&self.positions, state);
        self.indices.hash(state);
        if let Some(normals) = &self.normals {
            hash_f32_arrays(normals, state);
        }
        if let Some(uvs) = &self.uvs {
            hash_f32_arrays(uvs, state);
        }
        self.attributes.hash(state);
    }
}
