use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use geoset_types::{converter, AttrType, AttrValue};

use crate::varray::VArray;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrDomain {
    Point,
    Vertex,
    Primitive,
    Detail,
}

impl AttrDomain {
    pub const ALL: [AttrDomain; 4] = [
        AttrDomain::Point,
        AttrDomain::Vertex,
        AttrDomain::Primitive,
        AttrDomain::Detail,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AttrDomain::Point => "point",
            AttrDomain::Vertex => "vertex",
            AttrDomain::Primitive => "primitive",
            AttrDomain::Detail => "detail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeMetaData {
    pub domain: AttrDomain,
    pub data_type: AttrType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrError {
    InvalidDomain,
    InvalidLength {
        expected: usize,
        actual: usize,
    },
    InvalidType {
        expected: AttrType,
        actual: AttrType,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrStorage {
    Float(Vec<f32>),
    Int(Vec<i32>),
    Bool(Vec<bool>),
    Vec2(Vec<[f32; 2]>),
    Vec3(Vec<[f32; 3]>),
    Vec4(Vec<[f32; 4]>),
}

impl AttrStorage {
    /// Storage of the given length filled with the type's zero value.
    pub fn new(data_type: AttrType, len: usize) -> Self {
        Self::filled(data_type.default_value(), len)
    }

    pub fn filled(value: AttrValue, len: usize) -> Self {
        match value {
            AttrValue::Float(v) => AttrStorage::Float(vec![v; len]),
            AttrValue::Int(v) => AttrStorage::Int(vec![v; len]),
            AttrValue::Bool(v) => AttrStorage::Bool(vec![v; len]),
            AttrValue::Vec2(v) => AttrStorage::Vec2(vec![v; len]),
            AttrValue::Vec3(v) => AttrStorage::Vec3(vec![v; len]),
            AttrValue::Vec4(v) => AttrStorage::Vec4(vec![v; len]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AttrStorage::Float(values) => values.len(),
            AttrStorage::Int(values) => values.len(),
            AttrStorage::Bool(values) => values.len(),
            AttrStorage::Vec2(values) => values.len(),
            AttrStorage::Vec3(values) => values.len(),
            AttrStorage::Vec4(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> AttrType {
        match self {
            AttrStorage::Float(_) => AttrType::Float,
            AttrStorage::Int(_) => AttrType::Int,
            AttrStorage::Bool(_) => AttrType::Bool,
            AttrStorage::Vec2(_) => AttrType::Vec2,
            AttrStorage::Vec3(_) => AttrType::Vec3,
            AttrStorage::Vec4(_) => AttrType::Vec4,
        }
    }

    pub fn get(&self, index: usize) -> Option<AttrValue> {
        match self {
            AttrStorage::Float(values) => values.get(index).copied().map(AttrValue::Float),
            AttrStorage::Int(values) => values.get(index).copied().map(AttrValue::Int),
            AttrStorage::Bool(values) => values.get(index).copied().map(AttrValue::Bool),
            AttrStorage::Vec2(values) => values.get(index).copied().map(AttrValue::Vec2),
            AttrStorage::Vec3(values) => values.get(index).copied().map(AttrValue::Vec3),
            AttrStorage::Vec4(values) => values.get(index).copied().map(AttrValue::Vec4),
        }
    }

    /// Stores `value` at `index`, converting through the type registry when
    /// the value's type differs. False when out of range or unconvertible.
    pub fn set(&mut self, index: usize, value: AttrValue) -> bool {
        if index >= self.len() {
            return false;
        }
        let Some(value) = value.try_convert(self.data_type()) else {
            return false;
        };
        match (self, value) {
            (AttrStorage::Float(values), AttrValue::Float(v)) => values[index] = v,
            (AttrStorage::Int(values), AttrValue::Int(v)) => values[index] = v,
            (AttrStorage::Bool(values), AttrValue::Bool(v)) => values[index] = v,
            (AttrStorage::Vec2(values), AttrValue::Vec2(v)) => values[index] = v,
            (AttrStorage::Vec3(values), AttrValue::Vec3(v)) => values[index] = v,
            (AttrStorage::Vec4(values), AttrValue::Vec4(v)) => values[index] = v,
            _ => return false,
        }
        true
    }

    pub fn fill(&mut self, value: AttrValue) -> bool {
        let Some(value) = value.try_convert(self.data_type()) else {
            return false;
        };
        match (self, value) {
            (AttrStorage::Float(values), AttrValue::Float(v)) => values.fill(v),
            (AttrStorage::Int(values), AttrValue::Int(v)) => values.fill(v),
            (AttrStorage::Bool(values), AttrValue::Bool(v)) => values.fill(v),
            (AttrStorage::Vec2(values), AttrValue::Vec2(v)) => values.fill(v),
            (AttrStorage::Vec3(values), AttrValue::Vec3(v)) => values.fill(v),
            (AttrStorage::Vec4(values), AttrValue::Vec4(v)) => values.fill(v),
            _ => return false,
        }
        true
    }

    pub fn as_ref(&self) -> AttrRef<'_> {
        match self {
            AttrStorage::Float(values) => AttrRef::Float(values.as_slice()),
            AttrStorage::Int(values) => AttrRef::Int(values.as_slice()),
            AttrStorage::Bool(values) => AttrRef::Bool(values.as_slice()),
            AttrStorage::Vec2(values) => AttrRef::Vec2(values.as_slice()),
            AttrStorage::Vec3(values) => AttrRef::Vec3(values.as_slice()),
            AttrStorage::Vec4(values) => AttrRef::Vec4(values.as_slice()),
        }
    }

    pub fn as_mut(&mut self) -> AttrRefMut<'_> {
        match self {
            AttrStorage::Float(values) => AttrRefMut::Float(values.as_mut_slice()),
            AttrStorage::Int(values) => AttrRefMut::Int(values.as_mut_slice()),
            AttrStorage::Bool(values) => AttrRefMut::Bool(values.as_mut_slice()),
            AttrStorage::Vec2(values) => AttrRefMut::Vec2(values.as_mut_slice()),
            AttrStorage::Vec3(values) => AttrRefMut::Vec3(values.as_mut_slice()),
            AttrStorage::Vec4(values) => AttrRefMut::Vec4(values.as_mut_slice()),
        }
    }

    /// Element-wise conversion to another registered type. `None` when the
    /// registry has no routine for the pair.
    pub fn convert_to(&self, to: AttrType) -> Option<AttrStorage> {
        if self.data_type() == to {
            return Some(self.clone());
        }
        let convert = converter(self.data_type(), to)?;
        let mut out = AttrStorage::new(to, self.len());
        for index in 0..self.len() {
            if let Some(value) = self.get(index) {
                out.set(index, convert(value));
            }
        }
        Some(out)
    }
}

pub(crate) fn hash_f32<H: Hasher>(value: f32, state: &mut H) {
    // -0.0 and 0.0 compare equal, keep their hashes equal too.
    let value = if value == 0.0 { 0.0 } else { value };
    state.write_u32(value.to_bits());
}

pub(crate) fn hash_f32_slice<H: Hasher>(values: &[f32], state: &mut H) {
    state.write_usize(values.len());
    for value in values {
        hash_f32(*value, state);
    }
}

pub(crate) fn hash_f32_arrays<H: Hasher, const N: usize>(values: &[[f32; N]], state: &mut H) {
    state.write_usize(values.len());
    for value in values {
        for component in value {
            hash_f32(*component, state);
        }
    }
}

impl Hash for AttrStorage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AttrStorage::Float(values) => hash_f32_slice(values, state),
            AttrStorage::Int(values) => values.hash(state),
            AttrStorage::Bool(values) => values.hash(state),
            AttrStorage::Vec2(values) => hash_f32_arrays(values, state),
            AttrStorage::Vec3(values) => hash_f32_arrays(values, state),
            AttrStorage::Vec4(values) => hash_f32_arrays(values, state),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrRef<'a> {
    Float(&'a [f32]),
    Int(&'a [i32]),
    Bool(&'a [bool]),
    Vec2(&'a [[f32; 2]]),
    Vec3(&'a [[f32; 3]]),
    Vec4(&'a [[f32; 4]]),
}

impl<'a> AttrRef<'a> {
    pub fn len(&self) -> usize {
        match self {
            AttrRef::Float(values) => values.len(),
            AttrRef::Int(values) => values.len(),
            AttrRef::Bool(values) => values.len(),
            AttrRef::Vec2(values) => values.len(),
            AttrRef::Vec3(values) => values.len(),
            AttrRef::Vec4(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> AttrType {
        match self {
            AttrRef::Float(_) => AttrType::Float,
            AttrRef::Int(_) => AttrType::Int,
            AttrRef::Bool(_) => AttrType::Bool,
            AttrRef::Vec2(_) => AttrType::Vec2,
            AttrRef::Vec3(_) => AttrType::Vec3,
            AttrRef::Vec4(_) => AttrType::Vec4,
        }
    }

    pub fn get(&self, index: usize) -> Option<AttrValue> {
        match self {
            AttrRef::Float(values) => values.get(index).copied().map(AttrValue::Float),
            AttrRef::Int(values) => values.get(index).copied().map(AttrValue::Int),
            AttrRef::Bool(values) => values.get(index).copied().map(AttrValue::Bool),
            AttrRef::Vec2(values) => values.get(index).copied().map(AttrValue::Vec2),
            AttrRef::Vec3(values) => values.get(index).copied().map(AttrValue::Vec3),
            AttrRef::Vec4(values) => values.get(index).copied().map(AttrValue::Vec4),
        }
    }

    pub fn to_owned(&self) -> AttrStorage {
        match self {
            AttrRef::Float(values) => AttrStorage::Float(values.to_vec()),
            AttrRef::Int(values) => AttrStorage::Int(values.to_vec()),
            AttrRef::Bool(values) => AttrStorage::Bool(values.to_vec()),
            AttrRef::Vec2(values) => AttrStorage::Vec2(values.to_vec()),
            AttrRef::Vec3(values) => AttrStorage::Vec3(values.to_vec()),
            AttrRef::Vec4(values) => AttrStorage::Vec4(values.to_vec()),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum AttrRefMut<'a> {
    Float(&'a mut [f32]),
    Int(&'a mut [i32]),
    Bool(&'a mut [bool]),
    Vec2(&'a mut [[f32; 2]]),
    Vec3(&'a mut [[f32; 3]]),
    Vec4(&'a mut [[f32; 4]]),
}

impl<'a> AttrRefMut<'a> {
    pub fn len(&self) -> usize {
        match self {
            AttrRefMut::Float(values) => values.len(),
            AttrRefMut::Int(values) => values.len(),
            AttrRefMut::Bool(values) => values.len(),
            AttrRefMut::Vec2(values) => values.len(),
            AttrRefMut::Vec3(values) => values.len(),
            AttrRefMut::Vec4(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> AttrType {
        match self {
            AttrRefMut::Float(_) => AttrType::Float,
            AttrRefMut::Int(_) => AttrType::Int,
            AttrRefMut::Bool(_) => AttrType::Bool,
            AttrRefMut::Vec2(_) => AttrType::Vec2,
            AttrRefMut::Vec3(_) => AttrType::Vec3,
            AttrRefMut::Vec4(_) => AttrType::Vec4,
        }
    }

    pub fn get(&self, index: usize) -> Option<AttrValue> {
        self.reborrow().get(index)
    }

    pub fn set(&mut self, index: usize, value: AttrValue) -> bool {
        if index >= self.len() {
            return false;
        }
        let Some(value) = value.try_convert(self.data_type()) else {
            return false;
        };
        match (self, value) {
            (AttrRefMut::Float(values), AttrValue::Float(v)) => values[index] = v,
            (AttrRefMut::Int(values), AttrValue::Int(v)) => values[index] = v,
            (AttrRefMut::Bool(values), AttrValue::Bool(v)) => values[index] = v,
            (AttrRefMut::Vec2(values), AttrValue::Vec2(v)) => values[index] = v,
            (AttrRefMut::Vec3(values), AttrValue::Vec3(v)) => values[index] = v,
            (AttrRefMut::Vec4(values), AttrValue::Vec4(v)) => values[index] = v,
            _ => return false,
        }
        true
    }

    pub fn fill(&mut self, value: AttrValue) -> bool {
        let Some(value) = value.try_convert(self.data_type()) else {
            return false;
        };
        match (self, value) {
            (AttrRefMut::Float(values), AttrValue::Float(v)) => values.fill(v),
            (AttrRefMut::Int(values), AttrValue::Int(v)) => values.fill(v),
            (AttrRefMut::Bool(values), AttrValue::Bool(v)) => values.fill(v),
            (AttrRefMut::Vec2(values), AttrValue::Vec2(v)) => values.fill(v),
            (AttrRefMut::Vec3(values), AttrValue::Vec3(v)) => values.fill(v),
            (AttrRefMut::Vec4(values), AttrValue::Vec4(v)) => values.fill(v),
            _ => return false,
        }
        true
    }

    pub fn reborrow_mut(&mut self) -> AttrRefMut<'_> {
        match self {
            AttrRefMut::Float(values) => AttrRefMut::Float(&mut values[..]),
            AttrRefMut::Int(values) => AttrRefMut::Int(&mut values[..]),
            AttrRefMut::Bool(values) => AttrRefMut::Bool(&mut values[..]),
            AttrRefMut::Vec2(values) => AttrRefMut::Vec2(&mut values[..]),
            AttrRefMut::Vec3(values) => AttrRefMut::Vec3(&mut values[..]),
            AttrRefMut::Vec4(values) => AttrRefMut::Vec4(&mut values[..]),
        }
    }

    pub fn reborrow(&self) -> AttrRef<'_> {
        match self {
            AttrRefMut::Float(values) => AttrRef::Float(&values[..]),
            AttrRefMut::Int(values) => AttrRef::Int(&values[..]),
            AttrRefMut::Bool(values) => AttrRef::Bool(&values[..]),
            AttrRefMut::Vec2(values) => AttrRef::Vec2(&values[..]),
            AttrRefMut::Vec3(values) => AttrRef::Vec3(&values[..]),
            AttrRefMut::Vec4(values) => AttrRef::Vec4(&values[..]),
        }
    }
}

/// How newly created attribute storage is populated.
pub enum AttributeInit<'a> {
    /// Fill with the type's zero value.
    Default,
    /// Element-wise copy; the view length must match the target domain size.
    FromView(VArray<'a>),
    /// Adopt the buffer as backing storage without copying when possible.
    /// A type mismatch converts (copying) out of the buffer instead.
    Move(AttrStorage),
}

/// One custom attribute: its domain plus backing column.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct CustomAttribute {
    pub domain: AttrDomain,
    pub storage: AttrStorage,
}

/// Side table for user-defined attributes, keyed by name. A `BTreeMap` so
/// iteration order is stable within one call.
#[derive(Debug, Clone, Default, PartialEq, Hash)]
pub struct AttributeSet {
    attrs: BTreeMap<String, CustomAttribute>,
}

impl AttributeSet {
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CustomAttribute> {
        self.attrs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CustomAttribute> {
        self.attrs.get_mut(name)
    }

    pub fn meta_data(&self, name: &str) -> Option<AttributeMetaData> {
        self.attrs.get(name).map(|attr| AttributeMetaData {
            domain: attr.domain,
            data_type: attr.storage.data_type(),
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, domain: AttrDomain, storage: AttrStorage) {
        self.attrs
            .insert(name.into(), CustomAttribute { domain, storage });
    }

    pub fn remove(&mut self, name: &str) -> Option<CustomAttribute> {
        self.attrs.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CustomAttribute)> {
        self.attrs.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}
