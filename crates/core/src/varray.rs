use std::fmt;

use geoset_types::{converter, AttrType, AttrValue};

use crate::attributes::{AttrRef, AttrStorage};

/// Computed view: values produced per index by a closure. Used for lazy type
/// conversion and derived built-ins.
pub struct DerivedView<'a> {
    len: usize,
    data_type: AttrType,
    eval: Box<dyn Fn(usize) -> AttrValue + Send + Sync + 'a>,
}

impl fmt::Debug for DerivedView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedView")
            .field("len", &self.len)
            .field("data_type", &self.data_type)
            .finish()
    }
}

/// Type-erased read view over a homogeneous value sequence. The physical
/// backing is one of a closed set: a borrowed span, a materialized array the
/// view owns, a single-value broadcast, or a computed value per index.
#[derive(Debug)]
pub enum VArray<'a> {
    Span(AttrRef<'a>),
    Owned(AttrStorage),
    Constant { value: AttrValue, len: usize },
    Derived(DerivedView<'a>),
}

impl<'a> VArray<'a> {
    pub fn filled(value: AttrValue, len: usize) -> VArray<'static> {
        VArray::Constant { value, len }
    }

    pub fn derived<F>(len: usize, data_type: AttrType, eval: F) -> Self
    where
        F: Fn(usize) -> AttrValue + Send + Sync + 'a,
    {
        VArray::Derived(DerivedView {
            len,
            data_type,
            eval: Box::new(eval),
        })
    }

    pub fn len(&self) -> usize {
        match self {
            VArray::Span(span) => span.len(),
            VArray::Owned(storage) => storage.len(),
            VArray::Constant { len, .. } => *len,
            VArray::Derived(view) => view.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> AttrType {
        match self {
            VArray::Span(span) => span.data_type(),
            VArray::Owned(storage) => storage.data_type(),
            VArray::Constant { value, .. } => value.data_type(),
            VArray::Derived(view) => view.data_type,
        }
    }

    pub fn get(&self, index: usize) -> Option<AttrValue> {
        match self {
            VArray::Span(span) => span.get(index),
            VArray::Owned(storage) => storage.get(index),
            VArray::Constant { value, len } => (index < *len).then_some(*value),
            VArray::Derived(view) => (index < view.len).then(|| (view.eval)(index)),
        }
    }

    /// The backing span, when the view is physically contiguous.
    pub fn as_span(&self) -> Option<AttrRef<'_>> {
        match self {
            VArray::Span(span) => Some(*span),
            VArray::Owned(storage) => Some(storage.as_ref()),
            _ => None,
        }
    }

    pub fn materialize(&self) -> AttrStorage {
        match self {
            VArray::Span(span) => span.to_owned(),
            VArray::Owned(storage) => storage.clone(),
            VArray::Constant { value, len } => AttrStorage::filled(*value, *len),
            VArray::Derived(view) => {
                let mut out = AttrStorage::new(view.data_type, view.len);
                for index in 0..view.len {
                    out.set(index, (view.eval)(index));
                }
                out
            }
        }
    }

    pub fn into_storage(self) -> AttrStorage {
        match self {
            VArray::Owned(storage) => storage,
            other => other.materialize(),
        }
    }

    /// View with elements converted to another registered type. Spans and
    /// derived views convert lazily; constants convert their single value.
    /// `None` when the registry has no routine for the pair.
    pub fn convert(self, to: AttrType) -> Option<VArray<'a>> {
        let from = self.data_type();
        if from == to {
            return Some(self);
        }
        let convert = converter(from, to)?;
        let converted = match self {
            VArray::Span(span) => {
                let len = span.len();
                VArray::derived(len, to, move |index| {
                    span.get(index)
                        .map(convert)
                        .unwrap_or_else(|| to.default_value())
                })
            }
            VArray::Owned(storage) => {
                let len = storage.len();
                VArray::derived(len, to, move |index| {
                    storage
                        .get(index)
                        .map(convert)
                        .unwrap_or_else(|| to.default_value())
                })
            }
            VArray::Constant { value, len } => VArray::Constant {
                value: convert(value),
                len,
            },
            VArray::Derived(view) => {
                let eval = view.eval;
                VArray::derived(view.len, to, move |index| convert(eval(index)))
            }
        };
        Some(converted)
    }
}

impl From<AttrStorage> for VArray<'static> {
    fn from(storage: AttrStorage) -> Self {
        VArray::Owned(storage)
    }
}

impl<'a> From<AttrRef<'a>> for VArray<'a> {
    fn from(span: AttrRef<'a>) -> Self {
        VArray::Span(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_view_broadcasts_single_value() {
        let view = VArray::filled(AttrValue::Float(1.5), 3);
        assert_eq!(view.len(), 3);
        assert_eq!(view.data_type(), AttrType::Float);
        assert_eq!(view.get(2), Some(AttrValue::Float(1.5)));
        assert_eq!(view.get(3), None);
        assert_eq!(view.materialize(), AttrStorage::Float(vec![1.5; 3]));
    }

    #[test]
    fn derived_view_computes_per_index() {
        let view = VArray::derived(4, AttrType::Int, |index| AttrValue::Int(index as i32 * 2));
        assert_eq!(view.get(0), Some(AttrValue::Int(0)));
        assert_eq!(view.get(3), Some(AttrValue::Int(6)));
        assert_eq!(view.materialize(), AttrStorage::Int(vec![0, 2, 4, 6]));
    }

    #[test]
    fn span_converts_lazily() {
        let values = [1, 2, 3];
        let view = VArray::Span(AttrRef::Int(&values));
        let converted = view.convert(AttrType::Float).unwrap();
        assert!(matches!(converted, VArray::Derived(_)));
        assert_eq!(converted.len(), 3);
        assert_eq!(converted.get(1), Some(AttrValue::Float(2.0)));
        assert_eq!(
            converted.materialize(),
            AttrStorage::Float(vec![1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn unsupported_conversion_is_none() {
        let values = [[1.0, 2.0]; 2];
        let view = VArray::Span(AttrRef::Vec2(&values));
        assert!(view.convert(AttrType::Bool).is_none());
    }

    #[test]
    fn identity_conversion_keeps_backing() {
        let view = VArray::filled(AttrValue::Bool(true), 2);
        let same = view.convert(AttrType::Bool).unwrap();
        assert!(matches!(same, VArray::Constant { .. }));
    }
}
