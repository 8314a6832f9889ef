use std::collections::BTreeSet;

use geoset_types::{AttrType, AttrValue};
use tracing::warn;

use crate::attributes::{
    AttrDomain, AttrRefMut, AttrStorage, AttributeInit, AttributeMetaData, AttributeSet,
};
use crate::providers::ComponentProviders;
use crate::varray::VArray;

fn fallback_value(default: Option<AttrValue>, data_type: AttrType) -> AttrValue {
    default
        .and_then(|value| value.try_convert(data_type))
        .unwrap_or_else(|| data_type.default_value())
}

fn build_storage(
    data_type: AttrType,
    expected_len: usize,
    init: AttributeInit<'_>,
) -> Option<AttrStorage> {
    match init {
        AttributeInit::Default => Some(AttrStorage::new(data_type, expected_len)),
        AttributeInit::FromView(view) => {
            if view.len() != expected_len {
                warn!(
                    "attribute initializer length {} does not match domain size {}",
                    view.len(),
                    expected_len
                );
                return None;
            }
            view.materialize().convert_to(data_type)
        }
        AttributeInit::Move(storage) => {
            if storage.len() != expected_len {
                return None;
            }
            if storage.data_type() == data_type {
                // Adopt the buffer directly.
                Some(storage)
            } else {
                // Cannot use the buffer as-is: copy out, then let it drop.
                storage.convert_to(data_type)
            }
        }
    }
}

/// Capability interface every geometry component implements. The provided
/// methods are the one generic attribute surface: they consult the static
/// provider table for built-ins and fall back to the custom side table.
pub trait AttributeAccess: Sized + 'static {
    fn providers() -> &'static ComponentProviders<Self>;

    fn custom_attributes(&self) -> Option<&AttributeSet>;

    /// Mutable access to the side table. Implementations route through their
    /// payload write path, so shared bulk data is privately copied first.
    fn custom_attributes_mut(&mut self) -> Option<&mut AttributeSet>;

    /// Authoritative element count for the domain on this component.
    fn attribute_domain_size(&self, domain: AttrDomain) -> usize;

    /// Re-expresses a view on another domain, or `None` when no
    /// interpolation is implemented for the pair. Identity always works.
    fn attribute_try_adapt_domain<'a>(
        &self,
        varray: VArray<'a>,
        from: AttrDomain,
        to: AttrDomain,
    ) -> Option<VArray<'a>>;

    fn attribute_domain_supported(&self, domain: AttrDomain) -> bool {
        Self::providers().supported_domains.contains(&domain)
    }

    /// Whether the name designates a built-in attribute of this component
    /// kind, present or not.
    fn attribute_is_builtin(&self, name: &str) -> bool {
        Self::providers().builtin(name).is_some()
    }

    fn attribute_exists(&self, name: &str) -> bool {
        if let Some(provider) = Self::providers().builtin(name) {
            return (provider.exists)(self);
        }
        self.custom_attributes()
            .is_some_and(|attrs| attrs.contains(name))
    }

    fn attribute_get_meta_data(&self, name: &str) -> Option<AttributeMetaData> {
        if let Some(provider) = Self::providers().builtin(name) {
            return (provider.exists)(self).then_some(AttributeMetaData {
                domain: provider.domain,
                data_type: provider.data_type,
            });
        }
        self.custom_attributes()?.meta_data(name)
    }

    /// Read view at the attribute's native domain and type.
    fn attribute_try_get_for_read(&self, name: &str) -> Option<(VArray<'_>, AttributeMetaData)> {
        if let Some(provider) = Self::providers().builtin(name) {
            let varray = (provider.read)(self)?;
            return Some((
                varray,
                AttributeMetaData {
                    domain: provider.domain,
                    data_type: provider.data_type,
                },
            ));
        }
        let attr = self.custom_attributes()?.get(name)?;
        Some((
            VArray::Span(attr.storage.as_ref()),
            AttributeMetaData {
                domain: attr.domain,
                data_type: attr.storage.data_type(),
            },
        ))
    }

    /// Read view adapted to the requested domain and converted to the
    /// requested type. `None` when either step is unsupported.
    fn attribute_try_get_for_read_as(
        &self,
        name: &str,
        domain: AttrDomain,
        data_type: AttrType,
    ) -> Option<VArray<'_>> {
        if !self.attribute_domain_supported(domain) {
            return None;
        }
        let (varray, meta) = self.attribute_try_get_for_read(name)?;
        let adapted = self.attribute_try_adapt_domain(varray, meta.domain, domain)?;
        adapted.convert(data_type)
    }

    /// Total read: a constant view of the requested length stands in when the
    /// attribute is missing or unconvertible.
    fn attribute_get_for_read(
        &self,
        name: &str,
        domain: AttrDomain,
        data_type: AttrType,
        default: Option<AttrValue>,
    ) -> VArray<'_> {
        if let Some(varray) = self.attribute_try_get_for_read_as(name, domain, data_type) {
            return varray;
        }
        VArray::filled(
            fallback_value(default, data_type),
            self.attribute_domain_size(domain),
        )
    }

    fn attribute_try_create(
        &mut self,
        name: &str,
        domain: AttrDomain,
        data_type: AttrType,
        init: AttributeInit<'_>,
    ) -> bool {
        if name.is_empty() || !self.attribute_domain_supported(domain) {
            return false;
        }
        if let Some(provider) = Self::providers().builtin(name) {
            if provider.domain != domain || provider.data_type != data_type {
                return false;
            }
            if (provider.exists)(self) {
                return false;
            }
            let expected = self.attribute_domain_size(domain);
            let Some(storage) = build_storage(data_type, expected, init) else {
                return false;
            };
            return (provider.create)(self, storage);
        }
        if self
            .custom_attributes()
            .is_none_or(|attrs| attrs.contains(name))
        {
            return false;
        }
        let expected = self.attribute_domain_size(domain);
        let Some(storage) = build_storage(data_type, expected, init) else {
            return false;
        };
        let Some(attrs) = self.custom_attributes_mut() else {
            return false;
        };
        attrs.insert(name, domain, storage);
        true
    }

    fn attribute_try_delete(&mut self, name: &str) -> bool {
        if let Some(provider) = Self::providers().builtin(name) {
            if !provider.deletable {
                return false;
            }
            return (provider.remove)(self);
        }
        if !self
            .custom_attributes()
            .is_some_and(|attrs| attrs.contains(name))
        {
            return false;
        }
        self.custom_attributes_mut()
            .is_some_and(|attrs| attrs.remove(name).is_some())
    }

    /// Visits every attribute with its metadata, built-in then custom, in an
    /// order that is stable within one call. The callback returns false to
    /// stop; the method returns false iff iteration stopped early.
    fn attribute_foreach(
        &self,
        mut callback: impl FnMut(&str, AttributeMetaData) -> bool,
    ) -> bool {
        for provider in Self::providers().builtins {
            if (provider.exists)(self)
                && !callback(
                    provider.name,
                    AttributeMetaData {
                        domain: provider.domain,
                        data_type: provider.data_type,
                    },
                )
            {
                return false;
            }
        }
        if let Some(attrs) = self.custom_attributes() {
            for (name, attr) in attrs.iter() {
                let meta = AttributeMetaData {
                    domain: attr.domain,
                    data_type: attr.storage.data_type(),
                };
                if !callback(name, meta) {
                    return false;
                }
            }
        }
        true
    }

    fn attribute_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.attribute_foreach(|name, _| {
            names.insert(name.to_string());
            true
        });
        names
    }

    /// Scoped write handle. When the name exists with an incompatible
    /// domain/type, writes go to a temporary buffer that replaces the
    /// original only when the handle is released; readers observe the old
    /// attribute until then.
    fn attribute_try_get_for_output(
        &mut self,
        name: &str,
        domain: AttrDomain,
        data_type: AttrType,
        default: Option<AttrValue>,
    ) -> Option<OutputAttribute<'_>> {
        if !self.attribute_domain_supported(domain) {
            return None;
        }
        match self.attribute_get_meta_data(name) {
            Some(meta) if meta.domain == domain && meta.data_type == data_type => {
                if let Some(provider) = Self::providers().builtin(name) {
                    let span = (provider.write)(self)?;
                    return Some(OutputAttribute::direct(domain, span));
                }
                let attr = self.custom_attributes_mut()?.get_mut(name)?;
                Some(OutputAttribute::direct(domain, attr.storage.as_mut()))
            }
            Some(_) => {
                if Self::providers().builtin(name).is_some() {
                    // Built-in signatures are fixed; nothing can replace them.
                    return None;
                }
                let len = self.attribute_domain_size(domain);
                let buffer = match self.attribute_try_get_for_read_as(name, domain, data_type) {
                    Some(view) => view.materialize(),
                    None => AttrStorage::filled(fallback_value(default, data_type), len),
                };
                let name = name.to_string();
                Some(OutputAttribute::buffered(
                    domain,
                    buffer,
                    Box::new(move |storage| {
                        if let Some(attrs) = self.custom_attributes_mut() {
                            attrs.remove(&name);
                            attrs.insert(name, domain, storage);
                        }
                    }),
                ))
            }
            None => {
                let len = self.attribute_domain_size(domain);
                let init = match default {
                    Some(value) => AttributeInit::Move(AttrStorage::filled(
                        fallback_value(Some(value), data_type),
                        len,
                    )),
                    None => AttributeInit::Default,
                };
                if !self.attribute_try_create(name, domain, data_type, init) {
                    return None;
                }
                if let Some(provider) = Self::providers().builtin(name) {
                    let span = (provider.write)(self)?;
                    return Some(OutputAttribute::direct(domain, span));
                }
                let attr = self.custom_attributes_mut()?.get_mut(name)?;
                Some(OutputAttribute::direct(domain, attr.storage.as_mut()))
            }
        }
    }
}

enum OutputData<'a> {
    Direct(AttrRefMut<'a>),
    Buffered {
        buffer: Option<AttrStorage>,
        save: Option<Box<dyn FnOnce(AttrStorage) + 'a>>,
    },
}

/// Writable handle bound to one attribute. A buffered handle commits its
/// temporary storage exactly once when released, on every exit path.
pub struct OutputAttribute<'a> {
    domain: AttrDomain,
    data: OutputData<'a>,
}

impl<'a> OutputAttribute<'a> {
    pub(crate) fn direct(domain: AttrDomain, span: AttrRefMut<'a>) -> Self {
        Self {
            domain,
            data: OutputData::Direct(span),
        }
    }

    pub(crate) fn buffered(
        domain: AttrDomain,
        buffer: AttrStorage,
        save: Box<dyn FnOnce(AttrStorage) + 'a>,
    ) -> Self {
        Self {
            domain,
            data: OutputData::Buffered {
                buffer: Some(buffer),
                save: Some(save),
            },
        }
    }

    pub fn domain(&self) -> AttrDomain {
        self.domain
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self.data, OutputData::Buffered { .. })
    }

    pub fn len(&self) -> usize {
        match &self.data {
            OutputData::Direct(span) => span.len(),
            OutputData::Buffered { buffer, .. } => {
                buffer.as_ref().map_or(0, AttrStorage::len)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> Option<AttrType> {
        match &self.data {
            OutputData::Direct(span) => Some(span.data_type()),
            OutputData::Buffered { buffer, .. } => {
                buffer.as_ref().map(AttrStorage::data_type)
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<AttrValue> {
        match &self.data {
            OutputData::Direct(span) => span.get(index),
            OutputData::Buffered { buffer, .. } => buffer.as_ref()?.get(index),
        }
    }

    pub fn set(&mut self, index: usize, value: AttrValue) -> bool {
        match &mut self.data {
            OutputData::Direct(span) => span.set(index, value),
            OutputData::Buffered { buffer, .. } => {
                buffer.as_mut().is_some_and(|buffer| buffer.set(index, value))
            }
        }
    }

    pub fn fill(&mut self, value: AttrValue) -> bool {
        match &mut self.data {
            OutputData::Direct(span) => span.fill(value),
            OutputData::Buffered { buffer, .. } => {
                buffer.as_mut().is_some_and(|buffer| buffer.fill(value))
            }
        }
    }

    pub fn as_mut(&mut self) -> Option<AttrRefMut<'_>> {
        match &mut self.data {
            OutputData::Direct(span) => Some(span.reborrow_mut()),
            OutputData::Buffered { buffer, .. } => {
                debug_assert!(buffer.is_some(), "output buffer already committed");
                buffer.as_mut().map(AttrStorage::as_mut)
            }
        }
    }

    /// Explicit release. Dropping the handle commits as well; this form just
    /// names the point where buffered values become visible.
    pub fn save(mut self) {
        self.commit();
    }

    fn commit(&mut self) {
        if let OutputData::Buffered { buffer, save } = &mut self.data {
            if let (Some(buffer), Some(save)) = (buffer.take(), save.take()) {
                save(buffer);
            }
        }
    }
}

impl Drop for OutputAttribute<'_> {
    fn drop(&mut self) {
        self.commit();
    }
}
