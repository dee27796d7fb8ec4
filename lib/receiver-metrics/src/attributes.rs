use std::fmt;

use metrics::{Label, SharedString};

/// A metric attribute.
///
/// Attributes are the key/value pairs attached to each update of an instrument, and together with the instrument name,
/// identify a single series. Keys are always static, as the set of attribute keys used by a component is fixed at
/// compile time, while values can be either static or computed at runtime.
///
/// Under the hood, the [`metrics`][metrics] crate is used, which calls attributes "labels" instead.
///
/// [metrics]: https://docs.rs/metrics
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Attribute(Label);

impl Attribute {
    /// Creates a new `Attribute` with a static key and the given value.
    pub fn new<V>(key: &'static str, value: V) -> Self
    where
        V: Into<SharedString>,
    {
        Self(Label::new(SharedString::const_str(key), value.into()))
    }

    /// Creates a new `Attribute` from a static key and a static value.
    ///
    /// This does not allocate, and can be used to define attributes as constants.
    pub const fn from_static(key: &'static str, value: &'static str) -> Self {
        Self(Label::from_static_parts(key, value))
    }

    /// Returns the key of this attribute.
    pub fn key(&self) -> &str {
        self.0.key()
    }

    /// Returns the value of this attribute.
    pub fn value(&self) -> &str {
        self.0.value()
    }

    /// Consumes `self` and returns the underlying label.
    pub fn into_label(self) -> Label {
        self.0
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value())
    }
}

pub(crate) fn collect_labels<I>(attributes: I) -> Vec<Label>
where
    I: IntoIterator<Item = Attribute>,
{
    attributes.into_iter().map(Attribute::into_label).collect()
}
