//! Result records.

use alloc::string::String;
use core::fmt;
use sylva_core::Value;

/// One matched document: the queried fields plus the document id and the
/// aggregate version of the matched nodes.
///
/// The version is an opaque change counter. It grows whenever a matched
/// field is rewritten, but it does not order records of different ids.
#[derive(Clone, PartialEq)]
pub struct Record {
    id: String,
    version: u64,
    data: Value,
}

impl Record {
    pub fn new(id: impl Into<String>, version: u64, data: Value) -> Self {
        Self {
            id: id.into(),
            version,
            data,
        }
    }

    /// Returns the document id.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the aggregate version (`_v`).
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the matched data.
    #[inline]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Looks up a (dotted) field path of the matched data.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.data.get_path(path)
    }

    /// Flattens the record into a mapping with `id` and `_v` keys added to
    /// the matched fields. Data that is not a mapping is kept under `value`.
    pub fn to_value(&self) -> Value {
        let mut out = if self.data.is_map() {
            self.data.clone()
        } else {
            Value::object([("value", self.data.clone())])
        };
        out.insert("id", self.id.as_str());
        out.insert("_v", self.version);
        out
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("_v", &self.version)
            .field("data", &self.data)
            .finish()
    }
}
