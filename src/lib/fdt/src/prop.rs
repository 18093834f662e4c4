use crate::value::{bytes_to_value, Value};

/// A single property attached to a node.
///
/// `offset` caches the property's byte position within the struct block of
/// the last-synced blob; it is `None` for properties added since the last
/// sync and is invalidated (set back to `None`) by any further mutation.
#[derive(Clone, Debug)]
pub struct Prop {
    name: String,
    value: Value,
    dirty: bool,
    offset: Option<usize>,
}

impl Prop {
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            value: bytes_to_value(bytes),
            dirty: false,
            offset: None,
        }
    }

    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            dirty: true,
            offset: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = Some(offset);
    }

    pub fn invalidate_offset(&mut self) {
        self.offset = None;
    }

    /// Mark this property as written back during the last sync.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Replace the value outright, e.g. `set_int`/`set_data` on the node.
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
        self.dirty = true;
        self.offset = None;
    }

    /// Widen this property's value in place to also represent `incoming`.
    pub fn widen(&mut self, incoming: &Value) {
        let before = self.value.clone();
        crate::value::widen(&mut self.value, incoming);
        if self.value != before {
            self.dirty = true;
            self.offset = None;
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match &self.value {
            Value::Bool => Vec::new(),
            Value::Byte(b) => vec![*b],
            Value::ByteList(v) => v.clone(),
            Value::Int(i) => i.to_be_bytes().to_vec(),
            Value::IntList(v) => v.iter().flat_map(|c| c.to_be_bytes()).collect(),
            Value::Int64List(v) => v.iter().flat_map(|c| c.to_be_bytes()).collect(),
            Value::Str(s) => {
                let mut b = s.as_bytes().to_vec();
                b.push(0);
                b
            }
            Value::StrList(v) => {
                let mut b = Vec::new();
                for s in v {
                    b.extend_from_slice(s.as_bytes());
                    b.push(0);
                }
                b
            }
        }
    }
}
