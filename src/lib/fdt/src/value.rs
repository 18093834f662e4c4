//! Property type inference and the widening lattice.

/// Inferred type of a property's raw bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Type {
    Byte,
    Int,
    Str,
    Bool,
    Int64,
}

/// Rank of a type in the widening lattice, narrowest to widest:
/// `Int64 < Bool < Str < Int < Byte`. This is deliberately not the same
/// as any derived `Ord` on `Type` itself — the lattice order and the
/// type's natural declaration order are unrelated, and conflating them
/// is an easy way to get widening backwards.
fn lattice_rank(t: Type) -> u8 {
    match t {
        Type::Int64 => 0,
        Type::Bool => 1,
        Type::Str => 2,
        Type::Int => 3,
        Type::Byte => 4,
    }
}

/// The interpreted value of a property: either a single scalar or an
/// ordered sequence of same-typed elements.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool,
    Byte(u8),
    ByteList(Vec<u8>),
    Int(u32),
    IntList(Vec<u32>),
    Int64List(Vec<u64>),
    Str(String),
    StrList(Vec<String>),
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Bool => Type::Bool,
            Value::Byte(_) | Value::ByteList(_) => Type::Byte,
            Value::Int(_) | Value::IntList(_) => Type::Int,
            Value::Int64List(_) => Type::Int64,
            Value::Str(_) | Value::StrList(_) => Type::Str,
        }
    }

    /// Number of elements if this is a list-shaped value, `None` for a
    /// bare scalar (including `Bool`, which has no length).
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Bool | Value::Byte(_) | Value::Int(_) | Value::Str(_) => None,
            Value::ByteList(v) => Some(v.len()),
            Value::IntList(v) => Some(v.len()),
            Value::Int64List(v) => Some(v.len()),
            Value::StrList(v) => Some(v.len()),
        }
    }

    /// True if this value is represented as a list (even a list of one).
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Value::ByteList(_) | Value::IntList(_) | Value::Int64List(_) | Value::StrList(_)
        )
    }
}

/// Infer a property's type and value from its raw bytes.
///
/// Rules: empty -> `Bool(true)`. Otherwise split on NUL: if the terminator
/// is last and every preceding segment is non-empty printable ASCII
/// (32..=127), it is a string (or string list). Else if the size is not a
/// multiple of 4 it is a byte (or byte list). Else it is an int (or int
/// list of 4-byte big-endian cells).
pub fn bytes_to_value(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Bool;
    }

    if let Some(strings) = try_as_strings(bytes) {
        return if strings.len() == 1 {
            Value::Str(strings.into_iter().next().unwrap())
        } else {
            Value::StrList(strings)
        };
    }

    if bytes.len() % 4 != 0 {
        return if bytes.len() == 1 {
            Value::Byte(bytes[0])
        } else {
            Value::ByteList(bytes.to_vec())
        };
    }

    let cells: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    if cells.len() == 1 {
        Value::Int(cells[0])
    } else {
        Value::IntList(cells)
    }
}

fn try_as_strings(bytes: &[u8]) -> Option<Vec<String>> {
    if *bytes.last()? != 0 {
        return None;
    }
    let mut out = Vec::new();
    for segment in bytes[..bytes.len() - 1].split(|&b| b == 0) {
        if segment.is_empty() {
            return None;
        }
        if !segment.iter().all(|&b| (32..=127).contains(&b)) {
            return None;
        }
        out.push(String::from_utf8(segment.to_vec()).ok()?);
    }
    if out.is_empty() {
        return None;
    }
    Some(out)
}

/// Widen `existing` in place so it can represent everything `incoming` can.
///
/// Both values are first lifted to list form if either is (scalars widen
/// to lists when an observation at a wider length is seen). Special
/// transitions beyond plain type promotion: widening `Bool` to `Int`
/// yields a single-cell `[0]`; widening `Int` to `Byte` re-encodes each
/// 4-byte cell as its four constituent bytes (big-endian), not as a
/// 4-character string of that cell's decimal value.
pub fn widen(existing: &mut Value, incoming: &Value) {
    let target_rank = lattice_rank(existing.ty()).max(lattice_rank(incoming.ty()));
    promote_to_rank(existing, target_rank);

    let target_len = incoming
        .len()
        .unwrap_or(1)
        .max(existing.len().unwrap_or(1));
    if target_len > 1 || existing.is_list() || incoming.is_list() {
        pad_to_len(existing, target_len);
    }
}

fn promote_to_rank(value: &mut Value, target_rank: u8) {
    loop {
        let cur = lattice_rank(value.ty());
        if cur >= target_rank {
            return;
        }
        *value = match std::mem::replace(value, Value::Bool) {
            Value::Bool => Value::Int(0),
            Value::Int(v) => Value::ByteList(v.to_be_bytes().to_vec()),
            Value::IntList(vs) => {
                let mut bytes = Vec::with_capacity(vs.len() * 4);
                for v in vs {
                    bytes.extend_from_slice(&v.to_be_bytes());
                }
                Value::ByteList(bytes)
            }
            Value::Str(s) => Value::Byte(s.bytes().next().unwrap_or(0)),
            Value::StrList(ss) => {
                Value::ByteList(ss.into_iter().flat_map(|s| s.into_bytes()).collect())
            }
            other => other,
        };
    }
}

fn pad_to_len(value: &mut Value, target_len: usize) {
    match value {
        Value::Bool => {}
        Value::Byte(b) => *value = Value::ByteList(pad_vec(vec![*b], target_len, 0)),
        Value::ByteList(v) => pad_in_place(v, target_len, 0),
        Value::Int(i) => *value = Value::IntList(pad_vec(vec![*i], target_len, 0)),
        Value::IntList(v) => pad_in_place(v, target_len, 0),
        Value::Int64List(v) => pad_in_place(v, target_len, 0),
        Value::Str(s) => *value = Value::StrList(pad_vec(vec![s.clone()], target_len, String::new())),
        Value::StrList(v) => pad_in_place(v, target_len, String::new()),
    }
}

fn pad_vec<T: Clone>(mut v: Vec<T>, len: usize, zero: T) -> Vec<T> {
    pad_in_place(&mut v, len, zero);
    v
}

fn pad_in_place<T: Clone>(v: &mut Vec<T>, len: usize, zero: T) {
    while v.len() < len {
        v.push(zero.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_bool() {
        assert_eq!(bytes_to_value(&[]), Value::Bool);
    }

    #[test]
    fn single_string() {
        let v = bytes_to_value(b"hello\0");
        assert_eq!(v, Value::Str("hello".into()));
    }

    #[test]
    fn string_list() {
        let v = bytes_to_value(b"a\0bb\0");
        assert_eq!(v, Value::StrList(vec!["a".into(), "bb".into()]));
    }

    #[test]
    fn single_cell_int() {
        let v = bytes_to_value(&[0, 0, 0, 5]);
        assert_eq!(v, Value::Int(5));
    }

    #[test]
    fn int_list() {
        let v = bytes_to_value(&[0, 0, 0, 1, 0, 0, 0, 2]);
        assert_eq!(v, Value::IntList(vec![1, 2]));
    }

    #[test]
    fn odd_length_is_byte() {
        let v = bytes_to_value(&[1, 2, 3]);
        assert_eq!(v, Value::ByteList(vec![1, 2, 3]));
    }

    #[test]
    fn widen_bool_to_int_yields_single_cell_list() {
        let mut a = Value::Bool;
        widen(&mut a, &Value::IntList(vec![1, 2]));
        assert_eq!(a, Value::IntList(vec![0, 0]));
    }

    #[test]
    fn widen_lengthens_with_zero_padding() {
        let mut a = Value::Int(1);
        widen(&mut a, &Value::IntList(vec![1, 2]));
        assert_eq!(a, Value::IntList(vec![1, 0]));
    }

    #[test]
    fn widen_int_to_byte_splits_cells() {
        let mut a = Value::Int(0x01020304);
        widen(&mut a, &Value::Byte(9));
        assert_eq!(a, Value::ByteList(vec![1, 2, 3, 4]));
    }

    #[test]
    fn widen_is_order_independent() {
        let mut a = Value::Int(1);
        widen(&mut a, &Value::ByteList(vec![9, 9]));
        let mut b = Value::ByteList(vec![9, 9]);
        widen(&mut b, &Value::Int(1));
        assert_eq!(a.ty(), Type::Byte);
        assert_eq!(b.ty(), Type::Byte);
    }
}
