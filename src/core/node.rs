//! Path-addressed access to the configuration document
//!
//! Every value reachable from a [`crate::core::document::Document`] implements
//! [`Node`], which reports its [`Shape`] and knows how to descend one path
//! segment, re-encode itself and decode a replacement. The free functions in
//! this module walk dotted field paths (`devices.lab.addr`, `sequences.boot.0.cmd`)
//! over that capability, so reads and writes never need runtime reflection.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::FieldError;

/// Shape of a node, which decides how the next path segment is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Fixed set of named fields
    Record,
    /// String-keyed map
    Dictionary,
    /// Ordered list addressed by index
    List,
    /// Leaf value
    Scalar,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Record => "record",
            Self::Dictionary => "dictionary",
            Self::List => "list",
            Self::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

/// Why a child lookup failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Miss {
    /// No child with that name
    Absent,
    /// List index past the end
    OutOfRange { index: usize, len: usize },
}

/// Why a node refused a new value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Input does not decode into the node's shape
    Decode(String),
    /// Append is not defined for this shape
    Unsupported(Shape),
}

/// A raw input value on its way into a node
///
/// Keeps the original text next to its parsed YAML so string fields can take
/// scalars such as `1.10` or `0755` verbatim instead of their numeric reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    raw: Option<String>,
    value: Value,
}

impl Fragment {
    /// Parse user input as a YAML fragment
    ///
    /// Text that is not valid YAML is taken as a plain string.
    pub fn parse(raw: &str) -> Self {
        let value = serde_yaml::from_str::<Value>(raw)
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        Self {
            raw: Some(raw.to_string()),
            value,
        }
    }

    /// Wrap an already structured value
    pub fn from_value(value: Value) -> Self {
        Self { raw: None, value }
    }

    /// The parsed value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Interpret the fragment as dictionary entries
    ///
    /// `key=value` text becomes a single entry when the text before the first
    /// `=` is a bare key (no whitespace or YAML indicators); the value may then
    /// contain anything, including `=` and `: `. Any other input must be a YAML
    /// mapping, so keys containing `=` need the flow form `{"a=b": c}`.
    pub fn entries(&self) -> Result<Vec<(String, Fragment)>, Rejection> {
        if let Some(entry) = self.shortcut() {
            return Ok(vec![entry]);
        }
        match &self.value {
            Value::Mapping(map) => map
                .iter()
                .map(|(k, v)| Ok((key_text(k)?, Fragment::from_value(v.clone()))))
                .collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(Rejection::Decode(format!(
                "expected a mapping or key=value, got {}",
                describe(other)
            ))),
        }
    }

    /// The single `key=value` entry written with the shortcut form, if any
    pub fn shortcut(&self) -> Option<(String, Fragment)> {
        let (key, value) = self.raw.as_deref().and_then(split_shortcut)?;
        Some((key.to_string(), Fragment::parse(value)))
    }

    /// Decode into any deserializable type
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, Rejection> {
        serde_yaml::from_value(self.value.clone()).map_err(|e| Rejection::Decode(e.to_string()))
    }
}

/// A value addressable by dotted field paths
pub trait Node {
    /// Shape used to interpret the next path segment
    fn shape(&self) -> Shape;

    /// Child addressed by one path segment
    fn child(&self, segment: &str) -> Result<&dyn Node, Miss>;

    /// Mutable child addressed by one path segment
    fn child_mut(&mut self, segment: &str) -> Result<&mut dyn Node, Miss>;

    /// Names of all children, in natural order
    fn keys(&self) -> Vec<String>;

    /// Canonical key/value tree of this node
    fn encode(&self) -> Result<Value, String>;

    /// Replace this node wholesale with the decoded fragment
    fn assign(&mut self, fragment: &Fragment) -> Result<(), Rejection>;

    /// Merge (dictionaries) or push (lists) the decoded fragment
    fn append(&mut self, _fragment: &Fragment) -> Result<(), Rejection> {
        Err(Rejection::Unsupported(self.shape()))
    }

    /// Add the entry `key` to a dictionary
    fn insert(&mut self, _key: &str, _fragment: &Fragment) -> Result<(), Rejection> {
        Err(Rejection::Unsupported(self.shape()))
    }
}

/// Implement [`Node`] for a record from its encoded field names
///
/// Records decode through serde, so the type must derive `Deserialize` with
/// `deny_unknown_fields` and implement `Default` (an empty input resets it).
#[macro_export]
macro_rules! record_node {
    ($ty:ty { $($name:literal => $field:ident),* $(,)? }) => {
        impl $crate::core::node::Node for $ty {
            fn shape(&self) -> $crate::core::node::Shape {
                $crate::core::node::Shape::Record
            }

            fn child(
                &self,
                segment: &str,
            ) -> Result<&dyn $crate::core::node::Node, $crate::core::node::Miss> {
                match segment {
                    $($name => Ok(&self.$field as &dyn $crate::core::node::Node),)*
                    _ => Err($crate::core::node::Miss::Absent),
                }
            }

            fn child_mut(
                &mut self,
                segment: &str,
            ) -> Result<&mut dyn $crate::core::node::Node, $crate::core::node::Miss> {
                match segment {
                    $($name => Ok(&mut self.$field as &mut dyn $crate::core::node::Node),)*
                    _ => Err($crate::core::node::Miss::Absent),
                }
            }

            fn keys(&self) -> Vec<String> {
                vec![$($name.to_string()),*]
            }

            fn encode(&self) -> Result<serde_yaml::Value, String> {
                serde_yaml::to_value(self).map_err(|e| e.to_string())
            }

            fn assign(
                &mut self,
                fragment: &$crate::core::node::Fragment,
            ) -> Result<(), $crate::core::node::Rejection> {
                if let Some((key, entry)) = fragment.shortcut() {
                    let mut record = Self::default();
                    $crate::core::node::Node::child_mut(&mut record, &key)
                        .map_err(|_| {
                            $crate::core::node::Rejection::Decode(format!("unknown field `{key}`"))
                        })?
                        .assign(&entry)?;
                    *self = record;
                    return Ok(());
                }
                *self = if fragment.value().is_null() {
                    Self::default()
                } else {
                    fragment.decode()?
                };
                Ok(())
            }
        }
    };
}

/// Implement [`Node`] for leaf types decoded through serde
macro_rules! scalar_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Node for $ty {
                fn shape(&self) -> Shape {
                    Shape::Scalar
                }

                fn child(&self, _segment: &str) -> Result<&dyn Node, Miss> {
                    Err(Miss::Absent)
                }

                fn child_mut(&mut self, _segment: &str) -> Result<&mut dyn Node, Miss> {
                    Err(Miss::Absent)
                }

                fn keys(&self) -> Vec<String> {
                    Vec::new()
                }

                fn encode(&self) -> Result<Value, String> {
                    serde_yaml::to_value(self).map_err(|e| e.to_string())
                }

                fn assign(&mut self, fragment: &Fragment) -> Result<(), Rejection> {
                    *self = fragment.decode()?;
                    Ok(())
                }
            }
        )*
    };
}

scalar_node!(bool, u32, u64);

/// Optional leaves such as enumerated names; `null` clears them
impl<T> Node for Option<T>
where
    T: Serialize + DeserializeOwned,
{
    fn shape(&self) -> Shape {
        Shape::Scalar
    }

    fn child(&self, _segment: &str) -> Result<&dyn Node, Miss> {
        Err(Miss::Absent)
    }

    fn child_mut(&mut self, _segment: &str) -> Result<&mut dyn Node, Miss> {
        Err(Miss::Absent)
    }

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn encode(&self) -> Result<Value, String> {
        serde_yaml::to_value(self).map_err(|e| e.to_string())
    }

    fn assign(&mut self, fragment: &Fragment) -> Result<(), Rejection> {
        *self = fragment.decode()?;
        Ok(())
    }
}

impl Node for String {
    fn shape(&self) -> Shape {
        Shape::Scalar
    }

    fn child(&self, _segment: &str) -> Result<&dyn Node, Miss> {
        Err(Miss::Absent)
    }

    fn child_mut(&mut self, _segment: &str) -> Result<&mut dyn Node, Miss> {
        Err(Miss::Absent)
    }

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn encode(&self) -> Result<Value, String> {
        Ok(Value::String(self.clone()))
    }

    fn assign(&mut self, fragment: &Fragment) -> Result<(), Rejection> {
        *self = match &fragment.value {
            Value::String(s) => s.clone(),
            Value::Null | Value::Bool(_) | Value::Number(_) => match &fragment.raw {
                Some(raw) => raw.trim().to_string(),
                None => scalar_text(&fragment.value),
            },
            // Text such as `status: ok` reads as YAML structure; keep it as typed
            other => match &fragment.raw {
                Some(raw) => raw.trim().to_string(),
                None => {
                    return Err(Rejection::Decode(format!(
                        "expected a string, got {}",
                        describe(other)
                    )))
                }
            },
        };
        Ok(())
    }
}

impl<V> Node for BTreeMap<String, V>
where
    V: Node + Default + Serialize,
{
    fn shape(&self) -> Shape {
        Shape::Dictionary
    }

    fn child(&self, segment: &str) -> Result<&dyn Node, Miss> {
        self.get(segment).map(|v| v as &dyn Node).ok_or(Miss::Absent)
    }

    fn child_mut(&mut self, segment: &str) -> Result<&mut dyn Node, Miss> {
        self.get_mut(segment)
            .map(|v| v as &mut dyn Node)
            .ok_or(Miss::Absent)
    }

    fn keys(&self) -> Vec<String> {
        BTreeMap::keys(self).cloned().collect()
    }

    fn encode(&self) -> Result<Value, String> {
        serde_yaml::to_value(self).map_err(|e| e.to_string())
    }

    fn assign(&mut self, fragment: &Fragment) -> Result<(), Rejection> {
        *self = decode_entries::<V>(fragment)?.into_iter().collect();
        Ok(())
    }

    fn append(&mut self, fragment: &Fragment) -> Result<(), Rejection> {
        self.extend(decode_entries::<V>(fragment)?);
        Ok(())
    }

    fn insert(&mut self, key: &str, fragment: &Fragment) -> Result<(), Rejection> {
        BTreeMap::insert(self, key.to_string(), decode_element::<V>(fragment)?);
        Ok(())
    }
}

impl<T> Node for Vec<T>
where
    T: Node + Default + Serialize,
{
    fn shape(&self) -> Shape {
        Shape::List
    }

    fn child(&self, segment: &str) -> Result<&dyn Node, Miss> {
        let index = parse_index(segment)?;
        let len = self.len();
        self.get(index)
            .map(|v| v as &dyn Node)
            .ok_or(Miss::OutOfRange { index, len })
    }

    fn child_mut(&mut self, segment: &str) -> Result<&mut dyn Node, Miss> {
        let index = parse_index(segment)?;
        let len = self.len();
        self.get_mut(index)
            .map(|v| v as &mut dyn Node)
            .ok_or(Miss::OutOfRange { index, len })
    }

    fn keys(&self) -> Vec<String> {
        (0..self.len()).map(|i| i.to_string()).collect()
    }

    fn encode(&self) -> Result<Value, String> {
        serde_yaml::to_value(self).map_err(|e| e.to_string())
    }

    fn assign(&mut self, fragment: &Fragment) -> Result<(), Rejection> {
        let items = match &fragment.value {
            Value::Sequence(items) => items,
            Value::Null => {
                self.clear();
                return Ok(());
            }
            other => {
                return Err(Rejection::Decode(format!(
                    "expected a list, got {}",
                    describe(other)
                )))
            }
        };
        *self = items
            .iter()
            .map(|item| decode_element::<T>(&Fragment::from_value(item.clone())))
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn append(&mut self, fragment: &Fragment) -> Result<(), Rejection> {
        self.push(decode_element::<T>(fragment)?);
        Ok(())
    }
}

/// Free-form values (`app.options`) take their shape from their content
impl Node for Value {
    fn shape(&self) -> Shape {
        match self {
            Value::Mapping(_) => Shape::Dictionary,
            Value::Sequence(_) => Shape::List,
            _ => Shape::Scalar,
        }
    }

    fn child(&self, segment: &str) -> Result<&dyn Node, Miss> {
        match self {
            Value::Mapping(map) => map
                .iter()
                .find(|(k, _)| key_matches(k, segment))
                .map(|(_, v)| v as &dyn Node)
                .ok_or(Miss::Absent),
            Value::Sequence(items) => {
                let index = parse_index(segment)?;
                items
                    .get(index)
                    .map(|v| v as &dyn Node)
                    .ok_or(Miss::OutOfRange {
                        index,
                        len: items.len(),
                    })
            }
            _ => Err(Miss::Absent),
        }
    }

    fn child_mut(&mut self, segment: &str) -> Result<&mut dyn Node, Miss> {
        match self {
            Value::Mapping(map) => map
                .iter_mut()
                .find(|(k, _)| key_matches(k, segment))
                .map(|(_, v)| v as &mut dyn Node)
                .ok_or(Miss::Absent),
            Value::Sequence(items) => {
                let index = parse_index(segment)?;
                let len = items.len();
                items
                    .get_mut(index)
                    .map(|v| v as &mut dyn Node)
                    .ok_or(Miss::OutOfRange { index, len })
            }
            _ => Err(Miss::Absent),
        }
    }

    fn keys(&self) -> Vec<String> {
        match self {
            Value::Mapping(map) => map.keys().filter_map(|k| key_text(k).ok()).collect(),
            Value::Sequence(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    fn encode(&self) -> Result<Value, String> {
        Ok(self.clone())
    }

    fn assign(&mut self, fragment: &Fragment) -> Result<(), Rejection> {
        *self = fragment.value.clone();
        Ok(())
    }

    fn append(&mut self, fragment: &Fragment) -> Result<(), Rejection> {
        match self {
            Value::Mapping(map) => {
                for (key, entry) in fragment.entries()? {
                    map.insert(Value::String(key), entry.value);
                }
                Ok(())
            }
            Value::Null => {
                let mut map = Mapping::new();
                for (key, entry) in fragment.entries()? {
                    map.insert(Value::String(key), entry.value);
                }
                *self = Value::Mapping(map);
                Ok(())
            }
            Value::Sequence(items) => {
                items.push(fragment.value.clone());
                Ok(())
            }
            _ => Err(Rejection::Unsupported(Shape::Scalar)),
        }
    }

    fn insert(&mut self, key: &str, fragment: &Fragment) -> Result<(), Rejection> {
        if self.is_null() {
            *self = Value::Mapping(Mapping::new());
        }
        match self {
            Value::Mapping(map) => {
                map.insert(Value::String(key.to_string()), fragment.value.clone());
                Ok(())
            }
            _ => Err(Rejection::Unsupported(Shape::Scalar)),
        }
    }
}

fn decode_element<T: Node + Default>(fragment: &Fragment) -> Result<T, Rejection> {
    let mut element = T::default();
    element.assign(fragment)?;
    Ok(element)
}

fn decode_entries<V: Node + Default>(fragment: &Fragment) -> Result<Vec<(String, V)>, Rejection> {
    fragment
        .entries()?
        .into_iter()
        .map(|(key, entry)| Ok((key, decode_element::<V>(&entry)?)))
        .collect()
}

fn split_shortcut(raw: &str) -> Option<(&str, &str)> {
    const INDICATORS: &str = ":{}[],\"'#&*!|>%@`";
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    let bare = !key.is_empty()
        && !key
            .chars()
            .any(|c| c.is_whitespace() || INDICATORS.contains(c));
    bare.then_some((key, value))
}

fn parse_index(segment: &str) -> Result<usize, Miss> {
    segment.parse::<usize>().map_err(|_| Miss::Absent)
}

fn key_matches(key: &Value, segment: &str) -> bool {
    key_text(key).is_ok_and(|k| k == segment)
}

fn key_text(key: &Value) -> Result<String, Rejection> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(_) | Value::Bool(_) => Ok(scalar_text(key)),
        other => Err(Rejection::Decode(format!(
            "unsupported dictionary key {}",
            describe(other)
        ))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// ============================================
// Path walking
// ============================================

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|_| !path.is_empty())
}

fn prefix_of(path: &str, upto: usize) -> String {
    path.split('.').take(upto + 1).collect::<Vec<_>>().join(".")
}

fn miss_error(path: &str, depth: usize, segment: &str, miss: Miss) -> FieldError {
    match miss {
        Miss::Absent => FieldError::InvalidField {
            path: prefix_of(path, depth),
            segment: segment.to_string(),
        },
        Miss::OutOfRange { index, len } => FieldError::IndexOutOfRange {
            path: prefix_of(path, depth),
            index,
            len,
        },
    }
}

/// Locate the node at `path`; the empty path is the root itself
pub fn resolve<'a>(root: &'a dyn Node, path: &str) -> Result<&'a dyn Node, FieldError> {
    let mut node = root;
    for (depth, segment) in segments(path).enumerate() {
        node = node
            .child(segment)
            .map_err(|miss| miss_error(path, depth, segment, miss))?;
    }
    Ok(node)
}

/// Mutable variant of [`resolve`]
pub fn resolve_mut<'a>(root: &'a mut dyn Node, path: &str) -> Result<&'a mut dyn Node, FieldError> {
    let mut node = root;
    for (depth, segment) in segments(path).enumerate() {
        node = node
            .child_mut(segment)
            .map_err(|miss| miss_error(path, depth, segment, miss))?;
    }
    Ok(node)
}

/// Read the canonical value at `path`
pub fn read(root: &dyn Node, path: &str) -> Result<Value, FieldError> {
    resolve(root, path)?
        .encode()
        .map_err(|error| FieldError::Encode {
            path: path.to_string(),
            error,
        })
}

/// Replace (`append == false`) or extend (`append == true`) the node at `path`
///
/// The input is fully decoded before the target changes, so a failed write
/// leaves the document untouched.
pub fn write(root: &mut dyn Node, path: &str, raw: &str, append: bool) -> Result<(), FieldError> {
    let fragment = Fragment::parse(raw);
    apply(root, path, &fragment, append)
}

/// [`write`] with an already parsed fragment
pub fn apply(
    root: &mut dyn Node,
    path: &str,
    fragment: &Fragment,
    append: bool,
) -> Result<(), FieldError> {
    let target = resolve_mut(root, path)?;
    apply_at(target, path, fragment, append)
}

/// Plain [`write`] that also adds the last segment when it is a missing
/// dictionary key
pub fn upsert(root: &mut dyn Node, path: &str, raw: &str) -> Result<(), FieldError> {
    let fragment = Fragment::parse(raw);
    let missing = match resolve_mut(root, path) {
        Ok(target) => return apply_at(target, path, &fragment, false),
        Err(error) => error,
    };
    let (parent_path, key) = path.rsplit_once('.').unwrap_or(("", path));
    match resolve_mut(root, parent_path) {
        Ok(parent) if parent.shape() == Shape::Dictionary && parent.child(key).is_err() => parent
            .insert(key, &fragment)
            .map_err(|rejection| rejected(path, rejection)),
        _ => Err(missing),
    }
}

/// Assign or append `fragment` to a node already resolved from `path`
fn apply_at(
    target: &mut dyn Node,
    path: &str,
    fragment: &Fragment,
    append: bool,
) -> Result<(), FieldError> {
    let result = if append {
        target.append(fragment)
    } else {
        target.assign(fragment)
    };
    result.map_err(|rejection| rejected(path, rejection))
}

fn rejected(path: &str, rejection: Rejection) -> FieldError {
    match rejection {
        Rejection::Decode(error) => FieldError::TypeMismatch {
            path: path.to_string(),
            error,
        },
        Rejection::Unsupported(shape) => FieldError::UnsupportedAppend {
            path: path.to_string(),
            shape: shape.to_string(),
        },
    }
}

/// Replay a canonical tree onto `node`, which sits at `path`
///
/// Records and existing dictionary entries are descended key by key; new
/// dictionary entries are inserted; lists and scalars are replaced.
pub fn overlay(node: &mut dyn Node, path: &str, value: &Value) -> Result<(), FieldError> {
    let shape = node.shape();
    let map = match value {
        Value::Mapping(map) if matches!(shape, Shape::Record | Shape::Dictionary) => map,
        _ => return apply_at(node, path, &Fragment::from_value(value.clone()), false),
    };

    for (key, child_value) in map {
        let key = key_text(key).map_err(|_| FieldError::InvalidField {
            path: path.to_string(),
            segment: scalar_text(key),
        })?;
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };

        if node.child(&key).is_ok() {
            let child = node.child_mut(&key).map_err(|_| FieldError::InvalidField {
                path: child_path.clone(),
                segment: key.clone(),
            })?;
            overlay(child, &child_path, child_value)?;
        } else if shape == Shape::Dictionary {
            node.insert(&key, &Fragment::from_value(child_value.clone()))
                .map_err(|rejection| rejected(&child_path, rejection))?;
        } else {
            return Err(FieldError::InvalidField {
                path: child_path,
                segment: key,
            });
        }
    }
    Ok(())
}

/// Completion candidates one segment longer than `prefix`
///
/// A prefix ending in `.` lists every child of the node it names; otherwise
/// the last segment filters the parent's children by prefix. Unresolvable
/// prefixes yield nothing.
pub fn suggestions(root: &dyn Node, prefix: &str) -> Vec<String> {
    let (parent, partial) = prefix.rsplit_once('.').unwrap_or(("", prefix));
    let Ok(node) = resolve(root, parent) else {
        return Vec::new();
    };

    let mut found: Vec<String> = node
        .keys()
        .into_iter()
        .filter(|key| key.starts_with(partial))
        .map(|key| {
            if parent.is_empty() {
                key
            } else {
                format!("{parent}.{key}")
            }
        })
        .collect();
    if node.shape() != Shape::List {
        found.sort();
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Value {
        serde_yaml::from_str("{debug: true, ports: [80, 443], nested: {level: 2}}").unwrap()
    }

    #[test]
    fn test_fragment_shortcut_splits_at_first_equals() {
        let entries = Fragment::parse("cmd=echo a=b").entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "cmd");
        assert_eq!(entries[0].1.value(), &Value::String("echo a=b".to_string()));
    }

    #[test]
    fn test_fragment_mapping_wins_over_shortcut() {
        let entries = Fragment::parse("{\"a=b\": c}").entries().unwrap();
        assert_eq!(entries[0].0, "a=b");
    }

    #[test]
    fn test_fragment_shortcut_value_may_contain_mapping() {
        let entries = Fragment::parse("lab={addr: x}").entries().unwrap();
        assert_eq!(entries[0].0, "lab");
        let expected: Value = serde_yaml::from_str("{addr: x}").unwrap();
        assert_eq!(entries[0].1.value(), &expected);
    }

    #[test]
    fn test_fragment_with_indicator_before_equals_is_yaml() {
        let entries = Fragment::parse("a: b=c").entries().unwrap();
        assert_eq!(entries[0].0, "a");
        assert_eq!(entries[0].1.value(), &Value::String("b=c".to_string()));
    }

    #[test]
    fn test_fragment_without_entries_is_rejected() {
        assert!(matches!(
            Fragment::parse("plain").entries(),
            Err(Rejection::Decode(_))
        ));
    }

    #[test]
    fn test_string_keeps_raw_numeric_text() {
        let mut version = String::new();
        version.assign(&Fragment::parse("1.10")).unwrap();
        assert_eq!(version, "1.10");
    }

    #[test]
    fn test_string_keeps_raw_text_that_reads_as_mapping() {
        let mut description = String::new();
        description.assign(&Fragment::parse(" Status: ok ")).unwrap();
        assert_eq!(description, "Status: ok");
    }

    #[test]
    fn test_string_rejects_parsed_mapping() {
        let mut name = String::new();
        let value: Value = serde_yaml::from_str("{a: b}").unwrap();
        assert!(name.assign(&Fragment::from_value(value)).is_err());
    }

    #[test]
    fn test_value_descends_mapping_and_list() {
        let value = options();
        assert_eq!(read(&value, "ports.1").unwrap(), Value::from(443));
        assert_eq!(read(&value, "nested.level").unwrap(), Value::from(2));
    }

    #[test]
    fn test_value_index_out_of_range() {
        let value = options();
        let err = read(&value, "ports.5").unwrap_err();
        assert_eq!(
            err,
            FieldError::IndexOutOfRange {
                path: "ports.5".to_string(),
                index: 5,
                len: 2
            }
        );
    }

    #[test]
    fn test_cannot_descend_into_scalar() {
        let value = options();
        let err = read(&value, "debug.more").unwrap_err();
        assert!(matches!(err, FieldError::InvalidField { segment, .. } if segment == "more"));
    }

    #[test]
    fn test_append_to_unset_value_creates_mapping() {
        let mut value = Value::Null;
        write(&mut value, "", "foo=bar", true).unwrap();
        assert_eq!(read(&value, "foo").unwrap(), Value::String("bar".to_string()));
    }

    #[test]
    fn test_append_to_scalar_value_is_unsupported() {
        let mut value = options();
        let err = write(&mut value, "debug", "x=y", true).unwrap_err();
        assert!(matches!(err, FieldError::UnsupportedAppend { shape, .. } if shape == "scalar"));
    }

    #[test]
    fn test_dictionary_append_overwrites_on_collision() {
        let mut env: BTreeMap<String, String> = BTreeMap::new();
        write(&mut env, "", "{A: one, B: two}", false).unwrap();
        write(&mut env, "", "B=three", true).unwrap();
        assert_eq!(env.get("A").map(String::as_str), Some("one"));
        assert_eq!(env.get("B").map(String::as_str), Some("three"));
    }

    #[test]
    fn test_failed_dictionary_write_leaves_target_untouched() {
        let mut env: BTreeMap<String, String> = BTreeMap::new();
        write(&mut env, "", "{A: one}", false).unwrap();
        assert!(write(&mut env, "", "{B: two, C: [x]}", true).is_err());
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_upsert_adds_missing_dictionary_key() {
        let mut env: BTreeMap<String, Value> = BTreeMap::new();
        assert!(write(&mut env, "docs", "true", false).is_err());
        upsert(&mut env, "docs", "true").unwrap();
        assert_eq!(env.get("docs"), Some(&Value::Bool(true)));
        upsert(&mut env, "docs", "false").unwrap();
        assert_eq!(env.get("docs"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_upsert_below_missing_key_fails() {
        let mut env: BTreeMap<String, Value> = BTreeMap::new();
        let err = upsert(&mut env, "a.b", "1").unwrap_err();
        assert!(matches!(err, FieldError::InvalidField { segment, .. } if segment == "a"));
        assert!(env.is_empty());
    }

    #[test]
    fn test_upsert_into_free_form_mapping() {
        let mut value = options();
        upsert(&mut value, "nested.extra", "{deep: x}").unwrap();
        assert_eq!(
            read(&value, "nested.extra.deep").unwrap(),
            Value::String("x".to_string())
        );
    }

    #[test]
    fn test_overlay_nested_tree_at_non_root_path() {
        let mut value = options();
        let layer: Value =
            serde_yaml::from_str("{nested: {level: 3, extra: {deep: x}}, ports: [22]}").unwrap();
        overlay(&mut value, "", &layer).unwrap();
        assert_eq!(read(&value, "nested.level").unwrap(), Value::from(3));
        assert_eq!(
            read(&value, "nested.extra.deep").unwrap(),
            Value::String("x".to_string())
        );
        assert_eq!(read(&value, "ports").unwrap(), serde_yaml::from_str::<Value>("[22]").unwrap());
    }

    #[test]
    fn test_overlay_inserts_new_dictionary_entries() {
        let mut env: BTreeMap<String, String> = BTreeMap::new();
        let layer: Value = serde_yaml::from_str("{A: one, B: two}").unwrap();
        overlay(&mut env, "build.env", &layer).unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env.get("B").map(String::as_str), Some("two"));
    }

    #[test]
    fn test_list_append_pushes_single_element() {
        let mut list: Vec<String> = vec!["a".to_string()];
        write(&mut list, "", "b", true).unwrap();
        assert_eq!(list, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_suggestions_for_value() {
        let value = options();
        assert_eq!(
            suggestions(&value, ""),
            vec!["debug".to_string(), "nested".to_string(), "ports".to_string()]
        );
        assert_eq!(suggestions(&value, "ports."), vec!["ports.0", "ports.1"]);
        assert!(suggestions(&value, "missing.").is_empty());
    }
}
