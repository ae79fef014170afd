//! Field paths for addressing within documents
//!
//! Provides [`FieldPath`] and the three traversal modes every migration
//! operation is built on:
//!
//! - **read** ([`Value::get_path`]): absent segments yield `None`
//! - **write-create** ([`Value::insert_path`]): absent intermediates become maps
//! - **delete** ([`Value::remove_path`]): absent paths are a no-op

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::{Map, Value};

/// Dotted address of a field within a document
///
/// # Examples
/// - `"project"` → `["project"]`
/// - `"monitoring.webhooks"` → `["monitoring", "webhooks"]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Create path from segments
    ///
    /// Segments are taken as-is; use [`FromStr`] to parse and validate a
    /// dotted address.
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Empty path (the document root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parents) = self.0.split_last()?;
        Some(Self(parents.to_vec()))
    }

    /// Last segment (if not root)
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Path made of the first `depth` segments
    #[inline]
    #[must_use]
    pub fn prefix(&self, depth: usize) -> Self {
        Self(self.0[..depth.min(self.0.len())].to_vec())
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }

        let segments = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment {
                        path: s.to_string(),
                    })
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.0.join(".")
    }
}

impl From<Vec<String>> for FieldPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

/// Errors related to field paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Path string was empty
    #[error("field path is empty")]
    Empty,

    /// Empty segment in path
    #[error("field path '{path}' contains an empty segment")]
    EmptySegment { path: String },

    /// A write had to descend through a value that is not a map
    #[error("cannot write through '{prefix}': expected a map, found {found}")]
    NotAMap { prefix: FieldPath, found: &'static str },
}

// Path-addressed access. Reads and deletes treat any missing segment (or a
// non-map intermediate) as "absent"; only write-create can fail.
impl Value {
    /// Read the value at `path`
    #[must_use]
    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        descend(self, path.segments())
    }

    /// Mutable access to the value at `path`
    pub fn get_path_mut(&mut self, path: &FieldPath) -> Option<&mut Value> {
        descend_mut(self, path.segments())
    }

    /// Write `value` at `path`, creating intermediate maps as needed
    ///
    /// A `null` intermediate is replaced by an empty map. Returns the value
    /// previously stored at the leaf, if any.
    ///
    /// # Errors
    /// Returns [`PathError::NotAMap`] if an intermediate holds a scalar or a
    /// sequence. The document is left untouched in that case.
    pub fn insert_path(&mut self, path: &FieldPath, value: Value) -> Result<Option<Value>, PathError> {
        let Some((leaf, parents)) = path.segments().split_last() else {
            return Ok(Some(std::mem::replace(self, value)));
        };

        let mut current = self;
        for (depth, segment) in parents.iter().enumerate() {
            current = ensure_map(current, path, depth)?
                .entry(segment.clone())
                .or_insert_with(Value::empty_map);
        }

        let map = ensure_map(current, path, parents.len())?;
        Ok(map.insert(leaf.clone(), value))
    }

    /// Check that [`Value::insert_path`] would succeed for `path`
    ///
    /// # Errors
    /// Returns the error the write would produce.
    pub fn check_writable(&self, path: &FieldPath) -> Result<(), PathError> {
        let Some((_, parents)) = path.segments().split_last() else {
            return Ok(());
        };

        let mut current = self;
        for (depth, segment) in parents.iter().enumerate() {
            match current {
                // Everything below a null or missing node is created fresh
                Value::Null => return Ok(()),
                Value::Map(map) => match map.get(segment.as_str()) {
                    Some(next) => current = next,
                    None => return Ok(()),
                },
                other => {
                    return Err(PathError::NotAMap {
                        prefix: path.prefix(depth),
                        found: other.kind(),
                    })
                }
            }
        }

        match current {
            Value::Null | Value::Map(_) => Ok(()),
            other => Err(PathError::NotAMap {
                prefix: path.prefix(parents.len()),
                found: other.kind(),
            }),
        }
    }

    /// Remove the value at `path`
    ///
    /// Returns `None` (and leaves the document unchanged) if the path is
    /// absent. Sibling order is preserved.
    pub fn remove_path(&mut self, path: &FieldPath) -> Option<Value> {
        self.detach_path(path).map(|(_, value)| value)
    }

    /// Remove the value at `path`, reporting its position within the parent
    pub(crate) fn detach_path(&mut self, path: &FieldPath) -> Option<(usize, Value)> {
        let (leaf, parents) = path.segments().split_last()?;
        let parent = descend_mut(self, parents)?.as_map_mut()?;
        let (index, _, value) = parent.shift_remove_full(leaf.as_str())?;
        Some((index, value))
    }

    /// Put a detached value back at its original position
    pub(crate) fn reattach_path(&mut self, path: &FieldPath, index: usize, value: Value) {
        let Some((leaf, parents)) = path.segments().split_last() else {
            return;
        };
        if let Some(parent) = descend_mut(self, parents).and_then(Value::as_map_mut) {
            let index = index.min(parent.len());
            parent.shift_insert(index, leaf.clone(), value);
        }
    }
}

fn descend<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |current, segment| current.as_map()?.get(segment.as_str()))
}

fn descend_mut<'a>(root: &'a mut Value, segments: &[String]) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in segments {
        current = current.as_map_mut()?.get_mut(segment.as_str())?;
    }
    Some(current)
}

fn ensure_map<'a>(node: &'a mut Value, path: &FieldPath, depth: usize) -> Result<&'a mut Map, PathError> {
    if node.is_null() {
        *node = Value::empty_map();
    }
    let found = node.kind();
    node.as_map_mut().ok_or_else(|| PathError::NotAMap {
        prefix: path.prefix(depth),
        found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    fn doc(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn path_from_str_valid() {
        let p = path("a.b.c");
        assert_eq!(p.segments(), &["a", "b", "c"]);
        assert_eq!(p.len(), 3);
        assert_eq!(p.leaf(), Some("c"));
    }

    #[test]
    fn path_allows_dashes_and_spaces() {
        let p = path("cve-allowlist.expires at");
        assert_eq!(p.segments(), &["cve-allowlist", "expires at"]);
    }

    #[test]
    fn path_from_str_empty() {
        assert_eq!("".parse::<FieldPath>(), Err(PathError::Empty));
    }

    #[test]
    fn path_from_str_empty_segment() {
        let result: Result<FieldPath, _> = "a..b".parse();
        assert!(matches!(result, Err(PathError::EmptySegment { .. })));
        let trailing: Result<FieldPath, _> = "a.".parse();
        assert!(trailing.is_err());
    }

    #[test]
    fn path_parent_and_prefix() {
        let p = path("a.b.c");
        assert_eq!(p.parent().unwrap(), path("a.b"));
        assert_eq!(p.prefix(1), path("a"));
        assert!(FieldPath::root().parent().is_none());
    }


    #[test]
    fn path_display() {
        assert_eq!(path("a.b").to_string(), "a.b");
        assert_eq!(FieldPath::root().to_string(), "<root>");
    }

    #[test]
    fn path_serde_as_string() {
        let p: FieldPath = serde_json::from_str("\"x.y\"").unwrap();
        assert_eq!(p, path("x.y"));
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"x.y\"");
        assert!(serde_json::from_str::<FieldPath>("\"\"").is_err());
    }

    #[test]
    fn get_path_present_and_absent() {
        let value = doc("foo:\n  bar: 1\n");
        assert_eq!(value.get_path(&path("foo.bar")), Some(&Value::Integer(1)));
        assert!(value.get_path(&path("foo.baz")).is_none());
        assert!(value.get_path(&path("missing.bar")).is_none());
    }

    #[test]
    fn get_path_through_scalar_is_absent() {
        let value = doc("foo: text\n");
        assert!(value.get_path(&path("foo.bar")).is_none());
    }

    #[test]
    fn insert_path_creates_intermediates() {
        let mut value = doc("{}");
        let previous = value.insert_path(&path("a.b.c"), Value::from("x")).unwrap();
        assert!(previous.is_none());
        assert_eq!(value, doc("a:\n  b:\n    c: x\n"));
    }

    #[test]
    fn insert_path_overwrites_leaf() {
        let mut value = doc("a:\n  b: 1\n  c: 2\n");
        let previous = value.insert_path(&path("a.b"), Value::Integer(9)).unwrap();
        assert_eq!(previous, Some(Value::Integer(1)));

        // Existing key keeps its position
        let keys: Vec<_> = value.get("a").unwrap().as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn insert_path_replaces_null_intermediate() {
        let mut value = doc("monitoring: ~\n");
        value.insert_path(&path("monitoring.enabled"), Value::Bool(true)).unwrap();
        assert_eq!(value, doc("monitoring:\n  enabled: true\n"));
    }

    #[test]
    fn insert_path_through_scalar_fails_without_mutation() {
        let mut value = doc("a:\n  b: text\n");
        let before = value.clone();

        let err = value.insert_path(&path("a.b.c.d"), Value::Integer(1)).unwrap_err();
        assert_eq!(
            err,
            PathError::NotAMap {
                prefix: path("a.b"),
                found: "string",
            }
        );
        assert_eq!(value, before);
    }

    #[test]
    fn insert_path_through_sequence_fails() {
        let mut value = doc("repositories:\n  - name: r1\n");
        let err = value
            .insert_path(&path("repositories.name"), Value::from("x"))
            .unwrap_err();
        assert!(matches!(err, PathError::NotAMap { found: "sequence", .. }));
    }

    #[test]
    fn insert_path_on_scalar_root_fails() {
        let mut value = Value::from("root");
        let err = value.insert_path(&path("a"), Value::Null).unwrap_err();
        assert!(matches!(err, PathError::NotAMap { ref prefix, .. } if prefix.is_empty()));
    }

    #[test]
    fn check_writable_matches_insert() {
        let value = doc("a:\n  b: text\n  c: ~\nlist: [1]\n");
        for (p, ok) in [
            ("a.b", true),
            ("a.new.deep", true),
            ("a.c.deep", true),
            ("a.b.x", false),
            ("list.x", false),
            ("missing.x.y", true),
        ] {
            let p = path(p);
            assert_eq!(value.check_writable(&p).is_ok(), ok, "{p}");
            assert_eq!(value.clone().insert_path(&p, Value::Null).is_ok(), ok, "{p}");
        }
    }

    #[test]
    fn remove_path_present() {
        let mut value = doc("a:\n  x: 1\n  y: 2\n  z: 3\n");
        assert_eq!(value.remove_path(&path("a.y")), Some(Value::Integer(2)));
        let keys: Vec<_> = value.get("a").unwrap().as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["x", "z"]);
    }

    #[test]
    fn remove_path_absent_is_noop() {
        let mut value = doc("a:\n  x: 1\n");
        let before = value.clone();
        assert!(value.remove_path(&path("a.missing")).is_none());
        assert!(value.remove_path(&path("b.x")).is_none());
        assert!(value.remove_path(&path("a.x.deeper")).is_none());
        assert_eq!(value, before);
    }

    #[test]
    fn detach_and_reattach_restores_order() {
        let mut value = doc("a: 1\nb: 2\nc: 3\n");
        let before = value.clone();

        let (index, detached) = value.detach_path(&path("b")).unwrap();
        assert_eq!(index, 1);
        value.reattach_path(&path("b"), index, detached);

        let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(value, before);
    }
}
