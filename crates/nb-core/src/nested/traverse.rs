use std::ops::ControlFlow;

use crate::error::NestedError;
use crate::path::{Key, Path};
use crate::value::{Map, Value};

/// Options for [`map`] and [`try_map`].
#[derive(Debug, Clone, Copy)]
pub struct MapOptions {
    /// Pass an argument that is not a container of the current node's kind
    /// unchanged into every child.
    pub broadcast: bool,
    /// Rebuild tuples and records as such. When `false` the output only has
    /// maps and lists.
    pub keep_type: bool,
    /// Descend into records. When `false` records are leaves.
    pub records_as_nested: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            broadcast: false,
            keep_type: true,
            records_as_nested: false,
        }
    }
}

impl MapOptions {
    /// Default options with broadcasting switched on.
    #[must_use]
    pub fn broadcast() -> Self {
        Self {
            broadcast: true,
            ..Self::default()
        }
    }
}

/// Apply `f` to the leaves of `first` and the corresponding parts of `rest`.
///
/// The output has the shape of `first`. At every internal node of `first`
/// the other arguments must be congruent (same key set, same length, same
/// record fields) unless broadcasting lets a non-container through.
///
/// # Errors
/// [`NestedError::StructuralMismatch`] when shapes disagree.
///
/// # Example
/// ```
/// use nb_core::nested::{map, MapOptions};
/// use nb_core::Value;
/// use serde_json::json;
///
/// let a = Value::from(json!({"a": 1, "b": {"c": [1, 1]}}));
/// let b = Value::from(json!({"a": 0, "b": [1, 3]}));
/// fn weighted(v: &[&Value]) -> Value {
///     match (v[0], v[1]) {
///         (Value::Int(x), Value::Int(y)) => Value::Int(x + 3 * y),
///         _ => Value::Null,
///     }
/// }
///
/// assert!(map(weighted, &a, &[&b], MapOptions::default()).is_err());
/// let out = map(weighted, &a, &[&b], MapOptions::broadcast()).unwrap();
/// assert_eq!(out, Value::from(json!({"a": 1, "b": {"c": [4, 10]}})));
/// ```
pub fn map<F>(mut f: F, first: &Value, rest: &[&Value], options: MapOptions) -> Result<Value, NestedError>
where
    F: FnMut(&[&Value]) -> Value,
{
    try_map(|leaves| Ok(f(leaves)), first, rest, options)
}

/// Fallible variant of [`map`]; the first error returned by `f` aborts the walk.
///
/// # Errors
/// Whatever `f` returns, or a structural mismatch converted into `E`.
pub fn try_map<F, E>(mut f: F, first: &Value, rest: &[&Value], options: MapOptions) -> Result<Value, E>
where
    F: FnMut(&[&Value]) -> Result<Value, E>,
    E: From<NestedError>,
{
    walk(&mut f, first, rest, options, &Path::new())
}

fn walk<F, E>(f: &mut F, first: &Value, rest: &[&Value], options: MapOptions, path: &Path) -> Result<Value, E>
where
    F: FnMut(&[&Value]) -> Result<Value, E>,
    E: From<NestedError>,
{
    match first {
        Value::Map(entries) => {
            check_args(rest, options, path, |arg| match arg {
                Value::Map(other) => Some(same_keys(entries, other)),
                _ => None,
            })?;
            let mut output = Map::with_capacity(entries.len());
            for (key, child) in entries {
                let children: Vec<&Value> = rest
                    .iter()
                    .map(|&arg| match arg {
                        Value::Map(other) => other.get(key).unwrap_or(arg),
                        _ => arg,
                    })
                    .collect();
                let value = walk(f, child, &children, options, &path.child(key.as_str()))?;
                output.insert(key.clone(), value);
            }
            Ok(Value::Map(output))
        }
        Value::List(items) | Value::Tuple(items) => {
            check_args(rest, options, path, |arg| {
                arg.as_slice().map(|other| other.len() == items.len())
            })?;
            let mut output = Vec::with_capacity(items.len());
            for (index, child) in items.iter().enumerate() {
                let children: Vec<&Value> = rest
                    .iter()
                    .map(|&arg| arg.as_slice().and_then(|other| other.get(index)).unwrap_or(arg))
                    .collect();
                output.push(walk(f, child, &children, options, &path.child(index))?);
            }
            match first {
                Value::Tuple(_) if options.keep_type => Ok(Value::Tuple(output)),
                _ => Ok(Value::List(output)),
            }
        }
        Value::Record(record) if options.records_as_nested => {
            let names = record.field_names();
            check_args(rest, options, path, |arg| match arg {
                Value::Record(other) => Some(same_names(names, other.field_names())),
                _ => None,
            })?;
            let mut output = Vec::with_capacity(names.len());
            for name in names {
                let Some(child) = record.field(name) else {
                    return Err(mismatch(path, format!("record field {name} is unreadable")).into());
                };
                let children: Vec<&Value> = rest
                    .iter()
                    .map(|&arg| match arg {
                        Value::Record(other) => other.field(name).unwrap_or(arg),
                        _ => arg,
                    })
                    .collect();
                output.push(walk(f, child, &children, options, &path.child(*name))?);
            }
            if options.keep_type {
                Ok(Value::Record(record.rebuild(output)?))
            } else {
                Ok(Value::Map(
                    names
                        .iter()
                        .map(|name| (*name).to_string())
                        .zip(output)
                        .collect(),
                ))
            }
        }
        leaf => {
            let mut leaves = Vec::with_capacity(rest.len() + 1);
            leaves.push(leaf);
            leaves.extend_from_slice(rest);
            f(&leaves)
        }
    }
}

/// Validate the companions of a container node.
///
/// `congruent` returns `None` when the argument is not a container of the
/// node's kind, `Some(shape_matches)` otherwise.
fn check_args<C>(rest: &[&Value], options: MapOptions, path: &Path, congruent: C) -> Result<(), NestedError>
where
    C: Fn(&Value) -> Option<bool>,
{
    for (position, &arg) in rest.iter().enumerate() {
        match congruent(arg) {
            Some(true) => {}
            Some(false) => {
                return Err(mismatch(
                    path,
                    format!("argument {} has a different shape", position + 1),
                ));
            }
            None if options.broadcast => {}
            None => {
                return Err(mismatch(
                    path,
                    format!(
                        "argument {} is a {} where a container was expected",
                        position + 1,
                        arg.type_name()
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn same_keys(a: &Map, b: &Map) -> bool {
    a.len() == b.len() && a.keys().all(|key| b.contains_key(key))
}

fn same_names(a: &[&str], b: &[&str]) -> bool {
    a.len() == b.len() && a.iter().all(|name| b.contains(name))
}

fn mismatch(path: &Path, reason: String) -> NestedError {
    log::debug!("map: structural mismatch at {path}: {reason}");
    NestedError::StructuralMismatch {
        path: path.clone(),
        reason,
    }
}

/// Visit every leaf of `tree` in order until `visit` breaks.
///
/// Maps, lists and tuples are descended into; records are leaves.
pub fn try_for_each_leaf<B, F>(tree: &Value, visit: &mut F) -> ControlFlow<B>
where
    F: FnMut(&Value) -> ControlFlow<B>,
{
    match tree {
        Value::Map(entries) => {
            for child in entries.values() {
                try_for_each_leaf(child, visit)?;
            }
            ControlFlow::Continue(())
        }
        Value::List(items) | Value::Tuple(items) => {
            for child in items {
                try_for_each_leaf(child, visit)?;
            }
            ControlFlow::Continue(())
        }
        leaf => visit(leaf),
    }
}

/// True if `predicate` holds for at least one leaf. Stops at the first hit.
///
/// # Example
/// ```
/// use nb_core::nested::any;
/// use nb_core::Value;
/// use serde_json::json;
/// assert!(any(&Value::from(json!([1, 2, 3, 4])), |v| v.as_f64().is_some_and(|x| x % 2.0 == 1.0)));
/// ```
pub fn any<P>(tree: &Value, mut predicate: P) -> bool
where
    P: FnMut(&Value) -> bool,
{
    try_for_each_leaf(tree, &mut |leaf| {
        if predicate(leaf) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .is_break()
}

/// True if `predicate` holds for every leaf; `all(x, p) == !any(x, !p)`.
pub fn all<P>(tree: &Value, mut predicate: P) -> bool
where
    P: FnMut(&Value) -> bool,
{
    !any(tree, |leaf| !predicate(leaf))
}

/// [`any`] with [`Value::is_truthy`] as the predicate.
#[must_use]
pub fn any_truthy(tree: &Value) -> bool {
    any(tree, Value::is_truthy)
}

/// [`all`] with [`Value::is_truthy`] as the predicate.
#[must_use]
pub fn all_truthy(tree: &Value) -> bool {
    all(tree, Value::is_truthy)
}

/// Collapse maps and lists whose (squeezed) children are equal leaves.
///
/// Empty containers are kept.
///
/// # Example
/// ```
/// use nb_core::nested::squeeze;
/// use nb_core::Value;
/// use serde_json::json;
/// assert_eq!(squeeze(Value::from(json!({"a": 1, "b": 1}))), Value::Int(1));
/// assert_eq!(
///     squeeze(Value::from(json!({"a": {"x": 2, "y": 2}, "b": [3, 4]}))),
///     Value::from(json!({"a": 2, "b": [3, 4]}))
/// );
/// ```
#[must_use]
pub fn squeeze(value: Value) -> Value {
    match value {
        Value::Map(entries) => {
            let entries: Map = entries
                .into_iter()
                .map(|(key, child)| (key, squeeze(child)))
                .collect();
            match uniform_leaf(entries.values()) {
                Some(leaf) => leaf,
                None => Value::Map(entries),
            }
        }
        Value::List(items) => {
            let items: Vec<Value> = items.into_iter().map(squeeze).collect();
            match uniform_leaf(items.iter()) {
                Some(leaf) => leaf,
                None => Value::List(items),
            }
        }
        other => other,
    }
}

fn uniform_leaf<'a, I>(mut children: I) -> Option<Value>
where
    I: Iterator<Item = &'a Value>,
{
    let first = children.next()?;
    let squeezable = |v: &Value| !matches!(v, Value::Map(_) | Value::List(_));
    if !squeezable(first) {
        return None;
    }
    children
        .all(|child| squeezable(child) && child == first)
        .then(|| first.clone())
}

/// One path per leaf of `tree`, in traversal order. Records are leaves.
#[must_use]
pub fn leaf_paths(tree: &Value) -> Vec<Path> {
    let mut paths = Vec::new();
    collect_paths(tree, &Path::new(), &mut paths);
    paths
}

fn collect_paths(tree: &Value, prefix: &Path, paths: &mut Vec<Path>) {
    match tree {
        Value::Map(entries) => {
            for (key, child) in entries {
                collect_paths(child, &prefix.child(Key::Name(key.clone())), paths);
            }
        }
        Value::List(items) | Value::Tuple(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_paths(child, &prefix.child(index), paths);
            }
        }
        _ => paths.push(prefix.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    crate::nested_record! {
        struct Data { a, b }
    }

    fn int(v: &Value) -> i64 {
        match v {
            Value::Int(i) => *i,
            other => panic!("expected int, got {other}"),
        }
    }

    fn add(values: &[&Value]) -> Value {
        Value::Int(values.iter().map(|v| int(v)).sum())
    }

    fn tuple(items: &[i64]) -> Value {
        Value::Tuple(items.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn map_like_zip() {
        let out = map(add, &tuple(&[3, 5]), &[&tuple(&[7, 11])], MapOptions::default()).unwrap();
        assert_eq!(out, tuple(&[10, 16]));
    }

    #[test]
    fn map_over_nested_tuples_keeps_tuples() {
        let mut a = Map::new();
        a.insert("a".into(), tuple(&[3, 5]));
        let mut b = Map::new();
        b.insert("a".into(), tuple(&[7, 11]));
        let out = map(add, &Value::Map(a), &[&Value::Map(b)], MapOptions::default()).unwrap();
        assert_eq!(out.to_string(), r#"{"a": (10, 16)}"#);
    }

    #[test]
    fn keep_type_false_materializes_lists() {
        let options = MapOptions {
            keep_type: false,
            ..MapOptions::default()
        };
        let out = map(add, &tuple(&[1, 2]), &[], options).unwrap();
        assert_eq!(out, Value::from(json!([1, 2])));
    }

    #[test]
    fn weighted_sum_over_matching_trees() {
        let a = Value::from(json!({"a": [1], "b": {"c": 4}}));
        let b = Value::from(json!({"a": [0], "b": {"c": 1}}));
        let out = map(
            |v| Value::Int(int(v[0]) + 3 * int(v[1])),
            &a,
            &[&b],
            MapOptions::default(),
        )
        .unwrap();
        assert_eq!(out, Value::from(json!({"a": [1], "b": {"c": 7}})));
    }

    #[test]
    fn mismatch_reports_location() {
        let a = Value::from(json!({"a": 1, "b": {"c": [1, 1]}}));
        let b = Value::from(json!({"a": 0, "b": [1, 3]}));
        let err = map(add, &a, &[&b], MapOptions::default()).unwrap_err();
        match err {
            NestedError::StructuralMismatch { path, .. } => assert_eq!(path.to_string(), "b"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn broadcast_still_checks_containers_of_same_kind() {
        let a = Value::from(json!({"x": 1, "y": 2}));
        let b = Value::from(json!({"x": 1}));
        assert!(map(add, &a, &[&b], MapOptions::broadcast()).is_err());
        let lists = map(
            add,
            &Value::from(json!([1, 2])),
            &[&Value::from(json!([1, 2, 3]))],
            MapOptions::broadcast(),
        );
        assert!(lists.is_err());
    }

    #[test]
    fn broadcast_scalar_over_tree() {
        let a = Value::from(json!({"x": [1, 2], "y": 3}));
        let out = map(add, &a, &[&Value::Int(10)], MapOptions::broadcast()).unwrap();
        assert_eq!(out, Value::from(json!({"x": [11, 12], "y": 13})));
    }

    #[test]
    fn records_are_leaves_by_default() {
        let a: Value = Data {
            a: Value::Int(3),
            b: Value::Int(5),
        }
        .into();
        let mut seen = 0;
        map(
            |v| {
                seen += 1;
                assert_eq!(v[0].type_name(), "Data");
                Value::Null
            },
            &a,
            &[],
            MapOptions::default(),
        )
        .unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn records_as_nested_rebuilds_record() {
        let a: Value = Data {
            a: Value::Int(3),
            b: Value::Int(5),
        }
        .into();
        let b: Value = Data {
            a: Value::Int(7),
            b: Value::Int(11),
        }
        .into();
        let options = MapOptions {
            records_as_nested: true,
            ..MapOptions::default()
        };
        let out = map(add, &a, &[&b], options).unwrap();
        assert_eq!(out.to_string(), "Data(a=10, b=16)");

        let plain = map(
            add,
            &a,
            &[&b],
            MapOptions {
                keep_type: false,
                ..options
            },
        )
        .unwrap();
        assert_eq!(plain, Value::from(json!({"a": 10, "b": 16})));
    }

    #[test]
    fn try_map_propagates_callback_errors() {
        let tree = Value::from(json!([1, "x", 3]));
        let result: Result<Value, NestedError> = try_map(
            |v| match v[0] {
                Value::Int(_) => Ok(v[0].clone()),
                _ => Err(NestedError::EmptyPath),
            },
            &tree,
            &[],
            MapOptions::default(),
        );
        assert_eq!(result.unwrap_err(), NestedError::EmptyPath);
    }

    #[test]
    fn any_and_all_truthiness() {
        assert!(!any_truthy(&Value::from(json!([false, false, false]))));
        assert!(any_truthy(&Value::from(json!([true, false, false]))));
        assert!(!any_truthy(&Value::from(json!({"a": false}))));
        assert!(any_truthy(&Value::from(json!({"a": false, "b": true}))));
        assert!(any_truthy(&Value::from(json!([true, {"a": true}]))));

        assert!(all_truthy(&Value::from(json!([true, true, true]))));
        assert!(!all_truthy(&Value::from(json!([true, false, true]))));
        assert!(!all_truthy(&Value::from(json!([true, {"a": true, "b": {"c": true}}, 1, ""]))));
    }

    #[test]
    fn all_with_predicate() {
        let odd = |v: &Value| v.as_f64().is_some_and(|x| x % 2.0 == 1.0);
        assert!(all(&Value::from(json!([1, 3, 5, 7])), odd));
        assert!(!all(&Value::from(json!([1, 2, 3, 4])), odd));
    }

    #[test]
    fn any_stops_at_first_hit() {
        let mut calls = 0;
        let hit = any(&Value::from(json!([0, 1, 2, 3])), |v| {
            calls += 1;
            v.is_truthy()
        });
        assert!(hit);
        assert_eq!(calls, 2);
    }

    #[test]
    fn squeeze_keeps_heterogeneous_and_empty() {
        assert_eq!(squeeze(Value::from(json!({}))), Value::from(json!({})));
        assert_eq!(squeeze(Value::from(json!([1, 2]))), Value::from(json!([1, 2])));
        assert_eq!(squeeze(Value::from(json!([[5, 5], [5, 5]]))), Value::Int(5));
    }

    #[test]
    fn leaf_paths_in_order() {
        let tree = Value::from(json!({"a": [1, 2], "b": {"c": 3}}));
        let paths: Vec<String> = leaf_paths(&tree).iter().map(ToString::to_string).collect();
        assert_eq!(paths, ["a.0", "a.1", "b.c"]);
    }
}
