use indexmap::IndexMap;

use crate::error::NestedError;
use crate::path::Path;
use crate::value::{Map, Value};

/// Flatten a nested map into key-tuple paths.
///
/// Only non-empty maps are descended into; lists, tuples, records and empty
/// maps are stored as they are.
#[must_use]
pub fn flatten_paths(map: &Map) -> IndexMap<Vec<String>, Value> {
    let mut items = IndexMap::new();
    let mut prefix = Vec::new();
    flatten_into(map, &mut prefix, &mut items);
    items
}

fn flatten_into(map: &Map, prefix: &mut Vec<String>, items: &mut IndexMap<Vec<String>, Value>) {
    for (key, value) in map {
        prefix.push(key.clone());
        match value {
            Value::Map(inner) if !inner.is_empty() => flatten_into(inner, prefix, items),
            _ => {
                items.insert(prefix.clone(), value.clone());
            }
        }
        prefix.pop();
    }
}

/// Flatten a nested map, joining keys with `sep`.
///
/// Keys containing `sep` make the result ambiguous; this is not checked.
///
/// # Example
/// ```
/// use nb_core::nested::flatten;
/// use nb_core::Value;
/// let tree = Value::from(serde_json::json!(
///     {"a": 1, "c": {"a": 2, "b": {"x": 5, "y": 10}}, "d": [1, 2, 3]}
/// ));
/// let flat = flatten(tree.as_map().unwrap(), ".");
/// let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
/// assert_eq!(keys, ["a", "c.a", "c.b.x", "c.b.y", "d"]);
/// ```
#[must_use]
pub fn flatten(map: &Map, sep: &str) -> IndexMap<String, Value> {
    flatten_paths(map)
        .into_iter()
        .map(|(keys, value)| (keys.join(sep), value))
        .collect()
}

/// Rebuild a nested map from key-tuple paths.
///
/// # Errors
/// [`NestedError::ConflictingKeys`] when a path runs through an existing
/// leaf or lands on an occupied key; [`NestedError::EmptyPath`] for an empty
/// key tuple.
pub fn deflatten_paths<I>(flat: I) -> Result<Map, NestedError>
where
    I: IntoIterator<Item = (Vec<String>, Value)>,
{
    let mut root = Map::new();
    for (keys, value) in flat {
        insert_path(&mut root, &keys, value)?;
    }
    Ok(root)
}

/// Rebuild a nested map from separator-joined keys.
///
/// `max_depth` bounds the number of splits per key: `None` splits fully,
/// `Some(1)` only separates the first level, `Some(0)` leaves keys intact.
///
/// # Errors
/// [`NestedError::EmptySeparator`] for an empty `sep`, otherwise see
/// [`deflatten_paths`].
///
/// # Example
/// ```
/// use nb_core::nested::deflatten;
/// use nb_core::Value;
/// let flat = vec![("a.b", Value::Int(1)), ("a", Value::Int(2))];
/// assert!(deflatten(flat, ".", None).is_err());
/// ```
pub fn deflatten<I, K>(flat: I, sep: &str, max_depth: Option<usize>) -> Result<Map, NestedError>
where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
{
    if sep.is_empty() {
        return Err(NestedError::EmptySeparator);
    }
    let mut root = Map::new();
    for (key, value) in flat {
        let key = key.as_ref();
        let keys: Vec<String> = match max_depth {
            Some(depth) => key
                .splitn(depth.saturating_add(1), sep)
                .map(str::to_string)
                .collect(),
            None => key.split(sep).map(str::to_string).collect(),
        };
        insert_path(&mut root, &keys, value)?;
    }
    Ok(root)
}

fn insert_path(root: &mut Map, keys: &[String], value: Value) -> Result<(), NestedError> {
    let Some((last, parents)) = keys.split_last() else {
        return Err(NestedError::EmptyPath);
    };

    let mut node = root;
    for key in parents {
        node = match node
            .entry(key.clone())
            .or_insert_with(|| Value::Map(Map::new()))
        {
            Value::Map(inner) => inner,
            _ => return Err(conflict(keys)),
        };
    }

    if node.contains_key(last) {
        return Err(conflict(keys));
    }
    node.insert(last.clone(), value);
    Ok(())
}

fn conflict(keys: &[String]) -> NestedError {
    let path = Path::from(keys);
    log::debug!("deflatten: conflicting keys at {path}");
    NestedError::ConflictingKeys { path }
}
