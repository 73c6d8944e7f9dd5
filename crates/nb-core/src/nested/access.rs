use crate::error::NestedError;
use crate::path::{Key, Path};
use crate::value::Value;

/// Index `tree` successively by every key of `path`.
///
/// With `allow_partial`, a failed step at a node that is not a map returns
/// that node: a scalar reached early covers the rest of the path. An empty
/// path returns the root.
///
/// # Errors
/// [`NestedError::PathNotFound`] if some step cannot be taken.
///
/// # Example
/// ```
/// use nb_core::nested::get_by_path;
/// use nb_core::Value;
/// use serde_json::json;
///
/// let d = Value::from(json!({"a": "b", "c": {"d": {"e": "f"}, "g": [1, [2, 3], 4]}}));
/// assert_eq!(get_by_path(&d, &"c.d.e".into(), false).unwrap(), &Value::from("f"));
/// assert_eq!(get_by_path(&d, &"c.g.1.0".into(), false).unwrap(), &Value::Int(2));
/// assert_eq!(get_by_path(&d, &"a.b.c".into(), true).unwrap(), &Value::from("b"));
/// assert!(get_by_path(&d, &"c.b.c".into(), false).is_err());
/// ```
pub fn get_by_path<'a>(tree: &'a Value, path: &Path, allow_partial: bool) -> Result<&'a Value, NestedError> {
    let mut node = tree;
    for key in path.keys() {
        match node.get(key) {
            Some(child) => node = child,
            None if allow_partial && !node.is_map() => return Ok(node),
            None => {
                return Err(NestedError::PathNotFound { path: path.clone() });
            }
        }
    }
    Ok(node)
}

/// [`get_by_path`], falling back to `default` when the path is missing.
#[must_use]
pub fn get_by_path_or<'a>(
    tree: &'a Value,
    path: &Path,
    allow_partial: bool,
    default: &'a Value,
) -> &'a Value {
    get_by_path(tree, path, allow_partial).unwrap_or(default)
}

/// Assign `value` at `path`, in place.
///
/// The parent of the last key must already exist; no intermediate nodes are
/// created. Map keys may be new, list positions and record fields must exist.
///
/// # Errors
/// [`NestedError::EmptyPath`] for an empty path, [`NestedError::PathNotFound`]
/// if the parent is missing or cannot hold the last key.
///
/// # Example
/// ```
/// use nb_core::nested::set_by_path;
/// use nb_core::path::{Key, Path};
/// use nb_core::Value;
/// use serde_json::json;
///
/// let mut d = Value::from(json!({}));
/// set_by_path(&mut d, &"a".into(), Value::from(json!({}))).unwrap();
/// set_by_path(&mut d, &"a.b".into(), Value::from(json!({"c": [1, 2, 3], "d": "e"}))).unwrap();
/// let path: Path = vec![Key::from("a"), Key::from("b"), Key::from("c"), Key::Index(2)].into();
/// set_by_path(&mut d, &path, Value::Int(42)).unwrap();
/// assert_eq!(d, Value::from(json!({"a": {"b": {"c": [1, 2, 42], "d": "e"}}})));
/// ```
pub fn set_by_path(tree: &mut Value, path: &Path, value: Value) -> Result<(), NestedError> {
    let Some((last, parents)) = path.keys().split_last() else {
        return Err(NestedError::EmptyPath);
    };
    let not_found = || NestedError::PathNotFound { path: path.clone() };

    let mut node = tree;
    for key in parents {
        node = node.get_mut(key).ok_or_else(not_found)?;
    }
    assign(node, last, value).ok_or_else(not_found)
}

fn assign(node: &mut Value, key: &Key, value: Value) -> Option<()> {
    match node {
        Value::Map(entries) => {
            entries.insert(key.as_map_key().into_owned(), value);
        }
        Value::List(items) | Value::Tuple(items) => {
            *items.get_mut(key.as_index()?)? = value;
        }
        Value::Record(record) => {
            *record.field_mut(key.as_name()?)? = value;
        }
        _ => return None,
    }
    log::trace!("set_by_path: assigned {key}");
    Some(())
}
