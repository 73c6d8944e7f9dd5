use indexmap::IndexSet;

use crate::error::NestedError;
use crate::path::{Key, Path};
use crate::value::{Map, Value};

/// Options for [`merge`] and [`merge_in_place`].
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    /// Let later inputs overwrite earlier ones. When `false`, every input
    /// defining a key must agree on it.
    pub allow_overwrite: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            allow_overwrite: true,
        }
    }
}

impl MergeOptions {
    /// Options that reject any overwrite.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            allow_overwrite: false,
        }
    }
}

/// Merge `updates` into a copy of `base`; later updates take precedence.
///
/// For a key whose right-most value is a map, only the contiguous trailing
/// run of map values for that key is merged recursively; anything before
/// the first non-map value (scanning from the right) is dropped. Otherwise
/// the right-most value wins.
///
/// # Errors
/// With `allow_overwrite = false`, [`NestedError::MergeConflict`] when
/// non-map values for a key differ, or a map-valued key was defined as a
/// non-map by some input. Integers and floats agree when they are
/// numerically equal, so `1` and `1.0` do not conflict.
///
/// # Example
/// ```
/// use nb_core::nested::{merge, MergeOptions};
/// use nb_core::Value;
/// use serde_json::json;
///
/// let base = Value::from(json!({"level1": {"level2": {"levelA": 0, "levelB": 1}}}));
/// let update = Value::from(json!({"level1": {"level2": {"levelB": 10, "levelC": 2}}}));
/// let merged = merge(base.as_map().unwrap(), &[update.as_map().unwrap()], MergeOptions::default()).unwrap();
/// assert_eq!(
///     Value::Map(merged),
///     Value::from(json!({"level1": {"level2": {"levelA": 0, "levelB": 10, "levelC": 2}}}))
/// );
/// ```
pub fn merge(base: &Map, updates: &[&Map], options: MergeOptions) -> Result<Map, NestedError> {
    let mut target = base.clone();
    merge_level(&mut target, updates, options.allow_overwrite, &Path::new())?;
    Ok(target)
}

/// Merge `updates` into `base` itself and return it.
///
/// Nested maps of `base` that take part in a trailing map run are updated in
/// place as well. On error `base` may be partially updated.
///
/// # Errors
/// See [`merge`].
pub fn merge_in_place<'a>(
    base: &'a mut Map,
    updates: &[&Map],
    options: MergeOptions,
) -> Result<&'a mut Map, NestedError> {
    merge_level(base, updates, options.allow_overwrite, &Path::new())?;
    Ok(base)
}

fn merge_level(
    base: &mut Map,
    updates: &[&Map],
    allow_overwrite: bool,
    prefix: &Path,
) -> Result<(), NestedError> {
    if updates.is_empty() {
        return Ok(());
    }

    let keys: IndexSet<String> = base
        .keys()
        .chain(updates.iter().flat_map(|update| update.keys()))
        .cloned()
        .collect();

    for key in keys {
        let incoming: Vec<&Value> = updates.iter().filter_map(|u| u.get(&key)).collect();
        // Only the base defines it: nothing to merge.
        let Some(&last) = incoming.last() else {
            continue;
        };
        let path = prefix.child(Key::Name(key.clone()));

        if last.is_map() {
            let run_len = incoming.iter().rev().take_while(|v| v.is_map()).count();
            let existing = base.get(&key);
            let base_in_run = run_len == incoming.len() && existing.is_some_and(Value::is_map);

            if !allow_overwrite {
                let defined = incoming.len() + usize::from(existing.is_some());
                let in_run = run_len + usize::from(base_in_run);
                if defined != in_run {
                    return Err(conflict(path, existing, &incoming));
                }
            }

            let run: Vec<&Map> = incoming[incoming.len() - run_len..]
                .iter()
                .filter_map(|v| v.as_map())
                .collect();

            if base_in_run {
                if let Some(Value::Map(target)) = base.get_mut(&key) {
                    merge_level(target, &run, allow_overwrite, &path)?;
                }
            } else if let Some((first, rest)) = run.split_first() {
                let mut merged = (*first).clone();
                merge_level(&mut merged, rest, allow_overwrite, &path)?;
                base.insert(key, Value::Map(merged));
            }
        } else {
            if !allow_overwrite {
                let existing = base.get(&key);
                let agree = existing
                    .into_iter()
                    .chain(incoming.iter().copied())
                    .all(|v| same_value(v, last));
                if !agree {
                    return Err(conflict(path, existing, &incoming));
                }
            }
            base.insert(key, last.clone());
        }
    }
    Ok(())
}

fn conflict(path: Path, existing: Option<&Value>, incoming: &[&Value]) -> NestedError {
    let values = existing
        .into_iter()
        .chain(incoming.iter().copied())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    log::debug!("merge: conflicting values at {path}: [{values}]");
    NestedError::MergeConflict {
        path,
        values: format!("[{values}]"),
    }
}

/// Recursively update `orig` with `update`, in place.
///
/// Maps are updated key by key and lists position by position. When the old
/// and new value at a position are both maps (or both lists) the update
/// recurses, otherwise the new value replaces the old one. A list may grow,
/// one element past its end at a time.
///
/// # Errors
/// [`NestedError::StructuralMismatch`] if the roots are not both maps or
/// both lists.
///
/// # Example
/// ```
/// use nb_core::nested::nested_update;
/// use nb_core::Value;
/// use serde_json::json;
///
/// let mut orig = Value::from(json!({"a": [1, {"b": 2}], "c": 3}));
/// nested_update(&mut orig, &Value::from(json!({"a": [5, {"d": 4}, 6]}))).unwrap();
/// assert_eq!(orig, Value::from(json!({"a": [5, {"b": 2, "d": 4}, 6], "c": 3})));
/// ```
pub fn nested_update(orig: &mut Value, update: &Value) -> Result<(), NestedError> {
    update_at(orig, update, &Path::new())
}

fn update_at(orig: &mut Value, update: &Value, path: &Path) -> Result<(), NestedError> {
    match (orig, update) {
        (Value::Map(target), Value::Map(source)) => {
            for (key, value) in source {
                let recurse = target
                    .get(key)
                    .is_some_and(|slot| same_container(slot, value));
                match target.get_mut(key) {
                    Some(slot) if recurse => update_at(slot, value, &path.child(key.as_str()))?,
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
            Ok(())
        }
        (Value::List(target), Value::List(source)) => {
            for (index, value) in source.iter().enumerate() {
                if let Some(slot) = target.get_mut(index) {
                    if same_container(slot, value) {
                        update_at(slot, value, &path.child(index))?;
                    } else {
                        *slot = value.clone();
                    }
                } else {
                    // `index == target.len()` here since the update is walked in order.
                    target.push(value.clone());
                }
            }
            Ok(())
        }
        (orig, update) => Err(NestedError::StructuralMismatch {
            path: path.clone(),
            reason: format!(
                "cannot update a {} with a {}",
                orig.type_name(),
                update.type_name()
            ),
        }),
    }
}

#[allow(clippy::float_cmp)]
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => *i as f64 == *f,
        (Value::List(x), Value::List(y)) | (Value::Tuple(x), Value::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| same_value(x, y))
        }
        _ => a == b,
    }
}

fn same_container(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Map(_), Value::Map(_)) | (Value::List(_), Value::List(_))
    )
}
