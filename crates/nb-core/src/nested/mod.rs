//! Recursive operations over nested [`Value`](crate::Value) trees.

pub mod access;
pub mod flat;
pub mod merge;
pub mod traverse;

pub use access::{get_by_path, get_by_path_or, set_by_path};
pub use flat::{deflatten, deflatten_paths, flatten, flatten_paths};
pub use merge::{MergeOptions, merge, merge_in_place, nested_update};
pub use traverse::{
    MapOptions, all, all_truthy, any, any_truthy, leaf_paths, map, squeeze, try_for_each_leaf,
    try_map,
};
