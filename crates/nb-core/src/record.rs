use std::fmt;

use crate::error::NestedError;
use crate::value::Value;

/// Fixed-field record that the tree operations can look inside.
///
/// Implemented per record type, usually through [`nested_record!`](crate::nested_record).
/// Field order is the declaration order and drives traversal order.
///
/// # Example
/// ```
/// use nb_core::nested_record;
/// use nb_core::record::Record;
/// use nb_core::Value;
///
/// nested_record! {
///     pub struct Point { pub x, pub y }
/// }
///
/// let p = Point { x: Value::Int(1), y: Value::Int(2) };
/// assert_eq!(p.field_names(), &["x", "y"]);
/// assert_eq!(p.field("y"), Some(&Value::Int(2)));
/// ```
pub trait Record: fmt::Debug {
    /// Name of the concrete record type.
    fn type_name(&self) -> &'static str;

    /// Field names in declaration order.
    fn field_names(&self) -> &'static [&'static str];

    /// Borrow a field by name.
    fn field(&self, name: &str) -> Option<&Value>;

    /// Mutably borrow a field by name.
    fn field_mut(&mut self, name: &str) -> Option<&mut Value>;

    /// Construct a new record of the same type from values in declaration order.
    ///
    /// # Errors
    /// Returns [`NestedError::InvalidRecord`] if the number of values differs
    /// from the number of fields.
    fn rebuild(&self, values: Vec<Value>) -> Result<Box<dyn Record>, NestedError>;

    /// Clone behind the trait object.
    fn clone_record(&self) -> Box<dyn Record>;
}

impl Clone for Box<dyn Record> {
    fn clone(&self) -> Self {
        self.clone_record()
    }
}

impl PartialEq for Box<dyn Record> {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name()
            && self.field_names() == other.field_names()
            && self
                .field_names()
                .iter()
                .all(|name| self.field(name) == other.field(name))
    }
}

/// Check the value count handed to [`Record::rebuild`].
///
/// # Errors
/// Returns [`NestedError::InvalidRecord`] on a count mismatch.
pub fn check_arity(
    type_name: &'static str,
    fields: &[&str],
    values: &[Value],
) -> Result<(), NestedError> {
    if fields.len() == values.len() {
        Ok(())
    } else {
        Err(NestedError::InvalidRecord {
            type_name,
            reason: format!("expected {} values, got {}", fields.len(), values.len()),
        })
    }
}

/// Declare a struct whose fields are all [`Value`]s and implement
/// [`Record`] for it, plus `From<Struct> for Value`.
#[macro_export]
macro_rules! nested_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $crate::Value, )*
        }

        impl $crate::record::Record for $name {
            fn type_name(&self) -> &'static str {
                stringify!($name)
            }

            fn field_names(&self) -> &'static [&'static str] {
                &[$( stringify!($field) ),*]
            }

            fn field(&self, name: &str) -> Option<&$crate::Value> {
                match name {
                    $( stringify!($field) => Some(&self.$field), )*
                    _ => None,
                }
            }

            fn field_mut(&mut self, name: &str) -> Option<&mut $crate::Value> {
                match name {
                    $( stringify!($field) => Some(&mut self.$field), )*
                    _ => None,
                }
            }

            fn rebuild(
                &self,
                values: Vec<$crate::Value>,
            ) -> Result<Box<dyn $crate::record::Record>, $crate::NestedError> {
                $crate::record::check_arity(stringify!($name), self.field_names(), &values)?;
                #[allow(unused_mut, unused_variables)]
                let mut values = values.into_iter();
                Ok(Box::new($name {
                    $( $field: values.next().unwrap_or($crate::Value::Null), )*
                }))
            }

            fn clone_record(&self) -> Box<dyn $crate::record::Record> {
                Box::new(self.clone())
            }
        }

        impl From<$name> for $crate::Value {
            fn from(record: $name) -> Self {
                $crate::Value::Record(Box::new(record))
            }
        }
    };
}
