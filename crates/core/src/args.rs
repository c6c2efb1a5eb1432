//! Bindings and the nested-key merge that turns them into [`Args`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator that splits a key into a path: `a.b` is `a → b`.
pub const NESTING_SEPARATOR: char = '.';

/// One `(key, value)` pair produced by a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub key: String,
    pub value: Value,
    /// Produced inside `many`/`many1`. Repeated collisions on a leaf
    /// accumulate into a list instead of overwriting.
    pub repeated: bool,
}

impl Binding {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Binding {
            key: key.into(),
            value: value.into(),
            repeated: false,
        }
    }
}

/// Ordered bindings, in input order.
pub type Bindings = Vec<Binding>;

/// The structured result of a parse: a mapping in encounter order, with
/// nested keys expanded into sub-mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(Map<String, Value>);

impl Args {
    /// Merge bindings, splitting keys on [`NESTING_SEPARATOR`].
    pub fn from_bindings(bindings: &[Binding]) -> Self {
        Args::merge(bindings, Some(NESTING_SEPARATOR))
    }

    /// Merge bindings without splitting keys.
    pub fn from_bindings_flat(bindings: &[Binding]) -> Self {
        Args::merge(bindings, None)
    }

    fn merge(bindings: &[Binding], separator: Option<char>) -> Self {
        let mut root = Table::default();
        for binding in bindings {
            let path: Vec<&str> = match separator {
                Some(sep) => binding.key.split(sep).collect(),
                None => vec![binding.key.as_str()],
            };
            root.insert(&path, binding.value.clone(), binding.repeated);
        }
        Args(root.into_map())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Args {
    fn from(map: Map<String, Value>) -> Self {
        Args(map)
    }
}

impl std::ops::Index<&str> for Args {
    type Output = Value;

    /// Missing keys index to `Value::Null`, as `serde_json::Value` does.
    fn index(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.0.get(key).unwrap_or(&NULL)
    }
}

// ── Merge tree ───────────────────────────────────────────────────────

#[derive(Debug)]
enum Slot {
    Leaf { value: Value, repeated: bool },
    /// Repeated leaf collisions.
    Many(Vec<Value>),
    Table(Table),
    /// A leaf and a table collided at the same key.
    Mixed(Vec<Slot>),
}

#[derive(Debug, Default)]
struct Table {
    entries: Vec<(String, Slot)>,
}

impl Table {
    fn insert(&mut self, path: &[&str], value: Value, repeated: bool) {
        let Some((head, tail)) = path.split_first() else {
            return;
        };
        let position = self.entries.iter().position(|(k, _)| k == head);
        let Some(position) = position else {
            let slot = Slot::fresh(tail, value, repeated);
            self.entries.push(((*head).to_owned(), slot));
            return;
        };
        let slot = &mut self.entries[position].1;
        if tail.is_empty() {
            slot.insert_leaf(value, repeated);
        } else {
            slot.insert_nested(tail, value, repeated);
        }
    }

    fn into_map(self) -> Map<String, Value> {
        self.entries
            .into_iter()
            .map(|(k, slot)| (k, slot.into_value()))
            .collect()
    }
}

impl Slot {
    fn fresh(tail: &[&str], value: Value, repeated: bool) -> Slot {
        if tail.is_empty() {
            Slot::Leaf { value, repeated }
        } else {
            let mut table = Table::default();
            table.insert(tail, value, repeated);
            Slot::Table(table)
        }
    }

    fn insert_leaf(&mut self, value: Value, repeated: bool) {
        let current = std::mem::replace(self, Slot::Many(Vec::new()));
        *self = match current {
            Slot::Leaf {
                value: previous,
                repeated: was_repeated,
            } => {
                if repeated && was_repeated {
                    Slot::Many(vec![previous, value])
                } else {
                    Slot::Leaf { value, repeated }
                }
            }
            Slot::Many(mut values) => {
                if repeated {
                    values.push(value);
                    Slot::Many(values)
                } else {
                    Slot::Leaf { value, repeated }
                }
            }
            table @ Slot::Table(_) => Slot::Mixed(vec![table, Slot::Leaf { value, repeated }]),
            Slot::Mixed(mut items) => {
                items.push(Slot::Leaf { value, repeated });
                Slot::Mixed(items)
            }
        };
    }

    fn insert_nested(&mut self, tail: &[&str], value: Value, repeated: bool) {
        match self {
            Slot::Table(table) => table.insert(tail, value, repeated),
            Slot::Mixed(items) => match items.last_mut() {
                Some(Slot::Table(table)) => table.insert(tail, value, repeated),
                _ => items.push(Slot::fresh(tail, value, repeated)),
            },
            leaf => {
                let previous = std::mem::replace(leaf, Slot::Many(Vec::new()));
                *leaf = Slot::Mixed(vec![previous, Slot::fresh(tail, value, repeated)]);
            }
        }
    }

    fn into_value(self) -> Value {
        match self {
            Slot::Leaf { value, .. } => value,
            Slot::Many(values) => Value::Array(values),
            Slot::Table(table) => Value::Object(table.into_map()),
            Slot::Mixed(items) => Value::Array(items.into_iter().map(Slot::into_value).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repeated(key: &str, value: Value) -> Binding {
        Binding {
            repeated: true,
            ..Binding::new(key, value)
        }
    }

    #[test]
    fn dotted_key_nests() {
        let args = Args::from_bindings(&[Binding::new("a.b", true)]);
        assert_eq!(args.into_value(), json!({"a": {"b": true}}));
    }

    #[test]
    fn sibling_paths_share_a_table() {
        let args = Args::from_bindings(&[
            Binding::new("a.b.c", true),
            Binding::new("a.b.d", true),
            Binding::new("a.e", 1),
        ]);
        assert_eq!(
            args.into_value(),
            json!({"a": {"b": {"c": true, "d": true}, "e": 1}})
        );
    }

    #[test]
    fn leaf_and_table_collide_into_list_in_encounter_order() {
        let args = Args::from_bindings(&[Binding::new("a", true), Binding::new("a.b", true)]);
        assert_eq!(args.into_value(), json!({"a": [true, {"b": true}]}));

        let args = Args::from_bindings(&[Binding::new("a.b", true), Binding::new("a", true)]);
        assert_eq!(args.into_value(), json!({"a": [{"b": true}, true]}));
    }

    #[test]
    fn plain_collision_overwrites_repeated_collision_accumulates() {
        let args = Args::from_bindings(&[Binding::new("x", 1), Binding::new("x", 2)]);
        assert_eq!(args["x"], json!(2));

        let args = Args::from_bindings(&[
            repeated("y", json!(1.0)),
            repeated("y", json!(2.0)),
            repeated("y", json!(3.0)),
        ]);
        assert_eq!(args["y"], json!([1.0, 2.0, 3.0]));
    }

    #[test]
    fn single_repetition_stays_scalar() {
        let args = Args::from_bindings(&[repeated("verbose", json!(true))]);
        assert_eq!(args.into_value(), json!({"verbose": true}));
    }

    #[test]
    fn flat_merge_keeps_dots() {
        let args = Args::from_bindings_flat(&[Binding::new("a.b", 1)]);
        assert_eq!(args.into_value(), json!({"a.b": 1}));
    }

    #[test]
    fn keys_keep_encounter_order() {
        let args = Args::from_bindings(&[
            Binding::new("quiet", true),
            Binding::new("x", 1),
            Binding::new("a", 2),
        ]);
        let keys: Vec<_> = args.keys().cloned().collect();
        assert_eq!(keys, ["quiet", "x", "a"]);
    }

    #[test]
    fn missing_key_indexes_to_null() {
        let args = Args::default();
        assert_eq!(args["nope"], Value::Null);
        assert!(args.is_empty());
    }
}
