//! Declarative field tables.
//!
//! Each record kind lists the config members it reads as a static table of
//! `(member path, value type, setter)`. [`apply`] walks a table against one
//! class; absent members hand the setter the type's default.

use crate::store::{ConfigPath, ConfigStore};

/// Typed setter for one table row.
pub(crate) enum Setter<T> {
    Float(fn(&mut T, f64)),
    Int(fn(&mut T, i64)),
    Text(fn(&mut T, String)),
    FloatArray(fn(&mut T, Vec<f64>)),
    IntArray(fn(&mut T, Vec<i64>)),
    TextArray(fn(&mut T, Vec<String>)),
}

/// One row of a field table.
pub(crate) struct Field<T> {
    path: &'static [&'static str],
    set: Setter<T>,
}

impl<T> Field<T> {
    pub(crate) const fn float(path: &'static [&'static str], set: fn(&mut T, f64)) -> Self {
        Self {
            path,
            set: Setter::Float(set),
        }
    }

    pub(crate) const fn int(path: &'static [&'static str], set: fn(&mut T, i64)) -> Self {
        Self {
            path,
            set: Setter::Int(set),
        }
    }

    pub(crate) const fn text(path: &'static [&'static str], set: fn(&mut T, String)) -> Self {
        Self {
            path,
            set: Setter::Text(set),
        }
    }

    pub(crate) const fn floats(path: &'static [&'static str], set: fn(&mut T, Vec<f64>)) -> Self {
        Self {
            path,
            set: Setter::FloatArray(set),
        }
    }

    pub(crate) const fn ints(path: &'static [&'static str], set: fn(&mut T, Vec<i64>)) -> Self {
        Self {
            path,
            set: Setter::IntArray(set),
        }
    }

    pub(crate) const fn texts(path: &'static [&'static str], set: fn(&mut T, Vec<String>)) -> Self {
        Self {
            path,
            set: Setter::TextArray(set),
        }
    }
}

/// Populate `target` from the members of `root`/`class` listed in `fields`.
pub(crate) fn apply<T>(
    store: &dyn ConfigStore,
    root: &str,
    class: &str,
    fields: &[Field<T>],
    target: &mut T,
) {
    for field in fields {
        let path = ConfigPath::member(root, class, field.path);
        match field.set {
            Setter::Float(set) => set(target, store.float(&path).unwrap_or_default()),
            Setter::Int(set) => set(target, store.int(&path).unwrap_or_default()),
            Setter::Text(set) => set(target, store.text(&path).unwrap_or_default()),
            Setter::FloatArray(set) => set(target, store.float_array(&path).unwrap_or_default()),
            Setter::IntArray(set) => set(target, store.int_array(&path).unwrap_or_default()),
            Setter::TextArray(set) => set(target, store.text_array(&path).unwrap_or_default()),
        }
    }
}

/// Build a conditional sub-record only when its marker member exists.
pub(crate) fn section<T: Default>(
    store: &dyn ConfigStore,
    root: &str,
    class: &str,
    marker: &'static [&'static str],
    fields: &[Field<T>],
) -> Option<T> {
    if !store.exists(&ConfigPath::member(root, class, marker)) {
        return None;
    }
    let mut record = T::default();
    apply(store, root, class, fields, &mut record);
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryConfigStore;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Sample {
        weight: f64,
        count: i64,
        name: String,
        slots: Vec<String>,
        size: Vec<i64>,
    }

    const SAMPLE_FIELDS: &[Field<Sample>] = &[
        Field::float(&["weight"], |r, v| r.weight = v),
        Field::int(&["Stack", "count"], |r, v| r.count = v),
        Field::text(&["displayName"], |r, v| r.name = v),
        Field::texts(&["inventorySlot"], |r, v| r.slots = v),
        Field::ints(&["itemSize"], |r, v| r.size = v),
    ];

    #[test]
    fn absent_members_take_defaults() {
        let store = MemoryConfigStore::new().with_class(
            "cfgVehicles",
            "Apple",
            None,
            json!({ "weight": 150, "Stack": { "count": 3 } }),
        );
        let mut sample = Sample::default();
        apply(&store, "cfgVehicles", "Apple", SAMPLE_FIELDS, &mut sample);

        assert_eq!(sample.weight, 150.0);
        assert_eq!(sample.count, 3);
        assert_eq!(sample.name, "");
        assert!(sample.slots.is_empty());
        assert!(sample.size.is_empty());
    }

    #[test]
    fn section_requires_marker() {
        let store = MemoryConfigStore::new()
            .with_class("cfgVehicles", "Rock", None, json!({ "weight": 1 }))
            .with_class("cfgVehicles", "Pear", None, json!({ "displayName": "Pear" }));

        let rock = section(&store, "cfgVehicles", "Rock", &["displayName"], SAMPLE_FIELDS);
        assert!(rock.is_none());

        let pear = section(&store, "cfgVehicles", "Pear", &["displayName"], SAMPLE_FIELDS)
            .expect("marker present");
        assert_eq!(pear.name, "Pear");
        assert_eq!(pear.weight, 0.0);
    }
}
