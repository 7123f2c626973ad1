use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{ConfigPath, ConfigStore, ConfigValue};

/// In-memory config database with engine lookup semantics.
///
/// Class and member names match case-insensitively and values missing on a
/// class are looked up on its base classes. Class order inside a root is
/// insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryConfigStore {
    roots: Vec<Root>,
}

#[derive(Debug, Clone)]
struct Root {
    name: String,
    classes: Vec<ClassNode>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
struct ClassNode {
    name: String,
    base: Option<String>,
    members: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ExportFile {
    roots: Vec<ExportRoot>,
}

#[derive(Debug, Deserialize)]
struct ExportRoot {
    name: String,
    #[serde(default)]
    classes: Vec<ExportClass>,
}

#[derive(Debug, Deserialize)]
struct ExportClass {
    name: String,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    members: Map<String, Value>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON export of the config database.
    ///
    /// The export lists roots in order, each with its classes in native order:
    /// `{"roots": [{"name": "cfgWeapons", "classes": [{"name": "AK74",
    /// "base": "Rifle_Base", "members": {"scope": 2}}]}]}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config export {}", path.display()))?;
        let export: ExportFile = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config export {}", path.display()))?;

        let mut store = Self::new();
        for root in export.roots {
            for class in root.classes {
                store.insert(&root.name, &class.name, class.base.as_deref(), class.members);
            }
            store.root_mut(&root.name);
        }
        Ok(store)
    }

    /// Builder-style variant of [`MemoryConfigStore::insert`].
    ///
    /// `members` must be a JSON object; anything else is treated as empty.
    pub fn with_class(mut self, root: &str, class: &str, base: Option<&str>, members: Value) -> Self {
        let members = match members {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.insert(root, class, base, members);
        self
    }

    /// Add or replace a class under `root`.
    pub fn insert(&mut self, root: &str, class: &str, base: Option<&str>, members: Map<String, Value>) {
        let node = ClassNode {
            name: class.to_string(),
            base: base.filter(|value| !value.is_empty()).map(str::to_string),
            members,
        };
        let root = self.root_mut(root);
        let key = class.to_ascii_lowercase();
        match root.index.get(&key) {
            Some(&position) => root.classes[position] = node,
            None => {
                root.index.insert(key, root.classes.len());
                root.classes.push(node);
            }
        }
    }

    fn root_mut(&mut self, name: &str) -> &mut Root {
        let position = match self
            .roots
            .iter()
            .position(|root| root.name.eq_ignore_ascii_case(name))
        {
            Some(position) => position,
            None => {
                self.roots.push(Root {
                    name: name.to_string(),
                    classes: Vec::new(),
                    index: HashMap::new(),
                });
                self.roots.len() - 1
            }
        };
        &mut self.roots[position]
    }

    fn root(&self, name: &str) -> Option<&Root> {
        self.roots
            .iter()
            .find(|root| root.name.eq_ignore_ascii_case(name))
    }

    fn class_node(&self, root: &str, class: &str) -> Option<&ClassNode> {
        let root = self.root(root)?;
        let position = *root.index.get(&class.to_ascii_lowercase())?;
        root.classes.get(position)
    }
}

impl ConfigStore for MemoryConfigStore {
    fn class_names(&self, root: &str) -> Vec<String> {
        self.root(root)
            .map(|root| root.classes.iter().map(|class| class.name.clone()).collect())
            .unwrap_or_default()
    }

    fn base_name(&self, root: &str, class: &str) -> Option<String> {
        self.class_node(root, class)?.base.clone()
    }

    fn value(&self, path: &ConfigPath<'_>) -> Option<ConfigValue> {
        let node = self.class_node(path.root, path.class)?;
        if path.members.is_empty() {
            return Some(ConfigValue::Class);
        }
        if let Some(value) = lookup(&node.members, path.members) {
            return Some(value);
        }
        self.ancestry(path.root, &node.name).iter().find_map(|parent| {
            let parent = self.class_node(path.root, parent)?;
            lookup(&parent.members, path.members)
        })
    }
}

fn lookup(members: &Map<String, Value>, segments: &[&str]) -> Option<ConfigValue> {
    let (last, parents) = segments.split_last()?;
    let mut current = members;
    for segment in parents {
        match find_member(current, segment)? {
            Value::Object(inner) => current = inner,
            _ => return None,
        }
    }
    convert(find_member(current, last)?)
}

fn find_member<'a>(members: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    members.get(name).or_else(|| {
        members
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn convert(value: &Value) -> Option<ConfigValue> {
    match value {
        Value::Null => None,
        Value::Bool(flag) => Some(ConfigValue::Number(if *flag { 1.0 } else { 0.0 })),
        Value::Number(number) => number.as_f64().map(ConfigValue::Number),
        Value::String(text) => Some(ConfigValue::Text(text.clone())),
        Value::Array(items) => Some(ConfigValue::Array(items.iter().filter_map(convert).collect())),
        Value::Object(_) => Some(ConfigValue::Class),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn weapons() -> MemoryConfigStore {
        MemoryConfigStore::new()
            .with_class("cfgWeapons", "Weapon_Base", None, json!({ "scope": 0, "weight": 1000 }))
            .with_class(
                "cfgWeapons",
                "Rifle_Base",
                Some("Weapon_Base"),
                json!({ "OpticsInfo": { "distanceZoomMin": 100 } }),
            )
            .with_class(
                "cfgWeapons",
                "AK74",
                Some("Rifle_Base"),
                json!({ "scope": 2, "displayName": "AK-74", "muzzles": ["this"] }),
            )
    }

    #[test]
    fn values_are_inherited_from_base_classes() {
        let store = weapons();
        let scope = ConfigPath::member("cfgWeapons", "AK74", &["scope"]);
        let weight = ConfigPath::member("cfgWeapons", "AK74", &["weight"]);
        let zoom = ConfigPath::member("cfgWeapons", "AK74", &["OpticsInfo", "distanceZoomMin"]);
        assert_eq!(store.int(&scope), Some(2));
        assert_eq!(store.float(&weight), Some(1000.0));
        assert_eq!(store.float(&zoom), Some(100.0));
    }

    #[test]
    fn lookups_ignore_case() {
        let store = weapons();
        let path = ConfigPath::member("CfgWeapons", "ak74", &["DISPLAYNAME"]);
        assert_eq!(store.text(&path).as_deref(), Some("AK-74"));
        assert!(store.is_kind_of("cfgWeapons", "AK74", "weapon_base"));
        assert!(!store.is_kind_of("cfgWeapons", "Rifle_Base", "AK74"));
    }

    #[test]
    fn missing_entries_resolve_to_none() {
        let store = weapons();
        assert_eq!(store.float(&ConfigPath::member("cfgWeapons", "AK74", &["nope"])), None);
        assert_eq!(store.text_array(&ConfigPath::member("cfgWeapons", "M4", &["muzzles"])), None);
        assert!(store.exists(&ConfigPath::class("cfgWeapons", "AK74")));
        assert!(!store.exists(&ConfigPath::class("cfgVehicles", "AK74")));
    }

    #[test]
    fn class_order_is_insertion_order() {
        let store = weapons();
        assert_eq!(
            store.class_names("cfgWeapons"),
            vec!["Weapon_Base", "Rifle_Base", "AK74"]
        );
        assert!(store.class_names("cfgAmmo").is_empty());
    }

    #[test]
    fn loads_json_export() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("export.json");
        fs::write(
            &path,
            r#"{"roots": [
                {"name": "cfgVehicles", "classes": [
                    {"name": "Zmbm_Base", "members": {"scope": 0}},
                    {"name": "ZmbM_Soldier", "base": "Zmbm_Base", "members": {"scope": 2}}
                ]},
                {"name": "cfgAmmo", "classes": []}
            ]}"#,
        )?;

        let store = MemoryConfigStore::load(&path)?;
        assert_eq!(store.class_names("cfgVehicles"), vec!["Zmbm_Base", "ZmbM_Soldier"]);
        assert_eq!(store.ancestry("cfgVehicles", "ZmbM_Soldier"), vec!["Zmbm_Base"]);
        Ok(())
    }
}
