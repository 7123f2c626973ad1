//! Static game-data catalogs extracted from the config database.
//!
//! A catalog kind names a config root, the class every entry must descend
//! from and the artifact it is dumped to. Extraction filters the root's
//! classes to public descendants and materialises one typed record per class,
//! preserving the root's native order.

mod ammo;
pub mod dump;
mod fields;
pub mod gate;
mod items;
mod weapon;

pub use ammo::{AmmoDamage, AmmoRecord, MagazineRecord, AMMO_ROOT};
pub use dump::{CatalogDumper, DumpSummary};
pub use gate::{DumpGate, GateOutcome};
pub use items::{
    ArmorProfile, ArmorValues, ClothingRecord, ContainerRecord, ItemFields, ItemRecord, Medicine,
    Nutrition, ZombieRecord,
};
pub use weapon::{
    is_crash_listed, FireMode, NullProbe, OpticsInfo, ProbeEntity, RecoilProfile, WeaponProbe,
    WeaponRecord, CRASH_DENYLIST,
};

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::store::{ConfigPath, ConfigStore, PUBLIC_SCOPE};

/// The seven catalog kinds, in dump order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    /// Loose ammunition.
    Ammo,
    /// Magazines.
    Magazine,
    /// Firearms.
    Weapon,
    /// Wearables.
    Clothing,
    /// Inventory items other than clothing.
    Item,
    /// Storage containers.
    Container,
    /// Infected templates.
    Zombie,
}

impl CatalogKind {
    /// Every kind in the order the dump runs them.
    pub const ALL: [CatalogKind; 7] = [
        CatalogKind::Ammo,
        CatalogKind::Magazine,
        CatalogKind::Weapon,
        CatalogKind::Clothing,
        CatalogKind::Item,
        CatalogKind::Container,
        CatalogKind::Zombie,
    ];

    /// Config root the kind's classes live under.
    pub fn root(self) -> &'static str {
        match self {
            CatalogKind::Ammo | CatalogKind::Magazine => "cfgMagazines",
            CatalogKind::Weapon => "cfgWeapons",
            CatalogKind::Clothing
            | CatalogKind::Item
            | CatalogKind::Container
            | CatalogKind::Zombie => "cfgVehicles",
        }
    }

    /// Base class every entry must descend from.
    pub fn kind_of(self) -> &'static str {
        match self {
            CatalogKind::Ammo => "Ammunition_Base",
            CatalogKind::Magazine => "Magazine_Base",
            CatalogKind::Weapon => "Weapon_Base",
            CatalogKind::Clothing => "Clothing",
            CatalogKind::Item => "Inventory_Base",
            CatalogKind::Container => "Container_Base",
            CatalogKind::Zombie => "ZombieBase",
        }
    }

    /// Base class whose descendants are excluded even if they match.
    pub fn excluded(self) -> Option<&'static str> {
        match self {
            CatalogKind::Item => Some("Clothing"),
            _ => None,
        }
    }

    /// Artifact name, e.g. `weapondump`.
    pub fn artifact(self) -> &'static str {
        match self {
            CatalogKind::Ammo => "ammodump",
            CatalogKind::Magazine => "magdump",
            CatalogKind::Weapon => "weapondump",
            CatalogKind::Clothing => "clothingdump",
            CatalogKind::Item => "itemdump",
            CatalogKind::Container => "containerdump",
            CatalogKind::Zombie => "zombiedump",
        }
    }

    /// File name of the artifact inside the profile directory.
    pub fn file_name(self) -> String {
        format!("dzsm-{}.json", self.artifact())
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact())
    }
}

/// Identity shared by every catalog record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecordBase {
    /// Concrete class name.
    pub class_name: String,
    /// Config root the class was found under.
    pub source_root: String,
    /// Base classes, nearest first.
    pub ancestry: Vec<String>,
}

impl CatalogRecordBase {
    /// Resolve identity and ancestry for `class` under `root`.
    pub fn new(store: &dyn ConfigStore, root: &str, class: &str) -> Self {
        Self {
            class_name: class.to_string(),
            source_root: root.to_string(),
            ancestry: store.ancestry(root, class),
        }
    }
}

/// Collaborators available while building records.
pub struct ExtractContext<'a> {
    /// Config database.
    pub store: &'a dyn ConfigStore,
    /// Engine hook for weapon recoil introspection.
    pub probe: &'a dyn WeaponProbe,
}

/// A typed catalog record that can be built from config and dumped.
pub trait CatalogEntry: Serialize + DeserializeOwned + Sized {
    /// Catalog the record belongs to.
    const KIND: CatalogKind;

    /// Build the record for one qualifying class.
    fn extract(ctx: &ExtractContext<'_>, class: &str) -> Self;

    /// Identity of the record.
    fn base(&self) -> &CatalogRecordBase;
}

/// Public classes under the kind's root that pass its kind-of filter.
pub fn qualifying_classes(store: &dyn ConfigStore, kind: CatalogKind) -> Vec<String> {
    let root = kind.root();
    store
        .class_names(root)
        .into_iter()
        .filter(|class| {
            store.is_kind_of(root, class, kind.kind_of())
                && kind
                    .excluded()
                    .map_or(true, |excluded| !store.is_kind_of(root, class, excluded))
                && store.int(&ConfigPath::member(root, class, &["scope"])) == Some(PUBLIC_SCOPE)
        })
        .collect()
}

/// Extract every record of `R`'s kind in native config order.
pub fn extract<R: CatalogEntry>(ctx: &ExtractContext<'_>) -> Vec<R> {
    qualifying_classes(ctx.store, R::KIND)
        .iter()
        .map(|class| R::extract(ctx, class))
        .collect()
}
