#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use super::{
    fields::{apply, section, Field},
    weapon::{OpticsInfo, OPTICS_FIELDS, OPTICS_MARKER},
    CatalogEntry, CatalogKind, CatalogRecordBase, ExtractContext,
};
use crate::store::ConfigPath;

/// Fields shared by every inventory-backed record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFields {
    pub display_name: String,
    pub hit_points: f64,
    pub weight: f64,
    pub size: Vec<i64>,
    pub repairable_with_kits: Vec<i64>,
    pub repair_costs: Vec<f64>,
    pub inventory_slot: Vec<String>,
    pub loot_category: String,
    pub loot_tag: Vec<String>,
    pub item_info: Vec<String>,
}

pub(crate) const ITEM_FIELDS: &[Field<ItemFields>] = &[
    Field::text(&["displayName"], |r, v| r.display_name = v),
    Field::float(&["DamageSystem", "GlobalHealth", "Health", "hitpoints"], |r, v| {
        r.hit_points = v
    }),
    Field::float(&["weight"], |r, v| r.weight = v),
    Field::ints(&["itemSize"], |r, v| r.size = v),
    Field::ints(&["repairableWithKits"], |r, v| r.repairable_with_kits = v),
    Field::floats(&["repairCosts"], |r, v| r.repair_costs = v),
    Field::texts(&["inventorySlot"], |r, v| r.inventory_slot = v),
    Field::text(&["lootCategory"], |r, v| r.loot_category = v),
    Field::texts(&["lootTag"], |r, v| r.loot_tag = v),
    Field::texts(&["itemInfo"], |r, v| r.item_info = v),
];

/// Damage absorbed per health pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmorValues {
    pub health: f64,
    pub blood: f64,
    pub shock: f64,
}

/// Armor multipliers per damage source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmorProfile {
    pub projectile: ArmorValues,
    pub melee: ArmorValues,
    pub frag_grenade: ArmorValues,
    pub infected: ArmorValues,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingRecord {
    #[serde(flatten)]
    pub base: CatalogRecordBase,
    #[serde(flatten)]
    pub item: ItemFields,
    pub heat_isolation: f64,
    pub visibility_modifier: f64,
    pub quick_bar_bonus: f64,
    pub durability: f64,
    pub armor: ArmorProfile,
    pub cargo_size: Vec<i64>,
    pub attachments: Vec<String>,
}

const CLOTHING_FIELDS: &[Field<ClothingRecord>] = &[
    Field::float(&["heatIsolation"], |r, v| r.heat_isolation = v),
    Field::float(&["visibilityModifier"], |r, v| r.visibility_modifier = v),
    Field::float(&["quickBarBonus"], |r, v| r.quick_bar_bonus = v),
    Field::float(&["durability"], |r, v| r.durability = v),
    Field::float(&["DamageSystem", "GlobalArmor", "Projectile", "Health", "damage"], |r, v| {
        r.armor.projectile.health = v
    }),
    Field::float(&["DamageSystem", "GlobalArmor", "Projectile", "Blood", "damage"], |r, v| {
        r.armor.projectile.blood = v
    }),
    Field::float(&["DamageSystem", "GlobalArmor", "Projectile", "Shock", "damage"], |r, v| {
        r.armor.projectile.shock = v
    }),
    Field::float(&["DamageSystem", "GlobalArmor", "Melee", "Health", "damage"], |r, v| {
        r.armor.melee.health = v
    }),
    Field::float(&["DamageSystem", "GlobalArmor", "Melee", "Blood", "damage"], |r, v| {
        r.armor.melee.blood = v
    }),
    Field::float(&["DamageSystem", "GlobalArmor", "Melee", "Shock", "damage"], |r, v| {
        r.armor.melee.shock = v
    }),
    Field::float(&["DamageSystem", "GlobalArmor", "FragGrenade", "Health", "damage"], |r, v| {
        r.armor.frag_grenade.health = v
    }),
    Field::float(&["DamageSystem", "GlobalArmor", "FragGrenade", "Blood", "damage"], |r, v| {
        r.armor.frag_grenade.blood = v
    }),
    Field::float(&["DamageSystem", "GlobalArmor", "FragGrenade", "Shock", "damage"], |r, v| {
        r.armor.frag_grenade.shock = v
    }),
    Field::float(&["DamageSystem", "GlobalArmor", "Infected", "Health", "damage"], |r, v| {
        r.armor.infected.health = v
    }),
    Field::float(&["DamageSystem", "GlobalArmor", "Infected", "Blood", "damage"], |r, v| {
        r.armor.infected.blood = v
    }),
    Field::float(&["DamageSystem", "GlobalArmor", "Infected", "Shock", "damage"], |r, v| {
        r.armor.infected.shock = v
    }),
    Field::ints(&["itemsCargoSize"], |r, v| r.cargo_size = v),
    Field::texts(&["attachments"], |r, v| r.attachments = v),
];

impl CatalogEntry for ClothingRecord {
    const KIND: CatalogKind = CatalogKind::Clothing;

    fn extract(ctx: &ExtractContext<'_>, class: &str) -> Self {
        let root = Self::KIND.root();
        let mut record = ClothingRecord {
            base: CatalogRecordBase::new(ctx.store, root, class),
            ..Default::default()
        };
        apply(ctx.store, root, class, ITEM_FIELDS, &mut record.item);
        apply(ctx.store, root, class, CLOTHING_FIELDS, &mut record);
        record
    }

    fn base(&self) -> &CatalogRecordBase {
        &self.base
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    pub fullness_index: f64,
    pub energy: f64,
    pub water: f64,
    pub nutritional_index: f64,
    pub toxicity: f64,
    pub digestibility: f64,
    pub agents: f64,
}

const NUTRITION_MARKER: &[&str] = &["Nutrition", "fullnessIndex"];

const NUTRITION_FIELDS: &[Field<Nutrition>] = &[
    Field::float(NUTRITION_MARKER, |r, v| r.fullness_index = v),
    Field::float(&["Nutrition", "energy"], |r, v| r.energy = v),
    Field::float(&["Nutrition", "water"], |r, v| r.water = v),
    Field::float(&["Nutrition", "nutritionalIndex"], |r, v| r.nutritional_index = v),
    Field::float(&["Nutrition", "toxicity"], |r, v| r.toxicity = v),
    Field::float(&["Nutrition", "digestibility"], |r, v| r.digestibility = v),
    Field::float(&["Nutrition", "agents"], |r, v| r.agents = v),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub prevention: f64,
    pub treatment: f64,
    pub disease_exit: f64,
}

const MEDICINE_MARKER: &[&str] = &["Medicine", "prevention"];

const MEDICINE_FIELDS: &[Field<Medicine>] = &[
    Field::float(MEDICINE_MARKER, |r, v| r.prevention = v),
    Field::float(&["Medicine", "treatment"], |r, v| r.treatment = v),
    Field::float(&["Medicine", "diseaseExit"], |r, v| r.disease_exit = v),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    #[serde(flatten)]
    pub base: CatalogRecordBase,
    #[serde(flatten)]
    pub item: ItemFields,
    pub is_melee_weapon: bool,
    pub repair_kit_type: i64,
    pub nutrition: Option<Nutrition>,
    pub medicine: Option<Medicine>,
    pub cargo_size: Vec<i64>,
    pub attachments: Vec<String>,
    pub recoil_modifier: Vec<f64>,
    pub sway_modifier: Vec<f64>,
    pub noise_shoot_modifier: f64,
    pub dispersion_modifier: f64,
    pub optics: Option<OpticsInfo>,
}

const ITEM_RECORD_FIELDS: &[Field<ItemRecord>] = &[
    Field::int(&["isMeleeWeapon"], |r, v| r.is_melee_weapon = v == 1),
    Field::int(&["repairKitType"], |r, v| r.repair_kit_type = v),
    Field::ints(&["itemsCargoSize"], |r, v| r.cargo_size = v),
    Field::texts(&["attachments"], |r, v| r.attachments = v),
    Field::floats(&["recoilModifier"], |r, v| r.recoil_modifier = v),
    Field::floats(&["swayModifier"], |r, v| r.sway_modifier = v),
    Field::float(&["noiseShootModifier"], |r, v| r.noise_shoot_modifier = v),
    Field::float(&["dispersionModifier"], |r, v| r.dispersion_modifier = v),
];

impl CatalogEntry for ItemRecord {
    const KIND: CatalogKind = CatalogKind::Item;

    fn extract(ctx: &ExtractContext<'_>, class: &str) -> Self {
        let root = Self::KIND.root();
        let mut record = ItemRecord {
            base: CatalogRecordBase::new(ctx.store, root, class),
            ..Default::default()
        };
        apply(ctx.store, root, class, ITEM_FIELDS, &mut record.item);
        apply(ctx.store, root, class, ITEM_RECORD_FIELDS, &mut record);
        record.optics = section(ctx.store, root, class, OPTICS_MARKER, OPTICS_FIELDS);
        record.nutrition = section(ctx.store, root, class, NUTRITION_MARKER, NUTRITION_FIELDS);
        record.medicine = section(ctx.store, root, class, MEDICINE_MARKER, MEDICINE_FIELDS);
        record
    }

    fn base(&self) -> &CatalogRecordBase {
        &self.base
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    #[serde(flatten)]
    pub base: CatalogRecordBase,
    #[serde(flatten)]
    pub item: ItemFields,
    pub can_be_digged: i64,
    pub heavy_item: i64,
    pub cargo_size: Vec<i64>,
    pub attachments: Vec<String>,
}

const CONTAINER_FIELDS: &[Field<ContainerRecord>] = &[
    Field::int(&["canBeDigged"], |r, v| r.can_be_digged = v),
    Field::int(&["heavyItem"], |r, v| r.heavy_item = v),
    Field::texts(&["attachments"], |r, v| r.attachments = v),
];

const NESTED_CARGO: &[&str] = &["Cargo", "itemsCargoSize"];
const FLAT_CARGO: &[&str] = &["itemsCargoSize"];

impl CatalogEntry for ContainerRecord {
    const KIND: CatalogKind = CatalogKind::Container;

    fn extract(ctx: &ExtractContext<'_>, class: &str) -> Self {
        let root = Self::KIND.root();
        let mut record = ContainerRecord {
            base: CatalogRecordBase::new(ctx.store, root, class),
            ..Default::default()
        };
        apply(ctx.store, root, class, ITEM_FIELDS, &mut record.item);
        apply(ctx.store, root, class, CONTAINER_FIELDS, &mut record);

        let nested = ConfigPath::member(root, class, NESTED_CARGO);
        let cargo = if ctx.store.exists(&nested) {
            nested
        } else {
            ConfigPath::member(root, class, FLAT_CARGO)
        };
        record.cargo_size = ctx.store.int_array(&cargo).unwrap_or_default();
        record
    }

    fn base(&self) -> &CatalogRecordBase {
        &self.base
    }
}

/// Infected template; identity only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZombieRecord {
    #[serde(flatten)]
    pub base: CatalogRecordBase,
}

impl CatalogEntry for ZombieRecord {
    const KIND: CatalogKind = CatalogKind::Zombie;

    fn extract(ctx: &ExtractContext<'_>, class: &str) -> Self {
        ZombieRecord {
            base: CatalogRecordBase::new(ctx.store, Self::KIND.root(), class),
        }
    }

    fn base(&self) -> &CatalogRecordBase {
        &self.base
    }
}
