#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use super::{
    fields::{apply, Field},
    CatalogEntry, CatalogKind, CatalogRecordBase, ExtractContext,
};

/// Config root holding projectile definitions referenced by magazines.
pub const AMMO_ROOT: &str = "cfgAmmo";

/// Damage applied by one projectile hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AmmoDamage {
    pub health: f64,
    pub armor: f64,
    pub blood: f64,
    pub shock: f64,
}

/// Loose ammunition, resolved through the magazine's projectile reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmoRecord {
    #[serde(flatten)]
    pub base: CatalogRecordBase,
    pub display_name: String,
    /// `cfgAmmo` class fired by this round; empty when unset.
    pub projectile: String,
    pub simulation: String,
    pub hit: f64,
    pub indirect_hit: f64,
    pub indirect_hit_range: f64,
    pub init_speed: f64,
    pub typical_speed: f64,
    pub air_friction: f64,
    pub tracer: bool,
    pub explosive: bool,
    pub ttl: f64,
    pub weight: f64,
    pub caliber: f64,
    pub projectiles_count: f64,
    pub deflecting: f64,
    pub noise_hit: f64,
    pub damage: AmmoDamage,
}

const CARTRIDGE_FIELDS: &[Field<AmmoRecord>] = &[
    Field::text(&["displayName"], |r, v| r.display_name = v),
    Field::text(&["ammo"], |r, v| r.projectile = v),
];

const PROJECTILE_FIELDS: &[Field<AmmoRecord>] = &[
    Field::text(&["simulation"], |r, v| r.simulation = v),
    Field::float(&["hit"], |r, v| r.hit = v),
    Field::float(&["indirectHit"], |r, v| r.indirect_hit = v),
    Field::float(&["indirectHitRange"], |r, v| r.indirect_hit_range = v),
    Field::float(&["initSpeed"], |r, v| r.init_speed = v),
    Field::float(&["typicalSpeed"], |r, v| r.typical_speed = v),
    Field::float(&["airFriction"], |r, v| r.air_friction = v),
    Field::float(&["tracerStartTime"], |r, v| r.tracer = v > -1.0),
    Field::int(&["explosive"], |r, v| r.explosive = v > 0),
    Field::float(&["timeToLive"], |r, v| r.ttl = v),
    Field::float(&["weight"], |r, v| r.weight = v),
    Field::float(&["caliber"], |r, v| r.caliber = v),
    Field::float(&["projectilesCount"], |r, v| r.projectiles_count = v.max(1.0)),
    Field::float(&["deflecting"], |r, v| r.deflecting = v),
    Field::float(&["NoiseHit", "strength"], |r, v| r.noise_hit = v),
    Field::float(&["DamageApplied", "Health", "damage"], |r, v| r.damage.health = v),
    Field::float(&["DamageApplied", "Health", "armorDamage"], |r, v| r.damage.armor = v),
    Field::float(&["DamageApplied", "Blood", "damage"], |r, v| r.damage.blood = v),
    Field::float(&["DamageApplied", "DamageShock", "damage"], |r, v| r.damage.shock = v),
];

impl CatalogEntry for AmmoRecord {
    const KIND: CatalogKind = CatalogKind::Ammo;

    fn extract(ctx: &ExtractContext<'_>, class: &str) -> Self {
        let root = Self::KIND.root();
        let mut record = AmmoRecord {
            base: CatalogRecordBase::new(ctx.store, root, class),
            ..Default::default()
        };
        apply(ctx.store, root, class, CARTRIDGE_FIELDS, &mut record);
        if !record.projectile.is_empty() {
            let projectile = record.projectile.clone();
            apply(ctx.store, AMMO_ROOT, &projectile, PROJECTILE_FIELDS, &mut record);
        }
        record
    }

    fn base(&self) -> &CatalogRecordBase {
        &self.base
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagazineRecord {
    #[serde(flatten)]
    pub base: CatalogRecordBase,
    pub display_name: String,
    pub projectile: String,
    pub weight: f64,
    pub capacity: f64,
    pub weight_per_quantity_unit: f64,
    pub size: Vec<i64>,
    /// Loose rounds that fit this magazine.
    pub ammo: Vec<String>,
}

const MAGAZINE_FIELDS: &[Field<MagazineRecord>] = &[
    Field::text(&["displayName"], |r, v| r.display_name = v),
    Field::text(&["ammo"], |r, v| r.projectile = v),
    Field::float(&["weight"], |r, v| r.weight = v),
    Field::float(&["weightPerQuantityUnit"], |r, v| r.weight_per_quantity_unit = v),
    Field::float(&["count"], |r, v| r.capacity = v),
    Field::ints(&["itemSize"], |r, v| r.size = v),
    Field::texts(&["ammoItems"], |r, v| r.ammo = v),
];

impl CatalogEntry for MagazineRecord {
    const KIND: CatalogKind = CatalogKind::Magazine;

    fn extract(ctx: &ExtractContext<'_>, class: &str) -> Self {
        let root = Self::KIND.root();
        let mut record = MagazineRecord {
            base: CatalogRecordBase::new(ctx.store, root, class),
            ..Default::default()
        };
        apply(ctx.store, root, class, MAGAZINE_FIELDS, &mut record);
        record
    }

    fn base(&self) -> &CatalogRecordBase {
        &self.base
    }
}
