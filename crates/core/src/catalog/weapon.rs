#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use super::{
    fields::{apply, section, Field},
    items::{ItemFields, ITEM_FIELDS},
    CatalogEntry, CatalogKind, CatalogRecordBase, ExtractContext,
};
use crate::store::{ConfigPath, ConfigStore};

/// Classes that crash the engine when spawned for recoil introspection.
pub const CRASH_DENYLIST: &[&str] = &[
    "itemoptics",
    "quickiebow",
    "m203",
    "gp25",
    "gp25_standalone",
    "gp25_base",
    "m203_base",
    "m203_standalone",
    "archery_base",
];

/// Whether `class` must never be instantiated.
pub fn is_crash_listed(class: &str) -> bool {
    CRASH_DENYLIST
        .iter()
        .any(|listed| listed.eq_ignore_ascii_case(class))
}

/// Recoil shape read from a live weapon instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoilProfile {
    pub mouse_offset_range_min: f64,
    pub mouse_offset_range_max: f64,
    pub mouse_offset_distance: f64,
    pub mouse_offset_relative_time: f64,
    pub cam_offset_distance: f64,
    pub cam_offset_relative_time: f64,
}

/// A throwaway entity spawned by a [`WeaponProbe`].
///
/// Dropping the entity must delete it from the world.
pub trait ProbeEntity {
    /// Recoil parameters of the spawned weapon.
    fn recoil(&self) -> RecoilProfile;
}

/// Engine hook that instantiates weapons headlessly.
pub trait WeaponProbe: Send + Sync {
    /// Spawn `class` at the origin, or `None` if the engine refuses.
    fn spawn(&self, class: &str) -> Option<Box<dyn ProbeEntity + '_>>;
}

/// Probe for hosts that cannot spawn entities; recoil stays at zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProbe;

impl WeaponProbe for NullProbe {
    fn spawn(&self, _class: &str) -> Option<Box<dyn ProbeEntity + '_>> {
        None
    }
}

/// One selectable fire mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FireMode {
    /// Mode class name, e.g. `FullAuto`.
    pub name: String,
    /// Rounds per minute; zero when the mode declares no reload time.
    pub rpm: f64,
    pub dispersion: f64,
    /// Rounds per trigger pull, at least one.
    pub rounds: f64,
}

/// Zoom data of built-in or attachable optics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpticsInfo {
    pub distance_zoom_min: f64,
    pub distance_zoom_max: f64,
    pub discrete_distance: Vec<f64>,
}

pub(crate) const OPTICS_MARKER: &[&str] = &["OpticsInfo", "distanceZoomMin"];

pub(crate) const OPTICS_FIELDS: &[Field<OpticsInfo>] = &[
    Field::float(OPTICS_MARKER, |r, v| r.distance_zoom_min = v),
    Field::float(&["OpticsInfo", "distanceZoomMax"], |r, v| r.distance_zoom_max = v),
    Field::floats(&["OpticsInfo", "discreteDistance"], |r, v| r.discrete_distance = v),
];

/// Firearm catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponRecord {
    #[serde(flatten)]
    pub base: CatalogRecordBase,
    #[serde(flatten)]
    pub item: ItemFields,
    pub noise: f64,
    pub magazine_switch_time: f64,
    pub init_speed_multiplier: f64,
    /// Ammunition chamberable without a magazine.
    pub ammo: Vec<String>,
    pub magazines: Vec<String>,
    pub attachments: Vec<String>,
    pub chamber_size: i64,
    pub barrels: usize,
    pub color: String,
    pub modes: Vec<FireMode>,
    pub recoil_modifier: Vec<f64>,
    pub sway_modifier: Vec<f64>,
    pub optics: Option<OpticsInfo>,
    pub recoil: RecoilProfile,
}

const WEAPON_FIELDS: &[Field<WeaponRecord>] = &[
    Field::float(&["NoiseShoot", "strength"], |r, v| r.noise = v),
    Field::float(&["magazineSwitchTime"], |r, v| r.magazine_switch_time = v),
    Field::float(&["initSpeedMultiplier"], |r, v| r.init_speed_multiplier = v),
    Field::texts(&["chamberableFrom"], |r, v| r.ammo = v),
    Field::texts(&["magazines"], |r, v| r.magazines = v),
    Field::texts(&["attachments"], |r, v| r.attachments = v),
    Field::int(&["chamberSize"], |r, v| r.chamber_size = v),
    Field::texts(&["muzzles"], |r, v| r.barrels = v.len()),
    Field::text(&["color"], |r, v| r.color = v),
    Field::floats(&["recoilModifier"], |r, v| r.recoil_modifier = v),
    Field::floats(&["swayModifier"], |r, v| r.sway_modifier = v),
];

impl CatalogEntry for WeaponRecord {
    const KIND: CatalogKind = CatalogKind::Weapon;

    fn extract(ctx: &ExtractContext<'_>, class: &str) -> Self {
        let root = Self::KIND.root();
        let mut record = WeaponRecord {
            base: CatalogRecordBase::new(ctx.store, root, class),
            ..Default::default()
        };
        apply(ctx.store, root, class, ITEM_FIELDS, &mut record.item);
        apply(ctx.store, root, class, WEAPON_FIELDS, &mut record);
        record.modes = fire_modes(ctx.store, root, class);
        record.optics = section(ctx.store, root, class, OPTICS_MARKER, OPTICS_FIELDS);

        if !is_crash_listed(class) {
            if let Some(entity) = ctx.probe.spawn(class) {
                record.recoil = entity.recoil();
            }
        }
        record
    }

    fn base(&self) -> &CatalogRecordBase {
        &self.base
    }
}

fn fire_modes(store: &dyn ConfigStore, root: &str, class: &str) -> Vec<FireMode> {
    let names = store
        .text_array(&ConfigPath::member(root, class, &["modes"]))
        .unwrap_or_default();

    names
        .into_iter()
        .map(|name| {
            let read = |member: &str| {
                store
                    .float(&ConfigPath::member(root, class, &[name.as_str(), member]))
                    .unwrap_or_default()
            };
            let reload_time = read("reloadTime");
            let rpm = if reload_time > 0.0 {
                60.0 / reload_time
            } else {
                0.0
            };
            let dispersion = read("dispersion");
            let burst = read("burst");
            FireMode {
                rpm,
                dispersion,
                rounds: if burst > 0.0 { burst } else { 1.0 },
                name,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::extract;
    use crate::store::MemoryConfigStore;
    use parking_lot::Mutex;
    use serde_json::json;

    const PROFILE: RecoilProfile = RecoilProfile {
        mouse_offset_range_min: 45.0,
        mouse_offset_range_max: 95.0,
        mouse_offset_distance: 1.2,
        mouse_offset_relative_time: 0.5,
        cam_offset_distance: 0.03,
        cam_offset_relative_time: 1.0,
    };

    #[derive(Default)]
    struct RecordingProbe {
        spawned: Mutex<Vec<String>>,
        destroyed: Mutex<usize>,
    }

    struct Spawned<'a> {
        probe: &'a RecordingProbe,
    }

    impl ProbeEntity for Spawned<'_> {
        fn recoil(&self) -> RecoilProfile {
            PROFILE
        }
    }

    impl Drop for Spawned<'_> {
        fn drop(&mut self) {
            *self.probe.destroyed.lock() += 1;
        }
    }

    impl WeaponProbe for RecordingProbe {
        fn spawn(&self, class: &str) -> Option<Box<dyn ProbeEntity + '_>> {
            self.spawned.lock().push(class.to_string());
            Some(Box::new(Spawned { probe: self }))
        }
    }

    fn armory() -> MemoryConfigStore {
        MemoryConfigStore::new()
            .with_class("cfgWeapons", "Weapon_Base", None, json!({ "scope": 0 }))
            .with_class(
                "cfgWeapons",
                "AK74",
                Some("Weapon_Base"),
                json!({
                    "scope": 2,
                    "displayName": "AK-74",
                    "chamberSize": 1,
                    "muzzles": ["this"],
                    "magazines": ["Mag_AK74_30Rnd"],
                    "NoiseShoot": { "strength": 100 },
                    "modes": ["Single", "FullAuto"],
                    "Single": { "reloadTime": 0.1, "dispersion": 0.002 },
                    "FullAuto": { "reloadTime": 0.05, "dispersion": 0.003 },
                }),
            )
            .with_class(
                "cfgWeapons",
                "M203",
                Some("Weapon_Base"),
                json!({ "scope": 2, "displayName": "M203", "modes": ["Single"], "Single": {} }),
            )
    }

    #[test]
    fn ak74_fire_modes_resolve_rate_of_fire() {
        let store = armory();
        let probe = RecordingProbe::default();
        let ctx = ExtractContext {
            store: &store,
            probe: &probe,
        };
        let weapons = extract::<WeaponRecord>(&ctx);
        let ak = &weapons[0];

        assert_eq!(ak.base.class_name, "AK74");
        assert_eq!(ak.item.display_name, "AK-74");
        assert_eq!(ak.chamber_size, 1);
        assert_eq!(ak.barrels, 1);
        assert_eq!(ak.noise, 100.0);
        assert_eq!(
            ak.modes,
            vec![
                FireMode {
                    name: "Single".to_string(),
                    rpm: 600.0,
                    dispersion: 0.002,
                    rounds: 1.0,
                },
                FireMode {
                    name: "FullAuto".to_string(),
                    rpm: 1200.0,
                    dispersion: 0.003,
                    rounds: 1.0,
                },
            ]
        );
        assert!(ak.optics.is_none());
        assert_eq!(ak.recoil, PROFILE);
    }

    #[test]
    fn missing_reload_time_yields_zero_rpm() {
        let store = armory();
        let ctx = ExtractContext {
            store: &store,
            probe: &NullProbe,
        };
        let m203 = WeaponRecord::extract(&ctx, "M203");
        assert_eq!(m203.modes.len(), 1);
        assert_eq!(m203.modes[0].rpm, 0.0);
        assert_eq!(m203.modes[0].rounds, 1.0);
    }

    #[test]
    fn denylisted_weapons_are_never_spawned() {
        let store = armory();
        let probe = RecordingProbe::default();
        let ctx = ExtractContext {
            store: &store,
            probe: &probe,
        };
        let weapons = extract::<WeaponRecord>(&ctx);

        assert_eq!(weapons.len(), 2);
        assert_eq!(weapons[1].base.class_name, "M203");
        assert_eq!(weapons[1].recoil, RecoilProfile::default());
        assert_eq!(*probe.spawned.lock(), vec!["AK74".to_string()]);
        assert_eq!(*probe.destroyed.lock(), 1);
    }

    #[test]
    fn crash_list_ignores_case() {
        assert!(is_crash_listed("GP25_Standalone"));
        assert!(is_crash_listed("archery_base"));
        assert!(!is_crash_listed("AK74"));
    }

    #[test]
    fn optics_only_when_zoom_declared() {
        let store = MemoryConfigStore::new()
            .with_class("cfgWeapons", "Weapon_Base", None, json!({}))
            .with_class(
                "cfgWeapons",
                "SVD",
                Some("Weapon_Base"),
                json!({
                    "scope": 2,
                    "OpticsInfo": { "distanceZoomMin": 100, "discreteDistance": [100, 200, 300] },
                }),
            );
        let ctx = ExtractContext {
            store: &store,
            probe: &NullProbe,
        };
        let svd = WeaponRecord::extract(&ctx, "SVD");
        assert_eq!(
            svd.optics,
            Some(OpticsInfo {
                distance_zoom_min: 100.0,
                distance_zoom_max: 0.0,
                discrete_distance: vec![100.0, 200.0, 300.0],
            })
        );
    }
}
