//! Projection of live world state into report entries.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    report::{Category, EntryType, LiveEntry, ReportContainer},
    world::{PlayerState, VehicleState, WorldSnapshotProvider},
};

/// Script base class of helicopters.
pub const HELICOPTER_CLASS: &str = "ExpansionHelicopterScript";
/// Type name tag of fixed-wing and rotor airframes.
pub const AIRFRAME_TAG: &str = "RFFS";
/// Script base class of boats.
pub const BOAT_CLASS: &str = "ExpansionBoatScript";
/// Type name tag of watercraft.
pub const WATERCRAFT_TAG: &str = "RFWC";

/// Classify a vehicle. Air rules win over sea rules; ground is the fallback.
pub fn classify(vehicle: &VehicleState) -> Category {
    if vehicle.is_kind_of(HELICOPTER_CLASS) || vehicle.type_name.contains(AIRFRAME_TAG) {
        Category::Air
    } else if vehicle.is_kind_of(BOAT_CLASS) || vehicle.type_name.contains(WATERCRAFT_TAG) {
        Category::Sea
    } else {
        Category::Ground
    }
}

/// Builds a fresh [`ReportContainer`] from the live world on every call.
#[derive(Clone)]
pub struct LiveStateSampler {
    world: Arc<dyn WorldSnapshotProvider>,
}

impl LiveStateSampler {
    /// Sample from `world`.
    pub fn new(world: Arc<dyn WorldSnapshotProvider>) -> Self {
        Self { world }
    }

    /// Vehicles as report entries, in engine order.
    pub fn sample_vehicles(&self) -> Vec<LiveEntry> {
        self.world.list_vehicles().iter().map(vehicle_entry).collect()
    }

    /// Players as report entries, in engine order.
    pub fn sample_players(&self) -> Vec<LiveEntry> {
        self.world.list_players().iter().filter_map(player_entry).collect()
    }

    /// One complete report from a single world snapshot.
    pub fn sample(&self) -> ReportContainer {
        let snapshot = self.world.snapshot();
        let container = ReportContainer {
            players: snapshot.players.iter().filter_map(player_entry).collect(),
            vehicles: snapshot.vehicles.iter().map(vehicle_entry).collect(),
        };
        debug!(
            players = container.players.len(),
            vehicles = container.vehicles.len(),
            "sampled live state"
        );
        container
    }
}

fn vehicle_entry(vehicle: &VehicleState) -> LiveEntry {
    LiveEntry {
        entry_type: EntryType::Vehicle,
        type_name: vehicle.type_name.clone(),
        category: classify(vehicle),
        name: vehicle.name.clone(),
        id: vehicle.id,
        position: vehicle.position,
        speed: vehicle.speed,
        damage: vehicle.damage,
    }
}

fn player_entry(player: &PlayerState) -> Option<LiveEntry> {
    let Some(identity) = player.identity.as_ref() else {
        warn!(id = player.id, "player without identity skipped");
        return None;
    };
    Some(LiveEntry {
        entry_type: EntryType::Player,
        type_name: player.type_name.clone(),
        category: Category::Man,
        name: identity.name.clone(),
        id: player.id,
        position: player.position,
        speed: player.speed,
        damage: player.damage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{MemoryWorld, PlayerIdentity, Vector3};

    fn vehicle(type_name: &str, ancestry: &[&str]) -> VehicleState {
        VehicleState {
            type_name: type_name.to_string(),
            ancestry: ancestry.iter().map(|base| base.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn classification_precedence() {
        assert_eq!(classify(&vehicle("ExpansionMh6", &[HELICOPTER_CLASS])), Category::Air);
        assert_eq!(classify(&vehicle("RFFS_Cessna", &["CarScript"])), Category::Air);
        assert_eq!(classify(&vehicle("ExpansionUtilityBoat", &[BOAT_CLASS])), Category::Sea);
        assert_eq!(classify(&vehicle("RFWC_Jetski", &["CarScript"])), Category::Sea);
        assert_eq!(classify(&vehicle("OffroadHatchback", &["CarScript"])), Category::Ground);
        // Air rules are checked before any sea rule.
        assert_eq!(classify(&vehicle("Heli_RFWC", &[HELICOPTER_CLASS])), Category::Air);
        assert_eq!(classify(&vehicle("RFFS_RFWC_Seaplane", &[BOAT_CLASS])), Category::Air);
    }

    #[test]
    fn samples_players_and_vehicles() {
        let world = Arc::new(MemoryWorld::new());
        world.set_vehicles(vec![
            VehicleState {
                name: "Hatchback".into(),
                id: 1,
                type_name: "OffroadHatchback".into(),
                position: Vector3::new(1.0, 2.0, 3.0),
                ..Default::default()
            },
            vehicle("ExpansionMh6", &[HELICOPTER_CLASS]),
        ]);
        world.set_players(vec![
            PlayerState {
                identity: Some(PlayerIdentity {
                    name: "Survivor".into(),
                }),
                id: 5,
                damage: 0.1,
                type_name: "SurvivorF_Eva".into(),
                ..Default::default()
            },
            PlayerState {
                identity: None,
                id: 6,
                type_name: "SurvivorM_Boris".into(),
                ..Default::default()
            },
        ]);

        let sampler = LiveStateSampler::new(world);
        let report = sampler.sample();

        assert_eq!(report.vehicles.len(), 2);
        assert_eq!(report.vehicles[0].category, Category::Ground);
        assert_eq!(report.vehicles[0].entry_type, EntryType::Vehicle);
        assert_eq!(report.vehicles[0].position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(report.vehicles[1].category, Category::Air);

        assert_eq!(report.players.len(), 1);
        assert_eq!(report.players[0].name, "Survivor");
        assert_eq!(report.players[0].category, Category::Man);
        assert_eq!(report.players[0].entry_type, EntryType::Player);

        assert_eq!(sampler.sample_vehicles(), report.vehicles);
        assert_eq!(sampler.sample_players(), report.players);
    }

    #[test]
    fn empty_world_gives_empty_report() {
        let sampler = LiveStateSampler::new(Arc::new(MemoryWorld::new()));
        assert_eq!(sampler.sample(), ReportContainer::default());
    }
}
