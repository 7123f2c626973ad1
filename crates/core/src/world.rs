//! Live world state as seen by the reporting pipeline.
//!
//! The engine owns the entities; the pipeline only receives owned snapshots
//! through [`WorldSnapshotProvider`]. Two adapters are provided: a shared
//! in-memory world a host can update between ticks, and a JSON file rewritten
//! by the engine side.

#![allow(missing_docs)]

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

/// Three component vector, rendered the way the engine prints vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// Build a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

impl FromStr for Vector3 {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts = raw
            .split_whitespace()
            .map(|part| part.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| format!("invalid vector '{raw}': {err}"))?;
        match parts.as_slice() {
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            _ => Err(format!("invalid vector '{raw}': expected 3 components")),
        }
    }
}

impl Serialize for Vector3 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Vector3 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Vehicle as exposed by the engine at sampling time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleState {
    #[serde(default)]
    pub name: String,
    pub id: i64,
    #[serde(default)]
    pub damage: f64,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub speed: Vector3,
    #[serde(default)]
    pub position: Vector3,
    /// Script base classes of the entity, nearest first.
    #[serde(default)]
    pub ancestry: Vec<String>,
}

impl VehicleState {
    /// Whether the entity is `class` or descends from it.
    pub fn is_kind_of(&self, class: &str) -> bool {
        self.type_name.eq_ignore_ascii_case(class)
            || self
                .ancestry
                .iter()
                .any(|base| base.eq_ignore_ascii_case(class))
    }
}

/// Network identity bound to a connected player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub name: String,
}

/// Connected player as exposed by the engine at sampling time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Absent only while the engine is still binding the connection.
    #[serde(default)]
    pub identity: Option<PlayerIdentity>,
    pub id: i64,
    #[serde(default)]
    pub damage: f64,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub speed: Vector3,
    #[serde(default)]
    pub position: Vector3,
}

/// Everything sampled in one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default)]
    pub vehicles: Vec<VehicleState>,
    #[serde(default)]
    pub players: Vec<PlayerState>,
}

/// Source of live entity state.
pub trait WorldSnapshotProvider: Send + Sync {
    /// All vehicles currently in the world.
    fn list_vehicles(&self) -> Vec<VehicleState>;

    /// All connected players.
    fn list_players(&self) -> Vec<PlayerState>;

    /// Vehicles and players together; adapters may override to read once.
    fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            vehicles: self.list_vehicles(),
            players: self.list_players(),
        }
    }
}

/// World state held in memory and replaced by the host between ticks.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    state: RwLock<WorldSnapshot>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_vehicles(&self, vehicles: Vec<VehicleState>) {
        self.state.write().vehicles = vehicles;
    }

    pub fn set_players(&self, players: Vec<PlayerState>) {
        self.state.write().players = players;
    }

    /// Replace the whole world atomically.
    pub fn replace(&self, snapshot: WorldSnapshot) {
        *self.state.write() = snapshot;
    }
}

impl WorldSnapshotProvider for MemoryWorld {
    fn list_vehicles(&self) -> Vec<VehicleState> {
        self.state.read().vehicles.clone()
    }

    fn list_players(&self) -> Vec<PlayerState> {
        self.state.read().players.clone()
    }

    fn snapshot(&self) -> WorldSnapshot {
        self.state.read().clone()
    }
}

/// World snapshot read from a JSON file on every query.
///
/// A missing or unreadable file is reported as an empty world so a tick is
/// never aborted by the engine side lagging behind.
#[derive(Debug, Clone)]
pub struct JsonWorldFile {
    path: PathBuf,
}

impl JsonWorldFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the snapshot file.
    pub fn read(&self) -> Result<WorldSnapshot> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read world snapshot {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse world snapshot {}", self.path.display()))
    }

    fn read_or_empty(&self) -> WorldSnapshot {
        self.read().unwrap_or_else(|err| {
            warn!(?err, "world snapshot unavailable, reporting an empty world");
            WorldSnapshot::default()
        })
    }
}

impl WorldSnapshotProvider for JsonWorldFile {
    fn list_vehicles(&self) -> Vec<VehicleState> {
        self.read_or_empty().vehicles
    }

    fn list_players(&self) -> Vec<PlayerState> {
        self.read_or_empty().players
    }

    fn snapshot(&self) -> WorldSnapshot {
        self.read_or_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn vectors_render_like_the_engine() {
        assert_eq!(Vector3::new(1.5, 0.0, -2.25).to_string(), "1.5 0 -2.25");
        assert_eq!("  3 4.5  6 ".parse::<Vector3>(), Ok(Vector3::new(3.0, 4.5, 6.0)));
        assert!("1 2".parse::<Vector3>().is_err());
        assert!("1 two 3".parse::<Vector3>().is_err());
    }

    #[test]
    fn kind_of_checks_type_and_ancestry() {
        let heli = VehicleState {
            type_name: "ExpansionMh6".into(),
            ancestry: vec!["ExpansionHelicopterScript".into(), "CarScript".into()],
            ..Default::default()
        };
        assert!(heli.is_kind_of("expansionhelicopterscript"));
        assert!(heli.is_kind_of("ExpansionMh6"));
        assert!(!heli.is_kind_of("ExpansionBoatScript"));
    }

    #[test]
    fn memory_world_replaces_state() {
        let world = MemoryWorld::new();
        world.set_vehicles(vec![VehicleState {
            id: 7,
            type_name: "OffroadHatchback".into(),
            ..Default::default()
        }]);
        assert_eq!(world.snapshot().vehicles.len(), 1);
        assert!(world.list_players().is_empty());

        world.replace(WorldSnapshot::default());
        assert!(world.list_vehicles().is_empty());
    }

    #[test]
    fn json_world_file_reads_snapshot() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("world.json");
        fs::write(
            &path,
            r#"{
                "vehicles": [{
                    "name": "Hatchback",
                    "id": 42,
                    "damage": 0.25,
                    "type": "OffroadHatchback",
                    "speed": "0 0 12.5",
                    "position": "4500 12 10200",
                    "ancestry": ["CarScript"]
                }],
                "players": [{
                    "identity": { "name": "Survivor" },
                    "id": 3,
                    "type": "SurvivorM_Mirek",
                    "position": "1 2 3"
                }]
            }"#,
        )?;

        let world = JsonWorldFile::new(&path);
        let snapshot = world.snapshot();
        assert_eq!(snapshot.vehicles[0].id, 42);
        assert_eq!(snapshot.vehicles[0].speed, Vector3::new(0.0, 0.0, 12.5));
        assert_eq!(snapshot.players[0].position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(snapshot.players[0].speed, Vector3::default());
        assert_eq!(
            snapshot.players[0].identity.as_ref().map(|id| id.name.as_str()),
            Some("Survivor")
        );
        Ok(())
    }

    #[test]
    fn missing_world_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let world = JsonWorldFile::new(dir.path().join("absent.json"));
        assert!(world.read().is_err());
        assert_eq!(world.snapshot(), WorldSnapshot::default());
        Ok(())
    }
}
