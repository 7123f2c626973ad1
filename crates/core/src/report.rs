//! Wire shape of a live-state report.

use serde::{Deserialize, Serialize};

use crate::world::Vector3;

/// What a report entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    /// A connected player.
    Player,
    /// A vehicle of any kind.
    Vehicle,
}

/// Coarse movement class of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    /// Helicopters and other aircraft.
    Air,
    /// Boats.
    Sea,
    /// Anything else that drives.
    Ground,
    /// Players.
    Man,
}

/// Normalized snapshot of one live entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveEntry {
    /// Player or vehicle.
    pub entry_type: EntryType,
    /// Engine class name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Movement class.
    pub category: Category,
    /// Entity name; the identity name for players.
    pub name: String,
    /// Engine entity id.
    pub id: i64,
    /// World position.
    pub position: Vector3,
    /// Velocity vector.
    pub speed: Vector3,
    /// Accumulated damage.
    pub damage: f64,
}

/// Everything sent in one tick. Built fresh per tick and dropped after send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportContainer {
    /// Connected players in engine order.
    pub players: Vec<LiveEntry>,
    /// Vehicles in engine order.
    pub vehicles: Vec<LiveEntry>,
}

impl ReportContainer {
    /// Serialize to the JSON body shared by both sinks.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
