//! Sequential one-time dump of all catalog kinds.

use serde::Serialize;
use tracing::{error, info};

use super::{
    extract, gate::GateOutcome, AmmoRecord, CatalogEntry, CatalogKind, ClothingRecord,
    ContainerRecord, DumpGate, ExtractContext, ItemRecord, MagazineRecord, WeaponProbe,
    WeaponRecord, ZombieRecord,
};
use crate::store::ConfigStore;

/// Per-kind outcome of a full dump pass.
#[derive(Debug, Default)]
pub struct DumpSummary {
    /// Kinds whose artifact was written in this pass, with record counts.
    pub written: Vec<(CatalogKind, usize)>,
    /// Kinds that were already dumped.
    pub skipped: Vec<CatalogKind>,
    /// Kinds whose dump failed; the rest still ran.
    pub failed: Vec<CatalogKind>,
}

/// Owns the collaborators needed to dump every catalog kind.
pub struct CatalogDumper {
    store: Box<dyn ConfigStore>,
    probe: Box<dyn WeaponProbe>,
    gate: DumpGate,
}

impl CatalogDumper {
    /// Build a dumper over a config store, a weapon probe and a gate.
    pub fn new(store: Box<dyn ConfigStore>, probe: Box<dyn WeaponProbe>, gate: DumpGate) -> Self {
        Self { store, probe, gate }
    }

    /// Gate guarding the artifacts.
    pub fn gate(&self) -> &DumpGate {
        &self.gate
    }

    /// Dump every kind in order; failures are logged and do not stop the pass.
    pub fn run_all(&self) -> DumpSummary {
        info!(dir = %self.gate.dir().display(), "catalog dump started");
        let mut summary = DumpSummary::default();
        for kind in CatalogKind::ALL {
            let outcome = match kind {
                CatalogKind::Ammo => self.dump::<AmmoRecord>(),
                CatalogKind::Magazine => self.dump::<MagazineRecord>(),
                CatalogKind::Weapon => self.dump::<WeaponRecord>(),
                CatalogKind::Clothing => self.dump::<ClothingRecord>(),
                CatalogKind::Item => self.dump::<ItemRecord>(),
                CatalogKind::Container => self.dump::<ContainerRecord>(),
                CatalogKind::Zombie => self.dump::<ZombieRecord>(),
            };
            match outcome {
                Ok(GateOutcome::Written { records, .. }) => summary.written.push((kind, records)),
                Ok(GateOutcome::Skipped { .. }) => summary.skipped.push(kind),
                Err(err) => {
                    error!(%kind, ?err, "catalog dump failed");
                    summary.failed.push(kind);
                }
            }
        }
        info!(
            written = summary.written.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "catalog dump finished"
        );
        summary
    }

    /// Dump a single kind through the gate.
    pub fn dump<R>(&self) -> anyhow::Result<GateOutcome>
    where
        R: CatalogEntry + Serialize,
    {
        let ctx = ExtractContext {
            store: self.store.as_ref(),
            probe: self.probe.as_ref(),
        };
        self.gate.run_once(R::KIND, || extract::<R>(&ctx))
    }
}
