#![warn(clippy::all, missing_docs)]

//! Core pipeline of the DZSM server watcher.
//!
//! This crate hosts the config database seam and catalog extraction, the
//! once-per-storage dump gate, live-state sampling, report sinks and the
//! scheduler that ties them together. Engine collaborators are traits so a
//! host binding or a test fake can be injected.

pub mod catalog;
pub mod config;
pub mod lifecycle;
pub mod report;
pub mod sampler;
pub mod scheduler;
pub mod sink;
pub mod store;
pub mod world;

pub use catalog::{CatalogDumper, CatalogKind, DumpGate, NullProbe, WeaponProbe};
pub use config::{SinkMode, WatcherConfig};
pub use lifecycle::{Mission, ProcessRole};
pub use report::{LiveEntry, ReportContainer};
pub use sampler::LiveStateSampler;
pub use scheduler::{ReportScheduler, SchedulerHandle, SchedulerState};
pub use sink::{Delivery, ReportSink};
pub use store::{ConfigStore, MemoryConfigStore};
pub use world::{JsonWorldFile, MemoryWorld, WorldSnapshotProvider};
