//! # ts_core
//!
//! Data model for the TeleSABRE multi-core routing scheduler.
//!
//! This crate provides:
//! - [`heap::IndexedHeap`]: an indexed binary min-heap for O(log n)
//!   insert/decrease-key/remove.
//! - [`graph::Graph`]: a weighted adjacency-list graph with Dijkstra
//!   shortest paths, used both as the device topology and as the per-gate
//!   contracted router graph.
//! - [`device::Device`]: the static multi-core hardware topology.
//! - [`circuit::Circuit`]: the gate dependency DAG.
//! - [`layout::Layout`]: the mutable virt<->phys mapping the scheduler
//!   advances one op at a time.
//! - [`config::Config`]: every scheduler/CLI knob, JSON (de)serializable.
//! - [`report::Report`]: the per-iteration trace sink.
//! - [`error::TsError`]: the unified error type.

pub mod circuit;
pub mod config;
pub mod device;
pub mod error;
pub mod graph;
pub mod heap;
pub mod layout;
pub mod prelude;
pub mod report;

pub use circuit::{Circuit, Gate as CircuitGate, GateSpec};
pub use config::{Config, EnergyType, InitialLayoutType};
pub use device::{Device, TpEdge};
pub use error::{Result, TsError};
pub use graph::{Graph, Path};
pub use heap::{HeapItem, IndexedHeap, INF};
pub use layout::Layout;
pub use report::{Report, ReportEntry};
