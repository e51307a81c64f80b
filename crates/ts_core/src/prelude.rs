//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust
//! use ts_core::prelude::*;
//! ```

pub use crate::circuit::{Circuit, Gate as CircuitGate, GateSpec};
pub use crate::config::{Config, EnergyType, InitialLayoutType};
pub use crate::device::{Device, TpEdge};
pub use crate::error::{Result, TsError};
pub use crate::graph::{Graph, Path};
pub use crate::heap::{HeapItem, IndexedHeap, INF};
pub use crate::layout::Layout;
pub use crate::report::{Report, ReportEntry};
