//! The TeleSABRE routing engine: slicer, contracted router, candidate
//! generator, energy evaluator and the scheduler loop that ties them
//! together over a `ts_core::Device`/`Circuit` pair.

pub mod candidate;
pub mod contracted_router;
pub mod energy;
pub mod scheduler;
pub mod slicer;

pub use candidate::{attraction_paths, needed_free_qubits, swap_candidates, teledata_telegate_candidates, AttractionPath, CandidateOp, SwapReasons};
pub use contracted_router::RoutedPath;
pub use energy::EnergyBreakdown;
pub use scheduler::{Scheduler, SchedulerResult};
pub use slicer::{slice_remaining, Layer, Slices};
