//! Language Detection
//!
//! ## Modules
//!
//! - `local`: statistical scorer and the local priority chain
//! - `remote`: remote detector contract, adapters and pool
//! - `store`: bounded memory of remote answers used for corroboration
//! - `session`: per-call adjudication state machine
//! - `arbiter`: the engine tying them together

pub mod arbiter;
pub mod local;
pub mod remote;
pub mod session;
pub mod store;

pub use arbiter::{Arbiter, ArbiterSettings};
pub use local::{LanguageScorer, LocalDetection, LocalDetector, WhatlangScorer};
pub use remote::{RemoteDetector, RemoteDetectorPool};
pub use store::CorroborationStore;
