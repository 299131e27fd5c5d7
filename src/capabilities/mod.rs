//! Capability checks: what to look for on a target, how to look, and how
//! to put it in place.
//!
//! - [`check`]: the [`CapabilityCheck`] model
//! - [`catalog`]: the built-in checks and selection
//! - [`prober`]: read-only probes
//! - [`fix`]: fix actions
//! - [`status`]: per-check outcomes
//! - [`templates`]: remote files installed by fixes

pub mod catalog;
pub mod check;
pub mod fix;
pub mod prober;
pub mod status;
pub mod templates;

pub use catalog::{build_catalog, select, BUILTIN_CHECK_NAMES};
pub use check::{CapabilityCheck, FixAction, Payload, Probe};
pub use fix::{FixOutput, FixRunner};
pub use prober::{CapabilityProber, Presence, Timeouts};
pub use status::{CheckResult, ObservedState, RemediationOutcome};
