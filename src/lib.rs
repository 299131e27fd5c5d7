//! vmdesk - Idempotent remote-desktop setup for cloud VMs.
//!
//! vmdesk finds a VM through the cloud control plane, probes it over SSH for
//! every piece of a remote-desktop stack (XFCE, xrdp, TigerVNC, noVNC,
//! firewall rules) and optionally installs what is missing. Each run produces
//! an ordered [`reconcile::Report`].
//!
//! # Modules
//!
//! - [`capabilities`] - The check catalog, probes and fixes
//! - [`cli`] - Command-line interface and argument parsing
//! - [`cloud`] - Cloud control plane (VM listing, start, firewall rules)
//! - [`config`] - Configuration loading, merging and validation
//! - [`error`] - Error types and result aliases
//! - [`reconcile`] - Probe, fix and re-probe loop producing a report
//! - [`remote`] - Remote shell execution over SSH
//! - [`shell`] - Local process execution
//! - [`target`] - Target VM resolution
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use vmdesk::capabilities::{build_catalog, select, Timeouts};
//! use vmdesk::cloud::{HostStatus, MockControlPlane};
//! use vmdesk::config::VmdeskConfig;
//! use vmdesk::reconcile::Reconciler;
//! use vmdesk::remote::MockShell;
//! use vmdesk::target::{ResolveOptions, TargetResolver};
//! use vmdesk::ui::MockUI;
//!
//! let cloud = MockControlPlane::new().with_host("team-desktop", "us-central1-a", HostStatus::Running);
//! let shell = MockShell::new();
//!
//! let target = TargetResolver::new(&cloud).resolve(&ResolveOptions {
//!     project: "my-project".to_string(),
//!     name_pattern: "desktop".to_string(),
//!     ..Default::default()
//! })?;
//!
//! let only = ["ssh".to_string(), "xrdp-service".to_string()];
//! let checks = select(build_catalog(&VmdeskConfig::default(), None)?, &only, &[])?;
//!
//! let report = Reconciler::new(&shell, &cloud, Timeouts::default())
//!     .reconcile(&target, &checks, false, &mut MockUI::new());
//! assert_eq!(report.exit_code(), 0);
//! # Ok::<(), vmdesk::VmdeskError>(())
//! ```

pub mod capabilities;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod remote;
pub mod shell;
pub mod target;
pub mod ui;

pub use error::{Result, VmdeskError};
