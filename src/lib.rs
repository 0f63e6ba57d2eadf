//! quaykeep
//! ========
//!
//! Declarative repository and mirror management for [Quay](https://quay.io)
//! registries.
//!
//! A reconciliation run describes the desired state of a repository or of
//! its mirror configuration ([`reconcile::Params`]), compares it against
//! what the registry reports, applies the minimal mutation over the
//! [Quay REST API](https://docs.quay.io/api/swagger/), re-reads the server
//! state to verify the mutation took effect, and reports whether anything
//! changed ([`reconcile::Outcome`]).

pub mod error;
pub mod mirror;
pub mod reconcile;
pub mod repository;
pub mod spec;
pub mod transport;

mod repo_name;

pub use reconcile::{reconcile, Outcome, Params, Reconciler, State};
pub use repo_name::RepoName;
pub use transport::Transport;
