//! # studia-core
//!
//! A Rust library for staging client-side edits against server-owned study
//! plans, with undo/redo, batched saves, placeholder reconciliation, and
//! classification-driven retry.
//!
//! ## Overview
//!
//! studia-core is the state engine behind a plan editor UI: the user stages
//! multiple edits to a plan's lesson graph (add/remove/move lessons,
//! add/remove dependency edges) without touching the network, undoes and
//! redoes freely, then flushes the accumulated diff in one ordered batch.
//! Alongside the editor it provides the two smaller patterns every
//! data-fetching surface of the platform shares: merging locally-appended
//! placeholder records with their server-confirmed versions (in whichever
//! order confirmation arrives), and deciding which remote failures are worth
//! retrying.
//!
//! ### Key Features
//!
//! - **Edit sessions**: five staged collections plus invertible command
//!   stacks; undo always restores the exact pre-call state
//! - **Ordered batch saves**: one batched position flush, then removals,
//!   then relation changes; the session resets only on full success
//! - **Placeholder reconciliation**: idempotent, order-insensitive merge of
//!   local placeholders with authoritative records
//! - **Retry classification**: terminal failures (auth/forbidden/not-found)
//!   surface immediately; transient failures back off exponentially
//! - **Scoped cache invalidation**: an auth failure evicts one resource
//!   scope, never the whole cache
//! - **Event streaming**: push events with local/remote origins keep the
//!   confirmed graph and message lists synchronized between saves
//!
//! ## Quick Start
//!
//! ```rust
//! use studia_core::properties::{LessonId, Position};
//! use studia_core::session::EditSession;
//!
//! let mut session = EditSession::new();
//! session.move_lesson(LessonId(1), 500.0, 600.0);
//! session.remove_lesson(LessonId(102));
//! assert!(session.has_pending_changes());
//!
//! session.undo();
//! session.undo();
//! assert!(!session.has_pending_changes());
//!
//! session.redo();
//! assert_eq!(
//!     session.staged_moves().get(&LessonId(1)),
//!     Some(&Position::new(500.0, 600.0))
//! );
//! ```
//!
//! Flushing a session requires a [`save::PlanRemote`] implementation wrapping
//! the platform's HTTP client:
//!
//! ```rust,no_run
//! # use studia_core::{properties::PlanId, save::{save_session, PlanRemote}, session::EditSession};
//! # async fn example(remote: &dyn PlanRemote) -> Result<(), studia_core::StudiaError> {
//! let mut session = EditSession::new();
//! // ... stage edits ...
//! save_session(&mut session, Some(PlanId(42)), remote).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! Start with [`session::EditSession`] for staging and [`save::save_session`]
//! for flushing. See [`reconcile`] for append-list merging, [`retry`] and
//! [`cache`] for the data-fetching layer, and [`graph`] for the confirmed
//! plan snapshot that push [`event`]s keep current.

pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod graph;
pub mod properties;
pub mod reconcile;
pub mod retry;
pub mod save;
pub mod session;
#[cfg(test)]
mod tests;

pub use error::*;

uniffi::setup_scaffolding!();
