//! Seeded, prunable 3-D tree model.
//!
//! Main components:
//! - [`random`] - deterministic Mulberry32 stream.
//! - [`tree`] - tree generation and id lookup.
//! - [`prune`] - the prune set and its cascade rules.
//! - [`scene`] - the renderable hierarchy built from a tree.
//! - [`view`] - skeleton and solid view builders.
//! - [`picker`] - pointer rays, hit testing and highlighting.
//! - [`debris`] - falling fragments left behind by pruning.
//! - [`codec`] - compact and JSON tree state.
//! - [`template`] - normalized external segment shapes.
//! - [`session`] - the object that owns all of the above.
//! - [`config`] - runtime configuration.
//! - [`error`] - error types.
//! - [`types`] - shared type aliases and ids.

pub mod codec;
pub mod config;
pub mod debris;
pub mod error;
pub mod picker;
pub mod prune;
pub mod random;
pub mod scene;
pub mod session;
pub mod template;
pub mod tree;
pub mod types;
pub mod view;
