//! Overtone Patch Schema
//!
//! This crate defines the [`Patch`]: the flat, versioned set of named
//! parameters that describes one sound for the Overtone rendering engine.
//!
//! # Overview
//!
//! A patch is plain data. It carries no DSP and is never mutated by the
//! engine; analysis stages that need a variant (for example a forced sine for
//! THD measurement) clone it and override fields.
//!
//! Every field has a documented default, so callers only spell out what
//! differs:
//!
//! ```
//! use overtone_patch::Patch;
//!
//! let patch = Patch {
//!     frequency: 440.0,
//!     balance: 0.0,
//!     ..Patch::default()
//! };
//! assert!(patch.validate().is_ok());
//!
//! // JSON documents may omit fields as well
//! let parsed = Patch::from_json(r#"{ "frequency": 440.0, "balance": 0.0 }"#).unwrap();
//! assert_eq!(parsed, patch);
//! ```
//!
//! # Modules
//!
//! - [`error`]: Error type for parsing and validation
//! - [`partial`]: Inharmonic partial descriptions
//! - [`patch`]: The patch record, defaults and derived accessors
//! - [`validation`]: Range checks

pub mod error;
pub mod partial;
pub mod patch;
pub mod validation;

pub use error::PatchError;
pub use partial::{InharmonicPartial, PartialTuning, INHARMONIC_SLOTS};
pub use patch::{DelayMode, DitherType, Patch, BIT_DEPTH_OFF, OVERSAMPLE_FACTORS, PATCH_VERSION};
pub use validation::check_range;
