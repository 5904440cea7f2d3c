//! Shared types for the PANFlow configuration engine.
//!
//! This crate has no behavior of its own: it is the vocabulary every other
//! `panflow-*` crate shares so that contexts, kinds, property maps, change
//! records, and errors mean the same thing everywhere.

pub mod abort;
pub mod change;
pub mod config;
pub mod context;
pub mod error;
pub mod kind;
pub mod property;

pub use abort::AbortFlag;
pub use change::{Action, ChangeRecord, Journal};
pub use config::{ConflictStrategy, DedupConfig, DetectionConfig, MergeConfig, PanflowConfig, RenameConfig, SurvivorStrategy};
pub use context::{ContainerKind, ContextDescriptor, DeviceKind};
pub use error::{PanflowError, Result};
pub use kind::{EntityKind, ObjectKind, PolicyKind, ProfileKind};
pub use property::{PropertyMap, PropertyValue};
