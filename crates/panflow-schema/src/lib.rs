//! Version-aware XPath resolution and context routing (§4.1–4.2, C1+C2).
//!
//! [`SchemaRegistry`] holds one descriptor per supported software version
//! and turns `(version, kind, context)` into a concrete XPath.
//! [`ContextRouter`] validates context descriptors against a loaded tree
//! and resolves the device-group inheritance chain.

mod descriptor;
mod detect;
mod registry;
mod router;

pub use detect::{detect_device_kind, detect_version};
pub use registry::SchemaRegistry;
pub use router::ContextRouter;
