//! Typed CRUD accessors over object and policy kinds (§4.4, C4).
//!
//! Property maps arrive as a free-form, string-keyed [`panflow_model::PropertyMap`];
//! [`shape`] holds the one property-descriptor table translating each key
//! to its XML shape, and [`properties`] applies it. [`Accessors`] and
//! [`GroupAccessors`] are the public surface.

mod accessors;
mod group;
mod kind_lookup;
mod properties;
mod shape;

pub use accessors::Accessors;
pub use group::GroupAccessors;
