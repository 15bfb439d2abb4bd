//! Save document model for Satisfactory Buddy.
//!
//! A converted save arrives as one JSON document. This crate decodes it into
//! typed [`GameObject`]s whose self-describing properties land in a
//! [`PropertyBag`], then indexes the result into a [`World`] that resolves
//! instance names and power circuit membership in constant time.

/// Game objects, object references, and transforms.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Insertion-ordered string-keyed map used for levels and nested objects.
pub mod ordered;
/// Tag-discriminated property shapes and the lossy property bag decoder.
pub mod property;
/// The top-level save document: header, levels, and metadata blocks.
pub mod save;
/// Recursive semi-structured values for schema-less property payloads.
pub mod value;
/// The indexed world built from a decoded save document.
pub mod world;

/// Re-export entity types.
pub use entity::{GameObject, ObjectReference};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export the ordered map.
pub use ordered::OrderedMap;
/// Re-export property types.
pub use property::{Property, PropertyBag, PropertyKind};
/// Re-export document types.
pub use save::{Header, Level, SaveDocument};
/// Re-export the semi-structured value type.
pub use value::Value;
/// Re-export world types.
pub use world::{NO_CIRCUIT, World};
