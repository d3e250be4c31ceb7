//! Remote Schema Permissions
//!
//! Role-scoped views of a remote schema's introspection: explicit permission
//! documents filter the base schema, and roles without an explicit document
//! inherit by combining their parents' views through a deterministic merge
//! algebra.

pub mod algebra;
pub mod document;
pub mod merge;

pub use algebra::PermissionValue;
pub use document::{PermissionDocument, TypeExposure};
pub use merge::resolve_role_permissions;
