// Copyright (c) 2025 - Cowboy AI, Inc.

//! Declarative node and relationship schemas
//!
//! Schemas describe what a node looks like and how it relates to other
//! nodes. They are validated when constructed and immutable afterwards; the
//! [`crate::query`] compiler turns them into load and cleanup statements.
//!
//! ```rust
//! use cim_inventory_graph::schema::*;
//!
//! # fn main() -> Result<(), cim_inventory_graph::SchemaError> {
//! let account = RelationshipSchema::new(
//!     "AWSAccount",
//!     NodeMatcher::new("RESOURCE", [("id", PropertyRef::batch("AWS_ID"))])?,
//!     "RESOURCE",
//!     LinkDirection::Inward,
//!     RelationshipProperties::new("RESOURCE", [("lastupdated", PropertyRef::batch("lastupdated"))])?,
//! )?;
//!
//! let instance = NodeSchema::builder(
//!     "EC2Instance",
//!     NodeProperties::new(
//!         "EC2Instance",
//!         [
//!             ("id", PropertyRef::field("InstanceId")),
//!             ("lastupdated", PropertyRef::batch("lastupdated")),
//!             ("state", PropertyRef::field("State")),
//!         ],
//!     )?,
//! )
//! .sub_resource(account)
//! .build()?;
//!
//! assert!(instance.scoped_cleanup());
//! # Ok(())
//! # }
//! ```

pub mod node;
pub mod properties;
pub mod property_ref;
pub mod registry;
pub mod relationship;

pub use node::{NodeSchema, NodeSchemaBuilder};
pub use properties::{
    NodeMatcher, NodeProperties, RelationshipProperties, SourceNodeMatcher, TargetNodeMatcher,
    FIRSTSEEN, ID, LASTUPDATED, SUB_RESOURCE_ID, SUB_RESOURCE_LABEL,
};
pub use property_ref::{Cardinality, MatchMode, PropertyRef, Resolved, ValueSource};
pub use registry::{CleanupScope, SchemaRegistry};
pub use relationship::{LinkDirection, RelationshipSchema};

use crate::errors::{SchemaError, SchemaResult};

/// Labels and property names are embedded in statement text verbatim
pub(crate) fn validate_identifier(owner: &str, identifier: &str) -> SchemaResult<()> {
    let mut chars = identifier.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier {
            owner: owner.to_string(),
            identifier: identifier.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(validate_identifier("T", "_sub_resource_id").is_ok());
        assert!(validate_identifier("T", "AWSAccount").is_ok());
        assert!(validate_identifier("T", "").is_err());
        assert!(validate_identifier("T", "a-b").is_err());
        assert!(validate_identifier("T", "n}) DETACH DELETE n //").is_err());
    }
}
