//! Permission merge algebra
//!
//! The combination rule for inherited permissions. `combine` is a
//! commutative, associative semigroup over the tri-state value:
//! `Undefined` is the identity, two defined views agree only when their
//! scoped schemas are equal, and disagreement is sticky.

use crate::introspection::IntrospectionResult;

/// Tri-state permission of one role on one remote schema
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionValue {
    /// The role has an explicitly defined or successfully inherited view
    Defined(IntrospectionResult),
    /// No access
    Undefined,
    /// Parents disagree; the role ends up with no usable view
    Inconsistent,
}

impl PermissionValue {
    /// Combine two parent values
    pub fn combine(self, other: PermissionValue) -> PermissionValue {
        match (self, other) {
            (PermissionValue::Undefined, v) | (v, PermissionValue::Undefined) => v,
            (PermissionValue::Inconsistent, _) | (_, PermissionValue::Inconsistent) => {
                PermissionValue::Inconsistent
            }
            (PermissionValue::Defined(a), PermissionValue::Defined(b)) => {
                if a == b {
                    PermissionValue::Defined(a)
                } else {
                    PermissionValue::Inconsistent
                }
            }
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, PermissionValue::Defined(_))
    }
}

/// Fold a list of parent values into one
///
/// Folding an empty list yields `Undefined`; callers treat "no parents" as
/// no access before ever reaching this point.
pub fn merge(values: Vec<PermissionValue>) -> PermissionValue {
    values
        .into_iter()
        .fold(PermissionValue::Undefined, PermissionValue::combine)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(query_type: &str) -> IntrospectionResult {
        IntrospectionResult {
            query_type: query_type.to_string(),
            mutation_type: None,
            subscription_type: None,
            types: vec![],
        }
    }

    #[test]
    fn test_undefined_is_identity() {
        let defined = PermissionValue::Defined(schema("Query"));
        assert_eq!(
            defined.clone().combine(PermissionValue::Undefined),
            defined
        );
        assert_eq!(
            PermissionValue::Undefined.combine(defined.clone()),
            defined
        );
    }

    #[test]
    fn test_agreement_keeps_the_value() {
        let a = PermissionValue::Defined(schema("Query"));
        let b = PermissionValue::Defined(schema("Query"));
        assert_eq!(a.clone().combine(b), a);
    }

    #[test]
    fn test_disagreement_is_inconsistent_and_sticky() {
        let a = PermissionValue::Defined(schema("Query"));
        let b = PermissionValue::Defined(schema("RootQuery"));
        let merged = a.clone().combine(b);
        assert_eq!(merged, PermissionValue::Inconsistent);
        assert_eq!(merged.combine(a), PermissionValue::Inconsistent);
    }

    #[test]
    fn test_combine_is_associative() {
        let a = PermissionValue::Defined(schema("Query"));
        let b = PermissionValue::Undefined;
        let c = PermissionValue::Defined(schema("RootQuery"));

        let left = a.clone().combine(b.clone()).combine(c.clone());
        let right = a.combine(b.combine(c));
        assert_eq!(left, right);
    }

    #[test]
    fn test_merge_folds_all_parents() {
        let value = merge(vec![
            PermissionValue::Undefined,
            PermissionValue::Defined(schema("Query")),
            PermissionValue::Undefined,
        ]);
        assert_eq!(value, PermissionValue::Defined(schema("Query")));
    }
}
