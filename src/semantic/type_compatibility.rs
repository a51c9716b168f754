// Type names and compatibility
//
// - Display names for either side of a type/function reference
// - The compatibility relation used by every type check
// - Base-type ancestry through `extends` chains
// - Operand categories for operator checks

use bitflags::bitflags;

use super::SemanticAnalyzer;
use crate::symbols::{FunctionReference, Reference, TypeReference};

bitflags! {
    /// What an operand can take part in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeCategory: u8 {
        const NUMERIC = 1 << 0;
        const STRING  = 1 << 1;
        const BOOLEAN = 1 << 2;
        const FOURCC  = 1 << 3;
        const HANDLE  = 1 << 4;
        const CODE    = 1 << 5;
        const NULL    = 1 << 6;
    }
}

impl TypeCategory {
    /// Category of a type whose base-type ancestor is `base`
    fn of_base_type(base: &str) -> Self {
        match base {
            "integer" | "real" => Self::NUMERIC,
            "fourcc" => Self::FOURCC.union(Self::NUMERIC),
            "string" => Self::STRING,
            "boolean" => Self::BOOLEAN,
            "handle" => Self::HANDLE,
            "code" => Self::CODE,
            "null" => Self::NULL,
            _ => Self::empty(),
        }
    }

    pub fn describe(self) -> &'static str {
        if self.contains(Self::FOURCC) {
            "fourcc"
        } else if self.contains(Self::NUMERIC) {
            "numeric"
        } else if self.contains(Self::STRING) {
            "string"
        } else if self.contains(Self::BOOLEAN) {
            "boolean"
        } else if self.contains(Self::HANDLE) {
            "handle"
        } else if self.contains(Self::CODE) {
            "code"
        } else if self.contains(Self::NULL) {
            "null"
        } else {
            "unknown"
        }
    }
}

/// Compatibility of two type names
///
/// Symmetric but not transitive: `fourcc` and `real` are both compatible
/// with `integer` but not with each other.
pub fn type_names_are_compatible(a: &str, b: &str) -> bool {
    a == b
        || matches!(
            (a, b),
            ("fourcc", "integer") | ("integer", "fourcc") | ("integer", "real") | ("real", "integer")
        )
        || a == "null"
        || b == "null"
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn type_name<'r>(&'r self, reference: &'r TypeReference) -> &'r str {
        match reference {
            Reference::Resolved(id) => &self.types.get(*id).identifier,
            Reference::Unresolved(name) => name,
        }
    }

    pub fn function_name<'r>(&'r self, reference: &'r FunctionReference) -> &'r str {
        match reference {
            Reference::Resolved(id) => &self.functions.get(*id).identifier,
            Reference::Unresolved(name) => name,
        }
    }

    pub fn types_are_compatible(&self, a: &TypeReference, b: &TypeReference) -> bool {
        type_names_are_compatible(self.type_name(a), self.type_name(b))
    }

    /// True if `type_ref` is `base` or extends it, directly or through ancestors
    pub fn type_reference_is_of_base_type(&self, type_ref: &TypeReference, base: &str) -> bool {
        let mut current = type_ref;
        loop {
            if self.type_name(current) == base {
                return true;
            }
            // A parent is always declared before its child, so the walk ends
            match current {
                Reference::Resolved(id) => match &self.types.get(*id).parent {
                    Some(parent) => current = parent,
                    None => return false,
                },
                Reference::Unresolved(_) => return false,
            }
        }
    }

    /// Whether a value of type `value` may be stored where `target` is expected
    ///
    /// Compatible types, plus subtypes of the target (a `unit` is a `handle`).
    pub(super) fn is_assignable(&self, target: &TypeReference, value: &TypeReference) -> bool {
        self.types_are_compatible(target, value)
            || self.type_reference_is_of_base_type(value, self.type_name(target))
    }

    /// Category of a type, from the first base type found in its ancestry
    pub(super) fn category_of_type(&self, type_ref: &TypeReference) -> TypeCategory {
        let mut current = type_ref;
        loop {
            let category = TypeCategory::of_base_type(self.type_name(current));
            if !category.is_empty() {
                return category;
            }
            match current {
                Reference::Resolved(id) => match &self.types.get(*id).parent {
                    Some(parent) => current = parent,
                    None => return TypeCategory::empty(),
                },
                Reference::Unresolved(_) => return TypeCategory::empty(),
            }
        }
    }
}
