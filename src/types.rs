//! The SIMPL type model: a 4-bit flag set encoding
//! `{integer, boolean} x {scalar, array} x {value, callable}`.
//!
//! A legal scalar variable type is exactly one of `{BOOLEAN, INTEGER}`,
//! optionally OR-ed with `ARRAY`. A callable type is `CALLABLE` alone (a
//! procedure) or `CALLABLE | BOOLEAN` / `CALLABLE | INTEGER` (a function),
//! optionally also OR-ed with `ARRAY` for an array-returning function.
//! `check` is structural equality — there is no implicit widening.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValType(u8);

impl ValType {
    pub const ARRAY: ValType = ValType(1);
    pub const BOOLEAN: ValType = ValType(2);
    pub const INTEGER: ValType = ValType(4);
    pub const CALLABLE: ValType = ValType(8);

    pub const fn empty() -> Self {
        ValType(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, flag: ValType) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn is_array(self) -> bool {
        self.contains(ValType::ARRAY)
    }

    pub fn is_callable(self) -> bool {
        self.contains(ValType::CALLABLE)
    }

    pub fn has_base_type(self) -> bool {
        self.contains(ValType::INTEGER) || self.contains(ValType::BOOLEAN)
    }

    /// A function: a callable with a declared return base type.
    pub fn is_function(self) -> bool {
        self.is_callable() && self.has_base_type()
    }

    /// A procedure: a callable with no return type.
    pub fn is_procedure(self) -> bool {
        self.is_callable() && !self.has_base_type()
    }

    /// A plain (non-callable) variable type, scalar or array.
    pub fn is_variable(self) -> bool {
        !self.is_callable() && self.has_base_type()
    }

    pub fn is_integer(self) -> bool {
        self.contains(ValType::INTEGER)
    }

    pub fn is_boolean(self) -> bool {
        self.contains(ValType::BOOLEAN)
    }

    /// Strip the `CALLABLE` flag, leaving the base/array bits of a return type.
    pub fn strip_callable(self) -> ValType {
        ValType(self.0 & !ValType::CALLABLE.0)
    }

    /// The element type obtained by indexing an array of this type.
    pub fn element_type(self) -> ValType {
        ValType(self.0 & !ValType::ARRAY.0)
    }

    pub fn as_array(self) -> ValType {
        self | ValType::ARRAY
    }
}

impl BitOr for ValType {
    type Output = ValType;
    fn bitor(self, rhs: ValType) -> ValType {
        ValType(self.0 | rhs.0)
    }
}

impl BitOrAssign for ValType {
    fn bitor_assign(&mut self, rhs: ValType) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_callable() {
            if self.is_procedure() {
                return write!(f, "procedure");
            }
            write!(f, "function returning ")?;
        }
        let base = if self.is_boolean() {
            "boolean"
        } else if self.is_integer() {
            "integer"
        } else {
            "<untyped>"
        };
        write!(f, "{}", base)?;
        if self.is_array() {
            write!(f, " array")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_kinds() {
        let i = ValType::INTEGER;
        assert!(i.is_variable());
        assert!(!i.is_array());
        assert!(!i.is_callable());
    }

    #[test]
    fn array_variable() {
        let a = ValType::INTEGER | ValType::ARRAY;
        assert!(a.is_variable());
        assert!(a.is_array());
        assert_eq!(a.element_type(), ValType::INTEGER);
    }

    #[test]
    fn procedure_vs_function() {
        let proc = ValType::CALLABLE;
        assert!(proc.is_procedure());
        assert!(!proc.is_function());

        let func = ValType::CALLABLE | ValType::BOOLEAN;
        assert!(func.is_function());
        assert!(!func.is_procedure());
        assert_eq!(func.strip_callable(), ValType::BOOLEAN);
    }

    #[test]
    fn array_returning_function() {
        let func = ValType::CALLABLE | ValType::INTEGER | ValType::ARRAY;
        assert!(func.is_function());
        assert!(func.strip_callable().is_array());
    }

    #[test]
    fn check_is_structural_equality() {
        let a = ValType::INTEGER | ValType::ARRAY;
        let b = ValType::ARRAY | ValType::INTEGER;
        assert_eq!(a, b);
        assert_ne!(a, ValType::INTEGER);
    }
}
