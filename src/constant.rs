//! Constant values produced by literal scanning and by the
//! constant-expression folder.
//!
//! The original represents a folded constant as an `llvm::APInt` paired
//! with an `llvm::APFloat`, sized to whatever backend type the constant
//! carries. Without a backend-width-aware bignum on hand, integers are
//! stored here as `i128`/`u128` (wide enough for every integer type this
//! type system has, `long long`/`unsigned long long` included) and
//! floating constants as `f64` (`long double` is treated as `f64`-width,
//! per the Open Question resolution recorded in the project notes).

use crate::ty::{ArithKind, QualType, Type};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Integer { value: i128, unsigned: bool, kind: ArithKind },
    Float { value: f64, kind: ArithKind },
}

impl ConstValue {
    pub fn int(value: i128, kind: ArithKind) -> ConstValue {
        ConstValue::Integer { value, unsigned: kind.is_unsigned(), kind }
    }

    pub fn float(value: f64, kind: ArithKind) -> ConstValue {
        ConstValue::Float { value, kind }
    }

    pub fn ty(&self) -> QualType {
        match self {
            ConstValue::Integer { kind, .. } => QualType::unqualified(Type::arithmetic(*kind)),
            ConstValue::Float { kind, .. } => QualType::unqualified(Type::arithmetic(*kind)),
        }
    }

    pub fn as_i128(&self) -> i128 {
        match self {
            ConstValue::Integer { value, .. } => *value,
            ConstValue::Float { value, .. } => *value as i128,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            ConstValue::Integer { value, unsigned, .. } => {
                if *unsigned {
                    *value as u128 as f64
                } else {
                    *value as f64
                }
            }
            ConstValue::Float { value, .. } => *value,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            ConstValue::Integer { value, .. } => *value == 0,
            ConstValue::Float { value, .. } => *value == 0.0,
        }
    }

    pub fn is_true(&self) -> bool {
        !self.is_zero()
    }

    /// Converts this constant to the representation `target` calls for,
    /// truncating/sign- or zero-extending integers and converting
    /// between integer and floating representations as a real cast
    /// would. Used when folding an explicit cast or an implicit
    /// conversion (array initializer element, usual arithmetic
    /// conversions) over an already-folded operand.
    pub fn cast_to(&self, target: &QualType) -> Option<ConstValue> {
        let kind = match &target.ty.kind {
            crate::ty::TypeKind::Arithmetic(k) => *k,
            crate::ty::TypeKind::Pointer(_) => {
                return Some(ConstValue::Integer {
                    value: self.as_i128(),
                    unsigned: true,
                    kind: ArithKind::ULong,
                });
            }
            _ => return None,
        };

        if kind.is_float() {
            return Some(ConstValue::Float { value: self.as_f64(), kind });
        }

        let width_bits = kind.width() as u32 * 8;
        let raw = self.as_i128();
        let truncated = if width_bits >= 128 {
            raw
        } else {
            let mask: i128 = (1i128 << width_bits) - 1;
            let bits = raw & mask;
            if !kind.is_unsigned() && (bits & (1i128 << (width_bits - 1))) != 0 {
                bits - (1i128 << width_bits)
            } else {
                bits
            }
        };
        Some(ConstValue::Integer { value: truncated, unsigned: kind.is_unsigned(), kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_truncates_to_target_width() {
        let value = ConstValue::int(300, ArithKind::Int);
        let as_char = value.cast_to(&QualType::unqualified(Type::arithmetic(ArithKind::Char))).unwrap();
        assert_eq!(as_char.as_i128(), 44);
    }

    #[test]
    fn cast_sign_extends_negative_values() {
        let value = ConstValue::int(-1, ArithKind::Char);
        let as_int = value.cast_to(&QualType::unqualified(Type::arithmetic(ArithKind::Int))).unwrap();
        assert_eq!(as_int.as_i128(), -1);
    }
}
