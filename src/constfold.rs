//! Constant-expression folding.
//!
//! A bottom-up visitor over `Expr`, grounded on `calc.cpp`'s
//! `CalcConstantExpr`: each node kind folds from its already-folded
//! operands, and any node the folder doesn't recognize as one of the
//! fixed constant-producing shapes raises "not a constant" rather than
//! approximating. The original throws a C++ exception to unwind out of
//! a partially-evaluated recursive visit and catches it at `Calc`'s
//! entry point; the same shape is expressed here as `Result`/`?`.

use crate::ast::{BinaryOp, Expr, ExprKind, StmtKind, UnaryOp};
use crate::constant::ConstValue;
use crate::diagnostics::{Fatal, Result};
use crate::loc::SourceLocation;
use crate::ty::{usual_arithmetic_conversions, ArithKind, QualType, Type, TypeKind};

/// A folded constant, either a plain value or the address of a static
/// object/function reached through one of the syntactic shapes §4.5
/// allows (`array[index]`, `struct.member`, `*(p + n)`, a bare object
/// or function name).
#[derive(Debug, Clone)]
pub enum Folded {
    Value(ConstValue),
    /// The address of a named object or function, plus a constant byte
    /// offset accumulated by subscript/member-access folding.
    Address { name: String, byte_offset: i64 },
}

impl Folded {
    fn value(self, loc: &SourceLocation) -> Result<ConstValue> {
        match self {
            Folded::Value(v) => Ok(v),
            Folded::Address { .. } => {
                Err(Fatal::constant_fold(loc.clone(), "expected a value, found an address constant"))
            }
        }
    }
}

/// Folds `expr`, returning `Ok(None)` (not `Err`) when the expression is
/// simply not a constant and the caller treats that as optional (e.g.
/// speculative folding of a default-argument expression). Use `fold`
/// instead when a fatal diagnostic is wanted.
pub fn try_fold(expr: &Expr) -> Option<Folded> {
    fold_inner(expr).ok()
}

pub fn fold(expr: &Expr) -> Result<Folded> {
    fold_inner(expr).map_err(|_| Fatal::constant_fold(expr.loc.clone(), "expected constant expression"))
}

fn fold_inner(expr: &Expr) -> Result<Folded> {
    match &expr.kind {
        ExprKind::Constant(value) => Ok(Folded::Value(*value)),

        ExprKind::StringLiteral { .. } => {
            Err(Fatal::constant_fold(expr.loc.clone(), "string literal used where a scalar constant is required"))
        }

        ExprKind::Identifier { .. } => {
            Err(Fatal::constant_fold(expr.loc.clone(), "unresolved identifier in constant expression"))
        }

        ExprKind::Enumerator(e) => Ok(Folded::Value(ConstValue::int(e.value as i128, ArithKind::Int))),

        ExprKind::Object(object) => {
            use crate::ty::StorageClass;
            if matches!(object.storage.get(), StorageClass::Static | StorageClass::Extern)
                || object.linkage.get() != crate::ty::Linkage::None
            {
                Ok(Folded::Address { name: object.name.clone(), byte_offset: 0 })
            } else {
                Err(Fatal::constant_fold(expr.loc.clone(), "reference to a non-static object is not constant"))
            }
        }

        ExprKind::UnaryOp { op, operand } => fold_unary(*op, operand, &expr.loc, &expr.ty),

        ExprKind::TypeCast { operand } => {
            let folded = fold_inner(operand)?.value(&expr.loc)?;
            folded
                .cast_to(&expr.ty)
                .map(Folded::Value)
                .ok_or_else(|| Fatal::constant_fold(expr.loc.clone(), "non-foldable cast"))
        }

        ExprKind::BinaryOp { op, lhs, rhs } => fold_binary(*op, lhs, rhs, &expr.loc),

        ExprKind::ConditionOp { cond, then_expr, else_expr } => {
            let c = fold_inner(cond)?.value(&expr.loc)?;
            if c.is_true() { fold_inner(then_expr) } else { fold_inner(else_expr) }
        }

        ExprKind::StmtExpr { block } => fold_stmt_expr(block, &expr.loc),

        ExprKind::FuncCall { .. } => {
            Err(Fatal::constant_fold(expr.loc.clone(), "a function call is never a constant expression"))
        }

        ExprKind::Member { .. } => {
            Err(Fatal::constant_fold(expr.loc.clone(), "member access is not a constant expression"))
        }
    }
}

fn fold_unary(op: UnaryOp, operand: &Expr, loc: &SourceLocation, result_ty: &QualType) -> Result<Folded> {
    match op {
        UnaryOp::Plus => fold_inner(operand),
        UnaryOp::Minus => {
            let v = fold_inner(operand)?.value(loc)?;
            Ok(Folded::Value(negate(v)))
        }
        UnaryOp::BitNot => {
            let v = fold_inner(operand)?.value(loc)?;
            Ok(Folded::Value(bitnot(v)))
        }
        UnaryOp::LogNot => {
            let v = fold_inner(operand)?.value(loc)?;
            Ok(Folded::Value(ConstValue::int(if v.is_zero() { 1 } else { 0 }, ArithKind::Int)))
        }
        UnaryOp::Address => fold_address(operand, loc, result_ty),
        _ => Err(Fatal::constant_fold(loc.clone(), "operator is never constant")),
    }
}

/// Implements §4.5's restricted `Addr()`: only a static object, a
/// function, `array[index]`, `struct.member`, or `*(p + n)` may be
/// taken the address of in a constant context.
fn fold_address(operand: &Expr, loc: &SourceLocation, _result_ty: &QualType) -> Result<Folded> {
    match &operand.kind {
        ExprKind::Object(_) => fold_inner(operand),

        ExprKind::UnaryOp { op: UnaryOp::Deref, operand: inner } => {
            if let ExprKind::BinaryOp { op: BinaryOp::Add, lhs, rhs } = &inner.kind {
                let base = fold_inner(lhs)?;
                let index = fold_inner(rhs)?.value(loc)?;
                let elem_width = inner.ty.ty.width() as i64;
                match base {
                    Folded::Address { name, byte_offset } => Ok(Folded::Address {
                        name,
                        byte_offset: byte_offset + index.as_i128() as i64 * elem_width,
                    }),
                    Folded::Value(_) => {
                        Err(Fatal::constant_fold(loc.clone(), "pointer base of *(p + n) is not a constant address"))
                    }
                }
            } else {
                Err(Fatal::constant_fold(loc.clone(), "only *(p + n) may be folded to an address"))
            }
        }

        ExprKind::Member { base, member } => {
            let base_folded = fold_address(base, loc, &base.ty)?;
            match base_folded {
                Folded::Address { name, byte_offset } => {
                    Ok(Folded::Address { name, byte_offset: byte_offset + member.offset.get() })
                }
                Folded::Value(_) => unreachable!("fold_address never returns a plain value"),
            }
        }

        _ => Err(Fatal::constant_fold(loc.clone(), "operand of '&' is not one of the allowed constant shapes")),
    }
}

fn fold_binary(op: BinaryOp, lhs: &Expr, rhs: &Expr, loc: &SourceLocation) -> Result<Folded> {
    match op {
        BinaryOp::LogAnd => {
            let l = fold_inner(lhs)?.value(loc)?;
            if l.is_zero() {
                return Ok(Folded::Value(ConstValue::int(0, ArithKind::Int)));
            }
            let r = fold_inner(rhs)?.value(loc)?;
            Ok(Folded::Value(ConstValue::int(if r.is_true() { 1 } else { 0 }, ArithKind::Int)))
        }
        BinaryOp::LogOr => {
            let l = fold_inner(lhs)?.value(loc)?;
            if l.is_true() {
                return Ok(Folded::Value(ConstValue::int(1, ArithKind::Int)));
            }
            let r = fold_inner(rhs)?.value(loc)?;
            Ok(Folded::Value(ConstValue::int(if r.is_true() { 1 } else { 0 }, ArithKind::Int)))
        }
        _ => fold_binary_eager(op, lhs, rhs, loc),
    }
}

fn fold_binary_eager(op: BinaryOp, lhs: &Expr, rhs: &Expr, loc: &SourceLocation) -> Result<Folded> {
    let l = fold_inner(lhs)?;
    let r = fold_inner(rhs)?;

    // Pointer difference: two addresses into the same object, divided
    // by the pointee width. Grounded on calc.cpp's `SubOp` pointer path.
    if let (Folded::Address { name: ln, byte_offset: lo }, Folded::Address { name: rn, byte_offset: ro }) =
        (&l, &r)
    {
        if op == BinaryOp::Sub {
            if ln != rn {
                return Err(Fatal::constant_fold(loc.clone(), "pointer difference between unrelated objects"));
            }
            let elem_width = lhs.ty.ty.pointee().ty.width().max(1) as i64;
            return Ok(Folded::Value(ConstValue::int(((lo - ro) / elem_width) as i128, ArithKind::Long)));
        }
        if op == BinaryOp::Add {
            return Err(Fatal::constant_fold(loc.clone(), "cannot add two addresses"));
        }
    }

    if let Folded::Address { name, byte_offset } = &l {
        if matches!(op, BinaryOp::Add | BinaryOp::Sub) {
            let rv = r.value(loc)?;
            let elem_width = lhs.ty.ty.pointee().ty.width().max(1) as i64;
            let delta = rv.as_i128() as i64 * elem_width;
            let new_offset = if op == BinaryOp::Add { byte_offset + delta } else { byte_offset - delta };
            return Ok(Folded::Address { name: name.clone(), byte_offset: new_offset });
        }
    }

    let lv = l.value(loc)?;
    let rv = r.value(loc)?;
    let common = usual_arithmetic_conversions(&lv.ty(), &rv.ty());
    let lv = lv.cast_to(&common).unwrap_or(lv);
    let rv = rv.cast_to(&common).unwrap_or(rv);
    let common_kind = match &common.ty.kind {
        TypeKind::Arithmetic(k) => *k,
        _ => unreachable!("usual_arithmetic_conversions always returns an arithmetic type"),
    };

    if common_kind.is_float() {
        let (a, b) = (lv.as_f64(), rv.as_f64());
        return match op {
            BinaryOp::Add => Ok(Folded::Value(ConstValue::float(a + b, common_kind))),
            BinaryOp::Sub => Ok(Folded::Value(ConstValue::float(a - b, common_kind))),
            BinaryOp::Mul => Ok(Folded::Value(ConstValue::float(a * b, common_kind))),
            BinaryOp::Div => Ok(Folded::Value(ConstValue::float(a / b, common_kind))),
            BinaryOp::Lt => Ok(Folded::Value(cmp(a < b))),
            BinaryOp::Gt => Ok(Folded::Value(cmp(a > b))),
            BinaryOp::Le => Ok(Folded::Value(cmp(a <= b))),
            BinaryOp::Ge => Ok(Folded::Value(cmp(a >= b))),
            BinaryOp::Eq => Ok(Folded::Value(cmp(a == b))),
            BinaryOp::Ne => Ok(Folded::Value(cmp(a != b))),
            BinaryOp::Comma => Ok(Folded::Value(rv)),
            _ => Err(Fatal::constant_fold(loc.clone(), "operator requires integer operands")),
        };
    }

    let (a, b) = (lv.as_i128(), rv.as_i128());
    let result = match op {
        BinaryOp::Add => arith_int(a.wrapping_add(b), common_kind, &common),
        BinaryOp::Sub => arith_int(a.wrapping_sub(b), common_kind, &common),
        BinaryOp::Mul => arith_int(a.wrapping_mul(b), common_kind, &common),
        BinaryOp::Div => {
            if b == 0 {
                return Err(Fatal::constant_fold(loc.clone(), "division by zero"));
            }
            arith_int(a / b, common_kind, &common)
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(Fatal::constant_fold(loc.clone(), "division by zero"));
            }
            arith_int(a % b, common_kind, &common)
        }
        BinaryOp::BitAnd => arith_int(a & b, common_kind, &common),
        BinaryOp::BitOr => arith_int(a | b, common_kind, &common),
        BinaryOp::BitXor => arith_int(a ^ b, common_kind, &common),
        BinaryOp::Shl => arith_int(a.wrapping_shl(b as u32), common_kind, &common),
        BinaryOp::Shr => arith_int(a.wrapping_shr(b as u32), common_kind, &common),
        BinaryOp::Lt => return Ok(Folded::Value(cmp(a < b))),
        BinaryOp::Gt => return Ok(Folded::Value(cmp(a > b))),
        BinaryOp::Le => return Ok(Folded::Value(cmp(a <= b))),
        BinaryOp::Ge => return Ok(Folded::Value(cmp(a >= b))),
        BinaryOp::Eq => return Ok(Folded::Value(cmp(a == b))),
        BinaryOp::Ne => return Ok(Folded::Value(cmp(a != b))),
        BinaryOp::Comma => rv,
        _ => return Err(Fatal::constant_fold(loc.clone(), "operator is never constant")),
    };
    Ok(Folded::Value(result))
}

fn arith_int(value: i128, kind: ArithKind, common: &QualType) -> ConstValue {
    ConstValue::Integer { value, unsigned: kind.is_unsigned(), kind }.cast_to(common).unwrap()
}

fn cmp(result: bool) -> ConstValue {
    ConstValue::int(if result { 1 } else { 0 }, ArithKind::Int)
}

fn negate(v: ConstValue) -> ConstValue {
    match v {
        ConstValue::Integer { value, unsigned, kind } => {
            ConstValue::Integer { value: value.wrapping_neg(), unsigned, kind }
        }
        ConstValue::Float { value, kind } => ConstValue::Float { value: -value, kind },
    }
}

fn bitnot(v: ConstValue) -> ConstValue {
    match v {
        ConstValue::Integer { value, unsigned, kind } => {
            ConstValue::Integer { value: !value, unsigned, kind }
        }
        ConstValue::Float { .. } => v,
    }
}

/// A statement expression's value is its last expression-statement, if
/// constant. Grounded on §4.5's statement-expression rule.
fn fold_stmt_expr(block: &crate::ast::Stmt, loc: &SourceLocation) -> Result<Folded> {
    let items = match &block.kind {
        StmtKind::Compound { items } => items,
        _ => return Err(Fatal::constant_fold(loc.clone(), "statement expression body is not a compound statement")),
    };
    let last = items
        .iter()
        .rev()
        .find_map(|stmt| match &stmt.kind {
            StmtKind::Expr(Some(e)) => Some(e.as_ref()),
            _ => None,
        })
        .ok_or_else(|| Fatal::constant_fold(loc.clone(), "empty statement expression is not constant"))?;
    fold_inner(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc::SourceLocation;

    fn const_expr(value: i128, kind: ArithKind) -> Box<Expr> {
        Expr::new(ExprKind::Constant(ConstValue::int(value, kind)), QualType::unqualified(Type::arithmetic(kind)), SourceLocation::synthetic(), false)
    }

    #[test]
    fn folds_addition_of_two_ints() {
        let expr = Expr::new(
            ExprKind::BinaryOp { op: BinaryOp::Add, lhs: const_expr(2, ArithKind::Int), rhs: const_expr(3, ArithKind::Int) },
            QualType::unqualified(Type::arithmetic(ArithKind::Int)),
            SourceLocation::synthetic(),
            false,
        );
        match fold(&expr).unwrap() {
            Folded::Value(v) => assert_eq!(v.as_i128(), 5),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn division_by_zero_is_fatal() {
        let expr = Expr::new(
            ExprKind::BinaryOp { op: BinaryOp::Div, lhs: const_expr(1, ArithKind::Int), rhs: const_expr(0, ArithKind::Int) },
            QualType::unqualified(Type::arithmetic(ArithKind::Int)),
            SourceLocation::synthetic(),
            false,
        );
        assert!(fold(&expr).is_err());
    }

    #[test]
    fn logical_and_short_circuits_without_evaluating_rhs() {
        let expr = Expr::new(
            ExprKind::BinaryOp { op: BinaryOp::LogAnd, lhs: const_expr(0, ArithKind::Int), rhs: const_expr(1, ArithKind::Int) },
            QualType::unqualified(Type::arithmetic(ArithKind::Int)),
            SourceLocation::synthetic(),
            false,
        );
        match fold(&expr).unwrap() {
            Folded::Value(v) => assert_eq!(v.as_i128(), 0),
            _ => panic!("expected a value"),
        }
    }
}
