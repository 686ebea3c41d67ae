//! Expression grammar: the 15-level precedence-climbing chain plus its
//! sibling productions (sizeof/alignof, compound literals, calls,
//! member access, constants). Grounded on `parse_expr.cpp`.

use super::Parser;
use crate::ast::{BinaryOp, Expr, ExprKind, ObjectData, UnaryOp};
use crate::diagnostics::{Fatal, Result};
use crate::loc::SourceLocation;
use crate::scanner::{self, Encoding, FloatSuffix, NumericLiteral};
use crate::scope::Ordinary;
use crate::token::Tag;
use crate::ty::{
    usual_arithmetic_conversions, ArithKind, Linkage, QualType, StorageClass, Type, TypeKind,
};

impl Parser {
    pub(super) fn parse_expr(&mut self) -> Result<Box<Expr>> {
        self.eat(Tag::Extension);
        let mut lhs = self.parse_assignment_expr()?;
        while self.eat(Tag::Comma).is_some() {
            let loc = lhs.loc.clone();
            let rhs = self.parse_assignment_expr()?;
            let ty = rhs.ty.clone();
            lhs = Expr::new(
                ExprKind::BinaryOp { op: BinaryOp::Comma, lhs, rhs },
                ty,
                loc,
                false,
            );
        }
        Ok(lhs)
    }

    pub(super) fn parse_assignment_expr(&mut self) -> Result<Box<Expr>> {
        self.eat(Tag::Extension);
        let lhs = self.parse_condition_expr()?;

        let compound_op = match self.peek_tag() {
            Tag::Equal => None,
            Tag::StarEqual => Some(BinaryOp::Mul),
            Tag::SlashEqual => Some(BinaryOp::Div),
            Tag::PercentEqual => Some(BinaryOp::Mod),
            Tag::PlusEqual => Some(BinaryOp::Add),
            Tag::MinusEqual => Some(BinaryOp::Sub),
            Tag::LessLessEqual => Some(BinaryOp::Shl),
            Tag::GreaterGreaterEqual => Some(BinaryOp::Shr),
            Tag::AmpEqual => Some(BinaryOp::BitAnd),
            Tag::CaretEqual => Some(BinaryOp::BitXor),
            Tag::PipeEqual => Some(BinaryOp::BitOr),
            _ => return Ok(lhs),
        };

        if !lhs.lvalue {
            return Err(Fatal::expr_type(self.loc(), "left operand of an assignment must be an lvalue"));
        }
        if lhs.ty.is_const() {
            return Err(Fatal::expr_type(self.loc(), "cannot assign to a const-qualified lvalue"));
        }

        let loc = self.loc();
        self.advance();
        let rhs = self.parse_assignment_expr()?;
        let lhs_ty = lhs.ty.clone();

        let rhs = match compound_op {
            None => self.convert_for_assignment(rhs, &lhs_ty, &loc)?,
            Some(op) => {
                let folded = self.check_binary(op, &lhs, &rhs, &loc)?;
                let applied = Expr::new(
                    ExprKind::BinaryOp { op, lhs: lhs.clone(), rhs },
                    folded,
                    loc.clone(),
                    false,
                );
                self.convert_for_assignment(applied, &lhs_ty, &loc)?
            }
        };

        Ok(Expr::new(ExprKind::BinaryOp { op: BinaryOp::Assign, lhs, rhs }, lhs_ty, loc, false))
    }

    fn convert_for_assignment(&self, rhs: Box<Expr>, target: &QualType, loc: &SourceLocation) -> Result<Box<Expr>> {
        if target.ty.is_arithmetic() && rhs.ty.ty.is_arithmetic() {
            return Ok(Expr::new(ExprKind::TypeCast { operand: rhs }, target.clone(), loc.clone(), false));
        }
        if target.ty.is_pointer() && (rhs.ty.ty.is_pointer() || target.compatible(&rhs.ty)) {
            return Ok(rhs);
        }
        if !target.compatible(&rhs.ty.decay()) {
            return Err(Fatal::expr_type(loc.clone(), "incompatible types in assignment"));
        }
        Ok(rhs)
    }

    pub(super) fn parse_condition_expr(&mut self) -> Result<Box<Expr>> {
        let cond = self.parse_logical_or_expr()?;
        if self.eat(Tag::Question).is_none() {
            return Ok(cond);
        }

        let loc = self.loc();
        let then_expr = if self.check(Tag::Colon) {
            // GNU `a ?: b` extension: the condition is reused as the
            // `then` branch, evaluated once.
            cond.clone()
        } else {
            self.parse_expr()?
        };
        self.expect(Tag::Colon)?;
        let else_expr = self.parse_condition_expr()?;

        if !cond.ty.ty.is_scalar() {
            return Err(Fatal::expr_type(loc.clone(), "the condition of '?:' must have scalar type"));
        }
        let result_ty = if then_expr.ty.ty.is_arithmetic() && else_expr.ty.ty.is_arithmetic() {
            usual_arithmetic_conversions(&then_expr.ty, &else_expr.ty)
        } else {
            then_expr.ty.clone()
        };

        Ok(Expr::new(ExprKind::ConditionOp { cond, then_expr, else_expr }, result_ty, loc, false))
    }

    fn parse_binary_level(
        &mut self,
        next: fn(&mut Parser) -> Result<Box<Expr>>,
        ops: &[(Tag, BinaryOp)],
    ) -> Result<Box<Expr>> {
        let mut lhs = next(self)?;
        loop {
            let matched = ops.iter().find(|(tag, _)| self.check(*tag)).copied();
            let Some((_, op)) = matched else { break };
            let loc = self.loc();
            self.advance();
            let rhs = next(self)?;
            let ty = self.check_binary(op, &lhs, &rhs, &loc)?;
            lhs = Expr::new(ExprKind::BinaryOp { op, lhs, rhs }, ty, loc, false);
        }
        Ok(lhs)
    }

    pub(super) fn parse_logical_or_expr(&mut self) -> Result<Box<Expr>> {
        self.parse_binary_level(Parser::parse_logical_and_expr, &[(Tag::PipePipe, BinaryOp::LogOr)])
    }

    pub(super) fn parse_logical_and_expr(&mut self) -> Result<Box<Expr>> {
        self.parse_binary_level(Parser::parse_inclusive_or_expr, &[(Tag::AmpAmp, BinaryOp::LogAnd)])
    }

    fn parse_inclusive_or_expr(&mut self) -> Result<Box<Expr>> {
        self.parse_binary_level(Parser::parse_exclusive_or_expr, &[(Tag::Pipe, BinaryOp::BitOr)])
    }

    fn parse_exclusive_or_expr(&mut self) -> Result<Box<Expr>> {
        self.parse_binary_level(Parser::parse_and_expr, &[(Tag::Caret, BinaryOp::BitXor)])
    }

    fn parse_and_expr(&mut self) -> Result<Box<Expr>> {
        self.parse_binary_level(Parser::parse_equality_expr, &[(Tag::Amp, BinaryOp::BitAnd)])
    }

    fn parse_equality_expr(&mut self) -> Result<Box<Expr>> {
        self.parse_binary_level(
            Parser::parse_relation_expr,
            &[(Tag::EqualEqual, BinaryOp::Eq), (Tag::ExclaimEqual, BinaryOp::Ne)],
        )
    }

    fn parse_relation_expr(&mut self) -> Result<Box<Expr>> {
        self.parse_binary_level(
            Parser::parse_shift_expr,
            &[
                (Tag::Less, BinaryOp::Lt),
                (Tag::Greater, BinaryOp::Gt),
                (Tag::LessEqual, BinaryOp::Le),
                (Tag::GreaterEqual, BinaryOp::Ge),
            ],
        )
    }

    fn parse_shift_expr(&mut self) -> Result<Box<Expr>> {
        self.parse_binary_level(
            Parser::parse_additive_expr,
            &[(Tag::LessLess, BinaryOp::Shl), (Tag::GreaterGreater, BinaryOp::Shr)],
        )
    }

    fn parse_additive_expr(&mut self) -> Result<Box<Expr>> {
        self.parse_binary_level(
            Parser::parse_multiplicative_expr,
            &[(Tag::Plus, BinaryOp::Add), (Tag::Minus, BinaryOp::Sub)],
        )
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Box<Expr>> {
        self.parse_binary_level(
            Parser::parse_cast_expr,
            &[(Tag::Star, BinaryOp::Mul), (Tag::Slash, BinaryOp::Div), (Tag::Percent, BinaryOp::Mod)],
        )
    }

    /// Checks and computes the result type for `op` applied to `lhs`/`rhs`,
    /// per spec.md §4.4's per-operator-category rules.
    fn check_binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr, loc: &SourceLocation) -> Result<QualType> {
        use BinaryOp::*;
        match op {
            Mul | Div => {
                if !lhs.ty.ty.is_arithmetic() || !rhs.ty.ty.is_arithmetic() {
                    return Err(Fatal::expr_type(loc.clone(), "operands of '*'/'/' must have arithmetic type"));
                }
                Ok(usual_arithmetic_conversions(&lhs.ty, &rhs.ty))
            }
            Mod | BitAnd | BitXor | BitOr => {
                if !lhs.ty.ty.is_integer() || !rhs.ty.ty.is_integer() {
                    return Err(Fatal::expr_type(loc.clone(), "operands must have integer type"));
                }
                Ok(usual_arithmetic_conversions(&lhs.ty, &rhs.ty))
            }
            Add => {
                if lhs.ty.ty.is_arithmetic() && rhs.ty.ty.is_arithmetic() {
                    Ok(usual_arithmetic_conversions(&lhs.ty, &rhs.ty))
                } else if lhs.ty.ty.is_pointer() && rhs.ty.ty.is_integer() {
                    Ok(lhs.ty.clone())
                } else if rhs.ty.ty.is_pointer() && lhs.ty.ty.is_integer() {
                    Ok(rhs.ty.clone())
                } else {
                    Err(Fatal::expr_type(loc.clone(), "invalid operands to '+'"))
                }
            }
            Sub => {
                if lhs.ty.ty.is_arithmetic() && rhs.ty.ty.is_arithmetic() {
                    Ok(usual_arithmetic_conversions(&lhs.ty, &rhs.ty))
                } else if lhs.ty.ty.is_pointer() && rhs.ty.ty.is_integer() {
                    Ok(lhs.ty.clone())
                } else if lhs.ty.ty.is_pointer() && rhs.ty.ty.is_pointer() {
                    if !lhs.ty.compatible(&rhs.ty) {
                        return Err(Fatal::expr_type(loc.clone(), "pointer operands of '-' point to incompatible types"));
                    }
                    Ok(QualType::unqualified(Type::arithmetic(ArithKind::Long)))
                } else {
                    Err(Fatal::expr_type(loc.clone(), "invalid operands to '-'"))
                }
            }
            Shl | Shr => {
                if !lhs.ty.ty.is_integer() || !rhs.ty.ty.is_integer() {
                    return Err(Fatal::expr_type(loc.clone(), "operands of a shift must have integer type"));
                }
                Ok(crate::ty::integer_promote(&lhs.ty))
            }
            Lt | Gt | Le | Ge | Eq | Ne => {
                let compatible_pointers = lhs.ty.ty.is_pointer()
                    && rhs.ty.ty.is_pointer()
                    && (lhs.ty.compatible(&rhs.ty) || lhs.ty.ty.pointee().ty.is_void() || rhs.ty.ty.pointee().ty.is_void());
                if !(lhs.ty.ty.is_arithmetic() && rhs.ty.ty.is_arithmetic()) && !compatible_pointers {
                    return Err(Fatal::expr_type(loc.clone(), "incomparable operand types"));
                }
                Ok(QualType::unqualified(Type::arithmetic(ArithKind::Int)))
            }
            LogAnd | LogOr => {
                if !lhs.ty.ty.is_scalar() || !rhs.ty.ty.is_scalar() {
                    return Err(Fatal::expr_type(loc.clone(), "operands of '&&'/'||' must have scalar type"));
                }
                Ok(QualType::unqualified(Type::arithmetic(ArithKind::Int)))
            }
            Comma => Ok(rhs.ty.clone()),
            Assign | MulAssign | DivAssign | ModAssign | AddAssign | SubAssign | ShlAssign | ShrAssign
            | AndAssign | XorAssign | OrAssign => unreachable!("compound assignment is resolved by the caller"),
        }
    }

    pub(super) fn parse_cast_expr(&mut self) -> Result<Box<Expr>> {
        if self.check(Tag::LeftParen) && self.looks_like_type_name_after_paren() {
            let loc = self.loc();
            self.advance();
            let ty = self.parse_type_name()?;
            self.expect(Tag::RightParen)?;

            if self.check(Tag::LeftBrace) {
                let literal = self.parse_compound_literal(ty, loc)?;
                return self.parse_postfix_expr_tail(literal);
            }

            if !ty.ty.is_arithmetic() && !ty.ty.is_pointer() && !ty.ty.is_void() {
                return Err(Fatal::expr_type(loc, "a cast target must be void, arithmetic or pointer type"));
            }
            let operand = self.parse_cast_expr()?;
            return Ok(Expr::new(ExprKind::TypeCast { operand }, ty, loc, false));
        }
        self.parse_unary_expr()
    }

    /// Peeks past a `(` to decide whether it opens a type name (a cast or
    /// compound literal) rather than a parenthesized expression.
    fn looks_like_type_name_after_paren(&self) -> bool {
        let save_tag = self.tokens[self.pos + 1].tag;
        match save_tag {
            Tag::Void | Tag::Char | Tag::Short | Tag::Int | Tag::Long | Tag::Float | Tag::Double
            | Tag::Signed | Tag::Unsigned | Tag::BoolKw | Tag::Struct | Tag::Union | Tag::Enum
            | Tag::Const | Tag::Volatile | Tag::AtomicKw => true,
            Tag::Identifier => {
                let name = self.tokens[self.pos + 1].text();
                matches!(
                    self.scopes.current().find_ordinary(name),
                    Some(Ordinary::Object(o)) if matches!(o.storage.get(), StorageClass::Typedef)
                )
            }
            _ => false,
        }
    }

    fn parse_compound_literal(&mut self, ty: QualType, loc: SourceLocation) -> Result<Box<Expr>> {
        let init = self.parse_initializer()?;
        let at_file_scope = self.scopes.current().is_file_scope();
        let target = if at_file_scope { crate::init::Target::Static } else { crate::init::Target::Automatic };
        let plan = crate::init::elaborate(&ty, &init, target, &loc)?;
        let object = ObjectData::new("", ty.clone(), loc.clone());
        object.linkage.set(if at_file_scope { Linkage::Internal } else { Linkage::None });
        *object.init.borrow_mut() = Some(plan);
        Ok(Expr::new(ExprKind::Object(object), ty, loc, true))
    }

    pub(super) fn parse_unary_expr(&mut self) -> Result<Box<Expr>> {
        let loc = self.loc();
        match self.peek_tag() {
            Tag::PlusPlus => {
                self.advance();
                let operand = self.parse_unary_expr()?;
                self.check_increment(&operand, &loc)?;
                let ty = operand.ty.clone();
                Ok(Expr::new(ExprKind::UnaryOp { op: UnaryOp::PreInc, operand }, ty, loc, false))
            }
            Tag::MinusMinus => {
                self.advance();
                let operand = self.parse_unary_expr()?;
                self.check_increment(&operand, &loc)?;
                let ty = operand.ty.clone();
                Ok(Expr::new(ExprKind::UnaryOp { op: UnaryOp::PreDec, operand }, ty, loc, false))
            }
            Tag::Amp => {
                self.advance();
                let operand = self.parse_cast_expr()?;
                if !operand.lvalue {
                    return Err(Fatal::expr_type(loc, "cannot take the address of a non-lvalue"));
                }
                let ty = QualType::unqualified(Type::pointer_to(operand.ty.clone()));
                Ok(Expr::new(ExprKind::UnaryOp { op: UnaryOp::Address, operand }, ty, loc, false))
            }
            Tag::Star => {
                self.advance();
                let operand = self.parse_cast_expr()?;
                if !operand.ty.ty.is_pointer() {
                    return Err(Fatal::expr_type(loc, "cannot dereference a non-pointer"));
                }
                let ty = operand.ty.ty.pointee();
                Ok(Expr::new(ExprKind::UnaryOp { op: UnaryOp::Deref, operand }, ty, loc, true))
            }
            Tag::Plus | Tag::Minus => {
                let op = if self.check(Tag::Plus) { UnaryOp::Plus } else { UnaryOp::Minus };
                self.advance();
                let operand = self.parse_cast_expr()?;
                if !operand.ty.ty.is_arithmetic() {
                    return Err(Fatal::expr_type(loc, "unary '+'/'-' requires an arithmetic operand"));
                }
                let ty = crate::ty::integer_promote(&operand.ty);
                Ok(Expr::new(ExprKind::UnaryOp { op, operand }, ty, loc, false))
            }
            Tag::Tilde => {
                self.advance();
                let operand = self.parse_cast_expr()?;
                if !operand.ty.ty.is_integer() {
                    return Err(Fatal::expr_type(loc, "'~' requires an integer operand"));
                }
                let ty = crate::ty::integer_promote(&operand.ty);
                Ok(Expr::new(ExprKind::UnaryOp { op: UnaryOp::BitNot, operand }, ty, loc, false))
            }
            Tag::Exclaim => {
                self.advance();
                let operand = self.parse_cast_expr()?;
                if !operand.ty.ty.is_scalar() {
                    return Err(Fatal::expr_type(loc, "'!' requires a scalar operand"));
                }
                let ty = QualType::unqualified(Type::arithmetic(ArithKind::Int));
                Ok(Expr::new(ExprKind::UnaryOp { op: UnaryOp::LogNot, operand }, ty, loc, false))
            }
            Tag::Sizeof => {
                self.advance();
                self.parse_sizeof(loc)
            }
            Tag::AlignofKw => {
                self.advance();
                self.parse_alignof(loc)
            }
            _ => self.parse_postfix_expr(),
        }
    }

    fn check_increment(&self, operand: &Expr, loc: &SourceLocation) -> Result<()> {
        if !operand.lvalue {
            return Err(Fatal::expr_type(loc.clone(), "operand of '++'/'--' must be an lvalue"));
        }
        if operand.ty.is_const() {
            return Err(Fatal::expr_type(loc.clone(), "cannot modify a const-qualified lvalue"));
        }
        Ok(())
    }

    fn parse_sizeof(&mut self, loc: SourceLocation) -> Result<Box<Expr>> {
        let ty = if self.check(Tag::LeftParen) && self.looks_like_type_name_after_paren() {
            self.advance();
            let ty = self.parse_type_name()?;
            self.expect(Tag::RightParen)?;
            ty
        } else {
            self.parse_unary_expr()?.ty
        };

        if !ty.ty.is_complete() && !ty.ty.is_void() && !ty.ty.is_function() {
            return Err(Fatal::expr_type(loc, "sizeof applied to an incomplete type"));
        }

        let width = ty.ty.width() as i128;
        Ok(Expr::new(
            ExprKind::Constant(crate::constant::ConstValue::int(width, ArithKind::ULong)),
            QualType::unqualified(Type::arithmetic(ArithKind::ULong)),
            loc,
            false,
        ))
    }

    fn parse_alignof(&mut self, loc: SourceLocation) -> Result<Box<Expr>> {
        self.expect(Tag::LeftParen)?;
        let ty = self.parse_type_name()?;
        self.expect(Tag::RightParen)?;
        let align = ty.ty.align() as i128;
        Ok(Expr::new(
            ExprKind::Constant(crate::constant::ConstValue::int(align, ArithKind::ULong)),
            QualType::unqualified(Type::arithmetic(ArithKind::ULong)),
            loc,
            false,
        ))
    }

    fn parse_postfix_expr(&mut self) -> Result<Box<Expr>> {
        let expr = self.parse_primary_expr()?;
        self.parse_postfix_expr_tail(expr)
    }

    fn parse_postfix_expr_tail(&mut self, mut expr: Box<Expr>) -> Result<Box<Expr>> {
        loop {
            let loc = self.loc();
            match self.peek_tag() {
                Tag::LeftBracket => {
                    self.advance();
                    expr = self.parse_index_expr(expr, loc)?;
                }
                Tag::LeftParen => {
                    self.advance();
                    expr = self.parse_func_call_expr(expr, loc)?;
                }
                Tag::Arrow => {
                    self.advance();
                    if !expr.ty.ty.is_pointer() {
                        return Err(Fatal::expr_type(loc.clone(), "'->' requires a pointer operand"));
                    }
                    let pointee = expr.ty.ty.pointee();
                    let deref = Expr::new(ExprKind::UnaryOp { op: UnaryOp::Deref, operand: expr }, pointee, loc.clone(), true);
                    expr = self.parse_member_ref_expr(deref, loc)?;
                }
                Tag::Dot => {
                    self.advance();
                    expr = self.parse_member_ref_expr(expr, loc)?;
                }
                Tag::PlusPlus => {
                    self.advance();
                    self.check_increment(&expr, &loc)?;
                    let ty = expr.ty.clone();
                    expr = Expr::new(ExprKind::UnaryOp { op: UnaryOp::PostInc, operand: expr }, ty, loc, false);
                }
                Tag::MinusMinus => {
                    self.advance();
                    self.check_increment(&expr, &loc)?;
                    let ty = expr.ty.clone();
                    expr = Expr::new(ExprKind::UnaryOp { op: UnaryOp::PostDec, operand: expr }, ty, loc, false);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Rewrites `a[i]` as `*(a+i)`, per `ParseIndexExpr`.
    fn parse_index_expr(&mut self, expr: Box<Expr>, loc: SourceLocation) -> Result<Box<Expr>> {
        let index = self.parse_expr()?;
        self.expect(Tag::RightBracket)?;

        let sum_ty = self.check_binary(BinaryOp::Add, &expr, &index, &loc)?;
        let sum = Expr::new(ExprKind::BinaryOp { op: BinaryOp::Add, lhs: expr, rhs: index }, sum_ty.clone(), loc.clone(), false);
        if !sum_ty.ty.is_pointer() {
            return Err(Fatal::expr_type(loc, "subscripted value is not an array or pointer"));
        }
        let pointee = sum_ty.ty.pointee();
        Ok(Expr::new(ExprKind::UnaryOp { op: UnaryOp::Deref, operand: sum }, pointee, loc, true))
    }

    fn parse_func_call_expr(&mut self, callee: Box<Expr>, loc: SourceLocation) -> Result<Box<Expr>> {
        let (return_type, param_types, is_var_args, callee) = self.resolve_callee(callee, &loc)?;

        if is_builtin_va_arg_sub(&callee) {
            let mut args = vec![*self.parse_assignment_expr()?];
            self.expect(Tag::Comma)?;
            let va_arg_type = self.parse_type_name()?;
            self.expect(Tag::RightParen)?;
            return Ok(Expr::new(
                ExprKind::FuncCall { callee, args: std::mem::take(&mut args), va_arg_type: Some(va_arg_type.clone()) },
                va_arg_type,
                loc,
                false,
            ));
        }

        let mut args = Vec::new();
        if !self.check(Tag::RightParen) {
            loop {
                args.push(*self.parse_assignment_expr()?);
                if self.eat(Tag::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(Tag::RightParen)?;

        if !is_var_args && args.len() != param_types.len() {
            return Err(Fatal::expr_type(loc.clone(), "wrong number of arguments in function call"));
        }

        Ok(Expr::new(ExprKind::FuncCall { callee, args, va_arg_type: None }, return_type, loc, false))
    }

    fn resolve_callee(&self, callee: Box<Expr>, loc: &SourceLocation) -> Result<(QualType, Vec<QualType>, bool, Box<Expr>)> {
        let fn_ty = if callee.ty.ty.is_function() {
            callee.ty.clone()
        } else if callee.ty.ty.is_pointer() && callee.ty.ty.pointee().ty.is_function() {
            callee.ty.ty.pointee()
        } else {
            return Err(Fatal::expr_type(loc.clone(), "called object is not a function or function pointer"));
        };
        let data = fn_ty.ty.function_data();
        let return_type = data.return_type.clone();
        let param_types: Vec<QualType> = data.params.iter().map(|p| p.qual_type()).collect();
        let is_var_args = data.is_var_args;
        Ok((return_type, param_types, is_var_args, callee))
    }

    /// Rewrites `p->m` handling aside, implements `.m` member access
    /// including the anonymous-member-flattened-namespace lookup
    /// `StructData::merge_anonymous` already performed at parse time.
    fn parse_member_ref_expr(&mut self, expr: Box<Expr>, loc: SourceLocation) -> Result<Box<Expr>> {
        let member_name = self.expect_identifier()?;
        if !expr.ty.ty.is_struct_or_union() {
            return Err(Fatal::expr_type(loc, "member reference requires a struct or union"));
        }
        let member = expr
            .ty
            .ty
            .struct_data()
            .member(&member_name)
            .ok_or_else(|| Fatal::expr_type(loc.clone(), format!("no member named '{member_name}'")))?;
        let ty = member.qual_type();
        Ok(Expr::new(ExprKind::Member { base: expr, member }, ty, loc, true))
    }

    fn parse_primary_expr(&mut self) -> Result<Box<Expr>> {
        let loc = self.loc();

        match self.peek_tag() {
            Tag::Identifier => {
                let name = self.advance().text().to_string();
                match self.scopes.current().find_ordinary(&name) {
                    Some(Ordinary::Object(object)) => {
                        let ty = object.qual_type();
                        let lvalue = !ty.ty.is_function();
                        Ok(Expr::new(ExprKind::Object(object), ty, loc, lvalue))
                    }
                    Some(Ordinary::Enumerator(enumerator)) => {
                        Ok(Expr::new(
                            ExprKind::Enumerator(enumerator),
                            QualType::unqualified(Type::arithmetic(ArithKind::Int)),
                            loc,
                            false,
                        ))
                    }
                    None => Err(Fatal::expr_type(loc, format!("use of undeclared identifier '{name}'"))),
                }
            }
            Tag::IntegerConstant => self.parse_integer_constant(),
            Tag::FloatingConstant => self.parse_float_constant(),
            Tag::CharacterConstant => self.parse_character_constant(),
            Tag::StringLiteral => self.parse_string_literal_expr(),
            Tag::LeftParen => {
                self.advance();
                if self.check(Tag::LeftBrace) {
                    // GNU statement expression: `({ ... })`.
                    let block = self.parse_compound_statement_body()?;
                    self.expect(Tag::RightParen)?;
                    let ty = stmt_expr_type(&block);
                    return Ok(Expr::new(ExprKind::StmtExpr { block }, ty, loc, false));
                }
                let inner = self.parse_expr()?;
                self.expect(Tag::RightParen)?;
                Ok(inner)
            }
            Tag::GenericKw => self.parse_generic_selection(),
            Tag::FuncMacro | Tag::FunctionMacro | Tag::PrettyFunctionMacro => {
                self.advance();
                self.parse_func_name_expr(loc)
            }
            other => Err(Fatal::UnexpectedToken { loc, expected: vec![Tag::Identifier], found: other }),
        }
    }

    fn parse_integer_constant(&mut self) -> Result<Box<Expr>> {
        let token = self.advance();
        let loc = token.loc.clone();
        let literal = scanner::classify_numeric(token.text());
        let NumericLiteral::Integer { base, digits, suffix } = literal else {
            return Err(Fatal::expr_type(loc, "expected an integer constant"));
        };
        let value = i128::from_str_radix(&digits, base)
            .map_err(|_| Fatal::expr_type(loc.clone(), "integer constant out of range"))?;

        let kind = if suffix.long_count >= 2 {
            if suffix.unsigned { ArithKind::ULongLong } else { ArithKind::LongLong }
        } else if suffix.long_count == 1 {
            if suffix.unsigned { ArithKind::ULong } else { ArithKind::Long }
        } else if suffix.unsigned {
            if value > ArithKind::UInt.max_integer_value() as i128 { ArithKind::ULong } else { ArithKind::UInt }
        } else if value > ArithKind::Int.max_integer_value() as i128 {
            ArithKind::Long
        } else {
            ArithKind::Int
        };

        Ok(Expr::new(
            ExprKind::Constant(crate::constant::ConstValue::int(value, kind)),
            QualType::unqualified(Type::arithmetic(kind)),
            loc,
            false,
        ))
    }

    fn parse_float_constant(&mut self) -> Result<Box<Expr>> {
        let token = self.advance();
        let loc = token.loc.clone();
        let literal = scanner::classify_numeric(token.text());
        let NumericLiteral::Floating { digits, suffix } = literal else {
            return Err(Fatal::expr_type(loc, "expected a floating constant"));
        };
        let value: f64 = digits.parse().map_err(|_| Fatal::expr_type(loc.clone(), "invalid floating constant"))?;
        let kind = match suffix {
            FloatSuffix::Float => ArithKind::Float,
            FloatSuffix::Double => ArithKind::Double,
            FloatSuffix::LongDouble => ArithKind::LongDouble,
        };
        Ok(Expr::new(
            ExprKind::Constant(crate::constant::ConstValue::float(value, kind)),
            QualType::unqualified(Type::arithmetic(kind)),
            loc,
            false,
        ))
    }

    fn parse_character_constant(&mut self) -> Result<Box<Expr>> {
        let token = self.advance();
        let loc = token.loc.clone();
        let mut warnings = Vec::new();
        let (value, encoding) = scanner::handle_character(token.text(), &loc, &mut |l, m| warnings.push((l.clone(), m)))?;
        for (l, m) in warnings {
            self.warnings.push(l, m);
        }
        let kind = match encoding {
            Encoding::None => ArithKind::Int,
            Encoding::Utf16 | Encoding::Wide => ArithKind::UShort,
            Encoding::Utf32 => ArithKind::UInt,
            Encoding::Utf8 => return Err(Fatal::expr_type(loc, "a u8 prefix is not allowed on a character constant")),
        };
        Ok(Expr::new(
            ExprKind::Constant(crate::constant::ConstValue::int(value as i128, kind)),
            QualType::unqualified(Type::arithmetic(kind)),
            loc,
            false,
        ))
    }

    /// `__func__`/`__FUNCTION__`/`__PRETTY_FUNCTION__`: each behaves as an
    /// implicitly declared `static const char[]` holding the enclosing
    /// function's name, valid only inside a function body.
    fn parse_func_name_expr(&mut self, loc: SourceLocation) -> Result<Box<Expr>> {
        let name = self
            .current_function_name()
            .ok_or_else(|| Fatal::expr_type(loc.clone(), "use of '__func__' outside a function"))?
            .to_string();
        let bytes = name.into_bytes();
        let elem = QualType::unqualified(Type::arithmetic(ArithKind::Char));
        let ty = QualType::unqualified(Type::array_of(elem, Some(bytes.len() as u64 + 1)));
        Ok(Expr::new(ExprKind::StringLiteral { bytes }, ty, loc, false))
    }

    fn parse_string_literal_expr(&mut self) -> Result<Box<Expr>> {
        let token = self.advance();
        let loc = token.loc.clone();
        let (bytes, _enc) = scanner::handle_string(token.text(), &loc, true)?;
        let elem = QualType::unqualified(Type::arithmetic(ArithKind::Char));
        let ty = QualType::unqualified(Type::array_of(elem, Some(bytes.len() as u64 + 1)));
        Ok(Expr::new(ExprKind::StringLiteral { bytes }, ty, loc, false))
    }

    /// `_Generic(expr, type: result, ..., default: result)`: evaluates
    /// the controlling expression's type and selects the matching arm.
    fn parse_generic_selection(&mut self) -> Result<Box<Expr>> {
        self.expect(Tag::LeftParen)?;
        let control = self.parse_assignment_expr()?;
        let mut default_result: Option<Box<Expr>> = None;
        let mut selected: Option<Box<Expr>> = None;

        while self.eat(Tag::Comma).is_some() {
            if self.eat(Tag::Default).is_some() {
                self.expect(Tag::Colon)?;
                default_result = Some(self.parse_assignment_expr()?);
                continue;
            }
            let candidate = self.parse_type_name()?;
            self.expect(Tag::Colon)?;
            let result = self.parse_assignment_expr()?;
            if candidate.equal(&control.ty) {
                selected = Some(result);
            }
        }
        self.expect(Tag::RightParen)?;

        selected
            .or(default_result)
            .ok_or_else(|| Fatal::expr_type(control.loc.clone(), "_Generic: no matching association"))
    }

    pub(super) fn parse_constant_expr(&mut self) -> Result<Box<Expr>> {
        self.parse_condition_expr()
    }
}

fn is_builtin_va_arg_sub(callee: &Expr) -> bool {
    matches!(&callee.kind, ExprKind::Object(object) if object.name == "__builtin_va_arg_sub")
}

/// A statement expression's type is that of its last expression
/// statement, or `void` if it has none.
fn stmt_expr_type(block: &crate::ast::Stmt) -> QualType {
    if let crate::ast::StmtKind::Compound { items } = &block.kind {
        for item in items.iter().rev() {
            if let crate::ast::StmtKind::Expr(Some(expr)) = &item.kind {
                return expr.ty.clone();
            }
            if !matches!(item.kind, crate::ast::StmtKind::Expr(None)) {
                break;
            }
        }
    }
    QualType::unqualified(Type::void())
}
