//! Statement parsing: one method per statement kind plus the compound-
//! statement item loop that interleaves mixed declarations with
//! ordinary statements. Grounded on `parse_stmt.cpp`.

use super::Parser;
use crate::ast::{Stmt, StmtKind};
use crate::diagnostics::{Fatal, Result};
use crate::scope::ScopeKind;
use crate::token::Tag;

impl Parser {
    /// Grounded on `ParseStmt`'s dispatch switch. The `identifier` case
    /// needs one token of lookahead to tell a label (`ident:`) from an
    /// ordinary expression statement starting with an identifier.
    pub(super) fn parse_stmt(&mut self) -> Result<Box<Stmt>> {
        self.skip_gnu_attributes()?;

        match self.peek_tag() {
            Tag::Identifier if self.tokens[self.pos + 1].tag == Tag::Colon => self.parse_label_stmt(),
            Tag::Case => self.parse_case_stmt(),
            Tag::Default => self.parse_default_stmt(),
            Tag::LeftBrace => self.parse_compound_statement(),
            Tag::If => self.parse_if_stmt(),
            Tag::Switch => self.parse_switch_stmt(),
            Tag::While => self.parse_while_stmt(),
            Tag::Do => self.parse_do_while_stmt(),
            Tag::For => self.parse_for_stmt(),
            Tag::Goto => self.parse_goto_stmt(),
            Tag::Continue => self.parse_continue_stmt(),
            Tag::Break => self.parse_break_stmt(),
            Tag::Return => self.parse_return_stmt(),
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_label_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.loc();
        let name = self.expect_identifier()?;
        self.expect(Tag::Colon)?;
        self.skip_gnu_attributes()?;

        if let Some(ctx) = &mut self.function {
            if !ctx.defined_labels.insert(name.clone()) {
                return Err(Fatal::declaration(loc, format!("redefinition of label '{name}'")));
            }
        }

        let stmt = self.parse_stmt()?;
        Ok(Stmt::new(StmtKind::Label { name, stmt }, loc))
    }

    fn parse_case_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::Case)?.loc;
        let value = self.parse_int64_constant()?;

        let range_hi = if self.eat(Tag::Ellipsis).is_some() {
            Some(self.parse_int64_constant()?)
        } else {
            None
        };
        self.expect(Tag::Colon)?;
        let stmt = self.parse_stmt()?;
        Ok(Stmt::new(StmtKind::Case { value, range_hi, stmt }, loc))
    }

    fn parse_default_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::Default)?.loc;
        self.expect(Tag::Colon)?;
        let stmt = self.parse_stmt()?;
        Ok(Stmt::new(StmtKind::Default { stmt }, loc))
    }

    /// Consumes `{ ... }`, entering and leaving a fresh block scope.
    /// Shared by function bodies (`parse_compound_statement`, called
    /// with the scope already holding the function's parameters as its
    /// parent) and GNU statement expressions (`parse_compound_statement_body`,
    /// called from the middle of an expression with no such ambient
    /// function scope). Grounded on `ParseCompoundStmt`.
    fn compound_statement_inner(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::LeftBrace)?.loc;
        self.enter_scope(ScopeKind::Block);

        let mut items = Vec::new();
        while !self.check(Tag::RightBrace) {
            if self.is_decl_start() {
                let item_loc = self.loc();
                let decl = self.parse_external_declaration()?;
                items.push(*Stmt::new(StmtKind::Decl(Box::new(decl)), item_loc));
            } else {
                items.push(*self.parse_stmt()?);
            }
        }

        self.exit_scope();
        self.expect(Tag::RightBrace)?;
        Ok(Stmt::new(StmtKind::Compound { items }, loc))
    }

    pub(super) fn parse_compound_statement(&mut self) -> Result<Box<Stmt>> {
        self.compound_statement_inner()
    }

    pub(super) fn parse_compound_statement_body(&mut self) -> Result<Box<Stmt>> {
        self.compound_statement_inner()
    }

    fn parse_expr_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.loc();
        if self.eat(Tag::Semicolon).is_some() {
            return Ok(Stmt::new(StmtKind::Expr(None), loc));
        }
        let expr = self.parse_expr()?;
        self.expect(Tag::Semicolon)?;
        Ok(Stmt::new(StmtKind::Expr(Some(expr)), loc))
    }

    fn parse_if_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::If)?.loc;
        self.expect(Tag::LeftParen)?;
        let cond = self.parse_expr()?;
        self.expect(Tag::RightParen)?;

        let then_branch = self.parse_stmt()?;
        let else_branch = if self.eat(Tag::Else).is_some() { Some(self.parse_stmt()?) } else { None };
        Ok(Stmt::new(StmtKind::If { cond, then_branch, else_branch }, loc))
    }

    fn parse_switch_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::Switch)?.loc;
        self.expect(Tag::LeftParen)?;
        let cond = self.parse_expr()?;
        self.expect(Tag::RightParen)?;
        let body = self.parse_stmt()?;
        Ok(Stmt::new(StmtKind::Switch { cond, body }, loc))
    }

    fn parse_while_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::While)?.loc;
        self.expect(Tag::LeftParen)?;
        let cond = self.parse_expr()?;
        self.expect(Tag::RightParen)?;
        let body = self.parse_stmt()?;
        Ok(Stmt::new(StmtKind::While { cond, body }, loc))
    }

    fn parse_do_while_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::Do)?.loc;
        let body = self.parse_stmt()?;
        self.expect(Tag::While)?;
        self.expect(Tag::LeftParen)?;
        let cond = self.parse_expr()?;
        self.expect(Tag::RightParen)?;
        self.expect(Tag::Semicolon)?;
        Ok(Stmt::new(StmtKind::DoWhile { body, cond }, loc))
    }

    /// Grounded on `ParseForStmt`: the init-clause's own block scope
    /// outlives the loop body so a `for (int i = 0; ...)` binding is
    /// visible there, and must be entered/exited around the whole
    /// statement rather than just the init-clause itself.
    fn parse_for_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::For)?.loc;
        self.expect(Tag::LeftParen)?;
        self.enter_scope(ScopeKind::Block);

        let init = if self.is_decl_start() {
            let item_loc = self.loc();
            let decl = self.parse_external_declaration()?;
            Some(Stmt::new(StmtKind::Decl(Box::new(decl)), item_loc))
        } else if self.eat(Tag::Semicolon).is_some() {
            None
        } else {
            let expr_loc = self.loc();
            let expr = self.parse_expr()?;
            self.expect(Tag::Semicolon)?;
            Some(Stmt::new(StmtKind::Expr(Some(expr)), expr_loc))
        };

        let cond = if self.check(Tag::Semicolon) { None } else { Some(self.parse_expr()?) };
        self.expect(Tag::Semicolon)?;

        let step = if self.check(Tag::RightParen) { None } else { Some(self.parse_expr()?) };
        self.expect(Tag::RightParen)?;

        let body = self.parse_stmt()?;
        self.exit_scope();

        Ok(Stmt::new(StmtKind::For { init, cond, step, body }, loc))
    }

    fn parse_goto_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::Goto)?.loc;
        let label = self.expect_identifier()?;
        self.expect(Tag::Semicolon)?;

        if let Some(ctx) = &mut self.function {
            ctx.pending_gotos.push((label.clone(), loc.clone()));
        }

        Ok(Stmt::new(StmtKind::Goto { label }, loc))
    }

    fn parse_continue_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::Continue)?.loc;
        self.expect(Tag::Semicolon)?;
        Ok(Stmt::new(StmtKind::Continue, loc))
    }

    fn parse_break_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::Break)?.loc;
        self.expect(Tag::Semicolon)?;
        Ok(Stmt::new(StmtKind::Break, loc))
    }

    fn parse_return_stmt(&mut self) -> Result<Box<Stmt>> {
        let loc = self.expect(Tag::Return)?.loc;
        if self.eat(Tag::Semicolon).is_some() {
            return Ok(Stmt::new(StmtKind::Return(None), loc));
        }
        let expr = self.parse_expr()?;
        self.expect(Tag::Semicolon)?;
        Ok(Stmt::new(StmtKind::Return(Some(expr)), loc))
    }

    fn parse_int64_constant(&mut self) -> Result<i64> {
        let expr = self.parse_constant_expr()?;
        match crate::constfold::fold(&expr)? {
            crate::constfold::Folded::Value(v) => Ok(v.as_i128() as i64),
            _ => Err(Fatal::constant_fold(expr.loc.clone(), "case label is not an integer constant")),
        }
    }
}
