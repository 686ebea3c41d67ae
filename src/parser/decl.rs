//! Declaration, declarator, struct/union/enum, and declaration-merge
//! handling. Grounded on `parse_decl.cpp`.

use super::Parser;
use crate::ast::{BitField, DeclarationNode, ExternalDecl, FuncDefNode, ObjectData, ObjectRef};
use crate::diagnostics::{Fatal, Result};
use crate::init::{elaborate, InitNode, Target};
use crate::loc::SourceLocation;
use crate::scope::{Ordinary, ScopeKind};
use crate::token::Tag;
use crate::ty::{
    make_align, ArithKind, Linkage, Qualifiers, QualType, StorageClass, Type, TypeKind, TypeSpec,
};

/// Declaration specifiers accumulated by `parse_declaration_specifiers`,
/// per spec.md §4.4's list: arithmetic-type mask, storage class,
/// function-specifier mask, alignment, declared type.
#[derive(Debug, Default)]
pub struct DeclSpecifiers {
    pub type_spec: TypeSpec,
    pub storage: Option<StorageClass>,
    pub is_inline: bool,
    pub is_noreturn: bool,
    pub align: Option<i32>,
    pub declared_type: Option<QualType>,
    pub is_typedef_name: bool,
}

impl Parser {
    pub(super) fn parse_external_declaration(&mut self) -> Result<ExternalDecl> {
        let loc = self.loc();

        if self.eat(Tag::StaticAssertKw).is_some() {
            self.parse_static_assert_tail()?;
            return Ok(ExternalDecl::StaticAssert { loc });
        }

        let specs = self.parse_declaration_specifiers()?;
        let base_type = self.base_type_from_specs(&specs, &loc)?;

        if self.eat(Tag::Semicolon).is_some() {
            // A bare `struct S;` or similar: the specifier parse alone
            // already registered the tag.
            return Ok(ExternalDecl::Declaration(DeclarationNode {
                object: ObjectData::new("", QualType::unqualified(Type::void()), loc.clone()),
                loc,
            }));
        }

        let (name, declarator_type) = self.parse_declarator(base_type.clone())?;

        if declarator_type.ty.is_function() && self.check(Tag::LeftBrace) {
            return self.parse_function_definition(name, declarator_type, &specs, loc);
        }

        let object = self.make_declaration(name, declarator_type, &specs, loc.clone())?;

        if self.eat(Tag::Equal).is_some() {
            let init = self.parse_initializer()?;
            let target =
                if matches!(object.storage.get(), StorageClass::None) && !object.anonymous && self.scopes.current().is_file_scope() {
                    Target::Static
                } else if matches!(object.storage.get(), StorageClass::Static | StorageClass::Extern)
                    || self.scopes.current().is_file_scope()
                {
                    Target::Static
                } else {
                    Target::Automatic
                };
            let plan = elaborate(&object.qual_type(), &init, target, &loc)?;
            *object.init.borrow_mut() = Some(plan);
        } else if self.scopes.current().is_file_scope()
            && matches!(object.storage.get(), StorageClass::None | StorageClass::Static)
        {
            // Tentative definition: no initializer yet. Left as `None`
            // here; an embedder treats a declared-but-uninitialized
            // file-scope object as implicitly zero-initialized.
        }

        self.parse_init_declarator_tail(&base_type, &specs, loc)?;
        self.expect(Tag::Semicolon)?;

        Ok(ExternalDecl::Declaration(DeclarationNode { object, loc: self.loc() }))
    }

    /// Handles `, declarator (= initializer)?` repeats on the same
    /// declaration specifiers, per `ParseInitDeclaratorList`. Declared
    /// objects beyond the first are registered but not threaded back to
    /// the caller: external callers only need the translation unit's
    /// ordered declaration list, which the scope already owns.
    fn parse_init_declarator_tail(
        &mut self,
        base_type: &QualType,
        specs: &DeclSpecifiers,
        loc: SourceLocation,
    ) -> Result<()> {
        while self.eat(Tag::Comma).is_some() {
            let (name, ty) = self.parse_declarator(base_type.clone())?;
            let object = self.make_declaration(name, ty, specs, loc.clone())?;
            if self.eat(Tag::Equal).is_some() {
                let init = self.parse_initializer()?;
                let target = if self.scopes.current().is_file_scope() { Target::Static } else { Target::Automatic };
                let plan = elaborate(&object.qual_type(), &init, target, &loc)?;
                *object.init.borrow_mut() = Some(plan);
            }
        }
        Ok(())
    }

    fn parse_function_definition(
        &mut self,
        name: String,
        ty: QualType,
        specs: &DeclSpecifiers,
        loc: SourceLocation,
    ) -> Result<ExternalDecl> {
        let object = self.make_declaration(name, ty.clone(), specs, loc.clone())?;
        let params = ty.ty.function_data().params.clone();

        self.function =
            Some(super::FunctionContext { name: object.name.clone(), ..Default::default() });
        self.enter_scope(ScopeKind::Function);
        for param in &params {
            self.scopes.current().insert_ordinary(param.name.clone(), Ordinary::Object(param.clone()));
        }

        let body = self.parse_compound_statement()?;
        self.exit_scope();

        let function_ctx = self.function.take().unwrap();
        if let Some((label, label_loc)) = function_ctx
            .pending_gotos
            .iter()
            .find(|(label, _)| !function_ctx.defined_labels.contains(label))
        {
            return Err(Fatal::declaration(label_loc.clone(), format!("use of undeclared label '{label}'")));
        }

        Ok(ExternalDecl::FuncDef(FuncDefNode { object, params, body, loc }))
    }

    fn parse_static_assert_tail(&mut self) -> Result<()> {
        self.expect(Tag::LeftParen)?;
        let expr = self.parse_constant_expr()?;
        self.expect(Tag::Comma)?;
        self.expect(Tag::StringLiteral)?;
        self.expect(Tag::RightParen)?;
        self.expect(Tag::Semicolon)?;
        match crate::constfold::fold(&expr) {
            Ok(crate::constfold::Folded::Value(v)) if v.is_zero() => {
                Err(Fatal::declaration(expr.loc.clone(), "static assertion failed"))
            }
            _ => Ok(()),
        }
    }

    /// Accumulates decl-specifiers token by token; stops at the first
    /// token that cannot begin or continue a declaration-specifier run.
    /// Grounded on `ParseDeclSpec`.
    pub(super) fn parse_declaration_specifiers(&mut self) -> Result<DeclSpecifiers> {
        let mut specs = DeclSpecifiers::default();
        loop {
            self.skip_gnu_attributes()?;
            match self.peek_tag() {
                Tag::Void => {
                    specs.type_spec |= TypeSpec::VOID;
                    self.advance();
                }
                Tag::BoolKw => {
                    specs.type_spec |= TypeSpec::BOOL;
                    self.advance();
                }
                Tag::Char => {
                    specs.type_spec |= TypeSpec::CHAR;
                    self.advance();
                }
                Tag::Short => {
                    specs.type_spec |= TypeSpec::SHORT;
                    self.advance();
                }
                Tag::Int => {
                    specs.type_spec |= TypeSpec::INT;
                    self.advance();
                }
                Tag::Long => {
                    if specs.type_spec.contains(TypeSpec::LONG) {
                        specs.type_spec.remove(TypeSpec::LONG);
                        specs.type_spec |= TypeSpec::LONG_LONG;
                    } else {
                        specs.type_spec |= TypeSpec::LONG;
                    }
                    self.advance();
                }
                Tag::Float => {
                    specs.type_spec |= TypeSpec::FLOAT;
                    self.advance();
                }
                Tag::Double => {
                    specs.type_spec |= TypeSpec::DOUBLE;
                    self.advance();
                }
                Tag::Signed => {
                    specs.type_spec |= TypeSpec::SIGNED;
                    self.advance();
                }
                Tag::Unsigned => {
                    specs.type_spec |= TypeSpec::UNSIGNED;
                    self.advance();
                }
                Tag::Struct | Tag::Union => {
                    let is_struct = self.check(Tag::Struct);
                    self.advance();
                    let ty = self.parse_struct_or_union_specifier(is_struct)?;
                    specs.declared_type = Some(ty);
                }
                Tag::Enum => {
                    self.advance();
                    let ty = self.parse_enum_specifier()?;
                    specs.declared_type = Some(ty);
                }
                Tag::Const => {
                    self.advance();
                }
                Tag::Volatile | Tag::Restrict | Tag::AtomicKw => {
                    self.advance();
                }
                Tag::Typedef => {
                    specs.storage = Some(StorageClass::Typedef);
                    self.advance();
                }
                Tag::Extern => {
                    specs.storage = Some(StorageClass::Extern);
                    self.advance();
                }
                Tag::Static => {
                    specs.storage = Some(StorageClass::Static);
                    self.advance();
                }
                Tag::Auto => {
                    specs.storage = Some(StorageClass::Auto);
                    self.advance();
                }
                Tag::Register => {
                    specs.storage = Some(StorageClass::Register);
                    self.advance();
                }
                Tag::ThreadLocalKw => {
                    specs.storage = Some(StorageClass::ThreadLocal);
                    self.advance();
                }
                Tag::Inline => {
                    specs.is_inline = true;
                    self.advance();
                }
                Tag::NoreturnKw => {
                    specs.is_noreturn = true;
                    self.advance();
                }
                Tag::AlignasKw => {
                    self.advance();
                    self.expect(Tag::LeftParen)?;
                    let value = self.parse_alignas_operand()?;
                    self.expect(Tag::RightParen)?;
                    specs.align = Some(specs.align.unwrap_or(1).max(value));
                }
                Tag::Identifier if specs.declared_type.is_none() && specs.type_spec.is_empty() => {
                    let name = self.peek().text().to_string();
                    match self.scopes.current().find_ordinary(&name) {
                        Some(Ordinary::Object(object)) if matches!(object.storage.get(), StorageClass::Typedef) => {
                            specs.declared_type = Some(object.qual_type());
                            specs.is_typedef_name = true;
                            self.advance();
                        }
                        _ => break,
                    }
                }
                _ => break,
            }
        }
        Ok(specs)
    }

    fn parse_alignas_operand(&mut self) -> Result<i32> {
        let save = self.pos;
        if let Ok(ty) = self.parse_type_name() {
            return Ok(ty.ty.align());
        }
        self.pos = save;
        let expr = self.parse_constant_expr()?;
        match crate::constfold::fold(&expr)? {
            crate::constfold::Folded::Value(v) => Ok(v.as_i128() as i32),
            _ => Err(Fatal::declaration(expr.loc.clone(), "_Alignas operand is not a constant")),
        }
    }

    /// True when the upcoming tokens can only begin a declaration, never
    /// an expression-statement. Grounded on `IsDecl`; used by
    /// `parse_compound_statement` to decide whether a block item is a
    /// mixed declaration or an ordinary statement.
    pub(super) fn is_decl_start(&self) -> bool {
        match self.peek_tag() {
            Tag::Void | Tag::BoolKw | Tag::Char | Tag::Short | Tag::Int | Tag::Long | Tag::Float
            | Tag::Double | Tag::Signed | Tag::Unsigned | Tag::Struct | Tag::Union | Tag::Enum
            | Tag::Const | Tag::Volatile | Tag::Restrict | Tag::AtomicKw | Tag::Typedef
            | Tag::Extern | Tag::Static | Tag::Auto | Tag::Register | Tag::ThreadLocalKw
            | Tag::Inline | Tag::NoreturnKw | Tag::AlignasKw | Tag::StaticAssertKw => true,
            Tag::Identifier => {
                let name = self.peek().text();
                matches!(
                    self.scopes.current().find_ordinary(name),
                    Some(Ordinary::Object(o)) if matches!(o.storage.get(), StorageClass::Typedef)
                )
            }
            _ => false,
        }
    }

    /// Parses a standalone type name (`sizeof`/`_Alignof`/cast operand):
    /// declaration specifiers with no declarator name, just the abstract
    /// pointer/array/function wrapping. Grounded on `ParseTypeName`.
    pub(super) fn parse_type_name(&mut self) -> Result<QualType> {
        let specs = self.parse_declaration_specifiers()?;
        let base = self.base_type_from_specs(&specs, &self.loc())?;
        self.parse_abstract_declarator(base)
    }

    /// Resolves accumulated specifiers into a `QualType`: either the
    /// explicitly declared struct/union/enum/typedef type, or the
    /// normalized arithmetic mask.
    pub(super) fn base_type_from_specs(&self, specs: &DeclSpecifiers, loc: &SourceLocation) -> Result<QualType> {
        if let Some(ty) = &specs.declared_type {
            return Ok(ty.clone());
        }
        if specs.type_spec.contains(TypeSpec::VOID) {
            return Ok(QualType::unqualified(Type::void()));
        }
        if specs.type_spec.is_empty() {
            return Err(Fatal::declaration(loc.clone(), "a type specifier is required"));
        }
        let kind = ArithKind::from_spec(specs.type_spec);
        Ok(QualType::unqualified(Type::arithmetic(kind)))
    }

    // --- declarators --------------------------------------------------

    /// Parses a declarator into `(name, type)`, threading `base_type`
    /// through pointer/array/function layers in the reverse of their
    /// textual order. Grounded on `ParseDeclarator`/`ParseDirectDeclarator`.
    pub(super) fn parse_declarator(&mut self, base_type: QualType) -> Result<(String, QualType)> {
        let pointer_ty = self.parse_pointer_layers(base_type)?;
        self.parse_direct_declarator(pointer_ty)
    }

    fn parse_pointer_layers(&mut self, mut ty: QualType) -> Result<QualType> {
        while self.eat(Tag::Star).is_some() {
            let mut qual = Qualifiers::empty();
            loop {
                match self.peek_tag() {
                    Tag::Const => {
                        qual |= Qualifiers::CONST;
                        self.advance();
                    }
                    Tag::Volatile => {
                        qual |= Qualifiers::VOLATILE;
                        self.advance();
                    }
                    Tag::Restrict => {
                        qual |= Qualifiers::RESTRICT;
                        self.advance();
                    }
                    _ => break,
                }
            }
            ty = QualType::new(Type::pointer_to(ty), qual);
        }
        Ok(ty)
    }

    fn parse_direct_declarator(&mut self, base_type: QualType) -> Result<(String, QualType)> {
        if self.eat(Tag::LeftParen).is_some() {
            // A parenthesized declarator requires rebuilding the inner
            // name/type pair against the tail that follows the `)`.
            let inner_placeholder = QualType::unqualified(Type::void());
            let (name, _unused) = self.parse_declarator(inner_placeholder)?;
            self.expect(Tag::RightParen)?;
            let outer = self.parse_direct_declarator_tail(base_type)?;
            return Ok((name, outer));
        }

        let name = if self.check(Tag::Identifier) { self.advance().text().to_string() } else { String::new() };
        let ty = self.parse_direct_declarator_tail(base_type)?;
        Ok((name, ty))
    }

    /// Parses the `[n]`/`(params)` suffix chain, building from the
    /// innermost (closest to the name) outward so the first suffix seen
    /// wraps the base type first. Grounded on `ParseDirectDeclaratorTail`.
    fn parse_direct_declarator_tail(&mut self, base_type: QualType) -> Result<QualType> {
        if self.eat(Tag::LeftBracket).is_some() {
            let count = if self.check(Tag::RightBracket) {
                None
            } else {
                let expr = self.parse_constant_expr()?;
                match crate::constfold::fold(&expr)? {
                    crate::constfold::Folded::Value(v) => Some(v.as_i128() as u64),
                    _ => return Err(Fatal::declaration(expr.loc.clone(), "array bound is not a constant")),
                }
            };
            self.expect(Tag::RightBracket)?;
            let element = self.parse_direct_declarator_tail(base_type)?;
            return Ok(QualType::unqualified(Type::array_of(element, count)));
        }

        if self.eat(Tag::LeftParen).is_some() {
            let (params, var_args) = self.parse_param_type_list()?;
            self.expect(Tag::RightParen)?;
            let return_type = self.parse_direct_declarator_tail(base_type)?;
            return Ok(QualType::unqualified(Type::function(return_type, params, var_args)));
        }

        Ok(base_type)
    }

    fn parse_param_type_list(&mut self) -> Result<(Vec<ObjectRef>, bool)> {
        self.enter_scope(ScopeKind::FunctionPrototype);
        let mut params = Vec::new();
        let mut var_args = false;

        if !self.check(Tag::RightParen) {
            loop {
                if self.eat(Tag::Ellipsis).is_some() {
                    var_args = true;
                    break;
                }
                let specs = self.parse_declaration_specifiers()?;
                let base = self.base_type_from_specs(&specs, &self.loc())?;
                let (name, ty) = self.parse_declarator(base)?;
                let ty = ty.decay();
                let param = ObjectData::new(name.clone(), ty, self.loc());
                if !name.is_empty() {
                    self.scopes.current().insert_ordinary(name, Ordinary::Object(param.clone()));
                }
                params.push(param);
                if self.eat(Tag::Comma).is_none() {
                    break;
                }
            }
        }
        self.exit_scope();
        Ok((params, var_args))
    }

    fn parse_abstract_declarator(&mut self, base_type: QualType) -> Result<QualType> {
        let ty = self.parse_pointer_layers(base_type)?;
        self.parse_direct_declarator_tail(ty)
    }

    // --- struct/union/enum ---------------------------------------------

    /// Grounded on `ParseStructUnionSpec`/`ParseStructDeclList`.
    fn parse_struct_or_union_specifier(&mut self, is_struct: bool) -> Result<QualType> {
        self.skip_gnu_attributes()?;
        let name = if self.check(Tag::Identifier) { Some(self.advance().text().to_string()) } else { None };

        if !self.check(Tag::LeftBrace) {
            // A reference to a (possibly not-yet-complete) tag.
            if let Some(name) = &name {
                if let Some(crate::scope::Tag::Struct(existing)) = self.scopes.current().find_tag(name) {
                    return Ok(QualType::unqualified(crate::ty::Type::from_struct_data(existing)));
                }
            }
            let ty = Type::new_struct(is_struct, name.clone());
            if let Some(name) = name {
                self.scopes.current().insert_tag(name, crate::scope::Tag::Struct(ty.struct_data().clone()));
            }
            return Ok(QualType::unqualified(ty));
        }

        // A body: either completing a previously forward-declared tag,
        // or a brand-new anonymous/named struct.
        let ty = match &name {
            Some(name) => match self.scopes.current().find_tag_in_current(name) {
                Some(crate::scope::Tag::Struct(existing)) => Type::from_struct_data(existing),
                None => {
                    let fresh = Type::new_struct(is_struct, Some(name.clone()));
                    self.scopes.current().insert_tag(name.clone(), crate::scope::Tag::Struct(fresh.struct_data().clone()));
                    fresh
                }
            },
            None => Type::new_struct(is_struct, None),
        };

        self.advance();
        self.enter_scope(ScopeKind::Block);
        self.parse_struct_decl_list(&ty)?;
        self.exit_scope();
        self.expect(Tag::RightBrace)?;

        ty.struct_data().finish();
        Ok(QualType::unqualified(ty))
    }

    fn parse_struct_decl_list(&mut self, ty: &std::rc::Rc<Type>) -> Result<()> {
        let struct_data = ty.struct_data().clone();

        while !self.check(Tag::RightBrace) {
            if self.eat(Tag::StaticAssertKw).is_some() {
                self.parse_static_assert_tail()?;
                continue;
            }

            let specs = self.parse_declaration_specifiers()?;
            let base = self.base_type_from_specs(&specs, &self.loc())?;

            loop {
                if self.check(Tag::Colon) {
                    // An unnamed bit-field, or width-only.
                    self.advance();
                    self.parse_bit_field(&struct_data, String::new(), base.clone())?;
                } else if self.check(Tag::Semicolon) {
                    if base.ty.is_struct_or_union() && !base.ty.struct_data().has_name() {
                        // Anonymous struct/union member: merge its
                        // members directly into the enclosing namespace.
                        let anon = ObjectData::new("", base.clone(), self.loc());
                        struct_data.merge_anonymous(anon);
                    }
                    break;
                } else {
                    let (name, member_ty) = self.parse_declarator(base.clone())?;
                    if self.eat(Tag::Colon).is_some() {
                        self.parse_bit_field(&struct_data, name, member_ty)?;
                    } else {
                        self.check_flexible_array_member(&member_ty, &struct_data)?;
                        let object = ObjectData::new(name, member_ty, self.loc());
                        struct_data.add_member(object);
                    }
                }

                if self.eat(Tag::Comma).is_none() {
                    break;
                }
            }

            self.expect(Tag::Semicolon)?;
        }

        Ok(())
    }

    fn check_flexible_array_member(&self, ty: &QualType, struct_data: &crate::ty::StructData) -> Result<()> {
        let is_incomplete_array =
            matches!(&ty.ty.kind, TypeKind::Array(a) if a.num_elements.borrow().is_none());
        if is_incomplete_array && !struct_data.is_struct {
            return Err(Fatal::declaration(self.loc(), "a flexible array member is not allowed in a union"));
        }
        if is_incomplete_array && struct_data.members.borrow().is_empty() {
            return Err(Fatal::declaration(self.loc(), "a flexible array member cannot be a struct's only member"));
        }
        Ok(())
    }

    /// Grounded on `ParseBitField`: accepts an integer/bool-typed field
    /// of `width` bits, or a zero-width unnamed field that terminates
    /// the current access-unit run.
    fn parse_bit_field(&mut self, struct_data: &crate::ty::StructData, name: String, ty: QualType) -> Result<()> {
        if !ty.ty.is_integer() && !ty.ty.is_bool() {
            return Err(Fatal::declaration(self.loc(), "a bit-field must have integer or _Bool type"));
        }
        let expr = self.parse_constant_expr()?;
        let width = match crate::constfold::fold(&expr)? {
            crate::constfold::Folded::Value(v) => v.as_i128() as u16,
            _ => return Err(Fatal::declaration(expr.loc.clone(), "bit-field width is not a constant")),
        };

        let width_bits = (ty.ty.width() * 8) as u16;
        if width > width_bits {
            return Err(Fatal::declaration(expr.loc.clone(), "bit-field width exceeds its type's width"));
        }
        if width == 0 && !name.is_empty() {
            return Err(Fatal::declaration(expr.loc.clone(), "a named bit-field cannot have width 0"));
        }

        let unit_width = self.target.bit_field_unit_width as i64;
        let mut offset = struct_data.offset.borrow_mut();
        let bit_cursor = *offset * 8;
        let unit_index = bit_cursor / unit_width;
        let bit_in_unit = (bit_cursor % unit_width) as u16;

        let (begin, starts_new_unit) = if width == 0 || bit_in_unit as i64 + width as i64 > unit_width {
            (0u16, true)
        } else {
            (bit_in_unit, false)
        };

        let byte_offset = if starts_new_unit {
            make_align(*offset, self.target.bit_field_unit_width as i64 / 8)
        } else {
            unit_index * (unit_width / 8)
        };
        let bytes_used = make_align(begin as i64 + width as i64, 8) / 8;
        *offset = (*offset).max(byte_offset + bytes_used);
        drop(offset);

        if width == 0 {
            return Ok(());
        }

        let object = ObjectData::new(name, ty, self.loc());
        object.offset.set(byte_offset);
        object.bit_field.set(Some(BitField { begin, width }));
        struct_data.members.borrow_mut().push(crate::ty::Member { object: object.clone() });
        let mut align = struct_data.align.borrow_mut();
        *align = (*align).max(object.qual_type().ty.align() as i64);
        let mut width_cell = struct_data.width.borrow_mut();
        *width_cell = make_align(byte_offset + (unit_width / 8), *align);

        Ok(())
    }

    fn parse_enum_specifier(&mut self) -> Result<QualType> {
        self.skip_gnu_attributes()?;
        let _name = if self.check(Tag::Identifier) { Some(self.advance().text().to_string()) } else { None };

        if self.eat(Tag::LeftBrace).is_some() {
            let mut next_value: i64 = 0;
            while !self.check(Tag::RightBrace) {
                let loc = self.loc();
                let name = self.expect_identifier()?;
                if self.eat(Tag::Equal).is_some() {
                    let expr = self.parse_constant_expr()?;
                    next_value = match crate::constfold::fold(&expr)? {
                        crate::constfold::Folded::Value(v) => v.as_i128() as i64,
                        _ => return Err(Fatal::declaration(expr.loc.clone(), "enumerator value is not a constant")),
                    };
                }
                let enumerator = std::rc::Rc::new(crate::ast::EnumeratorData { name: name.clone(), value: next_value, loc });
                self.scopes.current().insert_ordinary(name, Ordinary::Enumerator(enumerator));
                next_value += 1;
                if self.eat(Tag::Comma).is_none() {
                    break;
                }
            }
            self.expect(Tag::RightBrace)?;
        }

        Ok(QualType::unqualified(Type::arithmetic(ArithKind::Int)))
    }

    pub(super) fn parse_initializer(&mut self) -> Result<InitNode> {
        if self.eat(Tag::LeftBrace).is_some() {
            let mut items = Vec::new();
            while !self.check(Tag::RightBrace) {
                let designator = self.parse_designator_list()?;
                let value = self.parse_initializer()?;
                items.push(crate::init::Designated { designator, value });
                if self.eat(Tag::Comma).is_none() {
                    break;
                }
            }
            self.expect(Tag::RightBrace)?;
            Ok(InitNode::List(items))
        } else {
            Ok(InitNode::Expr(self.parse_assignment_expr()?))
        }
    }

    fn parse_designator_list(&mut self) -> Result<Vec<crate::init::Designator>> {
        let mut designators = Vec::new();
        loop {
            if self.eat(Tag::Dot).is_some() {
                designators.push(crate::init::Designator::Member(self.expect_identifier()?));
            } else if self.eat(Tag::LeftBracket).is_some() {
                let expr = self.parse_constant_expr()?;
                self.expect(Tag::RightBracket)?;
                designators.push(crate::init::Designator::Index(expr));
            } else {
                break;
            }
        }
        if !designators.is_empty() {
            self.expect(Tag::Equal)?;
        }
        Ok(designators)
    }

    /// Implements `make_declaration` per spec.md §4.4: linkage
    /// computation, redeclaration compatibility, type completion merge,
    /// and `typedef` registration.
    pub(super) fn make_declaration(
        &mut self,
        name: String,
        ty: QualType,
        specs: &DeclSpecifiers,
        loc: SourceLocation,
    ) -> Result<ObjectRef> {
        let storage = specs.storage.unwrap_or(StorageClass::None);
        let at_file_scope = self.scopes.current().is_file_scope();

        let linkage = if storage == StorageClass::Typedef {
            Linkage::None
        } else if at_file_scope {
            if storage == StorageClass::Static { Linkage::Internal } else { Linkage::External }
        } else if storage == StorageClass::Extern {
            Linkage::External
        } else {
            Linkage::None
        };

        if let Some(Ordinary::Object(existing)) = self.scopes.current().find_ordinary_in_current(&name) {
            if !existing.qual_type().compatible(&ty) {
                return Err(Fatal::declaration(loc, format!("conflicting types for '{name}'")));
            }
            if linkage == Linkage::None && existing.linkage.get() == Linkage::None && at_file_scope {
                return Err(Fatal::declaration(loc, format!("redefinition of '{name}' without linkage")));
            }
            if at_file_scope && existing.linkage.get() != Linkage::None && linkage != Linkage::None && existing.linkage.get() != linkage {
                return Err(Fatal::declaration(loc, format!("conflicting linkage for '{name}'")));
            }
            if !existing.qual_type().ty.is_complete() && ty.ty.is_complete() {
                *existing.ty.borrow_mut() = ty;
            }
            existing.storage.set(storage);
            return Ok(existing);
        }

        let object = ObjectData::new(name.clone(), ty, loc);
        object.storage.set(storage);
        object.linkage.set(linkage);
        if let Some(align) = specs.align {
            object.align.set(object.align.get().max(align as u32));
        }
        if !name.is_empty() {
            self.scopes.current().insert_ordinary(name, Ordinary::Object(object.clone()));
        }
        Ok(object)
    }
}
