//! Integration tests exercising the frontend purely through [`c17_frontend::compile`],
//! the crate's only public pipeline entry point. Each test works a single
//! scenario end to end: scan, parse, resolve types/scopes, elaborate any
//! initializers, and (where relevant) fold constants, then asserts on the
//! resulting typed AST rather than on re-parsed source text.

use c17_frontend::ast::{BitField, DeclarationNode, Expr, ExprKind, ExternalDecl, FuncDefNode, InitEntry, InitPlan, ObjectRef, Stmt, StmtKind};
use c17_frontend::constfold::{fold, Folded};
use c17_frontend::ty::{ArithKind, TypeKind};
use c17_frontend::{compile, diagnostics::Warnings};
use pretty_assertions::assert_eq;

fn parse(src: &str) -> c17_frontend::ast::TranslationUnit {
    let _ = env_logger::try_init();
    let (tu, warnings) = compile(src.as_bytes(), "test.c").expect("source should parse and resolve cleanly");
    assert_warnings_benign(&warnings);
    tu
}

fn assert_warnings_benign(warnings: &Warnings) {
    assert!(warnings.is_empty(), "unexpected warnings");
}

fn find_func_def<'a>(tu: &'a c17_frontend::ast::TranslationUnit, name: &str) -> &'a FuncDefNode {
    tu.decls
        .iter()
        .find_map(|d| match d {
            ExternalDecl::FuncDef(f) if f.object.name == name => Some(f),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no function definition named '{name}'"))
}

/// Finds a block-scope `Decl` statement by the declared object's name,
/// searching only the immediate top level of a function's compound body
/// (every scenario below declares its probe variable directly in the
/// outermost block).
fn find_local_decl<'a>(body: &'a Stmt, name: &str) -> &'a ObjectRef {
    let items = match &body.kind {
        StmtKind::Compound { items } => items,
        _ => panic!("function body is not a compound statement"),
    };
    items
        .iter()
        .find_map(|item| match &item.kind {
            StmtKind::Decl(decl) => match decl.as_ref() {
                ExternalDecl::Declaration(DeclarationNode { object, .. }) if object.name == name => Some(object),
                _ => None,
            },
            _ => None,
        })
        .unwrap_or_else(|| panic!("no local declaration named '{name}'"))
}

/// Recursively collects every expression reachable from `stmt`, in
/// encounter order. There is no visitor trait over the AST (each node
/// kind is matched directly by its consumers instead), so tests that
/// need to inspect a whole function body walk it by hand.
fn collect_exprs<'a>(stmt: &'a Stmt, out: &mut Vec<&'a Expr>) {
    match &stmt.kind {
        StmtKind::Label { stmt, .. } | StmtKind::Case { stmt, .. } | StmtKind::Default { stmt } => {
            collect_exprs(stmt, out)
        }
        StmtKind::Compound { items } => items.iter().for_each(|s| collect_exprs(s, out)),
        StmtKind::Expr(Some(e)) => collect_expr(e, out),
        StmtKind::Expr(None) => {}
        StmtKind::If { cond, then_branch, else_branch } => {
            collect_expr(cond, out);
            collect_exprs(then_branch, out);
            if let Some(e) = else_branch {
                collect_exprs(e, out);
            }
        }
        StmtKind::Switch { cond, body } | StmtKind::While { cond, body } => {
            collect_expr(cond, out);
            collect_exprs(body, out);
        }
        StmtKind::DoWhile { body, cond } => {
            collect_exprs(body, out);
            collect_expr(cond, out);
        }
        StmtKind::For { init, cond, step, body } => {
            if let Some(i) = init {
                collect_exprs(i, out);
            }
            if let Some(c) = cond {
                collect_expr(c, out);
            }
            if let Some(s) = step {
                collect_expr(s, out);
            }
            collect_exprs(body, out);
        }
        StmtKind::Goto { .. } | StmtKind::Continue | StmtKind::Break | StmtKind::Decl(_) => {}
        StmtKind::Return(Some(e)) => collect_expr(e, out),
        StmtKind::Return(None) => {}
    }
}

fn collect_expr<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    out.push(expr);
    match &expr.kind {
        ExprKind::UnaryOp { operand, .. } | ExprKind::TypeCast { operand } => collect_expr(operand, out),
        ExprKind::BinaryOp { lhs, rhs, .. } => {
            collect_expr(lhs, out);
            collect_expr(rhs, out);
        }
        ExprKind::ConditionOp { cond, then_expr, else_expr } => {
            collect_expr(cond, out);
            collect_expr(then_expr, out);
            collect_expr(else_expr, out);
        }
        ExprKind::FuncCall { callee, args, .. } => {
            collect_expr(callee, out);
            args.iter().for_each(|a| collect_expr(a, out));
        }
        ExprKind::Member { base, .. } => collect_expr(base, out),
        ExprKind::StmtExpr { block } => collect_exprs(block, out),
        ExprKind::Constant(_)
        | ExprKind::StringLiteral { .. }
        | ExprKind::Identifier { .. }
        | ExprKind::Enumerator(_)
        | ExprKind::Object(_) => {}
    }
}

/// Scenario 1: a variadic sum written against `__builtin_va_arg_sub`
/// directly, standing in for the `va_arg` macro since preprocessing is
/// out of scope. `__builtin_va_list` must be usable as a declaration
/// type-specifier and each `va_arg_sub` call must carry the requested
/// type both as `va_arg_type` and as the call expression's own type,
/// not the builtin's declared `void*` return type.
#[test]
fn variadic_sum_rewrites_va_arg_sub_calls() {
    let tu = parse(
        r#"
        int sumi(int n, ...) {
            __builtin_va_list ap;
            __builtin_va_start(ap, n);
            int total = 0;
            total = total + __builtin_va_arg_sub(ap, int);
            total = total + __builtin_va_arg_sub(ap, int);
            __builtin_va_end(ap);
            return total;
        }
        "#,
    );

    let sumi = find_func_def(&tu, "sumi");
    let mut exprs = Vec::new();
    collect_exprs(&sumi.body, &mut exprs);

    let va_arg_calls: Vec<&Expr> = exprs
        .iter()
        .filter(|e| matches!(&e.kind, ExprKind::FuncCall { va_arg_type: Some(_), .. }))
        .copied()
        .collect();

    assert_eq!(va_arg_calls.len(), 2, "expected two rewritten va_arg_sub calls");
    for call in va_arg_calls {
        let va_arg_type = match &call.kind {
            ExprKind::FuncCall { va_arg_type: Some(ty), .. } => ty,
            _ => unreachable!(),
        };
        assert!(matches!(va_arg_type.ty.kind, TypeKind::Arithmetic(ArithKind::Int)));
        assert!(matches!(call.ty.ty.kind, TypeKind::Arithmetic(ArithKind::Int)), "the call's own type must be the requested type, not __builtin_va_arg_sub's declared return type");
    }
}

fn fold_int(expr: &Expr) -> i128 {
    match fold(expr).expect("constant leaf should fold") {
        Folded::Value(v) => v.as_i128(),
        Folded::Address { .. } => panic!("expected an integer constant leaf"),
    }
}

/// Replays a flat `InitEntry` list onto a byte-offset map, folding each
/// leaf and applying "last write wins", the same semantics a backend
/// emitting sequential stores would see, which is what overlapping union
/// members and designator overrides depend on.
fn replay_runtime_entries(entries: &[InitEntry]) -> std::collections::BTreeMap<i64, i128> {
    let mut values = std::collections::BTreeMap::new();
    for entry in entries {
        values.insert(entry.offset, fold_int(&entry.expr));
    }
    values
}

/// Scenario 2: a positional-then-designated initializer list against a
/// struct containing an anonymous union of overlapping members. The
/// flattened member list the type system builds interleaves unnamed
/// wrapper entries (the anonymous sub-aggregates themselves) among the
/// real fields; positional cursor advance must skip over them.
#[test]
fn designated_initializer_targets_overlapping_union_members() {
    let tu = parse(
        r#"
        void scenario2(void) {
            struct { union { struct { char a; char b; }; char c; char d; }; char e; } foo = {1, 2, 5, .d = 3, 4};
        }
        "#,
    );

    let scenario2 = find_func_def(&tu, "scenario2");
    let foo = find_local_decl(&scenario2.body, "foo");
    let struct_data = foo.qual_type().ty.struct_data().clone();

    let entries = match &*foo.init.borrow() {
        Some(InitPlan::Runtime(entries)) => entries.clone(),
        other => panic!("expected a runtime initializer plan, got {other:?}"),
    };
    // a, b, c, d (positional+designated), e: five leaves total, none of
    // them the two unnamed union/struct wrapper objects.
    assert_eq!(entries.len(), 5);

    let values = replay_runtime_entries(&entries);
    let a_offset = struct_data.member("a").unwrap().offset.get();
    let b_offset = struct_data.member("b").unwrap().offset.get();
    let e_offset = struct_data.member("e").unwrap().offset.get();

    assert_eq!(*values.get(&a_offset).unwrap(), 3, "a/c/d alias the same byte; d's later write should win");
    assert_eq!(*values.get(&b_offset).unwrap(), 2);
    assert_eq!(*values.get(&e_offset).unwrap(), 4);
}

/// Scenario 3: bit-field packing must cross into a new storage unit once
/// a field no longer fits in the current one, and a zero-width unnamed
/// bit-field must force the next field into a fresh unit even when bits
/// remain in the current one.
#[test]
fn bit_fields_pack_and_realign_on_zero_width() {
    let tu = parse(
        r#"
        struct bf1 { unsigned a: 8; unsigned b: 9; } bf1_probe;
        struct bf2 { unsigned a: 6; unsigned : 0; unsigned b: 1; } bf2_probe;
        "#,
    );

    let bf1 = find_top_level_object(&tu, "bf1_probe");
    let bf2 = find_top_level_object(&tu, "bf2_probe");

    assert_eq!(bf1.qual_type().ty.struct_data().width(), 4);
    assert_eq!(bf2.qual_type().ty.struct_data().width(), 8);

    let bf2_data = bf2.qual_type().ty.struct_data().clone();
    let b = bf2_data.member("b").unwrap();
    assert_eq!(b.offset.get(), 4, "the zero-width bit-field should push 'b' into the struct's second storage unit");
    assert_eq!(b.bit_field.get(), Some(BitField { begin: 0, width: 1 }));
}

fn find_top_level_object<'a>(tu: &'a c17_frontend::ast::TranslationUnit, name: &str) -> &'a ObjectRef {
    tu.decls
        .iter()
        .find_map(|d| match d {
            ExternalDecl::Declaration(DeclarationNode { object, .. }) if object.name == name => Some(object),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no top-level declaration named '{name}'"))
}

/// Scenario 4: members of a doubly-nested anonymous union/struct are
/// reachable directly off the enclosing object (`v.x`, not
/// `v.anon1.anon2.x`), and the overlapping layout `merge_anonymous`
/// produces is exactly what the union requires.
#[test]
fn anonymous_union_members_are_reachable_and_overlap() {
    let tu = parse(
        r#"
        void scenario4(void) {
            struct { union { struct { int x; int y; }; struct { char c[8]; }; }; } v;
            v.x = 1;
            v.y = 7;
        }
        "#,
    );

    let scenario4 = find_func_def(&tu, "scenario4");
    let v = find_local_decl(&scenario4.body, "v");
    let struct_data = v.qual_type().ty.struct_data().clone();

    let x = struct_data.member("x").unwrap();
    let y = struct_data.member("y").unwrap();
    let c = struct_data.member("c").unwrap();
    assert_eq!(x.offset.get(), 0);
    assert_eq!(y.offset.get(), 4);
    assert_eq!(c.offset.get(), 0, "c overlaps x through the anonymous union");
    assert_eq!(struct_data.width(), 8);

    let mut exprs = Vec::new();
    collect_exprs(&scenario4.body, &mut exprs);
    let assigned_members: Vec<&str> = exprs
        .iter()
        .filter_map(|e| match &e.kind {
            ExprKind::BinaryOp { op: c17_frontend::ast::BinaryOp::Assign, lhs, .. } => match &lhs.kind {
                ExprKind::Member { member, .. } => Some(member.name.as_str()),
                _ => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(assigned_members, vec!["x", "y"], "v.x and v.y should resolve straight through the anonymous wrappers");
}

/// Scenario 5: a char array with no declared bound, initialized from a
/// string literal, must infer its length as `strlen + 1` and elaborate
/// to one leaf per byte including the trailing NUL.
#[test]
fn string_literal_initializer_infers_array_length() {
    let tu = parse(
        r#"
        void scenario5(void) {
            char s[] = "abc";
        }
        "#,
    );

    let scenario5 = find_func_def(&tu, "scenario5");
    let s = find_local_decl(&scenario5.body, "s");

    let s_ty = s.qual_type();
    let array = s_ty.ty.array_data();
    assert_eq!(*array.num_elements.borrow(), Some(4));

    let entries = match &*s.init.borrow() {
        Some(InitPlan::Runtime(entries)) => entries.clone(),
        other => panic!("expected a runtime initializer plan, got {other:?}"),
    };
    let bytes: Vec<i128> = entries.iter().map(|entry| fold_int(&entry.expr)).collect();
    assert_eq!(bytes, vec![b'a' as i128, b'b' as i128, b'c' as i128, 0]);
}

/// Scenario 6: a struct tag forward-declared through a pointer use, then
/// completed, then referenced again must resolve to the identical
/// `StructData` both times: struct types are mutated in place rather
/// than re-resolved, so a forward use observes the completed body too.
#[test]
fn forward_declared_struct_shares_identity_after_completion() {
    let tu = parse(
        r#"
        struct S *p1;
        struct S { int x; };
        struct S *p2;
        "#,
    );

    let p1 = find_top_level_object(&tu, "p1");
    let p2 = find_top_level_object(&tu, "p2");

    let p1_struct = p1.qual_type().ty.pointee().ty.struct_data().clone();
    let p2_struct = p2.qual_type().ty.pointee().ty.struct_data().clone();

    assert!(std::rc::Rc::ptr_eq(&p1_struct, &p2_struct));
    assert!(*p1_struct.finished.borrow(), "completing the tag anywhere completes every existing reference to it");
    assert!(p1_struct.member("x").is_some());
}
