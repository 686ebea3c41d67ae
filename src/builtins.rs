//! Implicit builtin declarations.
//!
//! Registered into file scope's ordinary namespace by the parser's
//! initialization step, per spec.md §6. Grounded in the original
//! parser's implicit-declaration bootstrap (`Parser::Parser` seeds
//! `__builtin_va_list` and friends into file scope before the first
//! token is consumed).

use crate::ast::ObjectData;
use crate::loc::SourceLocation;
use crate::scope::{Ordinary, ScopeData};
use crate::ty::{ArithKind, QualType, StorageClass, Type};
use std::rc::Rc;


/// `__va_list_tag { gp_offset: unsigned; fp_offset: unsigned;
/// overflow_arg_area: void*; reg_save_area: void* }`, and
/// `__builtin_va_list` as an array-of-1 of that struct (the x86-64
/// System V ABI shape the original targets).
fn va_list_type(loc: &SourceLocation) -> QualType {
    let tag = Type::new_struct(true, Some("__va_list_tag".into()));
    let data = tag.struct_data().clone();

    let uint = QualType::unqualified(Type::arithmetic(ArithKind::UInt));
    let void_ptr = QualType::unqualified(Type::pointer_to(QualType::unqualified(Type::void())));

    data.add_member(ObjectData::new("gp_offset", uint.clone(), loc.clone()));
    data.add_member(ObjectData::new("fp_offset", uint, loc.clone()));
    data.add_member(ObjectData::new("overflow_arg_area", void_ptr.clone(), loc.clone()));
    data.add_member(ObjectData::new("reg_save_area", void_ptr, loc.clone()));
    data.finish();

    QualType::unqualified(Type::array_of(QualType::unqualified(tag), Some(1)))
}

/// A function prototype with no body, to stand in for the builtins the
/// parser recognizes by name at a call site rather than by signature
/// checking (`__builtin_va_arg_sub` takes its second "argument" as a
/// captured type name, not an ordinary parameter).
fn builtin_function(name: &str, return_type: QualType, params: Vec<QualType>, var_args: bool, loc: &SourceLocation) -> Rc<crate::ast::ObjectData> {
    let param_objects = params
        .into_iter()
        .enumerate()
        .map(|(i, ty)| ObjectData::new(format!("__arg{i}"), ty, loc.clone()))
        .collect();
    let fn_type = Type::function(return_type, param_objects, var_args);
    let object = ObjectData::new(name, QualType::unqualified(fn_type), loc.clone());
    object.storage.set(StorageClass::Extern);
    object.linkage.set(crate::ty::Linkage::External);
    object
}

/// Installs every builtin spec.md §6 names into `file_scope`'s ordinary
/// namespace.
pub fn install(file_scope: &ScopeData, loc: &SourceLocation) {
    let void = QualType::unqualified(Type::void());
    let void_ptr = QualType::unqualified(Type::pointer_to(void.clone()));
    let int = QualType::unqualified(Type::arithmetic(ArithKind::Int));
    let uint = QualType::unqualified(Type::arithmetic(ArithKind::UInt));
    let long = QualType::unqualified(Type::arithmetic(ArithKind::Long));
    let va_list = va_list_type(loc);
    let va_list_ptr = QualType::unqualified(Type::pointer_to(va_list.clone()));

    let va_list_name = ObjectData::new("__builtin_va_list", va_list, loc.clone());
    va_list_name.storage.set(StorageClass::Typedef);
    file_scope.insert_ordinary("__builtin_va_list", Ordinary::Object(va_list_name));

    let builtins: &[(&str, QualType, Vec<QualType>, bool)] = &[
        ("__builtin_va_start", void.clone(), vec![va_list_ptr.clone(), void_ptr.clone()], false),
        ("__builtin_va_end", void.clone(), vec![va_list_ptr.clone()], false),
        ("__builtin_va_arg_sub", void_ptr.clone(), vec![va_list_ptr.clone()], false),
        ("__builtin_va_copy", void.clone(), vec![va_list_ptr.clone(), va_list_ptr], false),
        ("__sync_synchronize", void.clone(), vec![], false),
        ("__builtin_alloca", void_ptr, vec![long.clone()], false),
        ("__builtin_popcount", int.clone(), vec![uint.clone()], false),
        ("__builtin_clz", int.clone(), vec![uint.clone()], false),
        ("__builtin_ctz", int.clone(), vec![uint], false),
        ("__builtin_expect", long.clone(), vec![long.clone(), long], false),
        ("__builtin_isinf_sign", int.clone(), vec![QualType::unqualified(Type::arithmetic(ArithKind::Double))], false),
        ("__builtin_isfinite", int, vec![QualType::unqualified(Type::arithmetic(ArithKind::Double))], false),
    ];

    for (name, ret, params, var_args) in builtins {
        let object = builtin_function(name, ret.clone(), params.clone(), *var_args, loc);
        file_scope.insert_ordinary(*name, Ordinary::Object(object));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::new_scope;
    use crate::scope::ScopeKind;

    #[test]
    fn installs_va_list_and_builtin_functions() {
        let file_scope = new_scope(None, ScopeKind::File);
        install(&file_scope, &SourceLocation::synthetic());
        assert!(file_scope.find_ordinary_in_current("__builtin_va_list").is_some());
        assert!(file_scope.find_ordinary_in_current("__builtin_popcount").is_some());
        assert!(file_scope.find_ordinary_in_current("__builtin_va_arg_sub").is_some());
    }
}
