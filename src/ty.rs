//! The C type system: qualifiers, arithmetic normalization, struct/union
//! layout and type compatibility/equality.
//!
//! `Type` values are handed out as `Rc<Type>` rather than interned by a
//! lifetime-parameterized arena: the original compiler this is grounded
//! on (`type.cpp`) doesn't intern arithmetic/pointer/array types either
//! — `ArithmeticType::Get`/`PointerType::Get` always allocate a fresh
//! object and rely on structural `Equal`/`Compatible` for comparisons,
//! reserving identity-based sharing for `StructType`, whose members are
//! mutated in place as a struct body is parsed. `Rc<RefCell<..>>`
//! reproduces that one exception faithfully without requiring two
//! different pointer representations.

use crate::ast::ObjectRef;
use bitflags::bitflags;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

bitflags! {
    /// Mirrors the `TypeSpec` bitmask kept on a C declaration before it is
    /// normalized into one of the fourteen canonical arithmetic types.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TypeSpec: u32 {
        const SIGNED    = 0x001;
        const UNSIGNED  = 0x002;
        const VOID      = 0x004;
        const CHAR      = 0x008;
        const SHORT     = 0x010;
        const INT       = 0x020;
        const LONG      = 0x040;
        const FLOAT     = 0x080;
        const DOUBLE    = 0x100;
        const BOOL      = 0x200;
        const LONG_LONG = 0x8000;
    }
}

impl TypeSpec {
    /// Collapses a raw combination of declaration specifiers (e.g.
    /// `unsigned long` = `UNSIGNED | LONG`) into one of the fourteen
    /// masks `ArithmeticKind` recognizes. `signed` alone becomes `int`;
    /// `unsigned` alone gains an implicit `int`; any explicit width
    /// (`short`/`long`/`long long`) absorbs a redundant `int`.
    pub fn normalize(mut self) -> TypeSpec {
        if self == TypeSpec::SIGNED {
            self = TypeSpec::INT;
        } else if self == TypeSpec::UNSIGNED {
            self |= TypeSpec::INT;
        }

        self.remove(TypeSpec::SIGNED);

        if self.intersects(TypeSpec::SHORT | TypeSpec::LONG | TypeSpec::LONG_LONG) {
            self.remove(TypeSpec::INT);
        }

        self
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Qualifiers: u8 {
        const CONST    = 0x1;
        const RESTRICT = 0x2;
        const VOLATILE = 0x4;
        const ATOMIC   = 0x8;
    }
}

/// The fourteen normalized arithmetic types, in rank order within each
/// signedness (spec.md §4.2's canonical set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithKind {
    Bool,
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
}

impl ArithKind {
    /// Normalizes `spec` and maps it onto one of the fourteen kinds.
    /// Panics on a combination a declaration parser should never have
    /// assembled (mirrors the original's `assert(false)` default case).
    pub fn from_spec(spec: TypeSpec) -> ArithKind {
        let spec = spec.normalize();
        use ArithKind::*;
        match spec {
            s if s == TypeSpec::BOOL => Bool,
            s if s == TypeSpec::CHAR => Char,
            s if s == TypeSpec::CHAR | TypeSpec::UNSIGNED => UChar,
            s if s == TypeSpec::SHORT => Short,
            s if s == TypeSpec::SHORT | TypeSpec::UNSIGNED => UShort,
            s if s == TypeSpec::INT => Int,
            s if s == TypeSpec::INT | TypeSpec::UNSIGNED => UInt,
            s if s == TypeSpec::LONG => Long,
            s if s == TypeSpec::LONG | TypeSpec::UNSIGNED => ULong,
            s if s == TypeSpec::LONG_LONG => LongLong,
            s if s == TypeSpec::LONG_LONG | TypeSpec::UNSIGNED => ULongLong,
            s if s == TypeSpec::FLOAT => Float,
            s if s == TypeSpec::DOUBLE => Double,
            s if s == TypeSpec::DOUBLE | TypeSpec::LONG => LongDouble,
            other => panic!("unnormalizable arithmetic type spec: {other:?}"),
        }
    }

    pub fn width(self) -> i32 {
        use ArithKind::*;
        match self {
            Bool | Char | UChar => 1,
            Short | UShort => 2,
            Int | UInt | Float => 4,
            Long | ULong | LongLong | ULongLong | Double => 8,
            LongDouble => 16,
        }
    }

    pub fn align(self) -> i32 {
        self.width()
    }

    pub fn rank(self) -> i32 {
        use ArithKind::*;
        match self {
            Bool => 0,
            Char | UChar => 1,
            Short | UShort => 2,
            Int | UInt => 3,
            Long | ULong => 4,
            LongLong | ULongLong => 5,
            Float | Double | LongDouble => panic!("rank() is only defined for integer types"),
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            ArithKind::Bool
                | ArithKind::UChar
                | ArithKind::UShort
                | ArithKind::UInt
                | ArithKind::ULong
                | ArithKind::ULongLong
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, ArithKind::Float | ArithKind::Double | ArithKind::LongDouble)
    }

    pub fn is_integer(self) -> bool {
        !self.is_float()
    }

    pub fn is_char(self) -> bool {
        matches!(self, ArithKind::Char | ArithKind::UChar)
    }

    /// The unsigned kind with the same width, used when the usual
    /// arithmetic conversions force a signed operand to flip sign.
    pub fn to_unsigned(self) -> ArithKind {
        use ArithKind::*;
        match self {
            Char => UChar,
            Short => UShort,
            Int => UInt,
            Long => ULong,
            LongLong => ULongLong,
            already_unsigned => already_unsigned,
        }
    }

    pub fn max_integer_value(self) -> u64 {
        use ArithKind::*;
        match self {
            Bool => 1,
            Char => i8::MAX as u64,
            UChar => u8::MAX as u64,
            Short => i16::MAX as u64,
            UShort => u16::MAX as u64,
            Int => i32::MAX as u64,
            UInt => u32::MAX as u64,
            Long | LongLong => i64::MAX as u64,
            ULong | ULongLong => u64::MAX,
            Float | Double | LongDouble => panic!("max_integer_value() is only defined for integer types"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    None,
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    None,
    Typedef,
    Extern,
    Static,
    ThreadLocal,
    Auto,
    Register,
}

/// A `Type` paired with the cv/restrict/atomic qualifiers that apply at
/// this use (the qualifiers are not part of type identity, matching
/// `Compatible`/`Equal`'s explicit "cvr ignored here" note).
#[derive(Debug, Clone)]
pub struct QualType {
    pub ty: Rc<Type>,
    pub qual: Qualifiers,
}

impl QualType {
    pub fn new(ty: Rc<Type>, qual: Qualifiers) -> QualType {
        QualType { ty, qual }
    }

    pub fn unqualified(ty: Rc<Type>) -> QualType {
        QualType { ty, qual: Qualifiers::empty() }
    }

    pub fn is_const(&self) -> bool {
        self.qual.contains(Qualifiers::CONST)
    }

    /// Array-to-pointer and function-to-pointer decay, applied at every
    /// expression boundary except as the operand of `&`, `sizeof` or
    /// string-literal initialization.
    pub fn decay(&self) -> QualType {
        match &self.ty.kind {
            TypeKind::Array(array) => {
                QualType::unqualified(Type::pointer_to(array.element.clone()))
            }
            TypeKind::Function(_) => QualType::unqualified(Type::pointer_to(self.clone())),
            _ => self.clone(),
        }
    }

    pub fn compatible(&self, other: &QualType) -> bool {
        self.ty.compatible(&other.ty)
    }

    pub fn equal(&self, other: &QualType) -> bool {
        self.ty.equal(&other.ty)
    }
}

#[derive(Debug)]
pub struct PointerData {
    pub element: QualType,
}

#[derive(Debug)]
pub struct ArrayData {
    pub element: QualType,
    /// `None` until a bound is known (an incomplete array type, e.g. an
    /// `extern` tentative array declaration or an unfinished flexible
    /// array member).
    pub num_elements: RefCell<Option<u64>>,
}

#[derive(Debug)]
pub struct Member {
    pub object: ObjectRef,
}

/// A struct or union body, built incrementally by `add_member`,
/// `merge_anonymous` and finally sealed by `finish`. Kept behind
/// `RefCell` because the parser mutates it in place while walking the
/// member-declaration list; once `finish`ed it is logically immutable.
#[derive(Debug)]
pub struct StructData {
    pub is_struct: bool,
    pub name: RefCell<Option<String>>,
    pub members: RefCell<Vec<Member>>,
    pub offset: RefCell<i64>,
    pub width: RefCell<i64>,
    pub align: RefCell<i64>,
    pub has_flexible_array: RefCell<bool>,
    pub index: RefCell<u32>,
    pub finished: RefCell<bool>,
}

impl StructData {
    fn new(is_struct: bool, name: Option<String>) -> StructData {
        StructData {
            is_struct,
            name: RefCell::new(name),
            members: RefCell::new(Vec::new()),
            offset: RefCell::new(0),
            width: RefCell::new(0),
            align: RefCell::new(1),
            has_flexible_array: RefCell::new(false),
            index: RefCell::new(0),
            finished: RefCell::new(false),
        }
    }

    pub fn has_name(&self) -> bool {
        self.name.borrow().is_some()
    }

    pub fn member(&self, name: &str) -> Option<ObjectRef> {
        self.members
            .borrow()
            .iter()
            .find(|m| m.object.name == name)
            .map(|m| m.object.clone())
    }

    /// Appends a named member, aligning it against the struct's current
    /// running offset (or, for a union, leaving the offset at zero and
    /// only widening the overall size). Grounded on `StructType::AddMember`.
    pub fn add_member(&self, object: ObjectRef) {
        let member_ty = object.qual_type();
        if matches!(&member_ty.ty.kind, TypeKind::Array(a) if a.num_elements.borrow().is_none()) {
            *self.has_flexible_array.borrow_mut() = true;
        }

        let member_align = member_ty.ty.align() as i64;
        let offset = make_align(*self.offset.borrow(), member_align);
        object.offset.set(offset);
        object.index.set(*self.index.borrow());
        *self.index.borrow_mut() += 1;

        let mut align = self.align.borrow_mut();
        *align = (*align).max(member_align);

        if self.is_struct {
            let mut off = self.offset.borrow_mut();
            *off = offset + member_ty.ty.width() as i64;
            *self.width.borrow_mut() = make_align(*off, *align);
        } else {
            let mut width = self.width.borrow_mut();
            *width = (*width).max(member_ty.ty.width() as i64);
            *width = make_align(*width, *align);
        }

        self.members.borrow_mut().push(Member { object });
    }

    /// Flattens an anonymous struct/union member's own members into this
    /// struct's namespace, re-basing each by the anonymous member's
    /// offset. Grounded on `StructType::MergeAnonymous`.
    pub fn merge_anonymous(&self, anonymous: ObjectRef) {
        let anon_ty = anonymous.qual_type();
        let anon_struct = match &anon_ty.ty.kind {
            TypeKind::Struct(s) => s.clone(),
            _ => panic!("merge_anonymous requires a struct/union operand"),
        };

        let anon_align = anon_ty.ty.align() as i64;
        let offset = make_align(*self.offset.borrow(), anon_align);
        anonymous.offset.set(offset);
        anonymous.index.set(*self.index.borrow());
        *self.index.borrow_mut() += 1;

        for member in anon_struct.members.borrow().iter() {
            let nested = member.object.clone();
            nested.offset.set(offset + nested.offset.get());
            nested.index.set(*self.index.borrow());
            *self.index.borrow_mut() += 1;
            self.members.borrow_mut().push(Member { object: nested });
        }
        self.members.borrow_mut().push(Member { object: anonymous });

        let mut align = self.align.borrow_mut();
        *align = (*align).max(anon_align);

        if self.is_struct {
            let mut off = self.offset.borrow_mut();
            *off = offset + anon_ty.ty.width() as i64;
            *self.width.borrow_mut() = make_align(*off, *align);
        } else {
            let mut width = self.width.borrow_mut();
            *width = (*width).max(anon_ty.ty.width() as i64);
            *width = make_align(*width, *align);
        }
    }

    pub fn finish(&self) {
        *self.finished.borrow_mut() = true;
    }

    pub fn width(&self) -> i64 {
        if self.members.borrow().is_empty() {
            1
        } else {
            *self.width.borrow()
        }
    }

    pub fn align(&self) -> i64 {
        if self.members.borrow().is_empty() {
            1
        } else {
            *self.align.borrow()
        }
    }
}

/// Rounds `offset` up to the next multiple of `align`. Grounded on
/// `StructType::MakeAlign`.
pub fn make_align(offset: i64, align: i64) -> i64 {
    debug_assert_ne!(align, 0);
    if offset % align == 0 {
        offset
    } else {
        offset + align - (offset % align)
    }
}

#[derive(Debug)]
pub struct FunctionData {
    pub return_type: QualType,
    pub params: Vec<ObjectRef>,
    pub is_var_args: bool,
    pub is_inline: RefCell<bool>,
    pub is_noreturn: RefCell<bool>,
}

#[derive(Debug)]
pub enum TypeKind {
    Void,
    Arithmetic(ArithKind),
    Pointer(PointerData),
    Array(ArrayData),
    Struct(Rc<StructData>),
    Function(FunctionData),
}

/// A type together with whatever bookkeeping its kind requires.
/// Completeness is tracked centrally since `void`, struct/union and
/// array incompleteness all follow the same has-a-definition-yet rule.
#[derive(Debug)]
pub struct Type {
    pub kind: TypeKind,
    complete: RefCell<bool>,
}

impl Type {
    fn new(kind: TypeKind, complete: bool) -> Rc<Type> {
        Rc::new(Type { kind, complete: RefCell::new(complete) })
    }

    pub fn void() -> Rc<Type> {
        Type::new(TypeKind::Void, false)
    }

    pub fn arithmetic(kind: ArithKind) -> Rc<Type> {
        Type::new(TypeKind::Arithmetic(kind), true)
    }

    pub fn pointer_to(element: QualType) -> Rc<Type> {
        Type::new(TypeKind::Pointer(PointerData { element }), true)
    }

    pub fn array_of(element: QualType, num_elements: Option<u64>) -> Rc<Type> {
        let complete = num_elements.is_some();
        Type::new(
            TypeKind::Array(ArrayData { element, num_elements: RefCell::new(num_elements) }),
            complete,
        )
    }

    pub fn new_struct(is_struct: bool, name: Option<String>) -> Rc<Type> {
        Type::new(TypeKind::Struct(Rc::new(StructData::new(is_struct, name))), false)
    }

    /// Wraps an already-existing `StructData` (e.g. one found by tag
    /// lookup) in a fresh `Type` handle, so a second reference to the
    /// same tag shares its layout state.
    pub fn from_struct_data(data: Rc<StructData>) -> Rc<Type> {
        let complete = *data.finished.borrow();
        Type::new(TypeKind::Struct(data), complete)
    }

    pub fn function(return_type: QualType, params: Vec<ObjectRef>, is_var_args: bool) -> Rc<Type> {
        Type::new(
            TypeKind::Function(FunctionData {
                return_type,
                params,
                is_var_args,
                is_inline: RefCell::new(false),
                is_noreturn: RefCell::new(false),
            }),
            true,
        )
    }

    pub fn is_complete(&self) -> bool {
        match &self.kind {
            TypeKind::Struct(s) => *s.finished.borrow(),
            TypeKind::Array(a) => a.num_elements.borrow().is_some(),
            _ => *self.complete.borrow(),
        }
    }

    pub fn set_complete(&self, complete: bool) {
        *self.complete.borrow_mut() = complete;
    }

    pub fn width(&self) -> i32 {
        match &self.kind {
            TypeKind::Void => 1,
            TypeKind::Arithmetic(k) => k.width(),
            TypeKind::Pointer(_) => 8,
            TypeKind::Array(a) => {
                a.element.ty.width() * a.num_elements.borrow().unwrap_or(0) as i32
            }
            TypeKind::Struct(s) => s.width() as i32,
            TypeKind::Function(_) => 1,
        }
    }

    pub fn align(&self) -> i32 {
        match &self.kind {
            TypeKind::Void => 1,
            TypeKind::Arithmetic(k) => k.align(),
            TypeKind::Pointer(_) => 8,
            TypeKind::Array(a) => a.element.ty.align(),
            TypeKind::Struct(s) => s.align() as i32,
            TypeKind::Function(_) => panic!("a function type has no alignment"),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Void)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self.kind, TypeKind::Arithmetic(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.kind, TypeKind::Pointer(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array(_))
    }

    pub fn is_struct_or_union(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(&self.kind, TypeKind::Struct(s) if s.is_struct)
    }

    pub fn is_union(&self) -> bool {
        matches!(&self.kind, TypeKind::Struct(s) if !s.is_struct)
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, TypeKind::Function(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, TypeKind::Arithmetic(ArithKind::Bool))
    }

    pub fn is_character(&self) -> bool {
        matches!(self.kind, TypeKind::Arithmetic(k) if k.is_char())
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind, TypeKind::Arithmetic(k) if k.is_integer())
    }

    pub fn is_float(&self) -> bool {
        matches!(self.kind, TypeKind::Arithmetic(k) if k.is_float())
    }

    pub fn is_scalar(&self) -> bool {
        self.is_arithmetic() || self.is_pointer()
    }

    pub fn is_aggregate(&self) -> bool {
        self.is_array() || self.is_struct()
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self.kind, TypeKind::Arithmetic(k) if k.is_unsigned())
    }

    pub fn struct_data(&self) -> &Rc<StructData> {
        match &self.kind {
            TypeKind::Struct(s) => s,
            _ => panic!("not a struct/union type"),
        }
    }

    pub fn array_data(&self) -> &ArrayData {
        match &self.kind {
            TypeKind::Array(a) => a,
            _ => panic!("not an array type"),
        }
    }

    pub fn function_data(&self) -> &FunctionData {
        match &self.kind {
            TypeKind::Function(f) => f,
            _ => panic!("not a function type"),
        }
    }

    pub fn pointee(&self) -> QualType {
        match &self.kind {
            TypeKind::Pointer(p) => p.element.clone(),
            _ => panic!("not a pointer type"),
        }
    }

    /// True if the two declarations can refer to the same object or
    /// function without undefined behavior; ignores qualifiers per the
    /// original's explicit note. Grounded on each `*Type::Compatible`.
    pub fn compatible(&self, other: &Type) -> bool {
        match (&self.kind, &other.kind) {
            (TypeKind::Void, TypeKind::Void) => true,
            (TypeKind::Arithmetic(a), TypeKind::Arithmetic(b)) => a == b,
            (TypeKind::Pointer(a), TypeKind::Pointer(b)) => a.element.compatible(&b.element),
            (TypeKind::Array(a), TypeKind::Array(b)) => {
                if !a.element.compatible(&b.element) {
                    return false;
                }
                match (*a.num_elements.borrow(), *b.num_elements.borrow()) {
                    (Some(x), Some(y)) => x == y,
                    _ => true,
                }
            }
            (TypeKind::Struct(a), TypeKind::Struct(b)) => {
                if a.is_struct != b.is_struct {
                    return false;
                }
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                if !*a.finished.borrow() || !*b.finished.borrow() {
                    // Declared but not yet defined: identity is all we
                    // can check until a body appears.
                    return a.name.borrow().is_some() && *a.name.borrow() == *b.name.borrow();
                }
                Rc::ptr_eq(a, b)
            }
            (TypeKind::Function(a), TypeKind::Function(b)) => {
                a.return_type.compatible(&b.return_type)
                    && a.params.len() == b.params.len()
                    && a.params
                        .iter()
                        .zip(&b.params)
                        .all(|(p, q)| p.qual_type().equal(&q.qual_type()))
            }
            _ => false,
        }
    }

    /// Stricter than `compatible`: the same named type, or structurally
    /// identical anonymous types. Grounded on each `*Type::Equal`.
    pub fn equal(&self, other: &Type) -> bool {
        match (&self.kind, &other.kind) {
            (TypeKind::Struct(a), TypeKind::Struct(b)) => Rc::ptr_eq(a, b),
            _ => self.compatible(other),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Void => write!(f, "void"),
            TypeKind::Arithmetic(k) => write!(f, "{k:?}"),
            TypeKind::Pointer(p) => write!(f, "{}*", p.element.ty),
            TypeKind::Array(a) => write!(f, "{}[]", a.element.ty),
            TypeKind::Struct(s) => {
                let kw = if s.is_struct { "struct" } else { "union" };
                match &*s.name.borrow() {
                    Some(name) => write!(f, "{kw} {name}"),
                    None => write!(f, "{kw} <anonymous>"),
                }
            }
            TypeKind::Function(_) => write!(f, "function"),
        }
    }
}

/// Promotes `char`/`short`/`_Bool`-rank integer operands to `int` ahead
/// of any arithmetic; never touches anything already at `int` rank or
/// wider. Grounded on `ArithmeticType::IntegerPromote`.
pub fn integer_promote(ty: &QualType) -> QualType {
    let kind = match &ty.ty.kind {
        TypeKind::Arithmetic(k) => *k,
        _ => panic!("integer_promote requires an integer or _Bool operand"),
    };
    if kind.rank() < ArithKind::Int.rank() {
        QualType::unqualified(Type::arithmetic(ArithKind::Int))
    } else {
        ty.clone()
    }
}

/// The usual arithmetic conversions: the common type two arithmetic
/// operands convert to before a binary operator is applied. Grounded on
/// `ArithmeticType::MaxType`.
pub fn usual_arithmetic_conversions(lhs: &QualType, rhs: &QualType) -> QualType {
    let (lk, rk) = match (&lhs.ty.kind, &rhs.ty.kind) {
        (TypeKind::Arithmetic(l), TypeKind::Arithmetic(r)) => (*l, *r),
        _ => panic!("usual_arithmetic_conversions requires two arithmetic operands"),
    };

    if (!lk.is_integer() || !rk.is_integer()) && !matches!(lk, ArithKind::Bool) && !matches!(rk, ArithKind::Bool)
    {
        // Floating always outranks integer regardless of the integer's own
        // rank: a floating operand's kind is never compared against an
        // integer rank on the same scale, only against another float's.
        return match (lk.is_float(), rk.is_float()) {
            (true, false) => lhs.clone(),
            (false, true) => rhs.clone(),
            (true, true) => {
                if lk.rank_for_mixed() >= rk.rank_for_mixed() { lhs.clone() } else { rhs.clone() }
            }
            (false, false) => unreachable!("this branch only runs when at least one operand is floating"),
        };
    }

    let lp = integer_promote(lhs);
    let rp = integer_promote(rhs);
    let (lpk, rpk) = match (&lp.ty.kind, &rp.ty.kind) {
        (TypeKind::Arithmetic(l), TypeKind::Arithmetic(r)) => (*l, *r),
        _ => unreachable!(),
    };

    if lpk == rpk {
        return lp;
    }

    if lpk.is_unsigned() == rpk.is_unsigned() {
        return if lpk.rank() >= rpk.rank() { lp } else { rp };
    }

    let (unsigned_side, unsigned_kind, signed_side, signed_kind) = if lpk.is_unsigned() {
        (lp.clone(), lpk, rp.clone(), rpk)
    } else {
        (rp.clone(), rpk, lp.clone(), lpk)
    };

    if unsigned_kind.rank() >= signed_kind.rank() {
        unsigned_side
    } else if signed_kind.max_integer_value() >= unsigned_kind.max_integer_value() {
        signed_side
    } else {
        QualType::unqualified(Type::arithmetic(signed_kind.to_unsigned()))
    }
}

impl ArithKind {
    /// Total order among the three floating kinds only: `rank()` panics
    /// for them, and this scale must never be compared against an
    /// integer's `rank()` (the two scales aren't on the same axis).
    fn rank_for_mixed(self) -> i32 {
        use ArithKind::*;
        match self {
            LongDouble => 2,
            Double => 1,
            Float => 0,
            _ => panic!("rank_for_mixed is only meaningful between two floating kinds"),
        }
    }
}

/// Parser/backend-facing target parameters threaded through
/// `CompilationContext`; the frontend core itself assumes a single
/// LP64-like target but keeps these configurable per spec.md's ambient
/// configuration section rather than hardcoding them.
#[derive(Debug, Clone, Copy)]
pub struct TargetOptions {
    pub pointer_width: u32,
    pub char_is_unsigned: bool,
    pub bit_field_unit_width: u32,
}

impl Default for TargetOptions {
    fn default() -> Self {
        TargetOptions { pointer_width: 64, char_is_unsigned: false, bit_field_unit_width: 32 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc::SourceLocation;

    #[test]
    fn normalizes_bare_signed_and_unsigned() {
        assert_eq!(TypeSpec::SIGNED.normalize(), TypeSpec::INT);
        assert_eq!(TypeSpec::UNSIGNED.normalize(), TypeSpec::UNSIGNED | TypeSpec::INT);
    }

    #[test]
    fn long_absorbs_redundant_int() {
        let spec = TypeSpec::LONG | TypeSpec::INT | TypeSpec::UNSIGNED;
        assert_eq!(ArithKind::from_spec(spec), ArithKind::ULong);
    }

    #[test]
    fn integer_promote_widens_char_to_int() {
        let c = QualType::unqualified(Type::arithmetic(ArithKind::Char));
        let promoted = integer_promote(&c);
        assert!(matches!(promoted.ty.kind, TypeKind::Arithmetic(ArithKind::Int)));
    }

    #[test]
    fn usual_conversions_prefer_unsigned_of_equal_rank() {
        let i = QualType::unqualified(Type::arithmetic(ArithKind::Int));
        let u = QualType::unqualified(Type::arithmetic(ArithKind::UInt));
        let result = usual_arithmetic_conversions(&i, &u);
        assert!(matches!(result.ty.kind, TypeKind::Arithmetic(ArithKind::UInt)));
    }

    #[test]
    fn usual_conversions_prefer_floating_over_any_integer_rank() {
        let long = QualType::unqualified(Type::arithmetic(ArithKind::Long));
        let d = QualType::unqualified(Type::arithmetic(ArithKind::Double));
        let result = usual_arithmetic_conversions(&long, &d);
        assert!(matches!(result.ty.kind, TypeKind::Arithmetic(ArithKind::Double)));
        let result = usual_arithmetic_conversions(&d, &long);
        assert!(matches!(result.ty.kind, TypeKind::Arithmetic(ArithKind::Double)));
    }

    #[test]
    fn struct_layout_packs_and_aligns_members() {
        let s = Type::new_struct(true, Some("point".into()));
        let data = s.struct_data().clone();
        let loc = SourceLocation::synthetic();
        let x = test_object("x", ArithKind::Int, loc.clone());
        let y = test_object("y", ArithKind::Char, loc.clone());
        data.add_member(x.clone());
        data.add_member(y.clone());
        assert_eq!(x.offset.get(), 0);
        assert_eq!(y.offset.get(), 4);
        assert_eq!(data.width(), 8);
        assert_eq!(data.align(), 4);
    }

    fn test_object(name: &str, kind: ArithKind, loc: SourceLocation) -> ObjectRef {
        crate::ast::ObjectData::new(name, QualType::unqualified(Type::arithmetic(kind)), loc)
    }
}
