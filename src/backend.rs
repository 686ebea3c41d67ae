//! Backend isolation seam.
//!
//! Per the "Backend-IR coupling" design note, the frontend never builds
//! backend type/constant handles eagerly the way the original
//! `type.cpp`/`calc.cpp` reach straight into `llvm::Type`/`llvm::Constant`.
//! Instead every place that would touch a backend handle goes through
//! this trait, so the frontend can run and be tested with no backend
//! attached at all.

use crate::constant::ConstValue;
use crate::ty::QualType;

/// A backend-opaque handle. The frontend never inspects these; it only
/// threads them through.
pub trait BackendHandle: std::fmt::Debug {}

pub trait Backend {
    type TypeHandle: BackendHandle;
    type ConstHandle: BackendHandle;

    fn lower_type(&mut self, ty: &QualType) -> Self::TypeHandle;
    fn lower_constant(&mut self, value: &ConstValue) -> Self::ConstHandle;
}

/// A backend that records every call instead of emitting real IR; used
/// by unit and integration tests so the frontend's own logic can be
/// exercised without pulling in a code generator.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub types_lowered: usize,
    pub constants_lowered: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedHandle(pub usize);

impl BackendHandle for RecordedHandle {}

impl Backend for RecordingBackend {
    type TypeHandle = RecordedHandle;
    type ConstHandle = RecordedHandle;

    fn lower_type(&mut self, _ty: &QualType) -> RecordedHandle {
        self.types_lowered += 1;
        RecordedHandle(self.types_lowered)
    }

    fn lower_constant(&mut self, _value: &ConstValue) -> RecordedHandle {
        self.constants_lowered += 1;
        RecordedHandle(self.constants_lowered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{ArithKind, Type};

    #[test]
    fn recording_backend_counts_lowered_types() {
        let mut backend = RecordingBackend::default();
        let qt = QualType::unqualified(Type::arithmetic(ArithKind::Int));
        backend.lower_type(&qt);
        backend.lower_type(&qt);
        assert_eq!(backend.types_lowered, 2);
    }
}
