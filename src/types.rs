//! Opaque type descriptors, attributes, and interners.
//!
//! Types are consumed here as opaque handles: the type-checker (an
//! external collaborator) decides what a type *means*; this module only
//! answers structural queries (address-ness, triviality, aggregate kind,
//! field lookup). `TypeData` is interned so that identical descriptors
//! always yield the same `TypeRef`.

use std::collections::HashMap;

use cranelift_entity::PrimaryMap;
use smallvec::SmallVec;

use crate::location::Location;
use crate::refs::{FuncRef, GlobalRef, PathRef, TypeRef};
use crate::symbol::Symbol;

// ============================================================================
// Attribute
// ============================================================================

/// Generic attribute values stored on instructions.
///
/// Narrow per-opcode views in [`crate::inst`] interpret these; passes
/// should not read the attribute map directly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Unit/nil value.
    Unit,
    Bool(bool),
    /// Integer constant stored as raw bits (signless).
    IntBits(u64),
    /// Float constant stored as raw bits.
    FloatBits(u64),
    String(String),
    /// Single interned symbol.
    Symbol(Symbol),
    Type(TypeRef),
    /// Reference to a function in the same context.
    Function(FuncRef),
    /// Reference to a global variable in the same context.
    Global(GlobalRef),
    /// List of attributes.
    List(Vec<Attribute>),
}

impl From<i64> for Attribute {
    fn from(value: i64) -> Self {
        Attribute::IntBits(u64::from_ne_bytes(value.to_ne_bytes()))
    }
}

impl From<u64> for Attribute {
    fn from(value: u64) -> Self {
        Attribute::IntBits(value)
    }
}

impl From<bool> for Attribute {
    fn from(value: bool) -> Self {
        Attribute::Bool(value)
    }
}

impl From<Symbol> for Attribute {
    fn from(value: Symbol) -> Self {
        Attribute::Symbol(value)
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Attribute::String(value)
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::String(value.to_string())
    }
}

impl From<TypeRef> for Attribute {
    fn from(value: TypeRef) -> Self {
        Attribute::Type(value)
    }
}

impl From<Vec<Attribute>> for Attribute {
    fn from(value: Vec<Attribute>) -> Self {
        Attribute::List(value)
    }
}

// ============================================================================
// TypeData
// ============================================================================

/// Structural kind of a type descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Scalar with no queryable structure (integers, floats, raw pointers).
    Primitive,
    Class,
    Struct,
    Enum,
    Tuple,
    /// Function type; used for `function_ref` results.
    Function,
}

/// A named field of a nominal type, an element of a tuple, or a case of
/// an enum (payload type).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: Symbol,
    pub ty: TypeRef,
}

/// Data for a single interned type descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeData {
    pub name: Symbol,
    pub kind: TypeKind,
    /// Whether this handle denotes the *address of* a value rather than
    /// the value itself.
    pub is_address: bool,
    /// Trivially copyable; no ownership operations required.
    pub is_trivial: bool,
    /// Managed by reference counting.
    pub is_reference_counted: bool,
    /// Contains a raw pointer somewhere in its layout.
    pub contains_raw_pointer: bool,
    /// Fields (nominal), elements (tuple), or cases (enum).
    pub fields: SmallVec<[Field; 4]>,
}

/// Builder for constructing `TypeData` with a fluent API.
///
/// Defaults to a trivial, non-address primitive with no fields.
pub struct TypeDataBuilder {
    name: Symbol,
    kind: TypeKind,
    is_address: bool,
    is_trivial: bool,
    is_reference_counted: bool,
    contains_raw_pointer: bool,
    fields: SmallVec<[Field; 4]>,
}

impl TypeDataBuilder {
    pub fn new(name: Symbol, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            is_address: false,
            is_trivial: true,
            is_reference_counted: false,
            contains_raw_pointer: false,
            fields: SmallVec::new(),
        }
    }

    pub fn address(mut self) -> Self {
        self.is_address = true;
        self
    }

    pub fn non_trivial(mut self) -> Self {
        self.is_trivial = false;
        self
    }

    pub fn reference_counted(mut self) -> Self {
        self.is_reference_counted = true;
        self.is_trivial = false;
        self
    }

    pub fn raw_pointer(mut self) -> Self {
        self.contains_raw_pointer = true;
        self
    }

    pub fn field(mut self, name: Symbol, ty: TypeRef) -> Self {
        self.fields.push(Field { name, ty });
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = (Symbol, TypeRef)>) -> Self {
        self.fields
            .extend(fields.into_iter().map(|(name, ty)| Field { name, ty }));
        self
    }

    pub fn build(self) -> TypeData {
        TypeData {
            name: self.name,
            kind: self.kind,
            is_address: self.is_address,
            is_trivial: self.is_trivial,
            is_reference_counted: self.is_reference_counted,
            contains_raw_pointer: self.contains_raw_pointer,
            fields: self.fields,
        }
    }
}

// ============================================================================
// TypeInterner
// ============================================================================

/// Deduplicating type interner. Same `TypeData` always yields the same `TypeRef`.
///
/// All structural queries on type handles live here; a `TypeRef` by
/// itself is opaque.
pub struct TypeInterner {
    types: PrimaryMap<TypeRef, TypeData>,
    dedup: HashMap<TypeData, TypeRef>,
}

impl TypeInterner {
    pub fn new() -> Self {
        Self {
            types: PrimaryMap::new(),
            dedup: HashMap::default(),
        }
    }

    /// Intern a type, returning an existing ref if the data matches.
    pub fn intern(&mut self, data: TypeData) -> TypeRef {
        if let Some(&existing) = self.dedup.get(&data) {
            return existing;
        }
        let r = self.types.push(data.clone());
        self.dedup.insert(data, r);
        r
    }

    /// Intern the address counterpart of `ty`.
    pub fn address_of(&mut self, ty: TypeRef) -> TypeRef {
        let mut data = self.types[ty].clone();
        data.is_address = true;
        self.intern(data)
    }

    /// Look up type data by reference.
    pub fn get(&self, r: TypeRef) -> &TypeData {
        &self.types[r]
    }

    // ------------------------------------------------------------------
    // Structural queries
    // ------------------------------------------------------------------

    pub fn is_address(&self, r: TypeRef) -> bool {
        self.types[r].is_address
    }

    pub fn is_trivial(&self, r: TypeRef) -> bool {
        self.types[r].is_trivial
    }

    pub fn is_reference_counted(&self, r: TypeRef) -> bool {
        self.types[r].is_reference_counted
    }

    pub fn is_non_trivial_or_contains_raw_pointer(&self, r: TypeRef) -> bool {
        let data = &self.types[r];
        !data.is_trivial || data.contains_raw_pointer
    }

    pub fn is_nominal(&self, r: TypeRef) -> bool {
        matches!(
            self.types[r].kind,
            TypeKind::Class | TypeKind::Struct | TypeKind::Enum
        )
    }

    pub fn is_class(&self, r: TypeRef) -> bool {
        self.types[r].kind == TypeKind::Class
    }

    pub fn is_struct(&self, r: TypeRef) -> bool {
        self.types[r].kind == TypeKind::Struct
    }

    pub fn is_enum(&self, r: TypeRef) -> bool {
        self.types[r].kind == TypeKind::Enum
    }

    pub fn is_tuple(&self, r: TypeRef) -> bool {
        self.types[r].kind == TypeKind::Tuple
    }

    /// Number of tuple elements.
    ///
    /// # Panics
    ///
    /// Panics if `r` is not a tuple type.
    pub fn num_tuple_elements(&self, r: TypeRef) -> usize {
        let data = &self.types[r];
        assert!(
            data.kind == TypeKind::Tuple,
            "num_tuple_elements: {} is not a tuple type",
            data.name,
        );
        data.fields.len()
    }

    /// Type of the i-th tuple element.
    ///
    /// # Panics
    ///
    /// Panics if `r` is not a tuple type or `index` is out of range.
    pub fn tuple_element_type(&self, r: TypeRef, index: usize) -> TypeRef {
        let data = &self.types[r];
        assert!(
            data.kind == TypeKind::Tuple,
            "tuple_element_type: {} is not a tuple type",
            data.name,
        );
        data.fields[index].ty
    }

    /// Number of fields of a nominal type.
    ///
    /// # Panics
    ///
    /// Panics if `r` is not a nominal type.
    pub fn num_fields(&self, r: TypeRef) -> usize {
        assert!(
            self.is_nominal(r),
            "num_fields: {} is not a nominal type",
            self.types[r].name,
        );
        self.types[r].fields.len()
    }

    /// Type of the i-th field of a nominal type.
    ///
    /// # Panics
    ///
    /// Panics if `r` is not a nominal type or `index` is out of range.
    pub fn field_type(&self, r: TypeRef, index: usize) -> TypeRef {
        assert!(
            self.is_nominal(r),
            "field_type: {} is not a nominal type",
            self.types[r].name,
        );
        self.types[r].fields[index].ty
    }

    /// Index of the field with the given name, or `None` if absent.
    pub fn field_index_by_name(&self, r: TypeRef, name: Symbol) -> Option<usize> {
        self.types[r].fields.iter().position(|f| f.name == name)
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PathInterner
// ============================================================================

/// Deduplicating path (URI string) interner.
pub struct PathInterner {
    paths: PrimaryMap<PathRef, String>,
    dedup: HashMap<String, PathRef>,
}

impl PathInterner {
    pub fn new() -> Self {
        Self {
            paths: PrimaryMap::new(),
            dedup: HashMap::default(),
        }
    }

    /// Intern a path string, returning an existing ref if the string matches.
    pub fn intern(&mut self, path: String) -> PathRef {
        if let Some(&existing) = self.dedup.get(&path) {
            return existing;
        }
        let r = self.paths.push(path.clone());
        self.dedup.insert(path, r);
        r
    }

    /// Look up path string by reference.
    pub fn get(&self, r: PathRef) -> &str {
        &self.paths[r]
    }

    /// Intern a synthetic location for nodes without a source position.
    pub fn unknown_location(&mut self) -> Location {
        let path = self.intern("unknown://".to_owned());
        Location::new(path, crate::location::Span::new(0, 0))
    }
}

impl Default for PathInterner {
    fn default() -> Self {
        Self::new()
    }
}
