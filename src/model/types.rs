use std::{collections::HashMap, fmt::Display, rc::Rc};

use lazy_static::lazy_static;

lazy_static! {
    /// Type keywords that resolve without a symbol table.
    pub static ref NATIVE_LOOKUP: HashMap<&'static str, TypeKeyword> = {
        let mut map = HashMap::new();
        map.insert("string", TypeKeyword::Native(Native::String));
        map.insert("bool", TypeKeyword::Native(Native::Bool));
        map.insert("i32", TypeKeyword::Native(Native::I32));
        map.insert("i64", TypeKeyword::Native(Native::I64));
        map.insert("f32", TypeKeyword::Native(Native::F32));
        map.insert("f64", TypeKeyword::Native(Native::F64));
        map.insert("void", TypeKeyword::Void);
        map.insert("any", TypeKeyword::Any);
        map
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKeyword {
    Native(Native),
    Void,
    Any,
}

impl TypeKeyword {
    pub fn to_type(self) -> Type {
        match self {
            TypeKeyword::Native(native) => Type::native(native),
            TypeKeyword::Void => Type::void(),
            TypeKeyword::Any => Type::any(),
        }
    }
}

/// Handle of a definition in the session's definition arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Native {
    String,
    Bool,
    I32,
    I64,
    F32,
    F64,
}

impl Native {
    pub fn name(&self) -> &'static str {
        match self {
            Native::String => "string",
            Native::Bool => "bool",
            Native::I32 => "i32",
            Native::I64 => "i64",
            Native::F32 => "f32",
            Native::F64 => "f64",
        }
    }
}

/// Array adornment of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(u32),
    /// Size decided at allocation
    Auto,
}

/// Reference to a definition. Equality is by identity only, the name is
/// kept for diagnostics.
#[derive(Debug, Clone)]
pub struct DefRef {
    pub id: DefId,
    pub name: Rc<str>,
}

impl PartialEq for DefRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Native(Native),
    Void,
    /// Wildcard accepted everywhere, used by variadic intrinsics
    Any,
    Def(DefRef),
    Tuple(Vec<Type>),
    /// Opaque host value
    Extern(String),
}

/// A resolved type. The derived `PartialEq` is exact identity (the
/// wildcard only equals itself); `is_equals` is the structural relation
/// the language uses.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    pub array: Option<Arity>,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type { kind, array: None }
    }

    pub fn native(native: Native) -> Self {
        Type::new(TypeKind::Native(native))
    }

    pub fn void() -> Self {
        Type::new(TypeKind::Void)
    }

    pub fn any() -> Self {
        Type::new(TypeKind::Any)
    }

    pub fn def(id: DefId, name: &str) -> Self {
        Type::new(TypeKind::Def(DefRef {
            id,
            name: Rc::from(name),
        }))
    }

    pub fn tuple(fields: Vec<Type>) -> Self {
        Type::new(TypeKind::Tuple(fields))
    }

    pub fn with_array(mut self, arity: Arity) -> Self {
        self.array = Some(arity);
        self
    }

    /// The element type of an array, or the type itself for scalars.
    pub fn element(&self) -> Type {
        Type::new(self.kind.clone())
    }

    pub fn is_void(&self) -> bool {
        self.kind == TypeKind::Void && self.array.is_none()
    }

    pub fn is_array(&self) -> bool {
        self.array.is_some()
    }

    pub fn is_native(&self, native: Native) -> bool {
        self.kind == TypeKind::Native(native) && self.array.is_none()
    }

    pub fn as_def(&self) -> Option<&DefRef> {
        match (&self.kind, self.array) {
            (TypeKind::Def(def), None) => Some(def),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Type]> {
        match (&self.kind, self.array) {
            (TypeKind::Tuple(fields), None) => Some(fields),
            _ => None,
        }
    }

    /// Structural equality. Definition references compare by identity,
    /// tuples pairwise, arrays must agree on arity and the wildcard equals
    /// everything.
    pub fn is_equals(&self, other: &Type) -> bool {
        if self.kind == TypeKind::Any || other.kind == TypeKind::Any {
            return true;
        }

        if self.array != other.array {
            return false;
        }

        match (&self.kind, &other.kind) {
            (TypeKind::Native(a), TypeKind::Native(b)) => a == b,
            (TypeKind::Void, TypeKind::Void) => true,
            (TypeKind::Def(a), TypeKind::Def(b)) => a == b,
            (TypeKind::Tuple(a), TypeKind::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.is_equals(b))
            }
            (TypeKind::Extern(a), TypeKind::Extern(b)) => a == b,
            _ => false,
        }
    }

    /// Whether a parameter of this type accepts an argument of type
    /// `argument`. Same as `is_equals` except that an `auto` array
    /// parameter accepts arrays of any size, and only arrays.
    pub fn accepts(&self, argument: &Type) -> bool {
        if self.array == Some(Arity::Auto) {
            return argument.is_array() && self.element().is_equals(&argument.element());
        }

        self.is_equals(argument)
    }

    /// Byte width of a value of this type when stored in memory. Composite
    /// values are stored as 32-bit pointers.
    pub fn width(&self) -> u32 {
        match (&self.kind, self.array) {
            (_, Some(_)) => 4,
            (TypeKind::Void, None) => 0,
            (TypeKind::Native(Native::I64 | Native::F64), None) => 8,
            _ => 4,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TypeKind::Native(native) => write!(f, "{}", native.name())?,
            TypeKind::Void => write!(f, "void")?,
            TypeKind::Any => write!(f, "any")?,
            TypeKind::Def(def) => write!(f, "{}", def.name)?,
            TypeKind::Tuple(fields) => {
                let fields: Vec<String> = fields.iter().map(|field| field.to_string()).collect();
                write!(f, "({})", fields.join(", "))?
            }
            TypeKind::Extern(name) => write!(f, "extern {}", name)?,
        }

        match self.array {
            None => Ok(()),
            Some(Arity::Auto) => write!(f, "[]"),
            Some(Arity::Fixed(size)) => write!(f, "[{}]", size),
        }
    }
}

/// Formats a list of types as `a, b, c`.
pub fn format_types(types: &[Type]) -> String {
    types
        .iter()
        .map(|ty| ty.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
