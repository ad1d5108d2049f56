//! Resolved types and the generic signatures built on top of them.
//!
//! A [`Type`] is a path naming a built-in or declared type plus its generic
//! arguments. Two types are the same iff they have the same shape; see
//! [`crate::eq`].

use std::fmt;

use crate::eq::{DeepEq, DepthExceeded};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub path: Vec<String>,
    pub args: Vec<Type>,
}

/// Integer families accepted as contextual types for numeric literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
}

impl IntKind {
    pub const ALL: [IntKind; 6] = [
        IntKind::U8,
        IntKind::I8,
        IntKind::U16,
        IntKind::I16,
        IntKind::U32,
        IntKind::I32,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IntKind::U8 => "u8",
            IntKind::I8 => "i8",
            IntKind::U16 => "u16",
            IntKind::I16 => "i16",
            IntKind::U32 => "u32",
            IntKind::I32 => "i32",
        }
    }

    pub fn from_name(name: &str) -> Option<IntKind> {
        IntKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Inclusive value range.
    pub fn range(self) -> (f64, f64) {
        match self {
            IntKind::U8 => (0.0, u8::MAX as f64),
            IntKind::I8 => (i8::MIN as f64, i8::MAX as f64),
            IntKind::U16 => (0.0, u16::MAX as f64),
            IntKind::I16 => (i16::MIN as f64, i16::MAX as f64),
            IntKind::U32 => (0.0, u32::MAX as f64),
            IntKind::I32 => (i32::MIN as f64, i32::MAX as f64),
        }
    }

    pub fn accepts(self, value: f64) -> bool {
        let (min, max) = self.range();
        value.fract() == 0.0 && value >= min && value <= max
    }
}

impl Type {
    pub fn new(path: Vec<String>, args: Vec<Type>) -> Self {
        Type { path, args }
    }

    pub fn named(name: &str) -> Self {
        Type::new(vec![name.to_string()], Vec::new())
    }

    pub fn int(kind: IntKind) -> Self {
        Type::named(kind.name())
    }

    pub fn str() -> Self {
        Type::named("str")
    }

    pub fn bool() -> Self {
        Type::named("bool")
    }

    pub fn vec(item: Type) -> Self {
        Type::new(vec!["vec".to_string()], vec![item])
    }

    pub fn int_kind(&self) -> Option<IntKind> {
        match self.path.as_slice() {
            [name] if self.args.is_empty() => IntKind::from_name(name),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.int_kind().is_some()
    }

    pub fn is_str(&self) -> bool {
        self.is_simple("str")
    }

    pub fn is_bool(&self) -> bool {
        self.is_simple("bool")
    }

    /// Item type of a `vec<T>`.
    pub fn vec_item(&self) -> Option<&Type> {
        match (self.path.as_slice(), self.args.as_slice()) {
            ([name], [item]) if name == "vec" => Some(item),
            _ => None,
        }
    }

    pub fn is_dict(&self) -> bool {
        matches!(self.path.as_slice(), [name] if name == "dict")
    }

    fn is_simple(&self, name: &str) -> bool {
        self.args.is_empty() && matches!(self.path.as_slice(), [n] if n == name)
    }
}

impl DeepEq for Type {
    fn deep_eq(&self, other: &Self, depth: usize) -> Result<bool, DepthExceeded> {
        let depth = depth.checked_sub(1).ok_or(DepthExceeded {
            limit: crate::eq::DEFAULT_DEPTH,
        })?;
        Ok(self.path.deep_eq(&other.path, depth)? && self.args.deep_eq(&other.args, depth)?)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join("."))?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// A parameter or return type that may mention generic slots.
#[derive(Debug, Clone, PartialEq)]
pub enum TypePattern {
    /// Generic parameter slot of the enclosing signature.
    Generic(usize),
    Apply {
        path: Vec<String>,
        args: Vec<TypePattern>,
    },
}

impl TypePattern {
    pub fn named(name: &str) -> Self {
        TypePattern::Apply {
            path: vec![name.to_string()],
            args: Vec::new(),
        }
    }

    /// Substitute bound slots. `None` if some slot is still unbound.
    pub fn instantiate(&self, bindings: &[Option<Type>]) -> Option<Type> {
        match self {
            TypePattern::Generic(slot) => bindings.get(*slot).cloned().flatten(),
            TypePattern::Apply { path, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.instantiate(bindings))
                    .collect::<Option<Vec<_>>>()?;
                Some(Type::new(path.clone(), args))
            }
        }
    }

    /// Match `ty` against the pattern, binding slots on first sight and
    /// requiring later occurrences of a slot to agree structurally.
    pub fn unify(&self, ty: &Type, bindings: &mut [Option<Type>]) -> Result<bool, DepthExceeded> {
        match self {
            TypePattern::Generic(slot) => match &bindings[*slot] {
                Some(bound) => crate::eq::eq(bound, ty),
                None => {
                    bindings[*slot] = Some(ty.clone());
                    Ok(true)
                }
            },
            TypePattern::Apply { path, args } => {
                if !crate::eq::eq(path, &ty.path)? || args.len() != ty.args.len() {
                    return Ok(false);
                }
                for (pattern, arg) in args.iter().zip(&ty.args) {
                    if !pattern.unify(arg, bindings)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

impl From<&Type> for TypePattern {
    fn from(ty: &Type) -> Self {
        TypePattern::Apply {
            path: ty.path.clone(),
            args: ty.args.iter().map(TypePattern::from).collect(),
        }
    }
}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypePattern::Generic(slot) => write!(f, "T{slot}"),
            TypePattern::Apply { path, args } => {
                write!(f, "{}", path.join("."))?;
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eq::eq;

    fn nested_vec(levels: usize) -> Type {
        (0..levels).fold(Type::str(), |ty, _| Type::vec(ty))
    }

    #[test]
    fn structural_equality_is_reflexive_and_symmetric() {
        let a = Type::vec(Type::int(IntKind::I32));
        let b = Type::vec(Type::int(IntKind::I32));
        let c = Type::vec(Type::str());
        assert!(eq(&a, &a).unwrap());
        assert!(eq(&a, &b).unwrap() && eq(&b, &a).unwrap());
        assert!(!eq(&a, &c).unwrap() && !eq(&c, &a).unwrap());
    }

    #[test]
    fn structural_equality_is_transitive() {
        let grid = || Type::vec(Type::vec(Type::int(IntKind::U8)));
        let dict = |value: Type| Type::new(vec!["dict".to_string()], vec![Type::str(), value]);
        let types = [
            grid(),
            grid(),
            grid(),
            Type::vec(Type::vec(Type::int(IntKind::I8))),
            Type::vec(Type::int(IntKind::U8)),
            dict(grid()),
            dict(grid()),
            dict(Type::vec(Type::str())),
        ];
        for a in &types {
            for b in &types {
                for c in &types {
                    if eq(a, b).unwrap() && eq(b, c).unwrap() {
                        assert!(eq(a, c).unwrap(), "{a} = {b} = {c}");
                    }
                }
            }
        }
        assert!(eq(&types[0], &types[1]).unwrap() && eq(&types[1], &types[2]).unwrap());
        assert!(eq(&types[0], &types[2]).unwrap());
        assert!(!eq(&types[0], &types[3]).unwrap());
    }

    #[test]
    fn vec_equality_follows_item_equality() {
        for (x, y) in [(Type::str(), Type::str()), (Type::str(), Type::bool())] {
            assert_eq!(
                eq(&Type::vec(x.clone()), &Type::vec(y.clone())).unwrap(),
                eq(&x, &y).unwrap()
            );
        }
    }

    #[test]
    fn depth_guard_rejects_runaway_nesting() {
        assert!(eq(&nested_vec(5), &nested_vec(5)).unwrap());
        assert!(eq(&nested_vec(12), &nested_vec(12)).is_err());
    }

    #[test]
    fn integer_ranges() {
        assert!(IntKind::U8.accepts(255.0));
        assert!(!IntKind::U8.accepts(256.0));
        assert!(!IntKind::U32.accepts(-1.0));
        assert!(IntKind::I8.accepts(-128.0));
        assert!(!IntKind::I32.accepts(1.5));
    }

    #[test]
    fn generic_slot_binds_once() {
        let push_item = TypePattern::Generic(0);
        let push_vec = TypePattern::Apply {
            path: vec!["vec".to_string()],
            args: vec![TypePattern::Generic(0)],
        };
        let mut bindings = vec![None];
        assert!(push_vec.unify(&Type::vec(Type::str()), &mut bindings).unwrap());
        assert!(push_item.unify(&Type::str(), &mut bindings).unwrap());
        assert!(!push_item.unify(&Type::bool(), &mut bindings).unwrap());
        assert_eq!(push_vec.instantiate(&bindings), Some(Type::vec(Type::str())));
    }

    #[test]
    fn instantiate_requires_bound_slots() {
        assert_eq!(TypePattern::Generic(0).instantiate(&[None]), None);
    }
}
