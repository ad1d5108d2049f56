//! Built-in types, namespaces and functions.
//!
//! The registry is closed: integer families, `str`, `bool`, `vec<T>`,
//! `dict<K, V>`, the `IO` namespace and the generic `push`. It does not
//! perform any I/O itself; the code generator decides how each
//! [`NativeFn`] is lowered.

use crate::types::{IntKind, TypePattern};

/// Host functions a native call can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFn {
    /// `IO.open(str) -> IO.file`
    Open,
    /// `IO.print(str) -> void`
    Print,
    /// `push<T>(ref vec<T>, T) -> void`
    Push,
}

impl NativeFn {
    pub fn qualified_name(self) -> &'static str {
        match self {
            NativeFn::Open => "IO.open",
            NativeFn::Print => "IO.print",
            NativeFn::Push => "push",
        }
    }
}

/// How a call to a function is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnImpl {
    Native(NativeFn),
    /// Index of a user function in the namespace.
    Namespace(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSig {
    pub ty: TypePattern,
    pub by_ref: bool,
}

/// A callable signature. Generic slots are numbered `0..generics`.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<ParamSig>,
    /// `None` for `void`.
    pub ret: Option<TypePattern>,
    pub generics: usize,
    pub implementation: FnImpl,
}

/// Metadata about a single builtin symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinDecl {
    Type {
        path: Vec<String>,
        /// Number of generic arguments the type takes.
        arity: usize,
    },
    Namespace {
        name: &'static str,
        members: Vec<(&'static str, BuiltinDecl)>,
    },
    Function(Signature),
}

impl BuiltinDecl {
    pub fn member(&self, name: &str) -> Option<&BuiltinDecl> {
        match self {
            BuiltinDecl::Namespace { members, .. } => find(members, name),
            _ => None,
        }
    }
}

/// The complete set of builtins known to the compiler.
#[derive(Debug, Clone)]
pub struct Registry {
    decls: Vec<(&'static str, BuiltinDecl)>,
}

impl Registry {
    pub fn standard() -> Self {
        let mut decls: Vec<(&'static str, BuiltinDecl)> = IntKind::ALL
            .into_iter()
            .map(|kind| (kind.name(), simple_type(&[kind.name()], 0)))
            .collect();
        decls.push(("str", simple_type(&["str"], 0)));
        decls.push(("bool", simple_type(&["bool"], 0)));
        decls.push(("vec", simple_type(&["vec"], 1)));
        decls.push(("dict", simple_type(&["dict"], 2)));
        decls.push((
            "IO",
            BuiltinDecl::Namespace {
                name: "IO",
                members: vec![
                    ("file", simple_type(&["IO", "file"], 0)),
                    ("token", simple_type(&["IO", "token"], 0)),
                    (
                        "open",
                        native(
                            NativeFn::Open,
                            vec![by_value(TypePattern::named("str"))],
                            Some(TypePattern::Apply {
                                path: vec!["IO".to_string(), "file".to_string()],
                                args: Vec::new(),
                            }),
                            0,
                        ),
                    ),
                    (
                        "print",
                        native(
                            NativeFn::Print,
                            vec![by_value(TypePattern::named("str"))],
                            None,
                            0,
                        ),
                    ),
                ],
            },
        ));
        decls.push((
            "push",
            native(
                NativeFn::Push,
                vec![
                    ParamSig {
                        ty: TypePattern::Apply {
                            path: vec!["vec".to_string()],
                            args: vec![TypePattern::Generic(0)],
                        },
                        by_ref: true,
                    },
                    by_value(TypePattern::Generic(0)),
                ],
                None,
                1,
            ),
        ));
        Registry { decls }
    }

    /// Look up a top-level builtin by name. The table is small, so the
    /// search is linear.
    pub fn get(&self, name: &str) -> Option<&BuiltinDecl> {
        find(&self.decls, name)
    }
}

fn find<'a>(decls: &'a [(&'static str, BuiltinDecl)], name: &str) -> Option<&'a BuiltinDecl> {
    decls
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, decl)| decl)
}

fn simple_type(path: &[&str], arity: usize) -> BuiltinDecl {
    BuiltinDecl::Type {
        path: path.iter().map(|segment| segment.to_string()).collect(),
        arity,
    }
}

fn by_value(ty: TypePattern) -> ParamSig {
    ParamSig { ty, by_ref: false }
}

fn native(
    function: NativeFn,
    params: Vec<ParamSig>,
    ret: Option<TypePattern>,
    generics: usize,
) -> BuiltinDecl {
    BuiltinDecl::Function(Signature {
        name: function.qualified_name().to_string(),
        params,
        ret,
        generics,
        implementation: FnImpl::Native(function),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_namespace_members() {
        let registry = Registry::standard();
        let io = registry.get("IO").expect("IO namespace");
        let Some(BuiltinDecl::Function(print)) = io.member("print") else {
            panic!("IO.print should be a function");
        };
        assert_eq!(print.implementation, FnImpl::Native(NativeFn::Print));
        assert!(print.ret.is_none());
        assert!(io.member("missing").is_none());
    }

    #[test]
    fn push_is_generic_over_its_item_type() {
        let registry = Registry::standard();
        let Some(BuiltinDecl::Function(push)) = registry.get("push") else {
            panic!("push should be a function");
        };
        assert_eq!(push.generics, 1);
        assert!(push.params[0].by_ref);
        assert!(!push.params[1].by_ref);
    }

    #[test]
    fn integer_families_are_types() {
        let registry = Registry::standard();
        for name in ["u8", "i8", "u16", "i16", "u32", "i32"] {
            assert!(matches!(registry.get(name), Some(BuiltinDecl::Type { arity: 0, .. })));
        }
        assert!(matches!(registry.get("dict"), Some(BuiltinDecl::Type { arity: 2, .. })));
    }
}
