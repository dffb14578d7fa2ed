//! TypeScript IR types for code generation.
//!
//! This module defines the TypeScript type system representation:
//! - TsType: Types (primitives, arrays, unions, objects, etc.)
//! - TsExpr: Expressions (identifiers, calls, arrows, etc.)
//! - TsLiteral: Literal values (strings, numbers, booleans)
//! - TsTypeDef / TsFunction: top-level declarations

use std::collections::BTreeSet;

/// TypeScript type representation
#[derive(Debug, Clone, PartialEq)]
pub enum TsType {
    /// Primitive types: string, number, boolean, null, undefined, void, unknown, never
    Primitive(TsPrimitive),
    /// Array type: T[]
    Array(Box<TsType>),
    /// Union type: A | B | C
    Union(Vec<TsType>),
    /// Intersection type: A & B & C
    Intersection(Vec<TsType>),
    /// Object type: { foo: string; bar?: number }
    Object(Vec<TsProp>),
    /// Record type: Record<K, V>
    Record {
        /// Key type
        key: Box<TsType>,
        /// Value type
        value: Box<TsType>,
    },
    /// Literal type: "foo", 42, true
    Literal(TsLiteral),
    /// Named type reference
    Ref(String),
    /// Generic application: Name<A, B>
    Generic {
        /// Generic type name
        name: String,
        /// Type arguments in order
        args: Vec<TsType>,
    },
    /// Type query: typeof value
    TypeOf(String),
}

impl TsType {
    /// `unknown`
    pub fn unknown() -> Self {
        TsType::Primitive(TsPrimitive::Unknown)
    }

    /// `name<args>`
    pub fn generic(name: impl Into<String>, args: Vec<TsType>) -> Self {
        TsType::Generic {
            name: name.into(),
            args,
        }
    }

    /// Union of `types`; a single member stands alone, no members is `never`.
    pub fn union(mut types: Vec<TsType>) -> Self {
        match types.len() {
            0 => TsType::Primitive(TsPrimitive::Never),
            1 => types.remove(0),
            _ => TsType::Union(types),
        }
    }

    /// Collect the names of all type references inside this type.
    pub fn collect_refs(&self, out: &mut BTreeSet<String>) {
        match self {
            TsType::Primitive(_) | TsType::Literal(_) => {}
            TsType::Array(inner) => inner.collect_refs(out),
            TsType::Union(types) | TsType::Intersection(types) => {
                for t in types {
                    t.collect_refs(out);
                }
            }
            TsType::Object(props) => {
                for p in props {
                    p.ty.collect_refs(out);
                }
            }
            TsType::Record { key, value } => {
                key.collect_refs(out);
                value.collect_refs(out);
            }
            TsType::Ref(name) | TsType::TypeOf(name) => {
                out.insert(name.clone());
            }
            TsType::Generic { name, args } => {
                out.insert(name.clone());
                for a in args {
                    a.collect_refs(out);
                }
            }
        }
    }
}

/// TypeScript primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsPrimitive {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `void`
    Void,
    /// `unknown`
    Unknown,
    /// `never`
    Never,
}

/// Object property definition
#[derive(Debug, Clone, PartialEq)]
pub struct TsProp {
    /// Property name, quoted on emit when it is not an identifier
    pub name: String,
    /// Property type
    pub ty: TsType,
    /// Emitted as `name?:`
    pub optional: bool,
    /// JSDoc text
    pub doc: Option<String>,
}

impl TsProp {
    /// Property without documentation.
    pub fn new(name: impl Into<String>, ty: TsType, optional: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            optional,
            doc: None,
        }
    }
}

/// TypeScript literal values
#[derive(Debug, Clone, PartialEq)]
pub enum TsLiteral {
    /// Double-quoted string
    String(String),
    /// Floating-point number
    Number(f64),
    /// Integer
    Int(i64),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
}

/// TypeScript expression
#[derive(Debug, Clone)]
pub enum TsExpr {
    /// Identifier: foo
    Ident(String),
    /// Literal value: "bar", 42
    Literal(TsLiteral),
    /// Function call: foo<T>(a, b)
    Call {
        /// Function being called
        callee: Box<TsExpr>,
        /// Explicit type arguments, omitted when empty
        type_args: Vec<TsType>,
        /// Call arguments
        args: Vec<TsExpr>,
    },
    /// Arrow function: (x) => x.foo
    Arrow {
        /// Parameters
        params: Vec<TsParam>,
        /// Expression body
        body: Box<TsExpr>,
    },
    /// Object literal: { a: 1, b: 2 }; spread values are emitted without their key
    Object(Vec<(String, TsExpr)>),
    /// Member access: foo.bar
    Member {
        /// Object being accessed
        object: Box<TsExpr>,
        /// Property name
        prop: String,
    },
    /// Spread: ...options
    Spread(Box<TsExpr>),
    /// Strict comparison: a === b
    BinOp {
        /// Left operand
        left: Box<TsExpr>,
        /// Operator
        op: BinOp,
        /// Right operand
        right: Box<TsExpr>,
    },
    /// Ternary/conditional: cond ? a : b
    Ternary {
        /// Condition
        cond: Box<TsExpr>,
        /// Value when the condition holds
        then_expr: Box<TsExpr>,
        /// Value otherwise
        else_expr: Box<TsExpr>,
    },
    /// Parenthesized expression: (expr)
    Paren(Box<TsExpr>),
    /// Array literal: [a, b, c]
    Array(Vec<TsExpr>),
    /// Type cast: expr as Type
    Cast {
        /// Expression being cast
        expr: Box<TsExpr>,
        /// Target type; `const` for const assertions
        ty: TsType,
    },
}

impl TsExpr {
    /// Bare identifier.
    pub fn ident(name: impl Into<String>) -> Self {
        TsExpr::Ident(name.into())
    }

    /// String literal.
    pub fn string(value: impl Into<String>) -> Self {
        TsExpr::Literal(TsLiteral::String(value.into()))
    }

    /// Call without type arguments.
    pub fn call(callee: TsExpr, args: Vec<TsExpr>) -> Self {
        TsExpr::Call {
            callee: Box::new(callee),
            type_args: Vec::new(),
            args,
        }
    }

    /// Collect identifiers and type names this expression mentions.
    pub fn collect_refs(&self, out: &mut BTreeSet<String>) {
        match self {
            TsExpr::Ident(name) => {
                out.insert(name.clone());
            }
            TsExpr::Literal(_) => {}
            TsExpr::Call {
                callee,
                type_args,
                args,
            } => {
                callee.collect_refs(out);
                for t in type_args {
                    t.collect_refs(out);
                }
                for a in args {
                    a.collect_refs(out);
                }
            }
            TsExpr::Arrow { params, body } => {
                for p in params {
                    p.ty.collect_refs(out);
                }
                body.collect_refs(out);
            }
            TsExpr::Object(props) => {
                for (_, v) in props {
                    v.collect_refs(out);
                }
            }
            TsExpr::Member { object, .. } => object.collect_refs(out),
            TsExpr::Spread(e) | TsExpr::Paren(e) => e.collect_refs(out),
            TsExpr::BinOp { left, right, .. } => {
                left.collect_refs(out);
                right.collect_refs(out);
            }
            TsExpr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                cond.collect_refs(out);
                then_expr.collect_refs(out);
                else_expr.collect_refs(out);
            }
            TsExpr::Array(items) => {
                for i in items {
                    i.collect_refs(out);
                }
            }
            TsExpr::Cast { expr, ty } => {
                expr.collect_refs(out);
                ty.collect_refs(out);
            }
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy)]
pub enum BinOp {
    /// `===`
    StrictEqual,
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct TsParam {
    /// Name or destructuring pattern
    pub name: String,
    /// Annotated type
    pub ty: TsType,
    /// Emitted as `name?:`
    pub optional: bool,
}

impl TsParam {
    /// Typed parameter.
    pub fn new(name: impl Into<String>, ty: TsType, optional: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            optional,
        }
    }
}

// =============================================================================
// Module-Level IR (for printer)
// =============================================================================

/// Import statement
#[derive(Debug, Clone)]
pub struct TsImport {
    /// Items to import
    pub items: Vec<ImportItem>,
    /// Module path
    pub from: String,
    /// Whether this is a type-only import
    pub type_only: bool,
}

/// Import item
#[derive(Debug, Clone)]
pub struct ImportItem {
    /// Imported name
    pub name: String,
}

impl ImportItem {
    /// Import `name` under its own name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Type definition kind
#[derive(Debug, Clone)]
pub enum TypeDefKind {
    /// interface Foo { ... }
    Interface {
        /// Members in declaration order
        properties: Vec<TsProp>,
    },
    /// type Foo = ...
    TypeAlias {
        /// Aliased type
        ty: TsType,
    },
    /// const Foo = { ... } as const; type Foo = ...
    ConstEnum {
        /// Key and literal value per enum member
        values: Vec<(String, TsLiteral)>,
    },
}

/// Type definition
#[derive(Debug, Clone)]
pub struct TsTypeDef {
    /// Declared identifier
    pub name: String,
    /// Declaration form
    pub kind: TypeDefKind,
    /// JSDoc text
    pub doc: Option<String>,
    /// Line comment emitted above the declaration
    pub note: Option<String>,
}

impl TsTypeDef {
    /// `export type name = ty;` without doc or note.
    pub fn alias(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            kind: TypeDefKind::TypeAlias { ty },
            doc: None,
            note: None,
        }
    }

    /// Names of all types this declaration refers to.
    pub fn references(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        match &self.kind {
            TypeDefKind::Interface { properties } => {
                for p in properties {
                    p.ty.collect_refs(&mut out);
                }
            }
            TypeDefKind::TypeAlias { ty } => ty.collect_refs(&mut out),
            TypeDefKind::ConstEnum { .. } => {}
        }
        out
    }
}

/// Statement in a function body
#[derive(Debug, Clone)]
pub enum TsStmt {
    /// Return statement
    Return(TsExpr),
}

/// Function definition
#[derive(Debug, Clone)]
pub struct TsFunction {
    /// Declared identifier
    pub name: String,
    /// JSDoc text
    pub doc: Option<String>,
    /// Type parameters with their defaults, e.g. `TData = Foo`
    pub type_params: Vec<String>,
    /// Parameters in order
    pub params: Vec<TsParam>,
    /// Statements of the body
    pub body: Vec<TsStmt>,
    /// Prefixed with `export`
    pub is_export: bool,
    /// `const name = (...) => {...}` instead of `function name(...) {...}`
    pub is_arrow: bool,
}

impl TsFunction {
    /// Identifiers and type names the function's signature and body mention.
    ///
    /// Parameter names shadow nothing here; callers filter the result down
    /// to names they actually declare.
    pub fn references(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for p in &self.params {
            p.ty.collect_refs(&mut out);
        }
        for stmt in &self.body {
            let TsStmt::Return(expr) = stmt;
            expr.collect_refs(&mut out);
        }
        out
    }
}
