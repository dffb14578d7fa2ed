//! TypeScript code emission via the Emit trait.
//!
//! This module provides a trait-based approach to converting TypeScript AST nodes
//! to string representations. Each AST type implements `Emit` for clean, composable
//! code generation. Output is deterministic and unformatted beyond two-space
//! indentation; prettifying is the emitter boundary's job.

use super::types::{
    BinOp, ImportItem, TsExpr, TsFunction, TsImport, TsLiteral, TsParam, TsPrimitive, TsProp,
    TsStmt, TsType, TsTypeDef, TypeDefKind,
};
use super::utils::{escape_js_string, quote_if_needed};

/// Trait for emitting TypeScript code from AST nodes.
pub trait Emit {
    /// Convert the AST node to its TypeScript string representation.
    fn emit(&self) -> String;
}

/// Render a JSDoc block at the given indentation.
fn emit_doc(doc: &str, prefix: &str) -> String {
    let doc = doc.trim().replace("*/", "*\\/");
    let lines: Vec<&str> = doc.lines().collect();
    if lines.len() <= 1 {
        return format!("{prefix}/** {doc} */\n");
    }
    let mut output = format!("{prefix}/**\n");
    for line in lines {
        let line = line.trim_end();
        if line.is_empty() {
            output.push_str(&format!("{prefix} *\n"));
        } else {
            output.push_str(&format!("{prefix} * {line}\n"));
        }
    }
    output.push_str(&format!("{prefix} */\n"));
    output
}

/// Render object properties one per line, each with its JSDoc.
fn emit_prop_lines(props: &[TsProp]) -> String {
    let mut output = String::new();
    for prop in props {
        if let Some(doc) = &prop.doc {
            output.push_str(&emit_doc(doc, "  "));
        }
        output.push_str(&format!("  {};\n", prop.emit()));
    }
    output
}

// =============================================================================
// Primitive Types
// =============================================================================

impl Emit for TsPrimitive {
    fn emit(&self) -> String {
        let keyword = match self {
            TsPrimitive::String => "string",
            TsPrimitive::Number => "number",
            TsPrimitive::Boolean => "boolean",
            TsPrimitive::Null => "null",
            TsPrimitive::Undefined => "undefined",
            TsPrimitive::Void => "void",
            TsPrimitive::Unknown => "unknown",
            TsPrimitive::Never => "never",
        };
        keyword.to_string()
    }
}

impl Emit for TsLiteral {
    fn emit(&self) -> String {
        match self {
            TsLiteral::String(s) => format!("\"{}\"", escape_js_string(s)),
            TsLiteral::Number(n) => n.to_string(),
            TsLiteral::Int(i) => i.to_string(),
            TsLiteral::Bool(b) => b.to_string(),
            TsLiteral::Null => "null".to_string(),
        }
    }
}

// =============================================================================
// Types
// =============================================================================

impl Emit for TsType {
    fn emit(&self) -> String {
        match self {
            TsType::Primitive(p) => p.emit(),
            TsType::Array(inner) => {
                let inner_str = inner.emit();
                // Wrap complex types in parentheses
                if matches!(**inner, TsType::Union(_) | TsType::Intersection(_)) {
                    format!("({inner_str})[]")
                } else {
                    format!("{inner_str}[]")
                }
            }
            TsType::Union(types) => types.iter().map(|t| t.emit()).collect::<Vec<_>>().join(" | "),
            TsType::Intersection(types) => types
                .iter()
                .map(|t| {
                    let s = t.emit();
                    if matches!(t, TsType::Union(_)) {
                        format!("({s})")
                    } else {
                        s
                    }
                })
                .collect::<Vec<_>>()
                .join(" & "),
            TsType::Object(props) => {
                if props.is_empty() {
                    "{}".to_string()
                } else {
                    let parts: Vec<_> = props.iter().map(|p| p.emit()).collect();
                    format!("{{ {} }}", parts.join("; "))
                }
            }
            TsType::Record { key, value } => {
                format!("Record<{}, {}>", key.emit(), value.emit())
            }
            TsType::Literal(lit) => lit.emit(),
            TsType::Ref(name) => name.clone(),
            TsType::Generic { name, args } => {
                let args_str = args.iter().map(|a| a.emit()).collect::<Vec<_>>().join(", ");
                format!("{name}<{args_str}>")
            }
            TsType::TypeOf(name) => format!("typeof {name}"),
        }
    }
}

impl Emit for TsProp {
    fn emit(&self) -> String {
        let key = quote_if_needed(&self.name);
        let opt = if self.optional { "?" } else { "" };
        format!("{}{}: {}", key, opt, self.ty.emit())
    }
}

// =============================================================================
// Type Definitions
// =============================================================================

impl Emit for TsTypeDef {
    fn emit(&self) -> String {
        let mut output = String::new();
        if let Some(note) = &self.note {
            for line in note.lines() {
                output.push_str(&format!("// {line}\n"));
            }
        }
        if let Some(doc) = &self.doc {
            output.push_str(&emit_doc(doc, ""));
        }

        match &self.kind {
            TypeDefKind::Interface { properties } => {
                output.push_str(&format!("export interface {} {{\n", self.name));
                output.push_str(&emit_prop_lines(properties));
                output.push_str("}\n");
            }
            TypeDefKind::TypeAlias { ty } => match ty {
                // Top-level objects get one property per line
                TsType::Object(props) if !props.is_empty() => {
                    output.push_str(&format!("export type {} = {{\n", self.name));
                    output.push_str(&emit_prop_lines(props));
                    output.push_str("};\n");
                }
                _ => {
                    output.push_str(&format!("export type {} = {};\n", self.name, ty.emit()));
                }
            },
            TypeDefKind::ConstEnum { values } => {
                output.push_str(&format!("export const {} = {{\n", self.name));
                for (key, value) in values {
                    output.push_str(&format!("  {}: {},\n", key, value.emit()));
                }
                output.push_str("} as const;\n\n");
                output.push_str(&format!(
                    "export type {} = (typeof {})[keyof typeof {}];\n",
                    self.name, self.name, self.name
                ));
            }
        }
        output
    }
}

// =============================================================================
// Expressions
// =============================================================================

impl Emit for BinOp {
    fn emit(&self) -> String {
        match self {
            BinOp::StrictEqual => "===".to_string(),
        }
    }
}

impl Emit for TsExpr {
    fn emit(&self) -> String {
        match self {
            TsExpr::Ident(name) => name.clone(),
            TsExpr::Literal(lit) => lit.emit(),
            TsExpr::Call {
                callee,
                type_args,
                args,
            } => {
                let args_str = args.iter().map(|a| a.emit()).collect::<Vec<_>>().join(", ");
                if type_args.is_empty() {
                    format!("{}({})", callee.emit(), args_str)
                } else {
                    let type_args_str = type_args
                        .iter()
                        .map(|t| t.emit())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{}<{}>({})", callee.emit(), type_args_str, args_str)
                }
            }
            TsExpr::Arrow { params, body } => {
                let params_str = params.iter().map(|p| p.emit()).collect::<Vec<_>>().join(", ");
                format!("({}) => {}", params_str, body.emit())
            }
            TsExpr::Object(props) => {
                if props.is_empty() {
                    "{}".to_string()
                } else {
                    let parts: Vec<_> = props
                        .iter()
                        .map(|(k, v)| match v {
                            // Spreads carry no key; `{ signal: signal }` shortens to `{ signal }`
                            TsExpr::Spread(_) => v.emit(),
                            TsExpr::Ident(name) if name == k => name.clone(),
                            _ => format!("{}: {}", quote_if_needed(k), v.emit()),
                        })
                        .collect();
                    format!("{{ {} }}", parts.join(", "))
                }
            }
            TsExpr::Member { object, prop } => {
                format!("{}.{}", object.emit(), prop)
            }
            TsExpr::Spread(expr) => {
                format!("...{}", expr.emit())
            }
            TsExpr::BinOp { left, op, right } => {
                format!("{} {} {}", left.emit(), op.emit(), right.emit())
            }
            TsExpr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                format!("{} ? {} : {}", cond.emit(), then_expr.emit(), else_expr.emit())
            }
            TsExpr::Paren(expr) => format!("({})", expr.emit()),
            TsExpr::Array(items) => {
                let items_str = items.iter().map(|i| i.emit()).collect::<Vec<_>>().join(", ");
                format!("[{items_str}]")
            }
            TsExpr::Cast { expr, ty } => {
                format!("{} as {}", expr.emit(), ty.emit())
            }
        }
    }
}

impl Emit for TsParam {
    fn emit(&self) -> String {
        let opt = if self.optional { "?" } else { "" };
        format!("{}{}: {}", self.name, opt, self.ty.emit())
    }
}

// =============================================================================
// Statements
// =============================================================================

impl Emit for TsStmt {
    fn emit(&self) -> String {
        self.emit_indented(1)
    }
}

impl TsStmt {
    /// Emit with specified indentation level (2 spaces per level)
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = "  ".repeat(indent);
        match self {
            TsStmt::Return(expr) => format!("{}return {};\n", prefix, expr.emit()),
        }
    }
}

// =============================================================================
// Functions
// =============================================================================

impl Emit for TsFunction {
    fn emit(&self) -> String {
        let mut output = String::new();

        if let Some(doc) = &self.doc {
            output.push_str(&emit_doc(doc, ""));
        }

        // Export keyword
        if self.is_export {
            output.push_str("export ");
        }

        // Type parameters
        let type_params_str = if self.type_params.is_empty() {
            String::new()
        } else {
            format!("<{}>", self.type_params.join(", "))
        };

        // Parameters
        let params_str = self.params.iter().map(|p| p.emit()).collect::<Vec<_>>().join(", ");

        let body_str: String = self.body.iter().map(|stmt| stmt.emit_indented(1)).collect();

        if self.is_arrow {
            // Arrow function: export const name = (...) => { ... }
            output.push_str(&format!(
                "const {} = {}({})",
                self.name, type_params_str, params_str
            ));
            if self.body.is_empty() {
                output.push_str(" => {};\n");
            } else {
                output.push_str(" => {\n");
                output.push_str(&body_str);
                output.push_str("};\n");
            }
        } else {
            // Regular function: export function name<T>(...) { ... }
            output.push_str(&format!(
                "function {}{}({})",
                self.name, type_params_str, params_str
            ));
            if self.body.is_empty() {
                output.push_str(" {}\n");
            } else {
                output.push_str(" {\n");
                output.push_str(&body_str);
                output.push_str("}\n");
            }
        }

        output
    }
}

// =============================================================================
// Imports
// =============================================================================

impl Emit for ImportItem {
    fn emit(&self) -> String {
        self.name.clone()
    }
}

impl Emit for TsImport {
    fn emit(&self) -> String {
        let items_str = self.items.iter().map(|i| i.emit()).collect::<Vec<_>>().join(", ");
        let type_keyword = if self.type_only { "type " } else { "" };
        format!("import {}{{ {} }} from \"{}\";\n", type_keyword, items_str, self.from)
    }
}

// =============================================================================
// Tests
// =============================================================================
