//! Intermediate Representation for API description to TypeScript code generation.
//!
//! The pipeline runs in leaf-first stages over one in-memory graph:
//! 1. Graph: description schemas -> arena of schema nodes (`graph`)
//! 2. Naming: (role, method, path) -> unique identifiers (`naming`)
//! 3. Resolution: component dependency order, cycles broken (`resolve`)
//! 4. Synthesis: schema nodes -> TypeScript types (`synth`)
//! 5. Binding: operations -> input/output types (`bind`)
//! 6. Hooks: operations -> key factory, options factory, hook (`hooks`)
//! 7. Emission: TypeScript AST -> code strings via the `Emit` trait (`emit`)
//!
//! ## Module Structure
//!
//! - `types`: TypeScript AST IR (TsType, TsExpr, TsStmt, TsFunction, TsTypeDef)
//! - `api`: operation-level IR (HttpMethod, OperationNames, OperationIR)
//! - `utils`: common utilities shared across modules

pub mod api;
pub mod bind;
pub mod emit;
pub mod graph;
pub mod hooks;
pub mod naming;
pub mod resolve;
pub mod synth;
pub mod types;
pub mod utils;

// Re-export the main entry points
pub use emit::Emit;
pub use graph::SchemaGraph;
pub use naming::NameTable;
pub use resolve::{DeclarationOrder, resolve};
pub use synth::TypeSynthesizer;
