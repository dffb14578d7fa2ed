//! hookgen core - OpenAPI to TypeScript types and TanStack Query hooks
//!
//! This crate turns a parsed API description into two families of
//! TypeScript declarations: request/response types and per-operation query
//! or mutation hooks. Writing the result is left to a host-supplied
//! [`Emitter`].

pub mod emitter;
pub mod error;
pub mod generate;
pub mod ir;
pub mod spec;

// Re-export commonly used types
pub use emitter::{EmitError, Emitter, FsEmitter, MemoryEmitter, write_modules};
pub use error::{Diagnostic, GenerationError, Result};
pub use generate::{
    ArtifactFamily, GeneratedDeclaration, Generation, RenderedModule, generate, generate_with,
    render_modules,
};
pub use hookgen_common::{EnumStyle, GeneratorConfig, NoContentPolicy};
pub use spec::ApiDescription;
