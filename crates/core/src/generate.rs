//! Pipeline entry point and module rendering.
//!
//! The pipeline is:
//! 1. Graph: ApiDescription -> SchemaGraph (references resolved)
//! 2. Naming: components first, then operations in (path, method) order
//! 3. Resolve + synthesize component declarations
//! 4. Bind operations and build their hooks
//! 5. Emit: every declaration -> source fragment (via Emit trait)

use std::collections::{BTreeMap, BTreeSet};

use hookgen_common::GeneratorConfig;
use tracing::{debug, warn};

use crate::error::{Diagnostic, GenerationError, Result};
use crate::ir::api::OperationKind;
use crate::ir::bind::bind_operations;
use crate::ir::graph::NodeId;
use crate::ir::hooks::{generate_hooks, runtime_preamble};
use crate::ir::naming::NameKey;
use crate::ir::types::{ImportItem, TsImport};
use crate::ir::{Emit, NameTable, SchemaGraph, TypeSynthesizer, resolve};
use crate::spec::ApiDescription;

/// Hook library exports the generated hooks use, split by import kind.
const LIBRARY_VALUES: [&str; 2] = ["useMutation", "useQuery"];
const LIBRARY_TYPES: [&str; 2] = ["UseMutationOptions", "UseQueryOptions"];

const HEADER: &str = "// This file is generated by hookgen. Do not edit by hand.\n";

/// Which generated module a declaration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactFamily {
    /// Type declarations (components, inputs, responses)
    Types,
    /// Runtime preamble, key factories, options factories and hooks
    Hooks,
}

/// One generated top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDeclaration {
    /// Declared TypeScript identifier, unique across the run
    pub identifier: String,
    /// Module the declaration belongs to
    pub family: ArtifactFamily,
    /// TypeScript source, newline-terminated
    pub source: String,
    /// Generated identifiers and hook library exports this declaration uses
    pub dependencies: BTreeSet<String>,
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Declarations in emission order: types family first
    pub declarations: Vec<GeneratedDeclaration>,
    /// Constructs typed as `unknown` in best-effort mode
    pub diagnostics: Vec<Diagnostic>,
}

/// A module ready to hand to an [`Emitter`](crate::emitter::Emitter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedModule {
    /// File name relative to the output directory
    pub file_name: String,
    /// Full module text: header, imports, declarations
    pub text: String,
}

/// Generate declarations with the default configuration.
pub fn generate(desc: &ApiDescription) -> Result<Vec<GeneratedDeclaration>> {
    Ok(generate_with(desc, &GeneratorConfig::default())?.declarations)
}

/// Generate declarations for every component and operation in `desc`.
pub fn generate_with(desc: &ApiDescription, config: &GeneratorConfig) -> Result<Generation> {
    let (graph, diagnostics) = SchemaGraph::build(desc, config.best_effort)?;
    for diagnostic in &diagnostics {
        warn!(%diagnostic, "Best-effort generation");
    }

    let mut table = NameTable::new();
    let mut names = BTreeMap::<NodeId, String>::new();
    for (name, id) in graph.components() {
        names.insert(*id, table.allocate(NameKey::schema(name))?);
    }

    let order = resolve(&graph);
    let synth = TypeSynthesizer::new(&graph, names, config.enum_style);
    let component_defs = synth.declare_all(&order)?;
    let operations = bind_operations(&synth, &mut table, config.no_content)?;
    let hooks = generate_hooks(&operations);

    let mut declarations = Vec::new();
    for def in component_defs.iter().chain(operations.iter().flat_map(|op| &op.types)) {
        declarations.push(GeneratedDeclaration {
            identifier: def.name.clone(),
            family: ArtifactFamily::Types,
            source: def.emit(),
            dependencies: def.references(),
        });
    }
    for runtime in runtime_preamble() {
        declarations.push(GeneratedDeclaration {
            identifier: runtime.name.to_string(),
            family: ArtifactFamily::Hooks,
            source: runtime.source,
            dependencies: runtime.dependencies.iter().map(|d| (*d).to_string()).collect(),
        });
    }
    for function in hooks.iter().flatten() {
        declarations.push(GeneratedDeclaration {
            identifier: function.name.clone(),
            family: ArtifactFamily::Hooks,
            source: function.emit(),
            dependencies: function.references(),
        });
    }

    let mut known = BTreeSet::new();
    for decl in &declarations {
        if !known.insert(decl.identifier.clone()) {
            return Err(GenerationError::NameCollision {
                identifier: decl.identifier.clone(),
                reason: "declared more than once".to_string(),
            });
        }
    }
    known.extend(LIBRARY_VALUES.iter().chain(&LIBRARY_TYPES).map(|s| (*s).to_string()));
    for decl in &mut declarations {
        let identifier = decl.identifier.clone();
        decl.dependencies.retain(|d| *d != identifier && known.contains(d));
    }

    debug!(
        components = order.order.len(),
        deferred = order.deferred.len(),
        operations = operations.len(),
        queries = operations.iter().filter(|o| o.kind == OperationKind::Query).count(),
        declarations = declarations.len(),
        "Generated declarations"
    );

    Ok(Generation {
        declarations,
        diagnostics,
    })
}

fn join_sources<'d>(decls: impl Iterator<Item = &'d GeneratedDeclaration>) -> String {
    decls
        .map(|d| d.source.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Imports for the hooks module: the hook library and the types module.
fn hooks_imports(
    hooks: &[&GeneratedDeclaration],
    type_names: &BTreeSet<&str>,
    config: &GeneratorConfig,
) -> Vec<TsImport> {
    let used: BTreeSet<&str> = hooks
        .iter()
        .flat_map(|d| d.dependencies.iter().map(String::as_str))
        .collect();

    let mut imports = Vec::new();
    let runtime_items: Vec<ImportItem> = LIBRARY_VALUES
        .iter()
        .filter(|n| used.contains(*n))
        .map(|n| ImportItem::named(*n))
        .collect();
    let library_types: Vec<ImportItem> = LIBRARY_TYPES
        .iter()
        .filter(|n| used.contains(*n))
        .map(|n| ImportItem::named(*n))
        .collect();
    let generated_types: Vec<ImportItem> = used
        .iter()
        .filter(|n| type_names.contains(*n))
        .map(|n| ImportItem::named(*n))
        .collect();

    if !runtime_items.is_empty() {
        imports.push(TsImport {
            items: runtime_items,
            from: config.query_library.clone(),
            type_only: false,
        });
    }
    if !library_types.is_empty() {
        imports.push(TsImport {
            items: library_types,
            from: config.query_library.clone(),
            type_only: true,
        });
    }
    if !generated_types.is_empty() {
        imports.push(TsImport {
            items: generated_types,
            from: config.types_import_path(),
            type_only: true,
        });
    }
    imports
}

/// Assemble declarations into the types module and the hooks module.
pub fn render_modules(
    declarations: &[GeneratedDeclaration],
    config: &GeneratorConfig,
) -> Vec<RenderedModule> {
    let types: Vec<&GeneratedDeclaration> = declarations
        .iter()
        .filter(|d| d.family == ArtifactFamily::Types)
        .collect();
    let hooks: Vec<&GeneratedDeclaration> = declarations
        .iter()
        .filter(|d| d.family == ArtifactFamily::Hooks)
        .collect();
    let type_names: BTreeSet<&str> = types.iter().map(|d| d.identifier.as_str()).collect();

    let mut types_text = format!("{HEADER}\n");
    types_text.push_str(&join_sources(types.iter().copied()));

    let mut hooks_text = format!("{HEADER}\n");
    let imports = hooks_imports(&hooks, &type_names, config);
    if !imports.is_empty() {
        for import in &imports {
            hooks_text.push_str(&import.emit());
        }
        hooks_text.push('\n');
    }
    hooks_text.push_str(&join_sources(hooks.iter().copied()));

    vec![
        RenderedModule {
            file_name: config.types_module.clone(),
            text: types_text,
        },
        RenderedModule {
            file_name: config.hooks_module.clone(),
            text: hooks_text,
        },
    ]
}
