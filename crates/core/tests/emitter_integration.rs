//! Writing rendered modules through the file system emitter.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;

use hookgen_core::{
    ApiDescription, EmitError, FsEmitter, GeneratorConfig, MemoryEmitter, generate_with,
    render_modules, write_modules,
};
use tempfile::TempDir;

const DISCORD: &str = include_str!("fixtures/discord.json");

fn rendered(config: &GeneratorConfig) -> Vec<hookgen_core::RenderedModule> {
    let desc = ApiDescription::from_json(DISCORD).unwrap();
    let generation = generate_with(&desc, config).unwrap();
    render_modules(&generation.declarations, config)
}

#[test]
fn test_fs_emitter_writes_both_modules() {
    let temp = TempDir::new().unwrap();
    let out_dir = temp.path().join("src").join("api");
    let config = GeneratorConfig::default();

    write_modules(&mut FsEmitter, &out_dir, &rendered(&config)).unwrap();

    let types = fs::read_to_string(out_dir.join("types.ts")).unwrap();
    assert!(types.contains("export type GatewayResponse = {\n  url: string;\n};\n"));
    assert!(!types.contains("useQuery"));

    let hooks = fs::read_to_string(out_dir.join("hooks.ts")).unwrap();
    assert!(hooks.contains(
        "import { useMutation, useQuery } from \"@tanstack/react-query\";\n"
    ));
    assert!(hooks.contains(
        "import type { UseMutationOptions, UseQueryOptions } from \"@tanstack/react-query\";\n"
    ));
    assert!(hooks.contains("from \"./types\";\n"));
    assert!(hooks.contains("export function useGetGateway<TData = GetGatewayData>("));
}

#[test]
fn test_fs_emitter_overwrites_previous_output() {
    let temp = TempDir::new().unwrap();
    let out_dir = temp.path().to_path_buf();
    fs::write(out_dir.join("types.ts"), "stale").unwrap();

    write_modules(&mut FsEmitter, &out_dir, &rendered(&GeneratorConfig::default())).unwrap();
    let types = fs::read_to_string(out_dir.join("types.ts")).unwrap();
    assert!(!types.contains("stale"));
}

#[test]
fn test_configured_module_names_and_library() {
    let config = GeneratorConfig::from_toml_str(
        "types_module = \"models.ts\"\nhooks_module = \"queries.ts\"\nquery_library = \"@tanstack/vue-query\"\n",
    )
    .unwrap();
    let mut emitter = MemoryEmitter::default();
    write_modules(&mut emitter, std::path::Path::new("gen"), &rendered(&config)).unwrap();

    let names: Vec<_> = emitter
        .files
        .keys()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["gen/models.ts", "gen/queries.ts"]);

    let hooks = &emitter.files[std::path::Path::new("gen/queries.ts")];
    assert!(hooks.contains("from \"@tanstack/vue-query\";\n"));
    assert!(hooks.contains("from \"./models\";\n"));
}

#[test]
fn test_io_error_is_surfaced() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let err = write_modules(
        &mut FsEmitter,
        &blocker.join("out"),
        &rendered(&GeneratorConfig::default()),
    )
    .unwrap_err();
    assert!(matches!(err, EmitError::Io { .. }));
}
