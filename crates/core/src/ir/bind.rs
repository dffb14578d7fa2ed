//! Operation input/output binding.
//!
//! Each operation gets one merged input type shaped like the client call
//! argument, one type per declared (status, content type), a status map,
//! and the success/error unions the hooks are typed with.

use hookgen_common::NoContentPolicy;
use rayon::prelude::*;
use tracing::debug;

use super::api::{InputIR, OperationIR, OperationKind, OperationNames, ResponseIR, ResponseName};
use super::graph::{OperationSchemas, ResponseSchema};
use super::naming::{NameKey, NameTable, Role, resource_group};
use super::synth::TypeSynthesizer;
use super::types::{TsPrimitive, TsProp, TsType, TsTypeDef};
use super::utils::make_never_record;
use crate::error::Result;
use crate::spec::ParameterLocation;

const LOCATIONS: [ParameterLocation; 4] = [
    ParameterLocation::Path,
    ParameterLocation::Query,
    ParameterLocation::Header,
    ParameterLocation::Cookie,
];

/// `2xx`-family status codes: `200`, `204`, `2XX`.
fn is_2xx(status: &str) -> bool {
    status.len() == 3 && status.starts_with('2')
}

/// Statuses counted towards the operation's data type.
///
/// `default` only counts when no 2xx status is declared.
fn success_statuses(responses: &[ResponseSchema]) -> Vec<bool> {
    let any_2xx = responses.iter().any(|r| is_2xx(&r.status));
    responses
        .iter()
        .map(|r| is_2xx(&r.status) || (!any_2xx && r.status == "default"))
        .collect()
}

fn has_body(op: &OperationSchemas) -> bool {
    op.body.as_ref().is_some_and(|b| !b.content.is_empty())
}

/// Allocate every identifier `op` needs, in a fixed role order.
pub fn allocate_operation_names(
    table: &mut NameTable,
    op: &OperationSchemas,
    no_content: NoContentPolicy,
) -> Result<OperationNames> {
    let key = |role: Role| NameKey::operation(role, op.method, &op.path);

    let input = if op.params.is_empty() && !has_body(op) {
        None
    } else {
        Some(table.allocate(key(Role::Input))?)
    };

    let mut response_types = Vec::new();
    for response in &op.responses {
        if response.content.is_empty() {
            if no_content == NoContentPolicy::Omit {
                continue;
            }
            let name = table.allocate(key(Role::Response {
                status: response.status.clone(),
                media: None,
            }))?;
            response_types.push(ResponseName {
                status: response.status.clone(),
                content_type: None,
                name,
            });
            continue;
        }
        let several = response.content.len() > 1;
        for media in &response.content {
            let name = table.allocate(key(Role::Response {
                status: response.status.clone(),
                media: several.then(|| media.content_type.clone()),
            }))?;
            response_types.push(ResponseName {
                status: response.status.clone(),
                content_type: Some(media.content_type.clone()),
                name,
            });
        }
    }

    let responses = table.allocate(key(Role::Responses))?;
    let data = table.allocate(key(Role::Data))?;
    let error = table.allocate(key(Role::Error))?;
    let (key_role, options_role) = match op.method.kind() {
        OperationKind::Query => (Role::QueryKey, Role::QueryOptions),
        OperationKind::Mutation => (Role::MutationKey, Role::MutationOptions),
    };
    let key_fn = table.allocate(key(key_role))?;
    let options_fn = table.allocate(key(options_role))?;
    let hook_fn = table.allocate(key(Role::Hook))?;

    Ok(OperationNames {
        input,
        response_types,
        responses,
        data,
        error,
        key_fn,
        options_fn,
        hook_fn,
    })
}

/// `{ params: { path; query? }; body?: T }` for one operation.
fn input_type(synth: &TypeSynthesizer<'_>, op: &OperationSchemas) -> Option<(TsType, bool)> {
    let mut groups = Vec::new();
    for location in LOCATIONS {
        let props: Vec<TsProp> = op
            .params
            .iter()
            .filter(|p| p.location == location)
            .map(|p| TsProp {
                name: p.name.clone(),
                ty: synth.type_of(p.node),
                optional: !p.required,
                doc: p.description.clone(),
            })
            .collect();
        if props.is_empty() {
            continue;
        }
        let optional = props.iter().all(|p| p.optional);
        groups.push(TsProp::new(location.as_str(), TsType::Object(props), optional));
    }

    let mut fields = Vec::new();
    if !groups.is_empty() {
        let optional = groups.iter().all(|g| g.optional);
        fields.push(TsProp::new("params", TsType::Object(groups), optional));
    }
    if let Some(body) = op.body.as_ref().filter(|b| !b.content.is_empty()) {
        let mut members = Vec::new();
        for media in &body.content {
            let ty = synth.type_of(media.node);
            if !members.contains(&ty) {
                members.push(ty);
            }
        }
        fields.push(TsProp::new("body", TsType::union(members), !body.required));
    }

    if fields.is_empty() {
        return None;
    }
    let required = fields.iter().any(|f| !f.optional);
    Some((TsType::Object(fields), required))
}

/// Bind one operation whose names are already allocated.
pub fn bind_operation(
    synth: &TypeSynthesizer<'_>,
    op: &OperationSchemas,
    names: OperationNames,
    no_content: NoContentPolicy,
) -> OperationIR {
    let mut types = Vec::new();

    let input = match (&names.input, input_type(synth, op)) {
        (Some(type_name), Some((ty, required))) => {
            types.push(TsTypeDef::alias(type_name.clone(), ty.clone()));
            Some(InputIR {
                type_name: type_name.clone(),
                ty,
                required,
            })
        }
        _ => None,
    };

    let success = success_statuses(&op.responses);
    let mut responses = Vec::new();
    let mut allocated = names.response_types.iter();
    for (response, success) in op.responses.iter().zip(success) {
        let mut outputs = Vec::new();
        if response.content.is_empty() {
            let ty = match no_content {
                NoContentPolicy::Undefined => TsType::Primitive(TsPrimitive::Undefined),
                NoContentPolicy::Void | NoContentPolicy::Omit => {
                    TsType::Primitive(TsPrimitive::Void)
                }
            };
            let type_name = if no_content == NoContentPolicy::Omit {
                None
            } else {
                allocated.next().map(|n| n.name.clone())
            };
            outputs.push((None, type_name, ty));
        } else {
            for media in &response.content {
                outputs.push((
                    Some(media.content_type.clone()),
                    allocated.next().map(|n| n.name.clone()),
                    synth.type_of(media.node),
                ));
            }
        }

        for (content_type, type_name, ty) in outputs {
            if let Some(name) = &type_name {
                let mut def = TsTypeDef::alias(name.clone(), ty.clone());
                def.doc = response.description.clone();
                types.push(def);
            }
            responses.push(ResponseIR {
                status: response.status.clone(),
                content_type,
                type_name,
                ty,
                success,
            });
        }
    }

    // Status → type map, one entry per status
    let mut map_props: Vec<TsProp> = Vec::new();
    for response in &responses {
        let Some(name) = &response.type_name else {
            continue;
        };
        let ty = TsType::Ref(name.clone());
        match map_props.iter_mut().find(|p| p.name == response.status) {
            Some(existing) => {
                existing.ty = match std::mem::replace(&mut existing.ty, TsType::unknown()) {
                    TsType::Union(mut members) => {
                        members.push(ty);
                        TsType::Union(members)
                    }
                    single => TsType::Union(vec![single, ty]),
                };
            }
            None => map_props.push(TsProp::new(response.status.clone(), ty, false)),
        }
    }
    let map_ty = if map_props.is_empty() {
        make_never_record()
    } else {
        TsType::Object(map_props)
    };
    types.push(TsTypeDef::alias(names.responses.clone(), map_ty));

    let union_of = |want_success: bool| -> TsType {
        let declared = responses.iter().any(|r| r.success == want_success);
        let refs: Vec<TsType> = responses
            .iter()
            .filter(|r| r.success == want_success)
            .filter_map(|r| r.type_name.clone().map(TsType::Ref))
            .collect();
        match (declared, refs.is_empty()) {
            (false, _) => TsType::unknown(),
            // Declared but every status was omitted
            (true, true) if want_success => TsType::Primitive(TsPrimitive::Void),
            (true, true) => TsType::unknown(),
            (true, false) => TsType::union(refs),
        }
    };
    types.push(TsTypeDef::alias(names.data.clone(), union_of(true)));
    types.push(TsTypeDef::alias(names.error.clone(), union_of(false)));

    OperationIR {
        method: op.method,
        path: op.path.clone(),
        resource_group: resource_group(&op.path),
        kind: op.method.kind(),
        summary: op.summary.clone(),
        deprecated: op.deprecated,
        names,
        input,
        responses,
        types,
    }
}

/// Allocate names for every operation in order, then bind them in parallel.
pub fn bind_operations(
    synth: &TypeSynthesizer<'_>,
    table: &mut NameTable,
    no_content: NoContentPolicy,
) -> Result<Vec<OperationIR>> {
    let ops = synth.graph().operations();
    let names = ops
        .iter()
        .map(|op| allocate_operation_names(table, op, no_content))
        .collect::<Result<Vec<_>>>()?;

    let bound: Vec<OperationIR> = ops
        .par_iter()
        .zip(names.into_par_iter())
        .map(|(op, names)| bind_operation(synth, op, names, no_content))
        .collect();

    debug!(operations = bound.len(), "Bound operations");
    Ok(bound)
}
