//! Key factory, options factory and hook per operation.
//!
//! GET and HEAD operations become `useQuery` hooks whose key carries the
//! operation input; everything else becomes a `useMutation` hook with a
//! fixed key. Every request goes through a caller-supplied `ApiClient`.

use rayon::prelude::*;

use super::api::{HttpMethod, InputIR, OperationIR, OperationKind};
use super::emit::Emit;
use super::types::{
    BinOp, TsExpr, TsFunction, TsLiteral, TsParam, TsPrimitive, TsProp, TsStmt, TsType,
    TsTypeDef, TypeDefKind,
};

const API_CLIENT: &str = "ApiClient";
const API_ERROR: &str = "ApiError";

const API_CLIENT_SOURCE: &str = r#"/** Transport every generated hook calls through. */
export interface ApiClient {
  request<TData, TInput = undefined>(
    method: HttpMethod,
    path: string,
    input: TInput,
    options?: RequestOptions,
  ): Promise<TData>;
}
"#;

const API_ERROR_SOURCE: &str = r#"/** Rejection value of a failed request: status code plus decoded body. */
export interface ApiError<TBody = unknown> {
  status: number;
  body: TBody;
}
"#;

/// One declaration of the hooks module preamble.
#[derive(Debug, Clone)]
pub struct RuntimeDeclaration {
    /// Declared identifier
    pub name: &'static str,
    /// TypeScript source
    pub source: String,
    /// Other preamble names the source mentions
    pub dependencies: Vec<&'static str>,
}

/// Declarations the hooks module carries ahead of the operation hooks.
pub fn runtime_preamble() -> Vec<RuntimeDeclaration> {
    let http_method = TsTypeDef::alias(
        "HttpMethod",
        TsType::union(
            HttpMethod::ALL
                .iter()
                .map(|m| TsType::Literal(TsLiteral::String(m.as_str().to_string())))
                .collect(),
        ),
    );
    let request_options = TsTypeDef {
        name: "RequestOptions".to_string(),
        kind: TypeDefKind::Interface {
            properties: vec![TsProp::new(
                "signal",
                TsType::Ref("AbortSignal".to_string()),
                true,
            )],
        },
        doc: None,
        note: None,
    };

    vec![
        RuntimeDeclaration {
            name: "HttpMethod",
            source: http_method.emit(),
            dependencies: Vec::new(),
        },
        RuntimeDeclaration {
            name: "RequestOptions",
            source: request_options.emit(),
            dependencies: Vec::new(),
        },
        RuntimeDeclaration {
            name: API_CLIENT,
            source: API_CLIENT_SOURCE.to_string(),
            dependencies: vec!["HttpMethod", "RequestOptions"],
        },
        RuntimeDeclaration {
            name: API_ERROR,
            source: API_ERROR_SOURCE.to_string(),
            dependencies: Vec::new(),
        },
    ]
}

fn input_ident() -> TsExpr {
    TsExpr::ident("input")
}

fn client_param() -> TsParam {
    TsParam::new("client", TsType::Ref(API_CLIENT.to_string()), false)
}

/// `input: T` or `input?: T`, when the operation has input.
fn input_param(op: &OperationIR) -> Option<TsParam> {
    op.input
        .as_ref()
        .map(|input| TsParam::new("input", TsType::Ref(input.type_name.clone()), !input.required))
}

fn string_union(values: &[&str]) -> TsType {
    TsType::union(
        values
            .iter()
            .map(|v| TsType::Literal(TsLiteral::String((*v).to_string())))
            .collect(),
    )
}

fn doc_for(op: &OperationIR) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(summary) = &op.summary {
        lines.push(summary.trim().to_string());
    }
    lines.push(format!("`{} {}`", op.method, op.path));
    if op.deprecated {
        lines.push("@deprecated".to_string());
    }
    Some(lines.join("\n"))
}

/// `client.request<Data, Input>("GET", "/path", input, { signal })`
fn request_call(op: &OperationIR, with_signal: bool) -> TsExpr {
    let mut type_args = vec![TsType::Ref(op.names.data.clone())];
    let mut args = vec![TsExpr::string(op.method.as_str()), TsExpr::string(&op.path)];
    match &op.input {
        Some(input) => {
            type_args.push(variables_type(op).unwrap_or_else(|| query_input_type(input)));
            args.push(input_ident());
        }
        None => args.push(TsExpr::ident("undefined")),
    }
    if with_signal {
        args.push(TsExpr::Object(vec![(
            "signal".to_string(),
            TsExpr::ident("signal"),
        )]));
    }
    TsExpr::Call {
        callee: Box::new(TsExpr::Member {
            object: Box::new(TsExpr::ident("client")),
            prop: "request".to_string(),
        }),
        type_args,
        args,
    }
}

/// Query input as passed to the client; optional inputs may be `undefined`.
fn query_input_type(input: &InputIR) -> TsType {
    let ty = TsType::Ref(input.type_name.clone());
    if input.required {
        ty
    } else {
        TsType::Union(vec![ty, TsType::Primitive(TsPrimitive::Undefined)])
    }
}

/// Mutation variables: the input, `Input | void` when every part is
/// optional, `void` when there is no input.
fn variables_type(op: &OperationIR) -> Option<TsType> {
    if op.kind == OperationKind::Query {
        return None;
    }
    Some(match &op.input {
        Some(input) if input.required => TsType::Ref(input.type_name.clone()),
        Some(input) => TsType::Union(vec![
            TsType::Ref(input.type_name.clone()),
            TsType::Primitive(TsPrimitive::Void),
        ]),
        None => TsType::Primitive(TsPrimitive::Void),
    })
}

/// `[resourceGroup, method, path, ...args] as const`
pub fn key_factory(op: &OperationIR) -> TsFunction {
    let mut items = vec![
        TsExpr::string(&op.resource_group),
        TsExpr::string(op.method.as_str()),
        TsExpr::string(&op.path),
    ];
    let mut params = Vec::new();
    if op.kind == OperationKind::Query
        && let Some(param) = input_param(op)
    {
        if param.optional {
            // Leave the key identical to the input-less one when no input is given
            items.push(TsExpr::Spread(Box::new(TsExpr::Paren(Box::new(
                TsExpr::Ternary {
                    cond: Box::new(TsExpr::BinOp {
                        left: Box::new(input_ident()),
                        op: BinOp::StrictEqual,
                        right: Box::new(TsExpr::ident("undefined")),
                    }),
                    then_expr: Box::new(TsExpr::Array(Vec::new())),
                    else_expr: Box::new(TsExpr::Array(vec![input_ident()])),
                },
            )))));
        } else {
            items.push(input_ident());
        }
        params.push(param);
    }

    TsFunction {
        name: op.names.key_fn.clone(),
        doc: None,
        type_params: Vec::new(),
        params,
        body: vec![TsStmt::Return(TsExpr::Cast {
            expr: Box::new(TsExpr::Array(items)),
            ty: TsType::Ref("const".to_string()),
        })],
        is_export: true,
        is_arrow: true,
    }
}

/// `{ queryKey, queryFn }` or `{ mutationKey, mutationFn }` bound to a client.
pub fn options_factory(op: &OperationIR) -> TsFunction {
    let mut params = vec![client_param()];
    let object = match op.kind {
        OperationKind::Query => {
            let mut key_args = Vec::new();
            if let Some(param) = input_param(op) {
                params.push(param);
                key_args.push(input_ident());
            }
            let query_fn = TsExpr::Arrow {
                params: vec![TsParam::new(
                    "{ signal }",
                    TsType::Object(vec![TsProp::new(
                        "signal",
                        TsType::Ref("AbortSignal".to_string()),
                        false,
                    )]),
                    false,
                )],
                body: Box::new(request_call(op, true)),
            };
            TsExpr::Object(vec![
                (
                    "queryKey".to_string(),
                    TsExpr::call(TsExpr::ident(&op.names.key_fn), key_args),
                ),
                ("queryFn".to_string(), query_fn),
            ])
        }
        OperationKind::Mutation => {
            let fn_params = match (&op.input, variables_type(op)) {
                (Some(_), Some(vars)) => vec![TsParam::new("input", vars, false)],
                _ => Vec::new(),
            };
            let mutation_fn = TsExpr::Arrow {
                params: fn_params,
                body: Box::new(request_call(op, false)),
            };
            TsExpr::Object(vec![
                (
                    "mutationKey".to_string(),
                    TsExpr::call(TsExpr::ident(&op.names.key_fn), Vec::new()),
                ),
                ("mutationFn".to_string(), mutation_fn),
            ])
        }
    };

    TsFunction {
        name: op.names.options_fn.clone(),
        doc: None,
        type_params: Vec::new(),
        params,
        body: vec![TsStmt::Return(object)],
        is_export: true,
        is_arrow: true,
    }
}

/// The hook: factory defaults merged with caller overrides.
pub fn hook(op: &OperationIR) -> TsFunction {
    let api_error = TsType::generic(API_ERROR, vec![TsType::Ref(op.names.error.clone())]);
    let data = TsType::Ref(op.names.data.clone());
    let mut params = vec![client_param()];
    let mut options_args = vec![TsExpr::ident("client")];

    let (type_params, options_ty, primitive) = match op.kind {
        OperationKind::Query => {
            if let Some(param) = input_param(op) {
                params.push(param);
                options_args.push(input_ident());
            }
            let options = TsType::generic(
                "UseQueryOptions",
                vec![
                    data,
                    api_error,
                    TsType::Ref("TData".to_string()),
                    TsType::generic(
                        "ReturnType",
                        vec![TsType::TypeOf(op.names.key_fn.clone())],
                    ),
                ],
            );
            (
                vec![format!("TData = {}", op.names.data)],
                TsType::generic("Omit", vec![options, string_union(&["queryKey", "queryFn"])]),
                "useQuery",
            )
        }
        OperationKind::Mutation => {
            let vars = variables_type(op).unwrap_or(TsType::Primitive(TsPrimitive::Void));
            let options = TsType::generic("UseMutationOptions", vec![data, api_error, vars]);
            (
                Vec::new(),
                TsType::generic(
                    "Omit",
                    vec![options, string_union(&["mutationKey", "mutationFn"])],
                ),
                "useMutation",
            )
        }
    };
    params.push(TsParam::new("options", options_ty, true));

    let merged = TsExpr::Object(vec![
        (
            String::new(),
            TsExpr::Spread(Box::new(TsExpr::call(
                TsExpr::ident(&op.names.options_fn),
                options_args,
            ))),
        ),
        (
            String::new(),
            TsExpr::Spread(Box::new(TsExpr::ident("options"))),
        ),
    ]);

    TsFunction {
        name: op.names.hook_fn.clone(),
        doc: doc_for(op),
        type_params,
        params,
        body: vec![TsStmt::Return(TsExpr::call(
            TsExpr::ident(primitive),
            vec![merged],
        ))],
        is_export: true,
        is_arrow: false,
    }
}

/// Key factory, options factory and hook, in that order.
pub fn operation_functions(op: &OperationIR) -> Vec<TsFunction> {
    vec![key_factory(op), options_factory(op), hook(op)]
}

/// Functions for every operation, operation order preserved.
pub fn generate_hooks(ops: &[OperationIR]) -> Vec<Vec<TsFunction>> {
    ops.par_iter().map(operation_functions).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ir::api::OperationNames;
    use crate::ir::naming::{operation_base, resource_group};

    fn op(method: HttpMethod, path: &str, input: Option<bool>) -> OperationIR {
        let base = operation_base(method, path);
        let (key, options) = match method.kind() {
            OperationKind::Query => ("QueryKey", "QueryOptions"),
            OperationKind::Mutation => ("MutationKey", "MutationOptions"),
        };
        OperationIR {
            method,
            path: path.to_string(),
            resource_group: resource_group(path),
            kind: method.kind(),
            summary: None,
            deprecated: false,
            names: OperationNames {
                input: input.map(|_| format!("{base}Input")),
                response_types: Vec::new(),
                responses: format!("{base}Responses"),
                data: format!("{base}Data"),
                error: format!("{base}Error"),
                key_fn: format!("{base}{key}"),
                options_fn: format!("{base}{options}"),
                hook_fn: format!("use{base}"),
            },
            input: input.map(|required| InputIR {
                type_name: format!("{base}Input"),
                ty: TsType::unknown(),
                required,
            }),
            responses: Vec::new(),
            types: Vec::new(),
        }
    }

    #[test]
    fn test_query_without_input() {
        let gateway = op(HttpMethod::Get, "/gateway", None);
        assert_eq!(
            key_factory(&gateway).emit(),
            "export const GetGatewayQueryKey = () => {\n  return [\"gateway\", \"GET\", \"/gateway\"] as const;\n};\n"
        );
        assert_eq!(
            options_factory(&gateway).emit(),
            "export const GetGatewayQueryOptions = (client: ApiClient) => {\n  return { queryKey: GetGatewayQueryKey(), queryFn: ({ signal }: { signal: AbortSignal }) => client.request<GetGatewayData>(\"GET\", \"/gateway\", undefined, { signal }) };\n};\n"
        );
        let hook = hook(&gateway).emit();
        assert!(hook.starts_with("/** `GET /gateway` */\n"));
        assert!(hook.contains(
            "export function useGetGateway<TData = GetGatewayData>(client: ApiClient, options?: Omit<UseQueryOptions<GetGatewayData, ApiError<GetGatewayError>, TData, ReturnType<typeof GetGatewayQueryKey>>, \"queryKey\" | \"queryFn\">) {\n"
        ));
        assert!(hook.contains("  return useQuery({ ...GetGatewayQueryOptions(client), ...options });\n"));
    }

    #[test]
    fn test_query_key_carries_input() {
        let bans = op(HttpMethod::Get, "/guilds/{guild_id}/bans", Some(true));
        assert_eq!(
            key_factory(&bans).emit(),
            "export const GetGuildsGuildIdBansQueryKey = (input: GetGuildsGuildIdBansInput) => {\n  return [\"guilds\", \"GET\", \"/guilds/{guild_id}/bans\", input] as const;\n};\n"
        );
        let options = options_factory(&bans).emit();
        assert!(options.contains("queryKey: GetGuildsGuildIdBansQueryKey(input)"));
        assert!(options.contains(
            "client.request<GetGuildsGuildIdBansData, GetGuildsGuildIdBansInput>(\"GET\", \"/guilds/{guild_id}/bans\", input, { signal })"
        ));
    }

    #[test]
    fn test_optional_query_input_spreads_into_key() {
        let members = op(HttpMethod::Get, "/users/@me/guilds", Some(false));
        let key = key_factory(&members).emit();
        assert!(key.contains("(input?: GetUsersMeGuildsInput)"));
        assert!(key.contains(
            "[\"users\", \"GET\", \"/users/@me/guilds\", ...(input === undefined ? [] : [input])] as const"
        ));
        let options = options_factory(&members).emit();
        assert!(options.contains("(client: ApiClient, input?: GetUsersMeGuildsInput)"));
        assert!(options.contains(
            "client.request<GetUsersMeGuildsData, GetUsersMeGuildsInput | undefined>(\"GET\", \"/users/@me/guilds\", input, { signal })"
        ));
    }

    #[test]
    fn test_mutation_key_takes_no_args() {
        let prune = op(HttpMethod::Post, "/guilds/{guild_id}/prune", Some(true));
        assert_eq!(
            key_factory(&prune).emit(),
            "export const PostGuildsGuildIdPruneMutationKey = () => {\n  return [\"guilds\", \"POST\", \"/guilds/{guild_id}/prune\"] as const;\n};\n"
        );
        assert_eq!(
            options_factory(&prune).emit(),
            "export const PostGuildsGuildIdPruneMutationOptions = (client: ApiClient) => {\n  return { mutationKey: PostGuildsGuildIdPruneMutationKey(), mutationFn: (input: PostGuildsGuildIdPruneInput) => client.request<PostGuildsGuildIdPruneData, PostGuildsGuildIdPruneInput>(\"POST\", \"/guilds/{guild_id}/prune\", input) };\n};\n"
        );
        let hook = hook(&prune).emit();
        assert!(hook.contains(
            "export function usePostGuildsGuildIdPrune(client: ApiClient, options?: Omit<UseMutationOptions<PostGuildsGuildIdPruneData, ApiError<PostGuildsGuildIdPruneError>, PostGuildsGuildIdPruneInput>, \"mutationKey\" | \"mutationFn\">) {\n"
        ));
        assert!(hook.contains("  return useMutation({ ...PostGuildsGuildIdPruneMutationOptions(client), ...options });\n"));
    }

    #[test]
    fn test_mutation_variables() {
        let optional = op(HttpMethod::Patch, "/users/@me", Some(false));
        assert!(options_factory(&optional)
            .emit()
            .contains("mutationFn: (input: PatchUsersMeInput | void) => client.request<PatchUsersMeData, PatchUsersMeInput | void>"));

        let none = op(HttpMethod::Delete, "/users/@me/guilds", None);
        let options = options_factory(&none).emit();
        assert!(options.contains(
            "mutationFn: () => client.request<DeleteUsersMeGuildsData>(\"DELETE\", \"/users/@me/guilds\", undefined)"
        ));
        assert!(hook(&none).emit().contains("ApiError<DeleteUsersMeGuildsError>, void>"));
    }

    #[test]
    fn test_hook_doc_marks_deprecated() {
        let mut gateway = op(HttpMethod::Get, "/gateway", None);
        gateway.summary = Some("Get gateway".to_string());
        gateway.deprecated = true;
        assert!(hook(&gateway)
            .emit()
            .starts_with("/**\n * Get gateway\n * `GET /gateway`\n * @deprecated\n */\n"));
    }

    #[test]
    fn test_function_order_and_references() {
        let bans = op(HttpMethod::Get, "/guilds/{guild_id}/bans", Some(true));
        let functions = operation_functions(&bans);
        let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "GetGuildsGuildIdBansQueryKey",
                "GetGuildsGuildIdBansQueryOptions",
                "useGetGuildsGuildIdBans"
            ]
        );
        let refs = functions[2].references();
        assert!(refs.contains("GetGuildsGuildIdBansQueryOptions"));
        assert!(refs.contains("GetGuildsGuildIdBansQueryKey"));
        assert!(refs.contains("GetGuildsGuildIdBansError"));
        assert!(refs.contains("ApiClient"));
    }

    #[test]
    fn test_runtime_preamble() {
        let preamble = runtime_preamble();
        let names: Vec<_> = preamble.iter().map(|d| d.name).collect();
        assert_eq!(names, ["HttpMethod", "RequestOptions", "ApiClient", "ApiError"]);
        assert_eq!(
            preamble[0].source,
            "export type HttpMethod = \"GET\" | \"HEAD\" | \"POST\" | \"PUT\" | \"PATCH\" | \"DELETE\";\n"
        );
        assert_eq!(
            preamble[1].source,
            "export interface RequestOptions {\n  signal?: AbortSignal;\n}\n"
        );
    }
}
