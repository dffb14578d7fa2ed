//! Schema graph: the arena every later stage reads from.
//!
//! Component schemas get the first node ids, in name order, so references
//! between components (including self-references) can be wired before the
//! target is built. A bare `$ref` resolves to the component's own node,
//! which interns every use of the same reference path into one node.
//! Operations are collected with their parameters, bodies and responses
//! already resolved to nodes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::api::HttpMethod;
use crate::error::{Diagnostic, GenerationError, Result};
use crate::spec::{
    AdditionalProperties, ApiDescription, EnumValue, MediaType, Operation, Parameter,
    ParameterLocation, PathItem, RefOr, RequestBody, Response, Schema, SchemaType,
};

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";
const PARAMETER_REF_PREFIX: &str = "#/components/parameters/";
const REQUEST_BODY_REF_PREFIX: &str = "#/components/requestBodies/";
const RESPONSE_REF_PREFIX: &str = "#/components/responses/";

/// Longest chain of component-to-component `$ref`s followed for
/// parameters, request bodies and responses.
const MAX_REF_DEPTH: usize = 16;

/// Index of a node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a node came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A named component schema
    Component {
        /// Name under `components/schemas`
        name: String,
    },
    /// An anonymous schema
    Inline {
        /// JSON-pointer-like location in the description
        location: String,
    },
}

/// How a schema says it admits `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullability {
    /// Only non-null values
    NotNull,
    /// `nullable: true`
    Flag,
    /// `type: [..., "null", ...]`
    TypeArray {
        /// Index `null` appeared at
        position: usize,
    },
}

/// Scalar schema types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// `type: string`
    String,
    /// `type: integer`
    Integer,
    /// `type: number`
    Number,
    /// `type: boolean`
    Boolean,
    /// `type: null`
    Null,
    /// `type: string, format: binary`
    Binary,
}

/// One declared property of an object node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Property name as written
    pub name: String,
    /// Node typing the property
    pub node: NodeId,
    /// Listed in the object's `required`
    pub required: bool,
}

/// What an object says about keys it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionalFields {
    /// No `additionalProperties` keyword
    Unspecified,
    /// `additionalProperties: true`
    Any,
    /// `additionalProperties: false`
    Forbidden,
    /// `additionalProperties: { schema }`
    Typed(NodeId),
}

/// Keyword a union came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `oneOf`
    OneOf,
    /// `anyOf`, or a `type` array with several non-null entries
    AnyOf,
}

/// Discriminator with its mapping resolved to nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionDiscriminator {
    /// Property carrying the tag
    pub property: String,
    /// Tag value → member node, in document order
    pub mapping: Vec<(String, NodeId)>,
}

/// Shape of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// A scalar
    Primitive(Primitive),
    /// `enum` or `const` values, in document order
    Enum(Vec<EnumValue>),
    /// Array of the item node
    Array(NodeId),
    /// Object with declared properties
    Object {
        /// Fields in document order
        fields: Vec<Field>,
        /// Treatment of undeclared keys
        additional: AdditionalFields,
    },
    /// `oneOf` / `anyOf`
    Union {
        /// Keyword the union came from
        combinator: Combinator,
        /// Member nodes in document order
        members: Vec<NodeId>,
        /// Tag property and mapping, when declared
        discriminator: Option<UnionDiscriminator>,
    },
    /// `allOf` members, own properties last
    Intersection(Vec<NodeId>),
    /// A `$ref` carrying siblings of its own (e.g. `nullable`)
    Reference(NodeId),
    /// No constraint, or a construct typed as `unknown` in best-effort mode
    Unknown,
}

impl SchemaKind {
    /// Children TypeScript must resolve to declare an alias of this shape:
    /// everything except property types and array items.
    pub fn eager_children(&self) -> Vec<NodeId> {
        match self {
            SchemaKind::Object {
                additional: AdditionalFields::Typed(node),
                ..
            }
            | SchemaKind::Reference(node) => vec![*node],
            SchemaKind::Array(_)
            | SchemaKind::Object { .. }
            | SchemaKind::Primitive(_)
            | SchemaKind::Enum(_)
            | SchemaKind::Unknown => Vec::new(),
            SchemaKind::Union { members, .. } | SchemaKind::Intersection(members) => {
                members.clone()
            }
        }
    }

    /// Direct children, in declaration order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            SchemaKind::Primitive(_) | SchemaKind::Enum(_) | SchemaKind::Unknown => Vec::new(),
            SchemaKind::Array(item) | SchemaKind::Reference(item) => vec![*item],
            SchemaKind::Object { fields, additional } => {
                let mut out: Vec<_> = fields.iter().map(|f| f.node).collect();
                if let AdditionalFields::Typed(node) = additional {
                    out.push(*node);
                }
                out
            }
            SchemaKind::Union { members, .. } | SchemaKind::Intersection(members) => {
                members.clone()
            }
        }
    }
}

/// One typed shape in the graph.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    /// Component name or inline location
    pub origin: Origin,
    /// Shape of the schema
    pub kind: SchemaKind,
    /// How the schema admits `null`
    pub nullable: Nullability,
    /// `description`, rendered as JSDoc
    pub description: Option<String>,
}

/// A resolved operation parameter.
#[derive(Debug, Clone)]
pub struct ParamSchema {
    /// Parameter name as written
    pub name: String,
    /// `in` value
    pub location: ParameterLocation,
    /// Always true for path parameters
    pub required: bool,
    /// Node typing the value
    pub node: NodeId,
    /// `description`, rendered as JSDoc
    pub description: Option<String>,
}

/// One media type of a body or response.
#[derive(Debug, Clone)]
pub struct MediaSchema {
    /// Media type key, e.g. `application/json`
    pub content_type: String,
    /// Node typing the payload
    pub node: NodeId,
}

/// A resolved request body.
#[derive(Debug, Clone)]
pub struct BodySchema {
    /// `required` on the request body
    pub required: bool,
    /// Media types in document order
    pub content: Vec<MediaSchema>,
}

/// One declared response status.
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    /// Status code as written (`200`, `2XX`, `default`)
    pub status: String,
    /// Response `description`
    pub description: Option<String>,
    /// Empty when the status has no body
    pub content: Vec<MediaSchema>,
}

/// An operation with every schema resolved to a node.
#[derive(Debug, Clone)]
pub struct OperationSchemas {
    /// HTTP method
    pub method: HttpMethod,
    /// Path template as written
    pub path: String,
    /// Operation `summary`
    pub summary: Option<String>,
    /// Operation `deprecated`
    pub deprecated: bool,
    /// Merged path-level and operation-level parameters
    pub params: Vec<ParamSchema>,
    /// Request body, if declared
    pub body: Option<BodySchema>,
    /// Responses in document order
    pub responses: Vec<ResponseSchema>,
}

/// Arena of schema nodes plus the operations that reference them.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    nodes: Vec<SchemaNode>,
    components: Vec<(String, NodeId)>,
    operations: Vec<OperationSchemas>,
}

impl SchemaGraph {
    /// Build the graph for a whole description.
    ///
    /// With `best_effort`, constructs without a TypeScript mapping become
    /// `Unknown` nodes and are reported as diagnostics instead of failing.
    pub fn build(desc: &ApiDescription, best_effort: bool) -> Result<(Self, Vec<Diagnostic>)> {
        let mut builder = Builder::new(desc, best_effort);
        builder.build_components()?;
        builder.build_operations()?;

        debug!(
            nodes = builder.nodes.len(),
            components = builder.components.len(),
            operations = builder.operations.len(),
            diagnostics = builder.diagnostics.len(),
            "Built schema graph"
        );

        let graph = SchemaGraph {
            nodes: builder.nodes,
            components: builder.components,
            operations: builder.operations,
        };
        Ok((graph, builder.diagnostics))
    }

    /// Node behind `id`.
    ///
    /// Ids only come from this graph, so indexing cannot go out of range.
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Component names and their nodes, in name order.
    pub fn components(&self) -> &[(String, NodeId)] {
        &self.components
    }

    /// Component name of a node, if it is a component.
    pub fn component_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).origin {
            Origin::Component { name } => Some(name),
            Origin::Inline { .. } => None,
        }
    }

    /// Whether `id` is a named component.
    pub fn is_component(&self, id: NodeId) -> bool {
        self.component_name(id).is_some()
    }

    /// Operations in (path, method) order.
    pub fn operations(&self) -> &[OperationSchemas] {
        &self.operations
    }
}

/// JSON-pointer location of a component schema.
pub fn component_location(name: &str) -> String {
    format!("{SCHEMA_REF_PREFIX}{}", escape_pointer(name))
}

/// Escape one JSON-pointer token.
fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape_pointer(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn malformed(location: &str, reason: impl Into<String>) -> GenerationError {
    GenerationError::MalformedSchema {
        location: location.to_string(),
        reason: reason.into(),
    }
}

/// Names of the `{placeholders}` in a path template, in order.
pub fn path_placeholders(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        names.push(rest[start + 1..start + len].to_string());
        rest = &rest[start + len + 1..];
    }
    names
}

fn operations_of(item: &PathItem) -> impl Iterator<Item = (HttpMethod, &Operation)> {
    HttpMethod::ALL.into_iter().filter_map(move |method| {
        let op = match method {
            HttpMethod::Get => item.get.as_ref(),
            HttpMethod::Head => item.head.as_ref(),
            HttpMethod::Post => item.post.as_ref(),
            HttpMethod::Put => item.put.as_ref(),
            HttpMethod::Patch => item.patch.as_ref(),
            HttpMethod::Delete => item.delete.as_ref(),
        };
        op.map(|op| (method, op))
    })
}

/// Follow `$ref`s through one component map until an inline item.
fn resolve_component<'d, T>(
    map: Option<&'d IndexMap<String, RefOr<T>>>,
    prefix: &str,
    mut item: &'d RefOr<T>,
    location: &str,
) -> Result<&'d T> {
    for _ in 0..MAX_REF_DEPTH {
        match item {
            RefOr::Item(value) => return Ok(value),
            RefOr::Ref(reference) => {
                let name = reference.ref_path.strip_prefix(prefix).ok_or_else(|| {
                    malformed(
                        location,
                        format!("unsupported reference `{}`", reference.ref_path),
                    )
                })?;
                item = map
                    .and_then(|m| m.get(unescape_pointer(name).as_str()))
                    .ok_or_else(|| {
                        malformed(
                            location,
                            format!("unresolved reference `{}`", reference.ref_path),
                        )
                    })?;
            }
        }
    }
    Err(malformed(
        location,
        format!("reference chain longer than {MAX_REF_DEPTH}"),
    ))
}

struct Builder<'a> {
    desc: &'a ApiDescription,
    best_effort: bool,
    nodes: Vec<SchemaNode>,
    components: Vec<(String, NodeId)>,
    component_ids: BTreeMap<String, NodeId>,
    operations: Vec<OperationSchemas>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Builder<'a> {
    fn new(desc: &'a ApiDescription, best_effort: bool) -> Self {
        Self {
            desc,
            best_effort,
            nodes: Vec::new(),
            components: Vec::new(),
            component_ids: BTreeMap::new(),
            operations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, origin: Origin, kind: SchemaKind, nullable: Nullability) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SchemaNode {
            origin,
            kind,
            nullable,
            description: None,
        });
        id
    }

    fn inline(&mut self, location: &str, kind: SchemaKind) -> NodeId {
        self.push(
            Origin::Inline {
                location: location.to_string(),
            },
            kind,
            Nullability::NotNull,
        )
    }

    fn unsupported(&mut self, location: &str, construct: &str) -> Result<SchemaKind> {
        if self.best_effort {
            warn!(location, construct, "Unsupported construct typed as unknown");
            self.diagnostics.push(Diagnostic {
                location: location.to_string(),
                construct: construct.to_string(),
            });
            Ok(SchemaKind::Unknown)
        } else {
            Err(GenerationError::UnsupportedConstruct {
                location: location.to_string(),
                construct: construct.to_string(),
            })
        }
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    fn build_components(&mut self) -> Result<()> {
        let desc = self.desc;
        let Some(components) = &desc.components else {
            return Ok(());
        };
        let mut names: Vec<&String> = components.schemas.keys().collect();
        names.sort();

        // Reserve ids first so references resolve before their target is built
        for name in &names {
            let id = self.push(
                Origin::Component {
                    name: (*name).clone(),
                },
                SchemaKind::Unknown,
                Nullability::NotNull,
            );
            self.components.push(((*name).clone(), id));
            self.component_ids.insert((*name).clone(), id);
        }

        for (name, id) in self.components.clone() {
            let Some(schema) = components.schemas.get(&name) else {
                continue;
            };
            let location = component_location(&name);
            let (kind, nullable) = self.build_kind(schema, &location, Some(id))?;
            let node = &mut self.nodes[id.0];
            node.kind = kind;
            node.nullable = nullable;
            node.description = schema.description.clone();
        }
        Ok(())
    }

    fn resolve_schema_ref(&self, ref_path: &str, location: &str) -> Result<NodeId> {
        let name = if let Some(name) = ref_path.strip_prefix(SCHEMA_REF_PREFIX) {
            unescape_pointer(name)
        } else {
            return Err(malformed(
                location,
                format!("unsupported reference `{ref_path}`"),
            ));
        };
        self.component_ids
            .get(&name)
            .copied()
            .ok_or_else(|| malformed(location, format!("unresolved reference `{ref_path}`")))
    }

    // -------------------------------------------------------------------------
    // Schemas
    // -------------------------------------------------------------------------

    /// Build an anonymous schema and return its node.
    fn build_schema(&mut self, schema: &Schema, location: &str) -> Result<NodeId> {
        if let Some(ref_path) = &schema.ref_path
            && schema.is_bare_ref()
        {
            return self.resolve_schema_ref(ref_path, location);
        }
        let (kind, nullable) = self.build_kind(schema, location, None)?;
        let id = self.push(
            Origin::Inline {
                location: location.to_string(),
            },
            kind,
            nullable,
        );
        self.nodes[id.0].description = schema.description.clone();
        Ok(id)
    }

    /// Work out the kind and nullability of one schema.
    ///
    /// `component` is the node being filled when the schema is a component
    /// itself; a component that is a bare `$ref` becomes a reference node.
    fn build_kind(
        &mut self,
        schema: &Schema,
        location: &str,
        component: Option<NodeId>,
    ) -> Result<(SchemaKind, Nullability)> {
        let flag = if schema.nullable == Some(true) {
            Nullability::Flag
        } else {
            Nullability::NotNull
        };

        if let Some(ref_path) = &schema.ref_path {
            let target = self.resolve_schema_ref(ref_path, location)?;
            if component == Some(target) && schema.is_bare_ref() {
                return Err(malformed(location, "component refers to itself"));
            }
            let rest = Schema {
                ref_path: None,
                nullable: None,
                description: None,
                title: None,
                ..schema.clone()
            };
            if !has_structure(&rest) {
                return Ok((SchemaKind::Reference(target), flag));
            }
            // `$ref` with structural siblings: both must hold
            let rest_id = self.build_schema(&rest, &format!("{location}/siblings"))?;
            return Ok((SchemaKind::Intersection(vec![target, rest_id]), flag));
        }

        if schema.not.is_some() {
            return Ok((self.unsupported(&format!("{location}/not"), "not")?, flag));
        }

        if let Some(value) = &schema.const_value {
            let kind = match const_to_enum_value(value) {
                Some(v) => SchemaKind::Enum(vec![v]),
                None => self.unsupported(location, "const with a non-scalar value")?,
            };
            return Ok((kind, flag));
        }

        if let Some(all_of) = &schema.all_of {
            let members = self.build_members(all_of, &format!("{location}/allOf"))?;
            let kind = if schema.properties.is_some() || schema.additional_properties.is_some() {
                // Own properties next to allOf are one more member
                let own = Schema {
                    all_of: None,
                    description: None,
                    nullable: None,
                    ..schema.clone()
                };
                let own_id = self.build_schema(&own, &format!("{location}/properties"))?;
                let mut members = members;
                members.push(own_id);
                SchemaKind::Intersection(members)
            } else {
                SchemaKind::Intersection(members)
            };
            return Ok((kind, flag));
        }

        if let Some(any_of) = &schema.any_of {
            let members = self.build_members(any_of, &format!("{location}/anyOf"))?;
            let discriminator = self.build_discriminator(schema, location)?;
            return Ok((
                SchemaKind::Union {
                    combinator: Combinator::AnyOf,
                    members,
                    discriminator,
                },
                flag,
            ));
        }

        if let Some(one_of) = &schema.one_of {
            let members = self.build_members(one_of, &format!("{location}/oneOf"))?;
            let discriminator = self.build_discriminator(schema, location)?;
            return Ok((
                SchemaKind::Union {
                    combinator: Combinator::OneOf,
                    members,
                    discriminator,
                },
                flag,
            ));
        }

        if let Some(values) = &schema.enum_values {
            return Ok((SchemaKind::Enum(values.clone()), flag));
        }

        match &schema.schema_type {
            Some(SchemaType::Single(ty)) => {
                let kind = self.build_typed(ty, schema, location)?;
                Ok((kind, flag))
            }
            Some(SchemaType::Multiple(types)) => {
                let position = types.iter().position(|t| t == "null");
                let nullable = match position {
                    Some(position) => Nullability::TypeArray { position },
                    None => flag,
                };
                let non_null: Vec<&String> = types.iter().filter(|t| *t != "null").collect();
                let kind = match non_null.as_slice() {
                    [] => SchemaKind::Primitive(Primitive::Null),
                    [single] => self.build_typed(single, schema, location)?,
                    many => {
                        let mut members = Vec::with_capacity(many.len());
                        for (i, ty) in many.iter().enumerate() {
                            let member_location = format!("{location}/type/{i}");
                            let kind = self.build_typed(ty, schema, &member_location)?;
                            members.push(self.inline(&member_location, kind));
                        }
                        SchemaKind::Union {
                            combinator: Combinator::AnyOf,
                            members,
                            discriminator: None,
                        }
                    }
                };
                Ok((kind, nullable))
            }
            None => {
                let kind = if schema.properties.is_some() || schema.additional_properties.is_some()
                {
                    self.build_object(schema, location)?
                } else if let Some(items) = &schema.items {
                    SchemaKind::Array(self.build_schema(items, &format!("{location}/items"))?)
                } else {
                    SchemaKind::Unknown
                };
                Ok((kind, flag))
            }
        }
    }

    /// Mapping targets may be full references or bare component names.
    fn build_discriminator(
        &self,
        schema: &Schema,
        location: &str,
    ) -> Result<Option<UnionDiscriminator>> {
        let Some(disc) = &schema.discriminator else {
            return Ok(None);
        };
        let mut mapping = Vec::new();
        for (value, target) in disc.mapping.iter().flatten() {
            let target = if target.starts_with('#') {
                target.clone()
            } else {
                format!("{SCHEMA_REF_PREFIX}{target}")
            };
            let id = self.resolve_schema_ref(&target, &format!("{location}/discriminator"))?;
            mapping.push((value.clone(), id));
        }
        Ok(Some(UnionDiscriminator {
            property: disc.property_name.clone(),
            mapping,
        }))
    }

    fn build_members(&mut self, schemas: &[Schema], location: &str) -> Result<Vec<NodeId>> {
        schemas
            .iter()
            .enumerate()
            .map(|(i, s)| self.build_schema(s, &format!("{location}/{i}")))
            .collect()
    }

    /// Kind for a single `type` name.
    fn build_typed(&mut self, ty: &str, schema: &Schema, location: &str) -> Result<SchemaKind> {
        let kind = match ty {
            "string" if schema.format.as_deref() == Some("binary") => {
                SchemaKind::Primitive(Primitive::Binary)
            }
            "string" => SchemaKind::Primitive(Primitive::String),
            "integer" => SchemaKind::Primitive(Primitive::Integer),
            "number" => SchemaKind::Primitive(Primitive::Number),
            "boolean" => SchemaKind::Primitive(Primitive::Boolean),
            "null" => SchemaKind::Primitive(Primitive::Null),
            "array" => {
                let item = match &schema.items {
                    Some(items) => self.build_schema(items, &format!("{location}/items"))?,
                    None => self.inline(&format!("{location}/items"), SchemaKind::Unknown),
                };
                SchemaKind::Array(item)
            }
            "object" => self.build_object(schema, location)?,
            other => self.unsupported(location, &format!("type `{other}`"))?,
        };
        Ok(kind)
    }

    fn build_object(&mut self, schema: &Schema, location: &str) -> Result<SchemaKind> {
        let required: BTreeSet<&str> = schema
            .required
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();

        let mut fields = Vec::new();
        for (name, prop) in schema.properties.iter().flatten() {
            let node = self.build_schema(
                prop,
                &format!("{location}/properties/{}", escape_pointer(name)),
            )?;
            fields.push(Field {
                name: name.clone(),
                node,
                required: required.contains(name.as_str()),
            });
        }

        let additional = match &schema.additional_properties {
            None => AdditionalFields::Unspecified,
            Some(AdditionalProperties::Bool(true)) => AdditionalFields::Any,
            Some(AdditionalProperties::Bool(false)) => AdditionalFields::Forbidden,
            Some(AdditionalProperties::Schema(inner)) => AdditionalFields::Typed(
                self.build_schema(inner, &format!("{location}/additionalProperties"))?,
            ),
        };

        Ok(SchemaKind::Object { fields, additional })
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    fn build_operations(&mut self) -> Result<()> {
        let desc = self.desc;
        let mut paths: Vec<(&String, &PathItem)> = desc.paths.iter().collect();
        paths.sort_by(|a, b| a.0.cmp(b.0));

        for (path, item) in paths {
            for (method, op) in operations_of(item) {
                let location = format!(
                    "#/paths/{}/{}",
                    escape_pointer(path),
                    method.as_str().to_ascii_lowercase()
                );
                let built = self.build_operation(path, method, item, op, &location)?;
                self.operations.push(built);
            }
        }
        Ok(())
    }

    fn build_operation(
        &mut self,
        path: &str,
        method: HttpMethod,
        item: &'a PathItem,
        op: &'a Operation,
        location: &str,
    ) -> Result<OperationSchemas> {
        let params = self.build_params(path, item, op, location)?;

        let body = match &op.request_body {
            Some(body) => Some(self.build_body(body, &format!("{location}/requestBody"))?),
            None => None,
        };

        let mut responses = Vec::with_capacity(op.responses.len());
        for (status, response) in &op.responses {
            let response_location = format!("{location}/responses/{}", escape_pointer(status));
            responses.push(self.build_response(status, response, &response_location)?);
        }

        Ok(OperationSchemas {
            method,
            path: path.to_string(),
            summary: op.summary.clone().or_else(|| op.description.clone()),
            deprecated: op.deprecated,
            params,
            body,
            responses,
        })
    }

    /// Resolve a parameter list, rejecting duplicate (name, location) pairs.
    fn resolve_params(
        &self,
        list: &'a [RefOr<Parameter>],
        location: &str,
    ) -> Result<Vec<&'a Parameter>> {
        let desc = self.desc;
        let map = desc.components.as_ref().map(|c| &c.parameters);
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(list.len());
        for param in list {
            let param = resolve_component(map, PARAMETER_REF_PREFIX, param, location)?;
            if !seen.insert((param.name.as_str(), param.location)) {
                return Err(malformed(
                    location,
                    format!(
                        "duplicate {} parameter `{}`",
                        param.location.as_str(),
                        param.name
                    ),
                ));
            }
            out.push(param);
        }
        Ok(out)
    }

    fn build_params(
        &mut self,
        path: &str,
        item: &'a PathItem,
        op: &'a Operation,
        location: &str,
    ) -> Result<Vec<ParamSchema>> {
        let shared = self.resolve_params(&item.parameters, location)?;
        let own = self.resolve_params(&op.parameters, &format!("{location}/parameters"))?;

        // Operation-level parameters override path-level ones
        let mut merged: Vec<&Parameter> = shared;
        for param in own {
            match merged
                .iter()
                .position(|p| p.name == param.name && p.location == param.location)
            {
                Some(i) => merged[i] = param,
                None => merged.push(param),
            }
        }

        let mut params = Vec::with_capacity(merged.len());
        for param in merged {
            let param_location = format!(
                "{location}/parameters/{}/{}",
                param.location.as_str(),
                escape_pointer(&param.name)
            );
            let node = match &param.schema {
                Some(schema) => self.build_schema(schema, &param_location)?,
                None => self.inline(&param_location, SchemaKind::Primitive(Primitive::String)),
            };
            params.push(ParamSchema {
                name: param.name.clone(),
                location: param.location,
                // Path parameters are always required
                required: param.required || param.location == ParameterLocation::Path,
                node,
                description: param.description.clone(),
            });
        }

        for placeholder in path_placeholders(path) {
            let declared = params
                .iter()
                .any(|p| p.location == ParameterLocation::Path && p.name == placeholder);
            if declared {
                continue;
            }
            warn!(
                path,
                placeholder = placeholder.as_str(),
                "Path placeholder has no declared parameter, typing it as string"
            );
            let param_location = format!(
                "{location}/parameters/path/{}",
                escape_pointer(&placeholder)
            );
            let node = self.inline(&param_location, SchemaKind::Primitive(Primitive::String));
            params.push(ParamSchema {
                name: placeholder,
                location: ParameterLocation::Path,
                required: true,
                node,
                description: None,
            });
        }

        Ok(params)
    }

    fn build_media(
        &mut self,
        content: &IndexMap<String, MediaType>,
        location: &str,
    ) -> Result<Vec<MediaSchema>> {
        let mut out = Vec::with_capacity(content.len());
        for (content_type, media) in content {
            let media_location = format!("{location}/content/{}/schema", escape_pointer(content_type));
            let node = match &media.schema {
                Some(schema) => self.build_schema(schema, &media_location)?,
                None => self.inline(&media_location, SchemaKind::Unknown),
            };
            out.push(MediaSchema {
                content_type: content_type.clone(),
                node,
            });
        }
        Ok(out)
    }

    fn build_body(&mut self, body: &RefOr<RequestBody>, location: &str) -> Result<BodySchema> {
        let map = self.desc.components.as_ref().map(|c| &c.request_bodies);
        let body = resolve_component(map, REQUEST_BODY_REF_PREFIX, body, location)?;
        Ok(BodySchema {
            required: body.required,
            content: self.build_media(&body.content, location)?,
        })
    }

    fn build_response(
        &mut self,
        status: &str,
        response: &RefOr<Response>,
        location: &str,
    ) -> Result<ResponseSchema> {
        let map = self.desc.components.as_ref().map(|c| &c.responses);
        let response = resolve_component(map, RESPONSE_REF_PREFIX, response, location)?;
        Ok(ResponseSchema {
            status: status.to_string(),
            description: response.description.clone(),
            content: self.build_media(&response.content, location)?,
        })
    }
}

/// True when the schema says anything about shape beyond annotations.
fn has_structure(schema: &Schema) -> bool {
    schema.schema_type.is_some()
        || schema.properties.is_some()
        || schema.items.is_some()
        || schema.enum_values.is_some()
        || schema.any_of.is_some()
        || schema.one_of.is_some()
        || schema.all_of.is_some()
        || schema.not.is_some()
        || schema.additional_properties.is_some()
        || schema.const_value.is_some()
}

fn const_to_enum_value(value: &serde_json::Value) -> Option<EnumValue> {
    match value {
        serde_json::Value::Null => Some(EnumValue::Null),
        serde_json::Value::Bool(b) => Some(EnumValue::Bool(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(EnumValue::Integer(i)),
            None => n.as_f64().map(EnumValue::Float),
        },
        serde_json::Value::String(s) => Some(EnumValue::String(s.clone())),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn build(json: &str) -> Result<(SchemaGraph, Vec<Diagnostic>)> {
        let desc = ApiDescription::from_json(json).unwrap();
        SchemaGraph::build(&desc, false)
    }

    fn component(graph: &SchemaGraph, name: &str) -> NodeId {
        graph
            .components()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
            .unwrap()
    }

    #[test]
    fn test_components_get_sorted_ids() {
        let (graph, _) = build(
            r#"{ "components": { "schemas": {
                "Zebra": { "type": "string" },
                "Apple": { "type": "integer" }
            } } }"#,
        )
        .unwrap();
        let names: Vec<_> = graph.components().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Apple", "Zebra"]);
        assert_eq!(component(&graph, "Apple"), NodeId(0));
        assert_eq!(graph.component_name(NodeId(1)), Some("Zebra"));
    }

    #[allow(clippy::panic)]
    #[test]
    fn test_bare_refs_are_interned() {
        let (graph, _) = build(
            r##"{ "components": { "schemas": {
                "User": { "type": "object", "properties": { "id": { "type": "string" } } },
                "Pair": { "type": "object", "properties": {
                    "a": { "$ref": "#/components/schemas/User" },
                    "b": { "$ref": "#/components/schemas/User" }
                } }
            } } }"##,
        )
        .unwrap();
        let user = component(&graph, "User");
        let pair = component(&graph, "Pair");
        match &graph.node(pair).kind {
            SchemaKind::Object { fields, .. } => {
                assert_eq!(fields[0].node, user);
                assert_eq!(fields[1].node, user);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_builds() {
        let (graph, _) = build(
            r##"{ "components": { "schemas": {
                "Node": { "type": "object", "properties": {
                    "next": { "$ref": "#/components/schemas/Node" }
                } }
            } } }"##,
        )
        .unwrap();
        let node = component(&graph, "Node");
        assert_eq!(graph.node(node).kind.children(), vec![node]);
    }

    #[test]
    fn test_dangling_ref_is_malformed() {
        let err = build(
            r##"{ "components": { "schemas": {
                "A": { "$ref": "#/components/schemas/Missing" }
            } } }"##,
        )
        .unwrap_err();
        assert!(matches!(err, GenerationError::MalformedSchema { .. }));
    }

    #[test]
    fn test_external_ref_is_malformed() {
        let err = build(
            r##"{ "components": { "schemas": {
                "A": { "$ref": "other.json#/components/schemas/B" }
            } } }"##,
        )
        .unwrap_err();
        assert!(
            matches!(err, GenerationError::MalformedSchema { reason, .. } if reason.contains("unsupported reference"))
        );
    }

    #[test]
    fn test_not_is_unsupported() {
        let json = r#"{ "components": { "schemas": {
            "NotString": { "not": { "type": "string" } }
        } } }"#;
        let err = build(json).unwrap_err();
        assert!(
            matches!(err, GenerationError::UnsupportedConstruct { construct, .. } if construct == "not")
        );

        let desc = ApiDescription::from_json(json).unwrap();
        let (graph, diagnostics) = SchemaGraph::build(&desc, true).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].location,
            "#/components/schemas/NotString/not"
        );
        assert_eq!(
            graph.node(component(&graph, "NotString")).kind,
            SchemaKind::Unknown
        );
    }

    #[test]
    fn test_unknown_type_name_is_unsupported() {
        let err = build(
            r#"{ "components": { "schemas": { "Odd": { "type": "decimal" } } } }"#,
        )
        .unwrap_err();
        assert!(
            matches!(err, GenerationError::UnsupportedConstruct { construct, .. } if construct == "type `decimal`")
        );
    }

    #[test]
    fn test_nullable_encodings() {
        let (graph, _) = build(
            r#"{ "components": { "schemas": {
                "Flagged": { "type": "string", "nullable": true },
                "Listed": { "type": ["null", "string"] },
                "Mixed": { "type": ["string", "integer", "null"] }
            } } }"#,
        )
        .unwrap();
        let flagged = graph.node(component(&graph, "Flagged"));
        assert_eq!(flagged.nullable, Nullability::Flag);
        assert_eq!(flagged.kind, SchemaKind::Primitive(Primitive::String));

        let listed = graph.node(component(&graph, "Listed"));
        assert_eq!(listed.nullable, Nullability::TypeArray { position: 0 });
        assert_eq!(listed.kind, SchemaKind::Primitive(Primitive::String));

        let mixed = graph.node(component(&graph, "Mixed"));
        assert_eq!(mixed.nullable, Nullability::TypeArray { position: 2 });
        assert!(matches!(&mixed.kind, SchemaKind::Union { members, .. } if members.len() == 2));
    }

    #[test]
    fn test_ref_with_nullable_sibling() {
        let (graph, _) = build(
            r##"{ "components": { "schemas": {
                "User": { "type": "object" },
                "Owner": { "$ref": "#/components/schemas/User", "nullable": true }
            } } }"##,
        )
        .unwrap();
        let owner = graph.node(component(&graph, "Owner"));
        assert_eq!(owner.kind, SchemaKind::Reference(component(&graph, "User")));
        assert_eq!(owner.nullable, Nullability::Flag);
    }

    #[test]
    fn test_const_and_binary() {
        let (graph, _) = build(
            r#"{ "components": { "schemas": {
                "Kind": { "const": "guild" },
                "File": { "type": "string", "format": "binary" }
            } } }"#,
        )
        .unwrap();
        assert_eq!(
            graph.node(component(&graph, "Kind")).kind,
            SchemaKind::Enum(vec![EnumValue::String("guild".into())])
        );
        assert_eq!(
            graph.node(component(&graph, "File")).kind,
            SchemaKind::Primitive(Primitive::Binary)
        );
    }

    #[allow(clippy::panic)]
    #[test]
    fn test_discriminator_mapping_resolves() {
        let (graph, _) = build(
            r##"{ "components": { "schemas": {
                "Cat": { "type": "object" },
                "Dog": { "type": "object" },
                "Pet": {
                    "oneOf": [
                        { "$ref": "#/components/schemas/Cat" },
                        { "$ref": "#/components/schemas/Dog" }
                    ],
                    "discriminator": {
                        "propertyName": "kind",
                        "mapping": { "cat": "#/components/schemas/Cat", "dog": "Dog" }
                    }
                }
            } } }"##,
        )
        .unwrap();
        let cat = component(&graph, "Cat");
        let dog = component(&graph, "Dog");
        match &graph.node(component(&graph, "Pet")).kind {
            SchemaKind::Union {
                combinator,
                members,
                discriminator: Some(disc),
            } => {
                assert_eq!(*combinator, Combinator::OneOf);
                assert_eq!(members, &vec![cat, dog]);
                assert_eq!(disc.property, "kind");
                assert_eq!(
                    disc.mapping,
                    vec![("cat".to_string(), cat), ("dog".to_string(), dog)]
                );
            }
            other => panic!("expected discriminated union, got {other:?}"),
        }
    }

    #[test]
    fn test_operations_sorted_and_params_merged() {
        let (graph, _) = build(
            r##"{
                "paths": {
                    "/guilds/{guild_id}/bans": {
                        "parameters": [
                            { "name": "guild_id", "in": "path", "schema": { "type": "string" } },
                            { "name": "limit", "in": "query", "schema": { "type": "integer" } }
                        ],
                        "get": {
                            "parameters": [
                                { "name": "limit", "in": "query", "required": true, "schema": { "type": "integer" } },
                                { "$ref": "#/components/parameters/Before" }
                            ],
                            "responses": { "200": { "description": "OK" } }
                        }
                    },
                    "/gateway": {
                        "post": { "responses": {} },
                        "get": { "responses": {} }
                    }
                },
                "components": {
                    "parameters": {
                        "Before": { "name": "before", "in": "query", "schema": { "type": "string" } }
                    }
                }
            }"##,
        )
        .unwrap();

        let ops: Vec<_> = graph
            .operations()
            .iter()
            .map(|o| (o.method, o.path.as_str()))
            .collect();
        assert_eq!(
            ops,
            [
                (HttpMethod::Get, "/gateway"),
                (HttpMethod::Post, "/gateway"),
                (HttpMethod::Get, "/guilds/{guild_id}/bans"),
            ]
        );

        let bans = &graph.operations()[2];
        let params: Vec<_> = bans
            .params
            .iter()
            .map(|p| (p.name.as_str(), p.location, p.required))
            .collect();
        assert_eq!(
            params,
            [
                ("guild_id", ParameterLocation::Path, true),
                ("limit", ParameterLocation::Query, true),
                ("before", ParameterLocation::Query, false),
            ]
        );
    }

    #[test]
    fn test_duplicate_parameter_is_malformed() {
        let err = build(
            r#"{ "paths": { "/items": { "get": {
                "parameters": [
                    { "name": "q", "in": "query" },
                    { "name": "q", "in": "query" }
                ],
                "responses": {}
            } } } }"#,
        )
        .unwrap_err();
        assert!(
            matches!(err, GenerationError::MalformedSchema { reason, .. } if reason.contains("duplicate query parameter `q`"))
        );
    }

    #[test]
    fn test_undeclared_placeholder_becomes_string_param() {
        let (graph, _) = build(
            r#"{ "paths": { "/channels/{channel_id}/messages": { "get": { "responses": {} } } } }"#,
        )
        .unwrap();
        let op = &graph.operations()[0];
        assert_eq!(op.params.len(), 1);
        assert_eq!(op.params[0].name, "channel_id");
        assert!(op.params[0].required);
        assert_eq!(
            graph.node(op.params[0].node).kind,
            SchemaKind::Primitive(Primitive::String)
        );
    }

    #[test]
    fn test_component_response_ref() {
        let (graph, _) = build(
            r##"{
                "paths": { "/gateway": { "get": { "responses": {
                    "200": { "$ref": "#/components/responses/Gateway" },
                    "204": { "description": "No Content" }
                } } } },
                "components": { "responses": {
                    "Gateway": { "content": { "application/json": { "schema": { "type": "object" } } } }
                } }
            }"##,
        )
        .unwrap();
        let op = &graph.operations()[0];
        assert_eq!(op.responses[0].status, "200");
        assert_eq!(op.responses[0].content[0].content_type, "application/json");
        assert!(op.responses[1].content.is_empty());
    }

    #[test]
    fn test_unresolved_request_body_ref() {
        let err = build(
            r##"{ "paths": { "/items": { "post": {
                "requestBody": { "$ref": "#/components/requestBodies/Missing" },
                "responses": {}
            } } } }"##,
        )
        .unwrap_err();
        assert!(matches!(err, GenerationError::MalformedSchema { .. }));
    }

    #[test]
    fn test_path_placeholders() {
        assert_eq!(
            path_placeholders("/guilds/{guild_id}/members/{user_id}"),
            ["guild_id", "user_id"]
        );
        assert!(path_placeholders("/gateway").is_empty());
        assert_eq!(path_placeholders("/files/{name}.{ext}"), ["name", "ext"]);
        assert_eq!(path_placeholders("/broken/{open"), Vec::<String>::new());
    }

    #[test]
    fn test_every_placeholder_in_a_segment_becomes_a_param() {
        let (graph, _) = build(
            r#"{ "paths": { "/files/{name}.{ext}": { "get": {
                "parameters": [
                    { "name": "name", "in": "path", "schema": { "type": "string" } }
                ],
                "responses": { "200": { "description": "File" } }
            } } } }"#,
        )
        .unwrap();
        let names: Vec<_> = graph.operations()[0]
            .params
            .iter()
            .map(|p| (p.name.as_str(), p.required))
            .collect();
        assert_eq!(names, [("name", true), ("ext", true)]);
    }

    #[allow(clippy::panic)]
    #[test]
    fn test_any_of_keeps_discriminator() {
        let (graph, _) = build(
            r##"{ "components": { "schemas": {
                "Cat": { "type": "object" },
                "Dog": { "type": "object" },
                "Pet": {
                    "anyOf": [
                        { "$ref": "#/components/schemas/Cat" },
                        { "$ref": "#/components/schemas/Dog" }
                    ],
                    "discriminator": { "propertyName": "kind", "mapping": { "cat": "Cat" } }
                }
            } } }"##,
        )
        .unwrap();
        let cat = component(&graph, "Cat");
        match &graph.node(component(&graph, "Pet")).kind {
            SchemaKind::Union {
                combinator: Combinator::AnyOf,
                discriminator: Some(disc),
                ..
            } => {
                assert_eq!(disc.property, "kind");
                assert_eq!(disc.mapping, vec![("cat".to_string(), cat)]);
            }
            other => panic!("expected discriminated anyOf, got {other:?}"),
        }
    }
}
