//! API description structs for serde deserialization.
//!
//! This module defines the subset of OpenAPI 3.0/3.1 the generator resolves.
//! Maps are `IndexMap`s so document order (property order in particular)
//! survives deserialization.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::Result;

/// Root API description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiDescription {
    /// Path templates and their operations.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    /// Reusable components.
    pub components: Option<Components>,
}

/// Components section containing reusable definitions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Named schemas, referenced as `#/components/schemas/{name}`.
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
    /// Named parameters, referenced as `#/components/parameters/{name}`.
    #[serde(default)]
    pub parameters: IndexMap<String, RefOr<Parameter>>,
    /// Named request bodies, referenced as `#/components/requestBodies/{name}`.
    #[serde(default)]
    pub request_bodies: IndexMap<String, RefOr<RequestBody>>,
    /// Named responses, referenced as `#/components/responses/{name}`.
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<Response>>,
}

/// Either a `$ref` or an inline definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// `{ "$ref": "#/components/..." }`
    Ref(Reference),
    /// Inline definition.
    Item(T),
}

/// A JSON reference object.
#[derive(Debug, Clone, Deserialize)]
pub struct Reference {
    /// The reference pointer.
    #[serde(rename = "$ref")]
    pub ref_path: String,
}

/// A path item containing operations for different HTTP methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    /// `GET` operation
    pub get: Option<Operation>,
    /// `HEAD` operation
    pub head: Option<Operation>,
    /// `POST` operation
    pub post: Option<Operation>,
    /// `PUT` operation
    pub put: Option<Operation>,
    /// `PATCH` operation
    pub patch: Option<Operation>,
    /// `DELETE` operation
    pub delete: Option<Operation>,
    /// Path-level parameters shared by all operations.
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
}

/// An API operation (endpoint).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Declared operation id; identifiers never derive from it.
    pub operation_id: Option<String>,
    /// Short summary.
    pub summary: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Whether the operation is deprecated.
    #[serde(default)]
    pub deprecated: bool,
    /// Operation-level parameters, overriding path-level ones.
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
    /// Request body, inline or referenced.
    pub request_body: Option<RefOr<RequestBody>>,
    /// Responses by status code, in document order.
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<Response>>,
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Substituted into the path template
    Path,
    /// Query string
    Query,
    /// Request header
    Header,
    /// Cookie
    Cookie,
}

impl ParameterLocation {
    /// Field name of this location's group in the client call argument.
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

/// A parameter (path, query, header or cookie).
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Where the parameter is carried.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Whether the parameter must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Parameter description.
    pub description: Option<String>,
    /// Value schema; absent means `string`.
    pub schema: Option<Schema>,
}

/// A request body definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    /// Whether a body must be sent.
    #[serde(default)]
    pub required: bool,
    /// Body description.
    pub description: Option<String>,
    /// Payload schema per media type.
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// A response definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    /// Response description.
    pub description: Option<String>,
    /// Payload schema per media type; empty for no content.
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// Media type content (e.g., application/json).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    /// Payload schema.
    pub schema: Option<Schema>,
}

/// JSON Schema definition used in the description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// The type of the schema (string, number, integer, boolean, object, array, null).
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    /// Reference to another schema.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    /// Properties for object types, in document order.
    pub properties: Option<IndexMap<String, Schema>>,

    /// Required property names for object types.
    pub required: Option<Vec<String>>,

    /// Item schema for array types.
    pub items: Option<Box<Schema>>,

    /// Enum values (can be strings, integers, floats, booleans, or null).
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<EnumValue>>,

    /// Union type (any of these schemas).
    pub any_of: Option<Vec<Schema>>,

    /// Union type (exactly one of these schemas).
    pub one_of: Option<Vec<Schema>>,

    /// Intersection type (all of these schemas combined).
    pub all_of: Option<Vec<Schema>>,

    /// Negation. No TypeScript mapping exists for it.
    pub not: Option<Box<Schema>>,

    /// Additional properties for object types (for Record/dict types).
    pub additional_properties: Option<AdditionalProperties>,

    /// Discriminator for polymorphic oneOf/anyOf schemas.
    pub discriminator: Option<Discriminator>,

    /// Format hint (e.g., date-time, uuid, binary).
    pub format: Option<String>,

    /// Constant value - schema matches only this exact value.
    #[serde(rename = "const")]
    pub const_value: Option<serde_json::Value>,

    /// OpenAPI 3.0 nullable flag (3.1 uses type arrays instead).
    pub nullable: Option<bool>,

    /// Short title; never rendered.
    pub title: Option<String>,

    /// Description, rendered as JSDoc.
    pub description: Option<String>,
}

/// Enum value can be string, integer, float, boolean, or null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    /// String member.
    String(String),
    /// Integer member.
    Integer(i64),
    /// Non-integer number member.
    Float(f64),
    /// Boolean member.
    Bool(bool),
    /// `null` member.
    Null,
}

/// Discriminator for polymorphic schemas (oneOf/anyOf).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    /// The property name that contains the discriminator value.
    pub property_name: String,
    /// Optional mapping from discriminator values to schema refs.
    pub mapping: Option<IndexMap<String, String>>,
}

/// Schema type can be a single type or an array of types (for nullable).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// `type: "string"`
    Single(String),
    /// `type: ["string", "null"]`
    Multiple(Vec<String>),
}

/// Additional properties can be a boolean or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` allows any extra key, `false` forbids them.
    Bool(bool),
    /// Extra keys must match this schema.
    Schema(Box<Schema>),
}

impl ApiDescription {
    /// Parse an API description from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse an API description from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl Schema {
    /// True when the schema is nothing but a `$ref`.
    ///
    /// Annotation-only siblings (`description`, `title`) do not count, since
    /// they do not change the referenced shape.
    pub fn is_bare_ref(&self) -> bool {
        self.ref_path.is_some()
            && self.schema_type.is_none()
            && self.properties.is_none()
            && self.items.is_none()
            && self.enum_values.is_none()
            && self.any_of.is_none()
            && self.one_of.is_none()
            && self.all_of.is_none()
            && self.not.is_none()
            && self.additional_properties.is_none()
            && self.const_value.is_none()
            && self.nullable != Some(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_property_order_preserved() {
        let schema: Schema = serde_json::from_str(
            r#"{ "type": "object", "properties": { "zeta": {}, "alpha": {}, "mid": {} } }"#,
        )
        .unwrap();
        let names: Vec<_> = schema.properties.unwrap().keys().cloned().collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_ref_or_parameter() {
        let params: Vec<RefOr<Parameter>> = serde_json::from_str(
            r##"[
                { "$ref": "#/components/parameters/Limit" },
                { "name": "guild_id", "in": "path", "required": true, "schema": { "type": "string" } }
            ]"##,
        )
        .unwrap();
        assert!(matches!(&params[0], RefOr::Ref(r) if r.ref_path == "#/components/parameters/Limit"));
        assert!(
            matches!(&params[1], RefOr::Item(p) if p.location == ParameterLocation::Path && p.required)
        );
    }

    #[test]
    fn test_enum_values_mixed() {
        let schema: Schema =
            serde_json::from_str(r#"{ "enum": ["a", 1, 2.5, true, null] }"#).unwrap();
        assert_eq!(
            schema.enum_values.unwrap(),
            vec![
                EnumValue::String("a".into()),
                EnumValue::Integer(1),
                EnumValue::Float(2.5),
                EnumValue::Bool(true),
                EnumValue::Null,
            ]
        );
    }

    #[test]
    fn test_bare_ref() {
        let bare: Schema =
            serde_json::from_str(r##"{ "$ref": "#/components/schemas/User", "description": "x" }"##)
                .unwrap();
        assert!(bare.is_bare_ref());

        let nullable: Schema =
            serde_json::from_str(r##"{ "$ref": "#/components/schemas/User", "nullable": true }"##)
                .unwrap();
        assert!(!nullable.is_bare_ref());
    }

    #[test]
    fn test_from_yaml() {
        let desc = ApiDescription::from_yaml(
            r"
paths:
  /gateway:
    get:
      responses:
        '200':
          description: OK
",
        )
        .unwrap();
        assert!(desc.paths["/gateway"].get.is_some());
    }

    #[test]
    fn test_invalid_json_error() {
        assert!(ApiDescription::from_json("{ not json").is_err());
    }
}
