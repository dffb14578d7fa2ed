//! API-level IR for bound operations.
//!
//! This module defines the intermediate representation for API operations:
//! - HttpMethod / OperationKind: the fixed method → hook primitive mapping
//! - OperationNames: every identifier an operation's artifacts need
//! - OperationIR: an operation with its synthesized input/output types

use std::fmt;

use super::types::{TsType, TsTypeDef};

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// All supported methods, in the order operations of one path are walked.
    pub const ALL: [HttpMethod; 6] = [
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    /// Method as sent on the wire: `GET`, `POST`, ...
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Method name as an identifier prefix: `Get`, `Post`, ...
    pub fn pascal(&self) -> &'static str {
        match self {
            HttpMethod::Get => "Get",
            HttpMethod::Head => "Head",
            HttpMethod::Post => "Post",
            HttpMethod::Put => "Put",
            HttpMethod::Patch => "Patch",
            HttpMethod::Delete => "Delete",
        }
    }

    /// GET and HEAD are reads; everything else is a write.
    ///
    /// This is a fixed table, not a judgement about idempotency: PUT and
    /// DELETE are still mutations.
    pub fn kind(&self) -> OperationKind {
        match self {
            HttpMethod::Get | HttpMethod::Head => OperationKind::Query,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete => {
                OperationKind::Mutation
            }
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation kind (query vs mutation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// GET/HEAD requests, wired to `useQuery`
    Query,
    /// POST, PUT, PATCH, DELETE, wired to `useMutation`
    Mutation,
}

/// Name of one (status, content type) response type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseName {
    /// Status code as written
    pub status: String,
    /// None for statuses without content
    pub content_type: Option<String>,
    /// Allocated identifier
    pub name: String,
}

/// Identifiers allocated for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationNames {
    /// Merged input type (None = operation takes no input)
    pub input: Option<String>,
    /// Per-status response types, in response order
    pub response_types: Vec<ResponseName>,
    /// Status → response type map
    pub responses: String,
    /// Union of success response types
    pub data: String,
    /// Union of non-success response types
    pub error: String,
    /// Query or mutation key factory
    pub key_fn: String,
    /// Query or mutation options factory
    pub options_fn: String,
    /// Hook function (e.g. "useGetGateway")
    pub hook_fn: String,
}

/// Merged operation input
#[derive(Debug, Clone)]
pub struct InputIR {
    /// Allocated identifier of the input type
    pub type_name: String,
    /// `{ params?: { path, query, header, cookie }, body? }` shape
    pub ty: TsType,
    /// Whether any part of the input is required
    pub required: bool,
}

/// One declared (status, content type) output
#[derive(Debug, Clone)]
pub struct ResponseIR {
    /// Status code as written
    pub status: String,
    /// None for statuses without content
    pub content_type: Option<String>,
    /// None when the status is omitted under the no-content policy
    pub type_name: Option<String>,
    /// Body type, or the no-content leaf
    pub ty: TsType,
    /// Counted towards the operation's data type
    pub success: bool,
}

/// Bound API operation
#[derive(Debug, Clone)]
pub struct OperationIR {
    /// HTTP method
    pub method: HttpMethod,
    /// URL path template (e.g., "/guilds/{guild_id}/bans")
    pub path: String,
    /// First literal path segment, used as the first cache key element
    pub resource_group: String,
    /// Query or mutation
    pub kind: OperationKind,
    /// Operation `summary`, first line of the hook's JSDoc
    pub summary: Option<String>,
    /// Marks the hook `@deprecated`
    pub deprecated: bool,
    /// Allocated identifiers
    pub names: OperationNames,
    /// Merged input (None = no parameters and no body)
    pub input: Option<InputIR>,
    /// Declared outputs
    pub responses: Vec<ResponseIR>,
    /// Type declarations contributed by this operation, in emission order
    pub types: Vec<TsTypeDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_mapping_is_fixed() {
        assert_eq!(HttpMethod::Get.kind(), OperationKind::Query);
        assert_eq!(HttpMethod::Head.kind(), OperationKind::Query);
        assert_eq!(HttpMethod::Post.kind(), OperationKind::Mutation);
        assert_eq!(HttpMethod::Put.kind(), OperationKind::Mutation);
        assert_eq!(HttpMethod::Patch.kind(), OperationKind::Mutation);
        assert_eq!(HttpMethod::Delete.kind(), OperationKind::Mutation);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
        assert_eq!(HttpMethod::Delete.pascal(), "Delete");
        assert_eq!(HttpMethod::Head.to_string(), "HEAD");
    }
}
