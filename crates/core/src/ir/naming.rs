//! Deterministic, collision-free identifiers.
//!
//! Every generated artifact is named from a [`NameKey`]: its role plus the
//! operation (method, path) or component it belongs to. The [`NameTable`]
//! records each key's identifier, so asking twice yields the same answer,
//! and disambiguates collisions with a numeric suffix.

use std::collections::{BTreeMap, BTreeSet};

use super::api::HttpMethod;
use super::utils::{pascal_identifier, pascal_words};
use crate::error::{GenerationError, Result};

/// Highest numeric suffix tried before giving up.
const MAX_SUFFIX: usize = 100;

/// Names the generated code declares or relies on, claimed before anything else.
pub const RESERVED_NAMES: &[&str] = &[
    "ApiClient",
    "ApiError",
    "HttpMethod",
    "RequestOptions",
    "Record",
    "Blob",
    "Promise",
    "AbortSignal",
    "Omit",
    "ReturnType",
    "FormData",
    "Error",
    "UseQueryOptions",
    "UseMutationOptions",
    "useQuery",
    "useMutation",
];

/// What an identifier names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Component type
    Schema,
    /// Merged operation input
    Input,
    /// One (status, content type) response body
    Response {
        /// Status code as written
        status: String,
        /// Set only when the status has more than one content type
        media: Option<String>,
    },
    /// Status → response map
    Responses,
    /// Success union
    Data,
    /// Non-success union
    Error,
    /// Query key factory
    QueryKey,
    /// Query options factory
    QueryOptions,
    /// Mutation key factory
    MutationKey,
    /// Mutation options factory
    MutationOptions,
    /// `use*` hook
    Hook,
    /// Name emitted by the runtime preamble or used from a library
    Runtime,
}

impl Role {
    fn suffix(&self) -> String {
        match self {
            Role::Schema | Role::Runtime | Role::Hook => String::new(),
            Role::Input => "Input".to_string(),
            Role::Response { status, media } => {
                let mut out = format!("Response{}", pascal_words(status));
                if let Some(media) = media {
                    out.push_str(&pascal_words(media));
                }
                out
            }
            Role::Responses => "Responses".to_string(),
            Role::Data => "Data".to_string(),
            Role::Error => "Error".to_string(),
            Role::QueryKey => "QueryKey".to_string(),
            Role::QueryOptions => "QueryOptions".to_string(),
            Role::MutationKey => "MutationKey".to_string(),
            Role::MutationOptions => "MutationOptions".to_string(),
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Role::Hook => "use",
            _ => "",
        }
    }
}

/// Everything an identifier is derived from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameKey {
    /// Artifact the identifier names
    pub role: Role,
    /// None for components and runtime names
    pub method: Option<HttpMethod>,
    /// Path template, component name or runtime name
    pub path: String,
}

impl NameKey {
    /// Key of a component type.
    pub fn schema(component: &str) -> Self {
        Self {
            role: Role::Schema,
            method: None,
            path: component.to_string(),
        }
    }

    /// Key of a fixed runtime or library name.
    pub fn runtime(name: &str) -> Self {
        Self {
            role: Role::Runtime,
            method: None,
            path: name.to_string(),
        }
    }

    /// Key of one operation artifact.
    pub fn operation(role: Role, method: HttpMethod, path: &str) -> Self {
        Self {
            role,
            method: Some(method),
            path: path.to_string(),
        }
    }

    /// Identifier this key asks for before any disambiguation.
    pub fn candidate(&self) -> String {
        match (&self.role, self.method) {
            (Role::Runtime, _) => self.path.clone(),
            (Role::Schema, _) | (_, None) => pascal_identifier(&self.path),
            (role, Some(method)) => format!(
                "{}{}{}",
                role.prefix(),
                operation_base(method, &self.path),
                role.suffix()
            ),
        }
    }
}

/// PascalCase form of a path template.
///
/// Each literal segment and each `{param}` name is PascalCased separately
/// and the results are concatenated: `/guilds/{guild_id}/widget.json`
/// becomes `GuildsGuildIdWidgetJson`. The root path becomes `Root`.
pub fn path_pascal(path: &str) -> String {
    let out: String = path
        .split('/')
        .map(|segment| pascal_words(&segment.replace(['{', '}'], "")))
        .collect();
    if out.is_empty() {
        "Root".to_string()
    } else {
        out
    }
}

/// Method plus path, the stem of every operation identifier.
pub fn operation_base(method: HttpMethod, path: &str) -> String {
    format!("{}{}", method.pascal(), path_pascal(path))
}

/// First literal path segment, or `root` when the path has none.
pub fn resource_group(path: &str) -> String {
    path.split('/')
        .find(|s| !s.is_empty() && !s.starts_with('{'))
        .unwrap_or("root")
        .to_string()
}

/// Explicit record of every identifier handed out.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    by_key: BTreeMap<NameKey, String>,
    taken: BTreeSet<String>,
}

impl NameTable {
    /// A table with the runtime names already claimed.
    pub fn new() -> Self {
        let mut table = Self::default();
        for name in RESERVED_NAMES {
            table.by_key.insert(NameKey::runtime(name), (*name).to_string());
            table.taken.insert((*name).to_string());
        }
        table
    }

    /// Identifier for `key`, allocating one on first use.
    ///
    /// A taken candidate gets the first free suffix from 2 up to 100;
    /// running out is a [`GenerationError::NameCollision`].
    pub fn allocate(&mut self, key: NameKey) -> Result<String> {
        if let Some(existing) = self.by_key.get(&key) {
            return Ok(existing.clone());
        }
        let base = key.candidate();
        let name = std::iter::once(base.clone())
            .chain((2..=MAX_SUFFIX).map(|n| format!("{base}{n}")))
            .find(|candidate| !self.taken.contains(candidate))
            .ok_or_else(|| GenerationError::NameCollision {
                identifier: base.clone(),
                reason: format!("candidates {base} through {base}{MAX_SUFFIX} are all taken"),
            })?;
        self.taken.insert(name.clone());
        self.by_key.insert(key, name.clone());
        Ok(name)
    }

    /// Identifier already allocated for `key`.
    pub fn get(&self, key: &NameKey) -> Option<&str> {
        self.by_key.get(key).map(String::as_str)
    }

    /// Whether `name` is reserved or already handed out.
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Number of allocated keys.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether nothing has been allocated yet.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
