//! Schema node → TypeScript type synthesis.
//!
//! Components are always referred to by their allocated identifier; every
//! other node is expanded in place. Declarations are produced in
//! resolution order, with deferred nodes declared as interfaces.

use std::collections::{BTreeMap, BTreeSet};

use hookgen_common::EnumStyle;
use rayon::prelude::*;

use super::emit::Emit;
use super::graph::{
    AdditionalFields, Nullability, NodeId, Primitive, SchemaGraph, SchemaKind, UnionDiscriminator,
    component_location,
};
use super::resolve::{DeclarationOrder, eager_cycle};
use super::types::{TsLiteral, TsPrimitive, TsProp, TsType, TsTypeDef, TypeDefKind};
use super::utils::{
    enum_value_to_key, enum_value_to_literal, make_never_record, make_string_record,
    make_unknown_record,
};
use crate::error::{GenerationError, Result};

/// Keep the first of every set of types that print identically.
fn dedup_types(types: Vec<TsType>) -> Vec<TsType> {
    let mut seen = BTreeSet::new();
    types.into_iter().filter(|t| seen.insert(t.emit())).collect()
}

fn null() -> TsType {
    TsType::Primitive(TsPrimitive::Null)
}

/// Add `null` to `ty` exactly where the schema put it.
fn apply_nullability(ty: TsType, nullable: Nullability) -> TsType {
    let position = match nullable {
        Nullability::NotNull => return ty,
        Nullability::Flag => None,
        Nullability::TypeArray { position } => Some(position),
    };
    let mut members = match ty {
        TsType::Union(members) => members,
        other => vec![other],
    };
    if members.contains(&null()) {
        return TsType::Union(members);
    }
    match position {
        Some(position) => members.insert(position.min(members.len()), null()),
        None => members.push(null()),
    }
    TsType::Union(members)
}

/// A field collected while merging an intersection.
struct MergedField {
    name: String,
    types: Vec<TsType>,
    required: bool,
    doc: Option<String>,
}

/// Maps schema nodes to TypeScript types.
#[derive(Debug)]
pub struct TypeSynthesizer<'g> {
    graph: &'g SchemaGraph,
    /// Component node → allocated identifier
    names: BTreeMap<NodeId, String>,
    enum_style: EnumStyle,
}

impl<'g> TypeSynthesizer<'g> {
    /// Synthesizer over `graph`, naming components as `names` says.
    pub fn new(
        graph: &'g SchemaGraph,
        names: BTreeMap<NodeId, String>,
        enum_style: EnumStyle,
    ) -> Self {
        Self {
            graph,
            names,
            enum_style,
        }
    }

    /// Graph the types are synthesized from.
    pub fn graph(&self) -> &'g SchemaGraph {
        self.graph
    }

    /// Identifier allocated to a component node.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Type used wherever `id` appears: a reference for components, the
    /// expanded shape for everything else.
    pub fn type_of(&self, id: NodeId) -> TsType {
        match self.names.get(&id) {
            Some(name) => TsType::Ref(name.clone()),
            None => self.body_of(id),
        }
    }

    /// The node's own shape, nullability included.
    pub fn body_of(&self, id: NodeId) -> TsType {
        let node = self.graph.node(id);
        let ty = match &node.kind {
            SchemaKind::Primitive(p) => match p {
                Primitive::String => TsType::Primitive(TsPrimitive::String),
                Primitive::Integer | Primitive::Number => TsType::Primitive(TsPrimitive::Number),
                Primitive::Boolean => TsType::Primitive(TsPrimitive::Boolean),
                Primitive::Null => null(),
                Primitive::Binary => TsType::Ref("Blob".to_string()),
            },
            SchemaKind::Enum(values) => TsType::union(
                values
                    .iter()
                    .map(|v| TsType::Literal(enum_value_to_literal(v)))
                    .collect(),
            ),
            SchemaKind::Array(item) => TsType::Array(Box::new(self.type_of(*item))),
            SchemaKind::Object { fields, additional } => {
                let props = fields
                    .iter()
                    .map(|f| TsProp {
                        name: f.name.clone(),
                        ty: self.type_of(f.node),
                        optional: !f.required,
                        doc: self.field_doc(f.node),
                    })
                    .collect();
                self.object_type(props, *additional)
            }
            SchemaKind::Union {
                members,
                discriminator,
                ..
            } => match discriminator {
                Some(disc) => self.discriminated_union(members, disc),
                None => TsType::union(dedup_types(
                    members.iter().map(|m| self.type_of(*m)).collect(),
                )),
            },
            SchemaKind::Intersection(members) => {
                let mut visiting = BTreeSet::from([id]);
                self.merge_intersection(members, &mut visiting)
            }
            SchemaKind::Reference(target) => self.type_of(*target),
            SchemaKind::Unknown => TsType::unknown(),
        };
        apply_nullability(ty, node.nullable)
    }

    /// Inline field nodes carry their own description; components document
    /// themselves at their declaration.
    fn field_doc(&self, id: NodeId) -> Option<String> {
        if self.graph.is_component(id) {
            None
        } else {
            self.graph.node(id).description.clone()
        }
    }

    fn object_type(&self, props: Vec<TsProp>, additional: AdditionalFields) -> TsType {
        match (props.is_empty(), additional) {
            (true, AdditionalFields::Unspecified | AdditionalFields::Any) => make_unknown_record(),
            (true, AdditionalFields::Forbidden) => make_never_record(),
            (true, AdditionalFields::Typed(value)) => make_string_record(self.type_of(value)),
            (false, AdditionalFields::Unspecified | AdditionalFields::Forbidden) => {
                TsType::Object(props)
            }
            (false, AdditionalFields::Any) => {
                TsType::Intersection(vec![TsType::Object(props), make_unknown_record()])
            }
            (false, AdditionalFields::Typed(value)) => TsType::Intersection(vec![
                TsType::Object(props),
                make_string_record(self.type_of(value)),
            ]),
        }
    }

    /// `{ kind: "cat" } & Cat | { kind: "dog" } & Dog`
    fn discriminated_union(&self, members: &[NodeId], disc: &UnionDiscriminator) -> TsType {
        let variants = members
            .iter()
            .map(|member| {
                let mut tags: Vec<TsType> = disc
                    .mapping
                    .iter()
                    .filter(|(_, target)| target == member)
                    .map(|(value, _)| TsType::Literal(TsLiteral::String(value.clone())))
                    .collect();
                if tags.is_empty()
                    && let Some(name) = self.graph.component_name(*member)
                {
                    tags.push(TsType::Literal(TsLiteral::String(name.to_string())));
                }
                let base = self.type_of(*member);
                if tags.is_empty() {
                    return base;
                }
                TsType::Intersection(vec![
                    TsType::Object(vec![TsProp::new(
                        disc.property.clone(),
                        TsType::union(tags),
                        false,
                    )]),
                    base,
                ])
            })
            .collect();
        TsType::union(variants)
    }

    /// Fields of a node that can be merged into an intersection's object.
    ///
    /// Follows references and components; anything that is not a plain,
    /// non-nullable object (or an intersection of those) is not mergeable.
    fn mergeable_fields(
        &self,
        id: NodeId,
        visiting: &mut BTreeSet<NodeId>,
    ) -> Option<Vec<(String, NodeId, bool)>> {
        let node = self.graph.node(id);
        if node.nullable != Nullability::NotNull || !visiting.insert(id) {
            return None;
        }
        let out = match &node.kind {
            SchemaKind::Object {
                fields,
                additional: AdditionalFields::Unspecified,
            } if !fields.is_empty() => Some(
                fields
                    .iter()
                    .map(|f| (f.name.clone(), f.node, f.required))
                    .collect(),
            ),
            SchemaKind::Reference(target) => self.mergeable_fields(*target, visiting),
            SchemaKind::Intersection(members) => {
                let mut all = Vec::new();
                let mut ok = true;
                for m in members {
                    match self.mergeable_fields(*m, visiting) {
                        Some(fields) => all.extend(fields),
                        None => {
                            ok = false;
                            break;
                        }
                    }
                }
                ok.then_some(all)
            }
            _ => None,
        };
        visiting.remove(&id);
        out
    }

    /// allOf → one object with every member's fields.
    ///
    /// A field seen more than once keeps every distinct type as a union and
    /// is required if any member requires it. Members that are not objects
    /// stay in a `&` next to the merged object.
    fn merge_intersection(&self, members: &[NodeId], visiting: &mut BTreeSet<NodeId>) -> TsType {
        if let [single] = members {
            return self.type_of(*single);
        }

        let mut merged: Vec<MergedField> = Vec::new();
        let mut rest = Vec::new();
        for member in members {
            match self.mergeable_fields(*member, visiting) {
                Some(fields) => {
                    for (name, node, required) in fields {
                        let ty = self.type_of(node);
                        match merged.iter_mut().find(|f| f.name == name) {
                            Some(existing) => {
                                existing.types.push(ty);
                                existing.required |= required;
                                if existing.doc.is_none() {
                                    existing.doc = self.field_doc(node);
                                }
                            }
                            None => merged.push(MergedField {
                                name,
                                types: vec![ty],
                                required,
                                doc: self.field_doc(node),
                            }),
                        }
                    }
                }
                None => rest.push(self.type_of(*member)),
            }
        }

        if merged.is_empty() {
            return TsType::Intersection(rest);
        }
        let object = TsType::Object(
            merged
                .into_iter()
                .map(|f| TsProp {
                    name: f.name,
                    ty: TsType::union(dedup_types(f.types)),
                    optional: !f.required,
                    doc: f.doc,
                })
                .collect(),
        );
        if rest.is_empty() {
            object
        } else {
            let mut all = vec![object];
            all.extend(rest);
            TsType::Intersection(all)
        }
    }

    /// Cycle audit line for a deferred node: `cycle: A -> B -> A (declared lazily)`.
    fn cycle_note(&self, id: NodeId, order: &DeclarationOrder) -> Option<String> {
        let cycle = order.cycle(id)?;
        let path: Vec<&str> = cycle
            .iter()
            .map(|n| self.name_of(*n).unwrap_or("?"))
            .collect();
        Some(format!("cycle: {} (declared lazily)", path.join(" -> ")))
    }

    /// Declaration for one component node.
    pub fn declare(&self, id: NodeId, order: &DeclarationOrder) -> Result<TsTypeDef> {
        let name = self
            .name_of(id)
            .ok_or_else(|| GenerationError::NameCollision {
                identifier: id.to_string(),
                reason: "component node has no allocated identifier".to_string(),
            })?
            .to_string();
        let node = self.graph.node(id);
        let deferred = order.is_deferred(id);

        let kind = match &node.kind {
            SchemaKind::Object {
                fields,
                additional: AdditionalFields::Unspecified | AdditionalFields::Forbidden,
            } if deferred && !fields.is_empty() && node.nullable == Nullability::NotNull => {
                TypeDefKind::Interface {
                    properties: fields
                        .iter()
                        .map(|f| TsProp {
                            name: f.name.clone(),
                            ty: self.type_of(f.node),
                            optional: !f.required,
                            doc: self.field_doc(f.node),
                        })
                        .collect(),
                }
            }
            SchemaKind::Enum(values)
                if self.enum_style == EnumStyle::ConstObject
                    && node.nullable == Nullability::NotNull
                    && !values.is_empty() =>
            {
                TypeDefKind::ConstEnum {
                    values: values
                        .iter()
                        .enumerate()
                        .map(|(i, v)| (enum_value_to_key(v, i), enum_value_to_literal(v)))
                        .collect(),
                }
            }
            _ => TypeDefKind::TypeAlias {
                ty: self.body_of(id),
            },
        };

        Ok(TsTypeDef {
            name,
            kind,
            doc: node.description.clone(),
            note: if deferred {
                self.cycle_note(id, order)
            } else {
                None
            },
        })
    }

    /// Declarations for every component, in resolution order.
    pub fn declare_all(&self, order: &DeclarationOrder) -> Result<Vec<TsTypeDef>> {
        if let Some(cycle) = eager_cycle(self.graph) {
            let path: Vec<&str> = cycle
                .iter()
                .map(|n| self.graph.component_name(*n).unwrap_or("?"))
                .collect();
            return Err(GenerationError::MalformedSchema {
                location: component_location(path.first().copied().unwrap_or("?")),
                reason: format!(
                    "cycle {} passes through no property or array item",
                    path.join(" -> ")
                ),
            });
        }

        let defs = order
            .order
            .par_iter()
            .map(|id| self.declare(*id, order))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = BTreeSet::new();
        for def in &defs {
            if !seen.insert(def.name.as_str()) {
                return Err(GenerationError::NameCollision {
                    identifier: def.name.clone(),
                    reason: "declared by more than one component".to_string(),
                });
            }
        }
        Ok(defs)
    }
}
