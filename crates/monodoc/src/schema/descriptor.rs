//! Validated, immutable per-type metadata.

use std::any::TypeId;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use monodoc_common::{OdmError, SchemaError};

use super::index::{IndexSpec, ParsedIndex, dedup_specs, parse_index};
use super::{DocumentBase, ReferenceShape, Schema};

/// Raw code of [`RelationType::Many`].
pub const REL_MANY: u8 = 0;
/// Raw code of [`RelationType::One`].
pub const REL_ONE: u8 = 1;

/// Cardinality of a relation as seen from the related document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    /// The related document holds an array of copies.
    Many,
    /// The related document holds at most one copy.
    One,
}

impl RelationType {
    pub fn code(&self) -> u8 {
        match self {
            RelationType::Many => REL_MANY,
            RelationType::One => REL_ONE,
        }
    }
}

impl TryFrom<u8> for RelationType {
    type Error = OdmError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            REL_MANY => Ok(RelationType::Many),
            REL_ONE => Ok(RelationType::One),
            other => Err(OdmError::InvalidRelation(format!(
                "unknown relation code {other}, expected {REL_MANY} (many) or {REL_ONE} (one)"
            ))),
        }
    }
}

impl FromStr for RelationType {
    type Err = OdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "many" | "rel_many" => Ok(RelationType::Many),
            "one" | "rel_one" => Ok(RelationType::One),
            _ => Err(OdmError::InvalidRelation(format!(
                "unknown relation {s:?}, expected \"one\" or \"many\""
            ))),
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationType::Many => f.write_str("many"),
            RelationType::One => f.write_str("one"),
        }
    }
}

/// A reference from one registered type to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub target: String,
    pub target_type: TypeId,
    pub relation: RelationType,
    /// Declared name of the field holding the reference(s).
    pub field: String,
    /// Storage path of that field.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub path: String,
    /// `None` when the field carries no index declaration.
    pub indexes: Option<Vec<ParsedIndex>>,
    pub relation: Option<RelationDescriptor>,
    pub is_base: bool,
}

/// Everything the registry knows about one document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDescriptor {
    pub type_id: TypeId,
    pub type_name: String,
    pub collection: String,
    pub fields: Vec<FieldDescriptor>,
    pub relations: Vec<RelationDescriptor>,
}

impl DocumentDescriptor {
    /// Validate `schema` and build its descriptor.
    ///
    /// `resolve` maps a reference target name to the registered type it
    /// names, or `None` when no such type is known.
    pub fn build(
        schema: &Schema,
        resolve: impl Fn(&str) -> Option<TypeId>,
    ) -> Result<Self, SchemaError> {
        let type_name = schema.type_name.clone();

        let base = schema
            .fields
            .iter()
            .find(|f| f.base)
            .ok_or_else(|| SchemaError::MissingBase {
                type_name: type_name.clone(),
            })?;

        let mut seen = HashSet::new();
        let mut declared_paths: HashSet<String> =
            DocumentBase::paths().iter().map(|p| p.to_string()).collect();
        for field in &schema.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    type_name,
                    field: field.name.clone(),
                });
            }
            if !field.base {
                declared_paths.insert(field.storage_path());
            }
        }

        let mut fields = Vec::with_capacity(schema.fields.len());
        let mut relations = Vec::new();

        for field in &schema.fields {
            let path = field.storage_path();

            if field.collection.is_some() && !field.base {
                tracing::warn!(
                    "{type_name}.{}: collection binding outside the base document is ignored",
                    field.name
                );
            }

            let indexes = match field.index.as_deref() {
                None => None,
                Some(source) => {
                    let parsed =
                        parse_index(&path, source).map_err(|e| SchemaError::InvalidIndex {
                            type_name: type_name.clone(),
                            field: field.name.clone(),
                            reason: e.to_string(),
                        })?;
                    for index in &parsed {
                        for index_field in &index.fields {
                            let head = index_field.split('.').next().unwrap_or(index_field);
                            if !declared_paths.contains(head) {
                                return Err(SchemaError::UnknownIndexField {
                                    type_name,
                                    field: field.name.clone(),
                                    index_field: index_field.clone(),
                                });
                            }
                        }
                    }
                    Some(parsed)
                }
            };

            let relation = match field.reference {
                None => None,
                Some(shape) => {
                    let target =
                        field
                            .target
                            .clone()
                            .ok_or_else(|| SchemaError::MissingReferenceTarget {
                                type_name: type_name.clone(),
                                field: field.name.clone(),
                            })?;
                    let target_type =
                        resolve(&target).ok_or_else(|| SchemaError::UnknownReferenceTarget {
                            type_name: type_name.clone(),
                            field: field.name.clone(),
                            target: target.clone(),
                        })?;
                    let relation = RelationDescriptor {
                        target,
                        target_type,
                        relation: match shape {
                            ReferenceShape::One => RelationType::One,
                            ReferenceShape::Many => RelationType::Many,
                        },
                        field: field.name.clone(),
                        path: path.clone(),
                    };
                    relations.push(relation.clone());
                    Some(relation)
                }
            };

            fields.push(FieldDescriptor {
                name: field.name.clone(),
                path,
                indexes,
                relation,
                is_base: field.base,
            });
        }

        let collection = base
            .collection
            .clone()
            .unwrap_or_else(|| type_name.to_lowercase());

        Ok(Self {
            type_id: schema.type_id,
            type_name,
            collection,
            fields,
            relations,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Index declarations of one field; `None` for unknown or unindexed
    /// fields.
    pub fn parsed_index(&self, field: &str) -> Option<&[ParsedIndex]> {
        self.field(field)?.indexes.as_deref()
    }

    /// Every declared field, with `None` for fields without indexes.
    pub fn all_parsed_index(&self) -> BTreeMap<String, Option<Vec<ParsedIndex>>> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.indexes.clone()))
            .collect()
    }

    pub fn index(&self, field: &str) -> Vec<IndexSpec> {
        dedup_specs(
            self.parsed_index(field)
                .unwrap_or_default()
                .iter()
                .map(ParsedIndex::to_spec),
        )
    }

    /// Native specs for the whole type, in declaration order, without
    /// duplicates.
    pub fn all_index(&self) -> Vec<IndexSpec> {
        dedup_specs(
            self.fields
                .iter()
                .filter_map(|f| f.indexes.as_ref())
                .flatten()
                .map(ParsedIndex::to_spec),
        )
    }

    pub fn relation(&self, field: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.field == field)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::{BaseField, Field, IndexOption};

    struct Sample;

    fn no_types(_: &str) -> Option<TypeId> {
        None
    }

    #[test]
    fn relation_codes_round_trip() {
        assert_eq!(RelationType::try_from(REL_ONE).unwrap(), RelationType::One);
        assert_eq!(RelationType::try_from(REL_MANY).unwrap(), RelationType::Many);
        assert_eq!(RelationType::One.code(), REL_ONE);
        assert_eq!("Many".parse::<RelationType>().unwrap(), RelationType::Many);
    }

    #[test]
    fn unknown_relation_code_is_descriptive() {
        let err = RelationType::try_from(7).unwrap_err();
        assert_eq!(err.kind(), "invalid_relation");
        assert!(err.to_string().contains("unknown relation code 7"));
        assert!("several".parse::<RelationType>().is_err());
    }

    #[test]
    fn collection_defaults_to_lowercased_type_name() {
        let schema = Schema::of::<Sample>().base(BaseField::new());
        let desc = DocumentDescriptor::build(&schema, no_types).unwrap();
        assert_eq!(desc.collection, "sample");
        assert_eq!(desc.fields.len(), 1);
        assert!(desc.fields[0].is_base);
    }

    #[test]
    fn duplicate_field_names_are_rejected() {
        let schema = Schema::of::<Sample>()
            .base(BaseField::new())
            .field(Field::new("Name"))
            .field(Field::new("Name"));
        assert_eq!(
            DocumentDescriptor::build(&schema, no_types).unwrap_err(),
            SchemaError::DuplicateField {
                type_name: "Sample".into(),
                field: "Name".into()
            }
        );
    }

    #[test]
    fn compound_index_must_cover_declared_fields() {
        let schema = Schema::of::<Sample>()
            .base(BaseField::new().index("{name,nickname},unique"))
            .field(Field::new("Name"));
        assert_eq!(
            DocumentDescriptor::build(&schema, no_types).unwrap_err(),
            SchemaError::UnknownIndexField {
                type_name: "Sample".into(),
                field: "DocumentBase".into(),
                index_field: "nickname".into()
            }
        );

        let ok = Schema::of::<Sample>()
            .base(BaseField::new().index("{_id,created},desc"))
            .field(Field::new("Address").index("{address.city}"));
        assert!(DocumentDescriptor::build(&ok, no_types).is_ok());
    }

    #[test]
    fn malformed_index_reports_field() {
        let schema = Schema::of::<Sample>()
            .base(BaseField::new())
            .field(Field::new("Name").index("{name"));
        match DocumentDescriptor::build(&schema, no_types).unwrap_err() {
            SchemaError::InvalidIndex { field, reason, .. } => {
                assert_eq!(field, "Name");
                assert!(reason.contains("unclosed"));
            }
            other => panic!("expected InvalidIndex, got {other:?}"),
        }
    }

    #[test]
    fn custom_storage_path_drives_index_position() {
        let schema = Schema::of::<Sample>()
            .base(BaseField::new())
            .field(Field::new("Surname").path("last_name"))
            .field(Field::new("Name").path("first_name").index("{last_name,first_name}"));
        let desc = DocumentDescriptor::build(&schema, no_types).unwrap();
        let parsed = desc.parsed_index("Name").unwrap();
        assert_eq!(parsed[0].position, 1);
        assert_eq!(desc.field("Name").unwrap().path, "first_name");
    }

    #[test]
    fn references_resolve_through_the_resolver() {
        let schema = Schema::of::<Sample>()
            .base(BaseField::new())
            .field(Field::new("Owner").target("Sample"))
            .field(Field::new("Peers").references().target("Sample"));
        let desc = DocumentDescriptor::build(&schema, |name| {
            (name == "Sample").then(|| TypeId::of::<Sample>())
        })
        .unwrap();

        assert_eq!(desc.relations.len(), 2);
        let owner = desc.relation("Owner").unwrap();
        assert_eq!(owner.relation, RelationType::One);
        assert_eq!(owner.path, "owner");
        assert_eq!(desc.relation("Peers").unwrap().relation, RelationType::Many);
        assert_eq!(desc.field("Peers").unwrap().relation.as_ref(), Some(&desc.relations[1]));
    }

    #[test]
    fn index_lookups_follow_declaration_order() {
        let schema = Schema::of::<Sample>()
            .base(BaseField::new().index("{name},unique"))
            .field(Field::new("Name").index("{name},unique {name,age}"))
            .field(Field::new("Age"));
        let desc = DocumentDescriptor::build(&schema, no_types).unwrap();

        assert_eq!(desc.index("Age"), vec![]);
        assert_eq!(desc.index("Missing"), vec![]);
        let all = desc.all_index();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].key, vec!["name".to_string()]);
        assert!(all[0].unique);
        assert_eq!(all[1].key, vec!["name".to_string(), "age".to_string()]);

        let parsed = desc.all_parsed_index();
        assert_eq!(parsed["Age"], None);
        assert_eq!(
            parsed["DocumentBase"].as_ref().unwrap()[0].options,
            vec![IndexOption::Unique]
        );
    }
}
