//! Relation definitions between entities.

use serde::{Deserialize, Serialize};

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// The foreign key holds a single reference.
    One,
    /// The foreign key holds a list of references.
    Many,
}

/// Shape of an embedded relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedShape {
    /// The projected target record itself (a list of them for to-many).
    #[default]
    Bare,
    /// A resource document: `{"data": {"type", "id", "attributes"}}`, or
    /// `{"data": [..]}` for to-many. To-many relations always write the
    /// document, with an empty list when the record holds no references.
    Resource,
}

/// A named, includable relation from one entity to another.
///
/// The foreign key is a record path on the source entity. It may hold a bare
/// identifier or a `{"type": .., "id": ..}` reference object; for
/// [`Cardinality::Many`] it holds a list of either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Relation name (unique per source entity).
    pub name: String,
    /// Source entity name.
    pub from_entity: String,
    /// Target entity name.
    pub to_entity: String,
    /// Relation cardinality.
    pub cardinality: Cardinality,
    /// Record path of the foreign key on the source entity.
    pub foreign_key: String,
    /// Target paths kept when embedding; empty keeps the whole record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    /// Record path receiving the resolved record; defaults to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_at: Option<String>,
    /// Shape written at the embed path.
    #[serde(default)]
    pub shape: EmbedShape,
}

impl RelationDef {
    fn build(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        foreign_key: impl Into<String>,
        to_entity: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            cardinality,
            foreign_key: foreign_key.into(),
            fields: Vec::new(),
            embed_at: None,
            shape: EmbedShape::Bare,
        }
    }

    /// Create a to-one relation.
    pub fn one(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        foreign_key: impl Into<String>,
        to_entity: impl Into<String>,
    ) -> Self {
        Self::build(name, from_entity, foreign_key, to_entity, Cardinality::One)
    }

    /// Create a to-many relation.
    pub fn many(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        foreign_key: impl Into<String>,
        to_entity: impl Into<String>,
    ) -> Self {
        Self::build(name, from_entity, foreign_key, to_entity, Cardinality::Many)
    }

    /// Project the embedded record to these paths.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Write the resolved record at this path.
    pub fn embed_at(mut self, path: impl Into<String>) -> Self {
        self.embed_at = Some(path.into());
        self
    }

    /// Embed as a resource document.
    pub fn as_resource(mut self) -> Self {
        self.shape = EmbedShape::Resource;
        self
    }

    /// Path receiving the resolved record.
    pub fn embed_path(&self) -> &str {
        self.embed_at.as_deref().unwrap_or(&self.name)
    }

    /// Check if this relation resolves a list of references.
    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_builders() {
        let rel = RelationDef::one("contract_type", "contracts", "contract_type_id", "contract_types")
            .with_fields(["id", "name"])
            .embed_at("relationships.contract_type");

        assert_eq!(rel.cardinality, Cardinality::One);
        assert_eq!(rel.embed_path(), "relationships.contract_type");
        assert_eq!(rel.fields, vec!["id", "name"]);
        assert!(!rel.is_many());

        let many = RelationDef::many("attachments", "contracts", "attachment_ids", "attachments");
        assert!(many.is_many());
        assert_eq!(many.embed_path(), "attachments");
        assert_eq!(many.shape, EmbedShape::Bare);
        assert_eq!(many.as_resource().shape, EmbedShape::Resource);
    }

    #[test]
    fn test_relation_from_json() {
        let rel: RelationDef = serde_json::from_str(
            r#"{
                "name": "spend_category",
                "from_entity": "events",
                "to_entity": "spend_categories",
                "cardinality": "one",
                "foreign_key": "spend_category_id"
            }"#,
        )
        .unwrap();
        assert_eq!(rel.embed_path(), "spend_category");
        assert!(rel.fields.is_empty());
    }
}
