//! Projects.

use apisim_proto::FilterOp;

use super::{attr, PROJECTS, SPEND_CATEGORIES, SUPPLIER_COMPANIES};
use crate::catalog::{EntityDef, FieldDef, IdType, RelationDef};

/// Projects, in identifier order.
pub fn projects() -> EntityDef {
    let range = [FilterOp::From, FilterOp::To];
    let text = [FilterOp::Contains, FilterOp::NotContains];
    let note = [FilterOp::Contains, FilterOp::NotContains, FilterOp::Empty, FilterOp::NotEmpty];

    let mut entity = EntityDef::new(PROJECTS, "id")
        .with_id_type(IdType::Integer)
        .with_fields([
            attr(FieldDef::datetime("updated_at")).only(&range),
            attr(FieldDef::integer("number")).only(&range),
            attr(FieldDef::string("title")).only(&text),
            attr(FieldDef::string("description")).only(&text),
            attr(FieldDef::string("external_id")).only(&[
                FilterOp::Equals,
                FilterOp::NotEquals,
                FilterOp::Empty,
                FilterOp::NotEmpty,
            ]),
            attr(FieldDef::boolean("needs_attention")),
            attr(FieldDef::string("state")).only(&[FilterOp::Equals]),
        ]);

    for name in ["actual_start_date", "actual_end_date", "target_start_date", "target_end_date"] {
        entity = entity.with_field(attr(FieldDef::date(name)).only(&range));
    }
    for name in [
        "actual_spend_amount",
        "approved_spend_amount",
        "estimated_savings_amount",
        "estimated_spend_amount",
    ] {
        entity = entity.with_field(attr(FieldDef::number(name)).only(&range));
    }
    for name in ["canceled_note", "canceled_reason", "on_hold_note", "on_hold_reason"] {
        entity = entity.with_field(attr(FieldDef::string(name)).only(&note));
    }
    entity
}

/// Relations includable on projects.
pub fn project_relations() -> Vec<RelationDef> {
    vec![
        RelationDef::one("spend_category", PROJECTS, "spend_category_id", SPEND_CATEGORIES)
            .with_fields(["id", "name"]),
        RelationDef::many("supplier_companies", PROJECTS, "supplier_company_ids", SUPPLIER_COMPANIES)
            .with_fields(["id", "attributes.name", "attributes.risk"]),
    ]
}
