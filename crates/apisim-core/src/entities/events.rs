//! Sourcing events.

use apisim_proto::FilterOp;

use super::{attr, EVENTS, SPEND_CATEGORIES};
use crate::catalog::{EntityDef, FieldDef, IdType, RelationDef};

const WINDOW_OPS: [FilterOp; 4] = [FilterOp::From, FilterOp::To, FilterOp::Empty, FilterOp::NotEmpty];

/// Sourcing events, in identifier order.
pub fn events() -> EntityDef {
    let one_of = [FilterOp::Equals];

    EntityDef::new(EVENTS, "id")
        .with_id_type(IdType::Integer)
        .with_fields([
            attr(FieldDef::string("title")).only(&[FilterOp::Contains, FilterOp::NotContains]),
            attr(FieldDef::datetime("updated_at")).only(&[FilterOp::From, FilterOp::To]),
            attr(FieldDef::datetime("created_at")).only(&[FilterOp::From, FilterOp::To]),
            attr(FieldDef::string("state")).only(&one_of),
            attr(FieldDef::string("event_type")).only(&one_of),
            attr(FieldDef::string("request_type")).only(&one_of),
            attr(FieldDef::datetime("supplier_rsvp_deadline")).only(&WINDOW_OPS),
            attr(FieldDef::datetime("supplier_question_deadline")).only(&WINDOW_OPS),
            attr(FieldDef::datetime("bid_submission_deadline")).only(&WINDOW_OPS),
            attr(FieldDef::datetime("published_at")).only(&WINDOW_OPS),
            attr(FieldDef::datetime("closed_at")).only(&WINDOW_OPS),
            attr(FieldDef::number("spend_amount")).only(&WINDOW_OPS),
            attr(FieldDef::string("external_id")).only(&[
                FilterOp::Equals,
                FilterOp::NotEquals,
                FilterOp::Empty,
                FilterOp::NotEmpty,
            ]),
            FieldDef::integer("spend_category_id").only(&one_of),
        ])
}

/// Relations includable on events.
pub fn event_relations() -> Vec<RelationDef> {
    vec![RelationDef::one("spend_category", EVENTS, "spend_category_id", SPEND_CATEGORIES)
        .with_fields(["id", "name"])]
}
