//! Contracts.

use apisim_proto::FilterOp;

use super::{
    attr, ADOBE_SIGN_AGREEMENTS, CONTRACTS, CONTRACT_TYPES, DOCUSIGN_ENVELOPES, SPEND_CATEGORIES,
    SUPPLIER_COMPANIES,
};
use crate::catalog::{EntityDef, FieldDef, IdType, Normalize, PageLimits, RelationDef};
use crate::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

const TEXT_OPS: [FilterOp; 4] = [
    FilterOp::Contains,
    FilterOp::NotContains,
    FilterOp::Empty,
    FilterOp::NotEmpty,
];
const RANGE_OPS: [FilterOp; 2] = [FilterOp::From, FilterOp::To];

/// Contracts, always paged, in identifier order.
pub fn contracts() -> EntityDef {
    EntityDef::new(CONTRACTS, "id")
        .with_id_type(IdType::Integer)
        .with_fields([
            attr(FieldDef::string("title")).only(&TEXT_OPS[..2]),
            attr(FieldDef::string("description")).only(&TEXT_OPS[..2]),
            attr(FieldDef::string("state")).only(&[FilterOp::Equals, FilterOp::NotEquals]),
            attr(FieldDef::integer("number")).only(&RANGE_OPS),
            attr(FieldDef::string("external_id")).only(&[
                FilterOp::Equals,
                FilterOp::NotEquals,
                FilterOp::Empty,
                FilterOp::NotEmpty,
            ]),
            attr(FieldDef::datetime("updated_at")).only(&RANGE_OPS),
            attr(FieldDef::date("actual_start_date")).only(&RANGE_OPS),
            attr(FieldDef::date("actual_end_date")).only(&RANGE_OPS),
            attr(FieldDef::number("actual_spend_amount")).only(&RANGE_OPS),
            attr(FieldDef::boolean("needs_attention")),
            attr(FieldDef::integer("renew_number_of_times"))
                .only(&RANGE_OPS)
                .at_least(0.0),
            attr(FieldDef::string("terminated_note")).only(&TEXT_OPS),
            attr(FieldDef::string("terminated_reason")).only(&TEXT_OPS),
            attr(FieldDef::datetime("marked_as_needs_attention_at")).only(&RANGE_OPS),
            attr(FieldDef::string("needs_attention_note")).only(&TEXT_OPS),
            attr(FieldDef::string("needs_attention_reason")).only(&TEXT_OPS),
            attr(FieldDef::date("renewal_termination_notice_date")).only(&RANGE_OPS),
            attr(FieldDef::date("renewal_termination_reminder_date")).only(&RANGE_OPS),
            attr(FieldDef::string("currency")).normalized(Normalize::Upper),
            FieldDef::integer("contract_type_id")
                .only(&[FilterOp::Equals, FilterOp::NotEquals])
                .above(0.0),
            FieldDef::integer("spend_category_id").only(&[FilterOp::Equals]),
        ])
        .with_page_limits(PageLimits::new(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE).always())
}

/// Relations includable on contracts.
///
/// Each is embedded as a resource document under `relationships`. Envelope
/// and agreement lists are always written, empty when the contract holds no
/// references.
pub fn contract_relations() -> Vec<RelationDef> {
    vec![
        RelationDef::one("contract_type", CONTRACTS, "contract_type_id", CONTRACT_TYPES)
            .as_resource()
            .embed_at("relationships.contract_type"),
        RelationDef::one("spend_category", CONTRACTS, "spend_category_id", SPEND_CATEGORIES)
            .as_resource()
            .embed_at("relationships.spend_category"),
        RelationDef::one("supplier_company", CONTRACTS, "supplier_id", SUPPLIER_COMPANIES)
            .as_resource()
            .embed_at("relationships.supplier_company"),
        RelationDef::many("docusign_envelopes", CONTRACTS, "docusign_envelope_ids", DOCUSIGN_ENVELOPES)
            .as_resource()
            .embed_at("relationships.docusign_envelopes"),
        RelationDef::many(
            "adobe_sign_agreements",
            CONTRACTS,
            "adobe_sign_agreement_ids",
            ADOBE_SIGN_AGREEMENTS,
        )
        .as_resource()
        .embed_at("relationships.adobe_sign_agreements"),
    ]
}
