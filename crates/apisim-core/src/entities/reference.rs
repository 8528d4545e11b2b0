//! Lookup tables referenced by the main entities.

use apisim_proto::FilterOp;

use super::{
    ADOBE_SIGN_AGREEMENTS, ATTACHMENTS, CONTRACT_TYPES, DOCUSIGN_ENVELOPES, PAYMENT_CURRENCIES,
    SPEND_CATEGORIES, SUPPLIER_CATEGORIES,
};
use crate::catalog::{EntityDef, FieldDef, IdType, Normalize, OrderBy};

/// Contract types.
pub fn contract_types() -> EntityDef {
    EntityDef::new(CONTRACT_TYPES, "id")
        .with_id_type(IdType::Integer)
        .with_field(FieldDef::string("name"))
}

/// Spend categories.
pub fn spend_categories() -> EntityDef {
    EntityDef::new(SPEND_CATEGORIES, "id")
        .with_id_type(IdType::Integer)
        .with_fields([
            FieldDef::string("name"),
            FieldDef::string("code").normalized(Normalize::Upper),
            FieldDef::boolean("usage_procurement"),
        ])
}

/// Supplier categories.
pub fn supplier_categories() -> EntityDef {
    EntityDef::new(SUPPLIER_CATEGORIES, "id").with_field(FieldDef::string("name"))
}

/// Payment currencies, ordered by ISO code. Codes compare case-insensitively.
pub fn payment_currencies() -> EntityDef {
    EntityDef::new(PAYMENT_CURRENCIES, "id")
        .with_field(
            FieldDef::string("alpha")
                .normalized(Normalize::Upper)
                .only(&[FilterOp::Equals, FilterOp::NotEquals]),
        )
        .order_by(OrderBy::asc("alpha"))
}

/// Attachments.
pub fn attachments() -> EntityDef {
    EntityDef::new(ATTACHMENTS, "id")
        .with_id_type(IdType::Integer)
        .with_fields([
            FieldDef::string("file_name"),
            FieldDef::datetime("uploaded_at").only(&[FilterOp::From, FilterOp::To]),
        ])
}

/// DocuSign envelopes attached to contracts.
pub fn docusign_envelopes() -> EntityDef {
    EntityDef::new(DOCUSIGN_ENVELOPES, "id").with_field(FieldDef::string("status"))
}

/// Adobe Sign agreements attached to contracts.
pub fn adobe_sign_agreements() -> EntityDef {
    EntityDef::new(ADOBE_SIGN_AGREEMENTS, "id").with_field(FieldDef::string("status"))
}
