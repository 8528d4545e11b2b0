//! Supplier companies.

use apisim_proto::FilterOp;

use super::{attr, ATTACHMENTS, PAYMENT_CURRENCIES, SUPPLIER_CATEGORIES, SUPPLIER_COMPANIES};
use crate::catalog::{EntityDef, FieldDef, RelationDef};

/// Supplier companies. Related resources are sideloaded.
pub fn supplier_companies() -> EntityDef {
    EntityDef::new(SUPPLIER_COMPANIES, "id")
        .with_fields([
            attr(FieldDef::datetime("updated_at")).only(&[FilterOp::From, FilterOp::To]),
            attr(FieldDef::string("external_id")).only(&[
                FilterOp::Equals,
                FilterOp::NotEquals,
                FilterOp::Empty,
                FilterOp::NotEmpty,
            ]),
            attr(FieldDef::string("segmentation_status")).only(&[FilterOp::Equals]),
            attr(FieldDef::string("name")),
            attr(FieldDef::string("risk")).only(&[FilterOp::Equals, FilterOp::NotEquals]),
        ])
        .sideloaded()
}

/// Relations includable on supplier companies.
pub fn supplier_relations() -> Vec<RelationDef> {
    vec![
        RelationDef::one(
            "supplier_category",
            SUPPLIER_COMPANIES,
            "relationships.supplier_category.data",
            SUPPLIER_CATEGORIES,
        ),
        RelationDef::many(
            "payment_currencies",
            SUPPLIER_COMPANIES,
            "relationships.payment_currencies.data",
            PAYMENT_CURRENCIES,
        ),
        RelationDef::one(
            "default_payment_currency",
            SUPPLIER_COMPANIES,
            "relationships.default_payment_currency.data",
            PAYMENT_CURRENCIES,
        ),
        RelationDef::many(
            "attachments",
            SUPPLIER_COMPANIES,
            "relationships.attachments.data",
            ATTACHMENTS,
        ),
    ]
}
