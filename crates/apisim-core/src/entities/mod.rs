//! Stock entity tables for the simulated APIs.
//!
//! Each submodule declares one entity family: its filterable fields, default
//! ordering, page limits, defaults and includable relations.
//! [`stock_schema`] assembles them into a single bundle.

mod contracts;
mod events;
mod projects;
mod reference;
mod suppliers;
mod trips;

use crate::catalog::{FieldDef, SchemaBundle};

pub use contracts::{contract_relations, contracts};
pub use events::{event_relations, events};
pub use projects::{project_relations, projects};
pub use reference::{
    adobe_sign_agreements, attachments, contract_types, docusign_envelopes, payment_currencies,
    spend_categories, supplier_categories,
};
pub use suppliers::{supplier_companies, supplier_relations};
pub use trips::{trips, BOOKING_TYPES};

/// Trip summaries.
pub const TRIPS: &str = "trips";
/// Contracts.
pub const CONTRACTS: &str = "contracts";
/// Sourcing events.
pub const EVENTS: &str = "events";
/// Projects.
pub const PROJECTS: &str = "projects";
/// Supplier companies.
pub const SUPPLIER_COMPANIES: &str = "supplier_companies";
/// Contract types.
pub const CONTRACT_TYPES: &str = "contract_types";
/// Spend categories.
pub const SPEND_CATEGORIES: &str = "spend_categories";
/// Supplier categories.
pub const SUPPLIER_CATEGORIES: &str = "supplier_categories";
/// Payment currencies.
pub const PAYMENT_CURRENCIES: &str = "payment_currencies";
/// Attachments.
pub const ATTACHMENTS: &str = "attachments";
/// DocuSign envelopes.
pub const DOCUSIGN_ENVELOPES: &str = "docusign_envelopes";
/// Adobe Sign agreements.
pub const ADOBE_SIGN_AGREEMENTS: &str = "adobe_sign_agreements";

/// Version of the stock schema.
pub const STOCK_SCHEMA_VERSION: u64 = 1;

/// The bundle of all stock entity tables.
pub fn stock_schema() -> SchemaBundle {
    let bundle = SchemaBundle::new(STOCK_SCHEMA_VERSION)
        .with_entity(trips())
        .with_entity(contracts())
        .with_entity(events())
        .with_entity(projects())
        .with_entity(supplier_companies())
        .with_entity(contract_types())
        .with_entity(spend_categories())
        .with_entity(supplier_categories())
        .with_entity(payment_currencies())
        .with_entity(attachments())
        .with_entity(docusign_envelopes())
        .with_entity(adobe_sign_agreements());

    contract_relations()
        .into_iter()
        .chain(event_relations())
        .chain(project_relations())
        .chain(supplier_relations())
        .fold(bundle, SchemaBundle::with_relation)
}

/// A field stored under the record's `attributes` object.
fn attr(field: FieldDef) -> FieldDef {
    let path = format!("attributes.{}", field.name);
    field.at(path)
}
