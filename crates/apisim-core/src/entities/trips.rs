//! Trip summaries.

use apisim_proto::FilterOp;

use super::TRIPS;
use crate::catalog::{DefaultWindow, EntityDef, FieldDef, Normalize, OrderBy, PageLimits};
use crate::config::{TRIP_LOOKAHEAD_MONTHS, TRIP_LOOKBACK_DAYS, TRIP_SUMMARY_PAGE_SIZE};

/// Booking types a trip filter may name. Compared case-insensitively.
pub const BOOKING_TYPES: [&str; 7] = ["Air", "Car", "Dining", "Hotel", "Parking", "Rail", "Ride"];

/// Trip summaries, ordered by start date.
///
/// Canceled, virtual and guest trips are hidden unless the caller filters
/// on those flags (a null value lifts the default without constraining).
/// Trips must overlap a window from 30 days ago to 12 months ahead unless
/// the caller bounds `end_date_from` or `start_date_to` itself.
pub fn trips() -> EntityDef {
    let flag_ops = [FilterOp::Equals, FilterOp::NotEquals];
    let range_ops = [FilterOp::From, FilterOp::To];

    EntityDef::new(TRIPS, "trip_id")
        .with_fields([
            FieldDef::date("start_date").required().only(&range_ops),
            FieldDef::date("end_date").required().only(&range_ops),
            FieldDef::date("created_date").required().only(&range_ops),
            FieldDef::datetime("last_modified_date").required().only(&[FilterOp::From]),
            FieldDef::string("booking_type")
                .normalized(Normalize::Upper)
                .one_of(BOOKING_TYPES)
                .only(&[FilterOp::Equals, FilterOp::NotEquals, FilterOp::Empty, FilterOp::NotEmpty]),
            FieldDef::string("userid").at("user_name").only(&flag_ops),
            FieldDef::string("status").normalized(Normalize::Upper).only(&flag_ops),
            FieldDef::string("trip_name"),
            FieldDef::boolean("is_virtual_trip").only(&flag_ops),
            FieldDef::boolean("is_canceled").only(&flag_ops),
            FieldDef::boolean("is_guest_booking").only(&flag_ops),
        ])
        .order_by(OrderBy::asc("start_date"))
        .with_page_limits(PageLimits::new(TRIP_SUMMARY_PAGE_SIZE, TRIP_SUMMARY_PAGE_SIZE))
        .with_default_filter("is_virtual_trip_not_equals", true)
        .with_default_filter("is_canceled_not_equals", true)
        .with_default_filter("is_guest_booking_not_equals", true)
        .with_default_window(DefaultWindow {
            lower_key: "end_date_from".into(),
            lookback_days: TRIP_LOOKBACK_DAYS,
            upper_key: "start_date_to".into(),
            lookahead_months: TRIP_LOOKAHEAD_MONTHS,
        })
}
