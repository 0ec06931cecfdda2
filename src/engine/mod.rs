// src/engine/mod.rs
//
// Pure reshape/aggregate transforms over Arrow record batches. Nothing in
// here does I/O or keeps state between calls.

pub mod columns;
pub mod error;
pub mod group;
pub mod reshape;

pub use columns::{key_strings, numeric_values, require_columns};
pub use error::EngineError;
pub use group::{filter_and_group, filter_rows, Predicate};
pub use reshape::{abs_columns, reshape_wide_to_long};

/// Month columns of the wide scenario table, in calendar order.
pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const SCENARIO: &str = "Scenario";
pub const BUSINESS_UNIT: &str = "business_unit";
pub const ACCOUNT: &str = "Account";
pub const YEAR: &str = "Year";

/// Name column emitted by the unpivot.
pub const PERIOD: &str = "period";
/// Amount column emitted by the unpivot and by every summary.
pub const VALUE: &str = "value";
