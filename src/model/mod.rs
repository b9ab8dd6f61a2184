//! Types that represent the core data model, such as `LeaseRecord` and `Invoice`.
mod amount;
mod catalog;
mod cell;
mod invoice;
mod record;
mod selection;

pub use amount::{as_given, fixed2, parse_number, Amount, AmountError};
pub use catalog::{Catalog, Parcel};
pub use cell::Cell;
pub use invoice::{Invoice, InvoiceHeader, InvoiceLine, Party};
pub use record::{Coercion, Column, LeaseRecord, LeaseSheet, COLUMN_COUNT};
pub use selection::{ParcelSelection, Selection};
