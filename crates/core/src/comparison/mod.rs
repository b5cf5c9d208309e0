pub mod collation;
pub mod sort;
pub mod table;

pub use sort::{partition, sort_rows, Partition, SortColumn, SortDirection, SortSpec};
pub use table::{ComparisonTable, ComparisonView, FetchTicket};
