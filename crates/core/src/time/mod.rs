pub mod average_month;
