pub mod bank;
pub mod contract;
pub mod locale;
pub mod rates;
pub mod term;
