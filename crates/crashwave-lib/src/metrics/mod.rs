pub mod calendar;
pub mod categories;
