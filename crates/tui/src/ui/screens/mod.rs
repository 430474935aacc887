pub mod expenses;
pub mod period_picker;
