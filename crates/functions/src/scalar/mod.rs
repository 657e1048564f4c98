pub mod datetime;
pub mod json;
pub mod math;
pub mod regex_fns;
pub mod string;
