pub mod attendance;
pub mod core;
pub mod grade;
pub mod records;
