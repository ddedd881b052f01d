pub mod albums;
pub mod uploads;
