pub mod spinner;
pub mod table;
pub mod test_mode;
