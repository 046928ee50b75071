pub mod controls;
pub mod spinner;
