pub mod label;
pub mod rows;
pub mod state;
