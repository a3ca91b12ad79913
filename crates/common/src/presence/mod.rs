pub mod highlight;
pub mod index;
