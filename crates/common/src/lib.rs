// pagepresence-common: block hierarchy reconstruction and presence overlay.

pub mod path;
pub mod presence;
pub mod protocol;
pub mod tree;
pub mod types;
pub mod view;
