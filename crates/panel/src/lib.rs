// pagepresence-panel: live presence panel over a presence backend.

pub mod config;
pub mod controller;
pub mod highlight;
pub mod identity;
pub mod live;
pub mod runtime;
pub mod store;
