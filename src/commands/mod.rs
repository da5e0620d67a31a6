pub mod lifecycle;
pub mod setup;
