pub mod effects;
pub mod persistence;
pub mod project;
