// Domain layer - Pure types and rules, no I/O

pub mod errors;
pub mod model;
pub mod rules;
