// Domain layer - Segment model, naming rules and error taxonomy

pub mod errors;
pub mod model;
pub mod rules;
