pub mod check_field;
pub mod check_pair;
pub mod normalize;
pub mod ontology;
pub mod plan;
pub mod validate;
