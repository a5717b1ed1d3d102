pub mod jwt;
pub mod sequence;
