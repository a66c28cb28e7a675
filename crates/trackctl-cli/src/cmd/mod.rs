pub mod issue;
pub mod milestone;
pub mod mr;
