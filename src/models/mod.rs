pub mod dto;
pub mod query;
pub mod todo;
pub mod validation;
