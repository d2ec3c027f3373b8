pub mod entities;
pub mod expand;
pub mod validate;
