pub mod compact;
pub mod extract;
pub mod validate;
