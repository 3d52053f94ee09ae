pub mod profile;
pub mod source;
pub mod template;
