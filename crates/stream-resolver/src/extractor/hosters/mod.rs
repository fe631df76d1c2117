pub mod direct;
pub mod json_api;

pub use direct::DirectFile;
pub use json_api::JsonApiEmbed;
