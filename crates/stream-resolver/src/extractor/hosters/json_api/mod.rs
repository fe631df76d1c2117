mod builder;
mod models;

pub use builder::{JSON_API_ID, JsonApiEmbed, api_url};
