pub mod http;
pub mod provider;

pub use http::HttpMatchSource;
pub use provider::MatchSource;
