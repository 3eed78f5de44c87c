pub mod client;
pub mod text;
pub mod types;

pub use client::VertexHttpClient;
pub use text::VertexTextClient;
