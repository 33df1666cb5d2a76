//! Rebuilds a Medium article as markdown from the state graph the page
//! bootstraps into its inline scripts.

pub mod article;
pub mod config;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod markup;
pub mod post;
pub mod render;
pub mod state;

pub use article::{MediumData, MediumParser};
pub use config::Settings;
pub use error::{ParseError, Result};
pub use fetch::{Fetch, FetchResponse, HttpFetcher};
