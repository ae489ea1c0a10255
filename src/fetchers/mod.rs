pub mod document;

pub use document::{DocumentFetcher, FetchObserver, FetchResponse, Hooks};
