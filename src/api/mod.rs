pub mod endpoints;
pub mod error;
pub mod fetcher;
#[cfg(test)]
pub(crate) mod mock;
pub mod token;
