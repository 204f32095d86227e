// Tagged, idempotent comments on GitHub pull requests.
// The binary in main.rs is a thin CLI over the `Commenter` defined here.

pub mod api;
pub mod chains;
pub mod cli;
pub mod comment;
pub mod config;
pub mod credentials;
pub mod description;
pub mod github;
pub mod inline;
pub mod pagination;
pub mod tags;
#[cfg(test)]
mod testing;
pub mod writer;
