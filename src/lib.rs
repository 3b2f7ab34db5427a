//! Answers questions about a web page through a chat, vision or web-search
//! language model endpoint, behind one request and result shape.

pub mod assistant;
pub mod commands;
pub mod config;
pub mod logging;
pub mod server;

pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit: ",
    env!("PAGEASK_GIT_SHA"),
    ", built: ",
    env!("PAGEASK_BUILD_TS"),
    ")"
);
