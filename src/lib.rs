pub mod budget;
pub mod config;
pub mod fitness;
pub mod output;
pub mod requirements;
pub mod search;
pub mod timeline;
pub mod vendors;
