pub mod archive;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod download;
pub mod error;
pub mod harvest;
mod http;
pub mod layout;
pub mod output;
pub mod records;
pub mod report;
pub mod resolver;
