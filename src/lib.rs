pub mod breaker;
pub mod config;
pub mod events;
pub mod notify;
pub mod processor;
pub mod query;
pub mod repository;
pub mod retry;
pub mod rpc;
pub mod scanner;
pub mod watched;
