// Forwarding pipeline stages, in execution order

pub mod window;
pub mod fetcher;
pub mod mapper;
pub mod signature;
pub mod publisher;
