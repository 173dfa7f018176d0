pub mod error;
pub mod report;
pub mod request;
pub mod response;
pub mod timing;
pub mod tracer;
pub mod transport;
