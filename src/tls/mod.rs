pub mod client_cert;
pub mod insecure;
