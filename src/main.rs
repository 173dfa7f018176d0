#[macro_use]
extern crate tracing;

mod app;
mod cli;
mod http;
mod tls;
mod trace;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run::main_with_error().await {
        println!("{e}");
        std::process::exit(1);
    }
}
