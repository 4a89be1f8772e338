//! Ningrat Wedding backend - binary entry point

#[tokio::main]
async fn main() {
    if let Err(e) = ningrat_backend::run().await {
        eprintln!("Server failed to start: {}", e);
        std::process::exit(1);
    }
}
