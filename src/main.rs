#[tokio::main]
async fn main() {
    if let Err(e) = swift_registry::run().await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
