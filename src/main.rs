#[tokio::main]
async fn main() {
    if let Err(e) = media_presence::run().await {
        eprintln!("media-presence: {}", e);
        std::process::exit(1);
    }
}
