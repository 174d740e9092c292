/// Entry point of the vitals service.
///
/// Log verbosity follows `RUST_LOG` and defaults to `info`.
///
/// ```bash
/// RUST_LOG=debug vitals-glimpse --ratelimit 120 --allow 10.0.0.0/8
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    vitals_glimpse::run().await
}
