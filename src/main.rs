// `main.rs` is intentionally tiny: it only declares modules and delegates
// execution to `bridge::run()`. The real implementation lives in the
// `config`, `notification`, `discord`, and `bridge` modules under `src/`
// so each responsibility is isolated and easier to navigate / test.
mod bridge;
mod config;
mod discord;
mod notification;

/// Start the bridge. Keep `main` minimal so tests and integration points
/// can exercise the individual modules directly.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bridge::run().await
}
