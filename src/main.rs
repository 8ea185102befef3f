use anyhow::Context;
use bookstore_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load bookstore settings")?;
    bookstore_telemetry::init(&settings.telemetry)?;

    if let Err(e) = bookstore_app::run(settings).await {
        tracing::error!(error = ?e, "bookstore terminated");
        return Err(e);
    }

    Ok(())
}
