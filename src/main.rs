use anyhow::Context;
use ops_dashboard_lib::settings::DashboardSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = DashboardSettings::from_env().context("failed to load dashboard settings")?;
    ops_dashboard_lib::init_tracing(&settings).map_err(anyhow::Error::msg)?;
    ops_dashboard_lib::run(settings).await.context("dashboard exited with an error")?;
    Ok(())
}
