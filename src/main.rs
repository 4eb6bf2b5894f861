use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use timesheet_exporter::helpers::config::DEFAULT_CONFIG_PATH;
use timesheet_exporter::service::TimesheetService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting timesheet export service");

    let service = TimesheetService::new(DEFAULT_CONFIG_PATH);

    let app = Router::new()
        .merge(service.router())
        .route("/health", axum::routing::get(|| async { "OK" }));

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!("Server running on http://0.0.0.0:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
