mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use startup_connect::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
