mod cli;
mod infra;
mod routes;
mod server;

use clubdesk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
