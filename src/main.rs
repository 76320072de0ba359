use std::sync::Arc;

use anyhow::Context;
use rocket::routes;

use v3_position_planner::bootstrap::AppState;
use v3_position_planner::config::Config;
use v3_position_planner::web::routes::{health, pools, position_quote};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Build application state
    let app_state = Arc::new(AppState::new(&config).context("Failed to initialize application state")?);

    // Configure Rocket
    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("address", "0.0.0.0"));

    rocket::custom(figment)
        .manage(app_state)
        .mount("/", routes![health, pools, position_quote])
        .launch()
        .await
        .context("Rocket failed to launch")?;
    Ok(())
}
