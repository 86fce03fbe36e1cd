use anyhow::Context;
use evlog::{meta, LogEventConsolePrinter, Logger};
use serenity::Client;

use crate::config::Config;
use crate::db::dbclient::DBClient;
use crate::handler::{BotData, BotHandler};
use crate::runtime::{get_logger, set_logger};

mod commands;
mod config;
mod db;
mod handler;
mod helpers;
mod lifecycle;
mod runtime;
mod support;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let mut logger = Logger::default();
    logger.register(LogEventConsolePrinter::default());
    set_logger(logger);

    let config = Config::from_env()?;

    let db_client = DBClient::new(&config.database_url, config.db_max_connections).await
        .context("failed to connect to database")?;

    let data = BotData::new(db_client);

    let mut client = Client::builder(&config.token)
        .event_handler(BotHandler {})
        .application_id(config.application_id)
        .await
        .context("client initialization error")?;
    client.data.write().await.insert::<BotData>(data);

    get_logger().info("Starting shards.", meta! {
        "Shards" => config.shards,
    });

    client.start_shards(config.shards).await.context("client error")?;

    Ok(())
}
