use std::sync::Arc;

use tracing::{error, info, warn};
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt as _};
use twilight_http::Client;
use twilight_model::gateway::event::Event;

use rustls::crypto::ring::default_provider;
use sqlx::postgres::PgPoolOptions;

use tagbot_commands::{handle_message, handle_reaction};
use tagbot_core::{Context, config::Config};
use tagbot_database::{
    Database, MIGRATOR,
    tags::{MemoryTagRepository, PgTagRepository, TagRepository},
};
use tagbot_utils::permissions::GuildPermissionHandler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Create a single shared HTTP Client
    let http = Arc::new(Client::new(config.discord_token.clone()));

    let tags: Arc<dyn TagRepository> = match config.database_url.as_deref() {
        Some(database_url) => {
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            MIGRATOR.run(&db_pool).await?;
            info!("PostgreSQL connection established.");
            Arc::new(PgTagRepository::new(Database::new(db_pool)))
        }
        None => {
            warn!("DATABASE_URL is not set, tags are kept in memory only");
            Arc::new(MemoryTagRepository::new())
        }
    };

    let permissions = Arc::new(GuildPermissionHandler::new(
        config.bot_owner_ids.iter().copied(),
    ));
    let ctx = Context::new(Arc::clone(&http), tags, permissions);

    // Declare which intents the bot has
    let intents = Intents::GUILDS
        | Intents::GUILD_MESSAGES
        | Intents::GUILD_MESSAGE_REACTIONS
        | Intents::MESSAGE_CONTENT;

    // A shard is one Gateway WebSocket connection to Discord
    let mut shard = Shard::new(ShardId::new(0, 1), config.discord_token, intents);

    info!("Tagbot is connecting...");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(source) => {
                error!(?source, "gateway event stream error");
                continue;
            }
        };

        match event {
            Event::Ready(_) => {
                info!("Tagbot is ready.");
            }

            // Commands may wait on later gateway events, so they never run inline.
            Event::MessageCreate(msg) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(source) = handle_message(ctx, msg).await {
                        error!(?source, "command handler failed");
                    }
                });
            }
            Event::ReactionAdd(reaction) => {
                handle_reaction(&ctx, &reaction);
            }
            _ => {} // Ignore unused events
        }
    }

    Ok(()) // Return Success, shutdown cleanly
}
