use std::collections::HashMap;

use evlog::meta;
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use serenity::model::gateway::Ready;
use serenity::model::guild::Guild;
use serenity::model::id::GuildId;
use serenity::model::interactions::{Interaction, InteractionResponseType, InteractionType};
use serenity::prelude::TypeMapKey;

use crate::commands;
use crate::db::dbclient::DBClient;
use crate::lifecycle::QuizLifecycle;
use crate::runtime::get_logger;

pub struct BotData {
    pub quizzes: QuizLifecycle<DBClient>,
}

impl BotData {
    pub fn new(db_client: DBClient) -> Self {
        Self {
            quizzes: QuizLifecycle::new(db_client),
        }
    }
}

impl TypeMapKey for BotData {
    type Value = BotData;
}

pub struct BotHandler {}

impl BotHandler {
    async fn register_commands(&self, ctx: &Context, guild: &Guild) -> anyhow::Result<()> {
        let existing_cmds = guild.get_application_commands(ctx).await?;

        let existing_map = existing_cmds.iter()
            .map(|v| (v.name.clone(), v))
            .collect::<HashMap<_, _>>();

        for cmd in commands::COMMANDS {
            let whitelisted = match cmd.whitelisted_servers {
                None => true,
                Some(servers) => servers.iter().any(|v| v.as_u64() == guild.id.as_u64()),
            };

            if !whitelisted {
                get_logger().debug("Command is not allowed in this server.", meta! {
                    "GuildID" => guild.id,
                    "GuildName" => guild.name,
                    "Command" => cmd.name
                });
                continue;
            }

            if existing_map.contains_key(cmd.name) && !cmd.re_register {
                get_logger().debug("Command already registered in this server.", meta! {
                    "GuildID" => guild.id,
                    "GuildName" => guild.name,
                    "Command" => cmd.name
                });
                continue;
            }

            let created = guild.create_application_command(&ctx.http, |c| {
                (cmd.builder)(c)
            }).await?;

            get_logger().debug("Registered command in server.", meta! {
                "GuildID" => guild.id,
                "GuildName" => guild.name,
                "Command" => cmd.name,
                "ID" => created.id
            });
        }

        Ok(())
    }
}

#[async_trait]
impl EventHandler for BotHandler {
    async fn cache_ready(&self, _ctx: Context, _guilds: Vec<GuildId>) {}

    async fn ready(&self, _ctx: Context, ready: Ready) {
        get_logger().info("Connected.", meta![
            "User" => ready.user.name,
        ]);
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, _is_new: bool) {
        get_logger().info("Guild ready.", meta![
            "ID" => guild.id,
            "Name" => guild.name,
        ]);

        if let Err(e) = self.register_commands(&ctx, &guild).await {
            get_logger().error("Failed to register commands in server.", meta! {
                "GuildID" => guild.id,
                "GuildName" => guild.name,
                "Error" => e,
            });
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::ApplicationCommand(interaction) = interaction {
            let guild_id = match interaction.guild_id {
                None => return,
                Some(v) => v,
            };

            if interaction.kind == InteractionType::Ping {
                get_logger().info("Interaction ping.", meta! {
                    "GuildID" => guild_id,
                    "InteractionID" => interaction.id
                });

                if let Err(e) = interaction.create_interaction_response(ctx.http.as_ref(), |r| {
                    r.kind(InteractionResponseType::Pong)
                }).await {
                    get_logger().error("Failed to answer interaction ping.", meta! {
                        "GuildID" => guild_id,
                        "Error" => e,
                    });
                }
            } else if interaction.kind == InteractionType::ApplicationCommand {
                get_logger().info("Application command.", meta! {
                    "GuildID" => guild_id,
                    "InteractionID" => interaction.id,
                    "CommandID" => interaction.data.id,
                    "CommandName" => interaction.data.name
                });

                let handler = match commands::get_handler(&interaction.data.name) {
                    None => return,
                    Some(v) => v,
                };

                let interaction_id = interaction.id;
                let command_id = interaction.data.id;
                let command_name = interaction.data.name.clone();

                let r: anyhow::Result<()> = handler(ctx, interaction).await;
                match r {
                    Ok(()) => {}
                    Err(e) => {
                        get_logger().error("Error occurred in interaction processor.", meta! {
                            "GuildID" => guild_id,
                            "InteractionID" => interaction_id,
                            "CommandID" => command_id,
                            "CommandName" => command_name,
                            "Error" => e,
                        });
                    }
                }
            }
        }
    }
}
