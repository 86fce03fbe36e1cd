use serenity::client::Context;
use serenity::model::interactions::application_command::ApplicationCommandInteraction;
use serenity::model::interactions::InteractionResponseType;

pub async fn reply_deferred_ack(ctx: &Context, interaction: &ApplicationCommandInteraction) -> anyhow::Result<()> {
    interaction.create_interaction_response(&ctx.http, |r| {
        r.kind(InteractionResponseType::DeferredChannelMessageWithSource)
    }).await?;

    Ok(())
}

pub async fn reply_deferred_result<D: ToString>(ctx: &Context, interaction: &ApplicationCommandInteraction, content: D) -> anyhow::Result<()> {
    interaction.create_followup_message(&ctx.http, |r| {
        r.content(content)
    }).await?;

    Ok(())
}
