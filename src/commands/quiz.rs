use evlog::meta;
use itertools::Itertools;
use serenity::builder::{CreateApplicationCommand, CreateApplicationCommandOption};
use serenity::client::Context;
use serenity::model::guild::Member;
use serenity::model::interactions::application_command::{ApplicationCommandInteraction, ApplicationCommandInteractionDataOption, ApplicationCommandOptionType};
use serenity::model::Permissions;

use crate::db::schema::QuizState;
use crate::handler::BotData;
use crate::helpers::{command_opt, command_resp};
use crate::lifecycle::{LifecycleError, DELETE_CONFIRMATION_PHRASE};
use crate::runtime::get_logger;
use crate::support::numbers::count_noun;

pub const QUIZ: &str = "quiz";

const THUMBNAIL: &str = "https://i.imgur.com/fWgQ8b6.png";

// Discord embed limits, in characters.
const TITLE_LIMIT: usize = 256;
const FIELD_LIMIT: usize = 1024;

fn confirm_phrase_hint() -> String {
    format!("Type {} to confirm", DELETE_CONFIRMATION_PHRASE)
}

/// Cuts `value` down to at most `limit` characters, marking the cut with an
/// ellipsis.
fn clamp(value: String, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value;
    }

    let mut clamped = value.chars().take(limit.saturating_sub(1)).collect::<String>();
    clamped.push('…');
    clamped
}

fn event_opt(opt: &mut CreateApplicationCommandOption) -> &mut CreateApplicationCommandOption {
    opt.name("event")
        .description("ID of the event the quiz belongs to")
        .required(true)
        .kind(ApplicationCommandOptionType::Integer)
}

pub fn quiz_builder(cmd: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    cmd.name(QUIZ)
        .description("Manage event quizzes")
        .create_option(|opt| {
            opt
                .name("status")
                .description("Show a quiz, what it holds, and which actions are available")
                .kind(ApplicationCommandOptionType::SubCommand)
                .create_sub_option(event_opt)
        })
        .create_option(|opt| {
            opt
                .name("reset")
                .description("Remove every attempt and answer; questions are kept")
                .kind(ApplicationCommandOptionType::SubCommand)
                .create_sub_option(event_opt)
                .create_sub_option(|opt| opt
                    .name("confirm")
                    .description("Set to true to confirm the reset")
                    .required(true)
                    .kind(ApplicationCommandOptionType::Boolean))
        })
        .create_option(|opt| {
            opt
                .name("delete")
                .description("Permanently delete a quiz with all questions, attempts and answers")
                .kind(ApplicationCommandOptionType::SubCommand)
                .create_sub_option(event_opt)
                .create_sub_option(|opt| opt
                    .name("confirm")
                    .description(confirm_phrase_hint())
                    .required(false)
                    .kind(ApplicationCommandOptionType::String))
        })
        .create_option(|opt| {
            opt
                .name("start")
                .description("Open the quiz to participants")
                .kind(ApplicationCommandOptionType::SubCommand)
                .create_sub_option(event_opt)
        })
        .create_option(|opt| {
            opt
                .name("stop")
                .description("Close the quiz to participants")
                .kind(ApplicationCommandOptionType::SubCommand)
                .create_sub_option(event_opt)
        });

    cmd
}

fn is_admin(member: &Member) -> bool {
    match member.permissions {
        None => false,
        Some(v) => v.contains(Permissions::ADMINISTRATOR),
    }
}

async fn find_event(ctx: &Context, interaction: &ApplicationCommandInteraction, opt: &ApplicationCommandInteractionDataOption) -> anyhow::Result<Option<i32>> {
    let event = match command_opt::find_required(ctx, interaction, &opt.options, command_opt::find_integer_opt, "event").await? {
        None => return Ok(None),
        Some(v) => v,
    };

    match i32::try_from(event) {
        Ok(v) if v > 0 => Ok(Some(v)),
        _ => {
            command_resp::reply_deferred_result(ctx, interaction, format!("`{}` is not a valid event ID.", event)).await?;
            Ok(None)
        }
    }
}

/// Tells the invoker why an action failed. Persistence failures are also
/// handed back to the interaction processor to be logged.
async fn reply_failure(ctx: &Context, interaction: &ApplicationCommandInteraction, err: LifecycleError) -> anyhow::Result<()> {
    let payload = serde_json::to_string(&err.payload())?;
    get_logger().info("Quiz action failed.", meta! {
        "InteractionID" => interaction.id,
        "Payload" => payload,
    });

    command_resp::reply_deferred_result(ctx, interaction, err.friendly_message()).await?;

    match err {
        LifecycleError::Persistence(_) => Err(err.into()),
        _ => Ok(()),
    }
}

fn state_label(state: QuizState) -> &'static str {
    match state {
        QuizState::Inactive => "Not started",
        QuizState::Active => "Running",
        QuizState::Stopped => "Stopped",
    }
}

async fn quiz_status(ctx: &Context, interaction: &ApplicationCommandInteraction, opt: &ApplicationCommandInteractionDataOption, data: &BotData) -> anyhow::Result<()> {
    let event_id = match find_event(ctx, interaction, opt).await? {
        None => return Ok(()),
        Some(v) => v,
    };

    let overview = match data.quizzes.overview(event_id).await {
        Ok(v) => v,
        Err(e) => return reply_failure(ctx, interaction, e).await,
    };

    let quiz = &overview.quiz;
    let impact = &overview.impact;

    let mut timing = String::new();
    if let Some(v) = quiz.time_started {
        timing.push_str(&format!("Started: {}\n", v.format("%Y-%m-%d %H:%M UTC")));
    }
    if let Some(v) = quiz.time_ended {
        timing.push_str(&format!("Ended: {}\n", v.format("%Y-%m-%d %H:%M UTC")));
    }

    let questions = match overview.questions.is_empty() {
        true => "No questions yet.".to_owned(),
        false => overview.questions.iter()
            .take(10)
            .map(|q| format!("**{}.** {}", q.position, q.question))
            .join("\n"),
    };

    let mut actions = Vec::new();
    if overview.visibility.reset {
        actions.push(format!(
            "**Reset**: `/quiz reset event:{} confirm:True` removes {} and {}; questions are kept.",
            event_id, count_noun(impact.attempts, "attempt"), count_noun(impact.answers, "answer"),
        ));
    }
    if overview.visibility.delete {
        actions.push(format!(
            "**Delete**: `/quiz delete event:{} confirm:{}` permanently removes the quiz, {}, {} and {}.",
            event_id, DELETE_CONFIRMATION_PHRASE,
            count_noun(impact.questions, "question"), count_noun(impact.attempts, "attempt"), count_noun(impact.answers, "answer"),
        ));
    }

    interaction.create_followup_message(&ctx.http, |r| r.create_embed(|e| {
        e.title(clamp(format!("Quiz: {}", quiz.name), TITLE_LIMIT));
        e.thumbnail(THUMBNAIL);

        e.field("Event", event_id, true);
        e.field("State", state_label(quiz.state), true);
        e.field("Participant limit", quiz.participant_limit, true);
        if let Some(v) = quiz.time_limit_seconds {
            e.field("Time per question", format!("{}s", v), true);
        }
        if !timing.is_empty() {
            e.field("Timing", timing, false);
        }
        e.field(format!("Questions ({})", impact.questions), clamp(questions, FIELD_LIMIT), false);
        e.field("Attempts", format!("{} ({})", impact.attempts, count_noun(impact.answers, "answer")), false);
        e.field("Actions", clamp(actions.join("\n"), FIELD_LIMIT), false);

        e
    })).await?;

    Ok(())
}

async fn quiz_reset(ctx: &Context, interaction: &ApplicationCommandInteraction, opt: &ApplicationCommandInteractionDataOption, data: &BotData) -> anyhow::Result<()> {
    let event_id = match find_event(ctx, interaction, opt).await? {
        None => return Ok(()),
        Some(v) => v,
    };
    let confirmed = command_opt::find_bool_opt(&opt.options, "confirm").unwrap_or(false);

    let outcome = match data.quizzes.reset_quiz(event_id, confirmed).await {
        Ok(v) => v,
        Err(e) => return reply_failure(ctx, interaction, e).await,
    };

    let payload = serde_json::to_string(&outcome)?;
    get_logger().info("Quiz reset through /quiz reset.", meta! {
        "InteractionID" => interaction.id,
        "EventID" => event_id,
        "Payload" => payload,
    });

    interaction.create_followup_message(&ctx.http, |r| r.create_embed(|e| {
        e.title("Quiz reset");
        e.thumbnail(THUMBNAIL);

        e.field("Result", clamp(outcome.message.clone(), FIELD_LIMIT), false);
        e.field("Attempts removed", outcome.attempts_removed, true);
        e.field("Answers removed", outcome.answers_removed, true);

        e
    })).await?;

    Ok(())
}

async fn quiz_delete(ctx: &Context, interaction: &ApplicationCommandInteraction, opt: &ApplicationCommandInteractionDataOption, data: &BotData) -> anyhow::Result<()> {
    let event_id = match find_event(ctx, interaction, opt).await? {
        None => return Ok(()),
        Some(v) => v,
    };
    let phrase = command_opt::find_string_opt(&opt.options, "confirm");

    let outcome = match data.quizzes.delete_quiz(event_id, phrase.as_deref()).await {
        Ok(v) => v,
        Err(e) => return reply_failure(ctx, interaction, e).await,
    };

    let payload = serde_json::to_string(&outcome)?;
    get_logger().info("Quiz deleted through /quiz delete.", meta! {
        "InteractionID" => interaction.id,
        "EventID" => event_id,
        "Payload" => payload,
    });

    let impact = &outcome.impact;
    let removed = [
        count_noun(impact.questions, "question"),
        count_noun(impact.attempts, "attempt"),
        count_noun(impact.answers, "answer"),
    ];

    interaction.create_followup_message(&ctx.http, |r| r.create_embed(|e| {
        e.title("Quiz deleted");
        e.thumbnail(THUMBNAIL);

        e.field("Result", clamp(outcome.message.clone(), FIELD_LIMIT), false);
        e.field("Removed", removed.iter().join(", "), false);

        e
    })).await?;

    Ok(())
}

async fn quiz_transition(ctx: &Context, interaction: &ApplicationCommandInteraction, opt: &ApplicationCommandInteractionDataOption, data: &BotData, start: bool) -> anyhow::Result<()> {
    let event_id = match find_event(ctx, interaction, opt).await? {
        None => return Ok(()),
        Some(v) => v,
    };

    let result = match start {
        true => data.quizzes.start_quiz(event_id).await,
        false => data.quizzes.stop_quiz(event_id).await,
    };

    match result {
        Ok(v) => command_resp::reply_deferred_result(ctx, interaction, format!("**{}**.", v.message)).await,
        Err(e) => reply_failure(ctx, interaction, e).await,
    }
}

pub async fn quiz(ctx: Context, interaction: ApplicationCommandInteraction) -> anyhow::Result<()> {
    command_resp::reply_deferred_ack(&ctx, &interaction).await?;

    let member = match interaction.member.as_ref() {
        None => {
            command_resp::reply_deferred_result(&ctx, &interaction, "/quiz can only be used inside a server.").await?;
            return Ok(());
        }
        Some(v) => v,
    };

    if !is_admin(member) {
        get_logger().info("Non-administrator attempted to use /quiz.", meta! {
            "InteractionID" => interaction.id,
            "UserID" => member.user.id,
        });
        command_resp::reply_deferred_result(&ctx, &interaction, "Only members with the 'Administrator' permission may use /quiz.").await?;
        return Ok(());
    }

    //

    let sub = match interaction.data.options.first() {
        None => return Ok(()),
        Some(v) => v,
    };

    let data = ctx.data.read().await;
    let data = match data.get::<BotData>() {
        None => return Err(anyhow::anyhow!("bot data has not been initialized")),
        Some(v) => v,
    };

    match sub.name.as_str() {
        "status" => quiz_status(&ctx, &interaction, sub, data).await?,
        "reset" => quiz_reset(&ctx, &interaction, sub, data).await?,
        "delete" => quiz_delete(&ctx, &interaction, sub, data).await?,
        "start" => quiz_transition(&ctx, &interaction, sub, data, true).await?,
        "stop" => quiz_transition(&ctx, &interaction, sub, data, false).await?,
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_hint_names_the_phrase() {
        assert_eq!(confirm_phrase_hint(), format!("Type {} to confirm", DELETE_CONFIRMATION_PHRASE));
    }

    #[test]
    fn clamp_keeps_short_values() {
        assert_eq!(clamp("**1.** Capital of France?".to_owned(), FIELD_LIMIT), "**1.** Capital of France?");
        assert_eq!(clamp("x".repeat(FIELD_LIMIT), FIELD_LIMIT).chars().count(), FIELD_LIMIT);
    }

    #[test]
    fn clamp_cuts_long_question_lists_to_the_field_limit() {
        let questions = (1..=10)
            .map(|i| format!("**{}.** {}", i, "Which of these is the longest river? ".repeat(10)))
            .join("\n");
        assert!(questions.chars().count() > FIELD_LIMIT);

        let clamped = clamp(questions.clone(), FIELD_LIMIT);
        assert_eq!(clamped.chars().count(), FIELD_LIMIT);
        assert!(clamped.ends_with('…'));
        assert!(questions.starts_with(clamped.trim_end_matches('…')));
    }

    #[test]
    fn clamp_counts_characters_not_bytes() {
        let clamped = clamp("é".repeat(300), TITLE_LIMIT);
        assert_eq!(clamped.chars().count(), TITLE_LIMIT);
        assert!(clamped.starts_with("éé"));
    }
}
