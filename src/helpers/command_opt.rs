use serenity::client::Context;
use serenity::model::interactions::application_command::{ApplicationCommandInteraction, ApplicationCommandInteractionDataOption, ApplicationCommandInteractionDataOptionValue};

use crate::helpers::command_resp;

fn find_opt<'a>(options: &'a [ApplicationCommandInteractionDataOption], name: &str) -> Option<&'a ApplicationCommandInteractionDataOptionValue> {
    options.iter()
        .find(|v| v.name == name)
        .and_then(|v| v.resolved.as_ref())
}

pub fn find_string_opt(options: &[ApplicationCommandInteractionDataOption], name: &str) -> Option<String> {
    match find_opt(options, name) {
        Some(ApplicationCommandInteractionDataOptionValue::String(v)) => Some(v.clone()),
        _ => None,
    }
}

pub fn find_integer_opt(options: &[ApplicationCommandInteractionDataOption], name: &str) -> Option<i64> {
    match find_opt(options, name) {
        Some(ApplicationCommandInteractionDataOptionValue::Integer(v)) => Some(*v),
        _ => None,
    }
}

pub fn find_bool_opt(options: &[ApplicationCommandInteractionDataOption], name: &str) -> Option<bool> {
    match find_opt(options, name) {
        Some(ApplicationCommandInteractionDataOptionValue::Boolean(v)) => Some(*v),
        _ => None,
    }
}

/// Looks up a required option, telling the invoker when it is missing.
///
/// `Ok(None)` means the invoker has already been answered.
pub async fn find_required<T, F>(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
    options: &[ApplicationCommandInteractionDataOption],
    finder: F,
    name: &str,
) -> anyhow::Result<Option<T>>
where
    F: Fn(&[ApplicationCommandInteractionDataOption], &str) -> Option<T>,
{
    match finder(options, name) {
        Some(v) => Ok(Some(v)),
        None => {
            command_resp::reply_deferred_result(ctx, interaction, format!("Missing or invalid value for `{}`.", name)).await?;
            Ok(None)
        }
    }
}
