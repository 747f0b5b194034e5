pub mod likes;

use std::collections::HashSet;

use serenity::model::id::UserId;
use tracing::error;

use crate::{Error, LikeContext};

#[poise::command(prefix_command, track_edits, slash_command)]
async fn help(
    ctx: LikeContext<'_>,
    #[description = "The command requested for help"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> Result<(), Error> {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
        .await?;
    Ok(())
}

// Every command failure lands here; the user gets a fixed message and the
// detail stays in the log.
async fn on_error(error: poise::FrameworkError<'_, (), Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Command '{}' failed: {}", ctx.command().qualified_name, error);
            if let Err(ex) = ctx.say("An unexpected error occurred. Please try again later.").await {
                error!("Failed to send error message: {}", ex);
            }
        }
        other => {
            if let Err(ex) = poise::builtins::on_error(other).await {
                error!("Failed to handle framework error: {}", ex);
            }
        }
    }
}

pub fn get_framework(pref: &str, owners: HashSet<UserId>) -> poise::FrameworkOptions<(), Error> {
    poise::FrameworkOptions {
        commands: vec![
            help(),
            likes::like(),
            likes::setlikechannel()
        ],
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(pref.to_string()),
            mention_as_prefix: true,
            ..Default::default()
        },
        on_error: |error| Box::pin(on_error(error)),
        owners,
        ..Default::default()
    }
}
