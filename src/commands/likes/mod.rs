use std::time::{Duration, Instant};

use poise::CreateReply;
use serenity::builder::CreateEmbed;
use serenity::model::channel::GuildChannel;
use serenity::model::Timestamp;
use tracing::error;

use crate::{channel_config, cooldowns, like_api, Error, LikeContext};
use crate::services::channel_config::ChannelToggle;
use crate::services::cooldown::CooldownCheck;
use crate::services::like_api::LikeOutcome;

/// Minimum seconds between one user's like invocations.
pub const COOLDOWN_WINDOW: Duration = Duration::from_secs(30);

const SUCCESS_COLOR: u32 = 0x2ECC71;
const FAILURE_COLOR: u32 = 0xE74C3C;
const WARNING_COLOR: u32 = 0xF39C12;

struct EmbedParts {
    title: &'static str,
    color: u32,
    description: String
}

fn is_valid_uid(uid: &str) -> bool {
    uid.len() >= 6 && uid.chars().all(|c| c.is_ascii_digit())
}

fn format_count(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

// Renders an expiry like "<t:1756000000:R>" if the API gave us a parseable
// timestamp, so Discord shows it in the reader's timezone.
fn format_reset_hint(expires_at: Option<&str>) -> String {
    expires_at
        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
        .map(|expiry| format!("⏰ Try again <t:{}:R>.", expiry.timestamp()))
        .unwrap_or_else(|| "⏰ Try again after reset time.".to_string())
}

/// Presentation template for each outcome. Total: every variant gets a
/// title, a color and a body.
fn render_outcome(outcome: &LikeOutcome, region: &str, uid: &str) -> EmbedParts {
    match outcome {
        LikeOutcome::Success { player, likes_added, likes_before, likes_after, remain, daily_limit } => {
            let mut description = format!(
                "\n┌  ACCOUNT\n\
                 ├─ NICKNAME: {}\n\
                 ├─ UID: {}\n\
                 ├─ REGION: {}\n\
                 └─ RESULT:\n\
                 \u{20}  ├─ ADDED: +{}\n\
                 \u{20}  ├─ BEFORE: {}\n\
                 \u{20}  └─ AFTER: {}\n",
                player, uid, region, likes_added, format_count(*likes_before), format_count(*likes_after)
            );

            if let (Some(remain), Some(daily_limit)) = (remain, daily_limit) {
                description.push_str(&format!("\nLikes remaining today: {}/{}", remain, daily_limit));
            }

            EmbedParts { title: "FREE FIRE LIKE", color: SUCCESS_COLOR, description }
        }
        LikeOutcome::AlreadyClaimed { message, expires_at } => {
            let notice = message.clone()
                .unwrap_or_else(|| format!("⚠️ This UID `{uid}` already received likes today."));

            EmbedParts {
                title: "FREE FIRE LIKE",
                color: FAILURE_COLOR,
                description: format!("{}\n{}", notice, format_reset_hint(expires_at.as_deref()))
            }
        }
        LikeOutcome::Rejected => EmbedParts {
            title: "FREE FIRE LIKE",
            color: FAILURE_COLOR,
            description: format!("❌ The UID `{uid}` cannot receive more likes right now.")
        },
        LikeOutcome::NotFound => EmbedParts {
            title: "FREE FIRE LIKE",
            color: FAILURE_COLOR,
            description: format!("❌ No player found with UID `{uid}` in region `{region}`.")
        },
        LikeOutcome::RateLimited => EmbedParts {
            title: "⏳ Slow Down",
            color: WARNING_COLOR,
            description: "The like API is rate limiting requests at the moment. Try again in a few minutes.".to_string()
        },
        LikeOutcome::UpstreamError { .. } => EmbedParts {
            title: "⚠️ Service Unavailable",
            color: WARNING_COLOR,
            description: "The Free Fire API is not responding at the moment.\nTry again in a few minutes.".to_string()
        },
        LikeOutcome::Timeout => EmbedParts {
            title: "❌ Timeout",
            color: FAILURE_COLOR,
            description: "The server took too long to respond.".to_string()
        },
        LikeOutcome::Unexpected => EmbedParts {
            title: "❌ Critical Error",
            color: FAILURE_COLOR,
            description: "An unexpected error occurred. Please try again later.".to_string()
        }
    }
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Sends likes to a Free Fire player."),
    aliases("likes")
)]
pub async fn like(
    ctx: LikeContext<'_>,
    #[description = "Player region (e.g., IN, BR, SG)"] region: String,
    #[description = "Player UID (numbers only, minimum 6 characters)"] uid: String)
-> Result<(), Error> {
    let is_slash = matches!(ctx, poise::Context::Application(_));

    // Channel allow-list; direct messages are always allowed.
    if let Some(guild_id) = ctx.guild_id() {
        let config = channel_config!(ctx);
        let allowed = config.read().await.is_channel_allowed(guild_id, ctx.channel_id());

        if !allowed {
            ctx.send(CreateReply::default()
                .content("This command is not available in this channel. Please use it in an authorized channel.")
                .ephemeral(true)
            ).await?;
            return Ok(());
        }
    }

    // One check-and-record per invocation, charged before the API call is
    // made; the lock is never held across an await.
    let check = {
        let cooldowns = cooldowns!(ctx);
        let mut tracker = cooldowns.lock().unwrap();
        tracker.check_and_record(ctx.author().id, Instant::now())
    };

    if let CooldownCheck::OnCooldown { remaining } = check {
        // Why round up when we can add one?
        ctx.send(CreateReply::default()
            .content(format!("⏳ Please wait {} seconds before using this command again.", remaining.as_secs() + 1))
            .ephemeral(is_slash)
        ).await?;
        return Ok(());
    }

    if !is_valid_uid(&uid) {
        ctx.send(CreateReply::default()
            .content("❌ Invalid UID. It must contain only numbers and be at least 6 characters long.")
            .ephemeral(is_slash)
        ).await?;
        return Ok(());
    }

    // Shows the typing indicator (or the interaction spinner) while the
    // upstream call is in flight.
    ctx.defer().await?;

    let api = like_api!(ctx);
    let outcome = api.fetch_likes(&region, &uid).await;
    let parts = render_outcome(&outcome, &region, &uid);

    let embed = CreateEmbed::new()
        .title(parts.title)
        .description(parts.description)
        .color(parts.color)
        .timestamp(Timestamp::now());

    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    description_localized("en-US", "Sets the channels where the like command is allowed.")
)]
pub async fn setlikechannel(
    ctx: LikeContext<'_>,
    #[description = "The channel to allow/disallow the like command in."] channel: GuildChannel)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("This command can only be used in a server.").await?;
        return Ok(());
    };

    let config = channel_config!(ctx);
    let toggle = config.write().await.toggle_channel(guild_id, channel.id).await;

    match toggle {
        Ok(ChannelToggle::Added) => {
            ctx.send(CreateReply::default()
                .content(format!("✅ Channel <#{}> is now **allowed** for like commands.", channel.id))
                .ephemeral(true)
            ).await?;
        }
        Ok(ChannelToggle::Removed) => {
            ctx.send(CreateReply::default()
                .content(format!("✅ Channel <#{}> has been **removed** from allowed channels.", channel.id))
                .ephemeral(true)
            ).await?;
        }
        Err(ex) => {
            error!("Failed to save channel configuration: {}", ex);
            ctx.say("We couldn't update the channel settings, sorry... Try again later?").await?;
        }
    }

    Ok(())
}
