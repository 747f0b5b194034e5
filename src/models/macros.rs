#[macro_export]
macro_rules! like_api {
    ($ctx: expr) => {
        {
            let ctx_global = $ctx.serenity_context().data.read().await;
            let out = ctx_global.get::<$crate::services::like_api::LikeApi>().expect("Couldn't find like API client").clone();

            out
        }
    }
}

#[macro_export]
macro_rules! cooldowns {
    ($ctx: expr) => {
        {
            let ctx_global = $ctx.serenity_context().data.read().await;
            let out = ctx_global.get::<$crate::services::cooldown::Cooldowns>().expect("Couldn't find cooldown tracker").clone();

            out
        }
    }
}

#[macro_export]
macro_rules! channel_config {
    ($ctx: expr) => {
        {
            let ctx_global = $ctx.serenity_context().data.read().await;
            let out = ctx_global.get::<$crate::services::channel_config::ChannelConfig>().expect("Couldn't find channel config").clone();

            out
        }
    }
}
