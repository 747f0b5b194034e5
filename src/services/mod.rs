pub mod channel_config;
pub mod cooldown;
pub mod like_api;
