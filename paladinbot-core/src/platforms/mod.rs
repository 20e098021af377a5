pub mod twitch_eventsub;
pub mod twitch_helix;
pub mod twitch_irc;
