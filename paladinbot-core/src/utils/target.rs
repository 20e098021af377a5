use paladinbot_common::models::Chatter;

/// The user a command is aimed at: the first argument with any leading `@`
/// stripped, or the invoker when there is no argument. Always lowercase.
pub fn resolve_target(invoker: &Chatter, args: &[String]) -> String {
    let tagged = args
        .first()
        .map(|a| a.trim_start_matches('@'))
        .filter(|a| !a.is_empty())
        .unwrap_or(invoker.login.as_str());
    tagged.to_lowercase()
}
