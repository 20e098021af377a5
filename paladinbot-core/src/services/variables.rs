//! `${name}` substitution in custom command responses.

use std::collections::HashMap;
use std::sync::Arc;
use paladinbot_common::models::Chatter;
use crate::utils::target::resolve_target;

/// What a variable can see when it is resolved.
pub struct VariableContext<'a> {
    pub channel: &'a str,
    pub invoker: &'a Chatter,
    /// Arguments after the command token.
    pub args: &'a [String],
}

pub trait Variable: Send + Sync {
    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn resolve(&self, ctx: &VariableContext<'_>) -> String;
}

/// `@` plus the targeted user, or the invoker when nobody is targeted.
pub struct UserVariable;

impl Variable for UserVariable {
    fn name(&self) -> &'static str {
        "user"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["target"]
    }

    fn resolve(&self, ctx: &VariableContext<'_>) -> String {
        format!("@{}", resolve_target(ctx.invoker, ctx.args))
    }
}

/// Display name of whoever ran the command.
pub struct SenderVariable;

impl Variable for SenderVariable {
    fn name(&self) -> &'static str {
        "sender"
    }

    fn resolve(&self, ctx: &VariableContext<'_>) -> String {
        ctx.invoker.display_name.clone()
    }
}

pub struct ChannelVariable;

impl Variable for ChannelVariable {
    fn name(&self) -> &'static str {
        "channel"
    }

    fn resolve(&self, ctx: &VariableContext<'_>) -> String {
        ctx.channel.to_string()
    }
}

#[derive(Clone, Default)]
pub struct VariableEngine {
    variables: HashMap<&'static str, Arc<dyn Variable>>,
}

impl VariableEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with `user`, `sender` and `channel` registered.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.register(Arc::new(UserVariable));
        engine.register(Arc::new(SenderVariable));
        engine.register(Arc::new(ChannelVariable));
        engine
    }

    pub fn register(&mut self, variable: Arc<dyn Variable>) {
        for alias in variable.aliases() {
            self.variables.insert(*alias, variable.clone());
        }
        self.variables.insert(variable.name(), variable);
    }

    /// Replaces every `${name}` whose name is registered. Unknown markers are
    /// left as they are, and substituted values are never scanned again.
    pub fn expand(&self, template: &str, ctx: &VariableContext<'_>) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];

            let Some(close) = after_open.find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };

            let name = &after_open[..close];
            match self.variables.get(name) {
                Some(var) => {
                    out.push_str(&var.resolve(ctx));
                    rest = &after_open[close + 1..];
                }
                None => {
                    // keep the marker opener and rescan from just after it
                    out.push_str("${");
                    rest = after_open;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(template: &str, args: &[&str]) -> String {
        let invoker = Chatter::new(42, "alice", "Alice");
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let ctx = VariableContext {
            channel: "paladin",
            invoker: &invoker,
            args: &args,
        };
        VariableEngine::with_defaults().expand(template, &ctx)
    }

    #[test]
    fn user_falls_back_to_invoker() {
        assert_eq!(expand("Hello ${user}!", &[]), "Hello @alice!");
    }

    #[test]
    fn user_targets_first_argument() {
        assert_eq!(expand("hi ${user}", &["@Bob", "extra"]), "hi @bob");
        assert_eq!(expand("hi ${target}", &["Carol"]), "hi @carol");
    }

    #[test]
    fn unknown_markers_are_left_verbatim() {
        assert_eq!(expand("${nope} and ${user}", &[]), "${nope} and @alice");
        assert_eq!(expand("unterminated ${user", &[]), "unterminated ${user");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        // the target argument itself looks like a marker
        assert_eq!(expand("${user}", &["${channel}"]), "@${channel}");
    }

    #[test]
    fn several_variables_in_one_template() {
        assert_eq!(
            expand("${sender} says hi to ${user} in ${channel}", &["dave"]),
            "Alice says hi to @dave in paladin"
        );
    }
}
