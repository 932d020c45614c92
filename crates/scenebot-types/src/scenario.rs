//! Compiled scenario model.
//!
//! A `ScenarioModel` is produced once by the scenario compiler in
//! `scenebot-core` and is read-only afterwards: bot orchestrators share it
//! behind an `Arc` and never mutate it.

use serde::{Deserialize, Serialize};

/// Name of the reserved input slot that receives the inbound chat message.
///
/// It is never declared in a scenario's `prompt_items`; the binder synthesizes
/// it for every message.
pub const USER_INPUT: &str = "usr_in";

/// A validated scenario: one channel, one or more bots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioModel {
    pub name: String,
    pub channel: String,
    pub bots: Vec<BotDef>,
}

impl ScenarioModel {
    /// Look up a bot by name.
    pub fn bot(&self, name: &str) -> Option<&BotDef> {
        self.bots.iter().find(|b| b.name == name)
    }

    /// Bot names in declaration order.
    pub fn bot_names(&self) -> impl Iterator<Item = &str> {
        self.bots.iter().map(|b| b.name.as_str())
    }

    /// Whether `nick` belongs to one of this scenario's bots.
    ///
    /// Chat nicknames are case-insensitive, so the comparison is too.
    pub fn is_bot(&self, nick: &str) -> bool {
        self.bots.iter().any(|b| b.name.eq_ignore_ascii_case(nick))
    }

    /// Whether any bot is marked as speaking in the channel. When one is,
    /// bots without the mark stay silent there and only answer privately.
    pub fn gates_channel(&self) -> bool {
        self.bots.iter().any(|b| b.speaks_in_channel)
    }

    /// Number of bots sharing the channel.
    pub fn group_size(&self) -> usize {
        self.bots.len()
    }

    /// The channel identity to join, e.g. `#lobby` for a scenario channel `lobby`.
    pub fn channel_target(&self) -> String {
        if self.channel.starts_with('#') || self.channel.starts_with('&') {
            self.channel.clone()
        } else {
            format!("#{}", self.channel)
        }
    }
}

/// One simulated chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotDef {
    /// Unique within the scenario; also the bot's chat nickname.
    pub name: String,
    pub prompt_template: String,
    /// Declared and implied inputs, in declaration order. Never contains
    /// [`USER_INPUT`].
    pub inputs: Vec<PromptInput>,
    #[serde(default)]
    pub profile: BotProfile,
    /// Set by a `<SIP/>` marker on the bot.
    #[serde(default)]
    pub speaks_in_channel: bool,
}

impl BotDef {
    /// Look up a declared input by name.
    pub fn input(&self, name: &str) -> Option<&PromptInput> {
        self.inputs.iter().find(|i| i.name == name)
    }
}

/// A named template input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptInput {
    pub name: String,
    /// `None` means the value is supplied per message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_value: Option<String>,
}

impl PromptInput {
    pub fn fixed(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_value: Some(value.into()),
        }
    }

    pub fn runtime(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_value: None,
        }
    }
}

/// Optional descriptive fields of a bot.
///
/// Carried through from the scenario document untouched; orchestration does
/// not interpret them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protects: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bot(name: &str) -> BotDef {
        BotDef {
            name: name.to_string(),
            prompt_template: "You are {role}. {usr_in}".to_string(),
            inputs: vec![PromptInput::fixed("role", "a guard")],
            profile: BotProfile::default(),
            speaks_in_channel: false,
        }
    }

    fn make_model(channel: &str, bots: &[&str]) -> ScenarioModel {
        ScenarioModel {
            name: "heist".to_string(),
            channel: channel.to_string(),
            bots: bots.iter().map(|b| make_bot(b)).collect(),
        }
    }

    #[test]
    fn test_channel_target_prepends_hash() {
        assert_eq!(make_model("lobby", &["a"]).channel_target(), "#lobby");
    }

    #[test]
    fn test_channel_target_keeps_existing_prefix() {
        assert_eq!(make_model("#lobby", &["a"]).channel_target(), "#lobby");
        assert_eq!(make_model("&local", &["a"]).channel_target(), "&local");
    }

    #[test]
    fn test_is_bot_ignores_case() {
        let model = make_model("lobby", &["Alice", "bob"]);
        assert!(model.is_bot("alice"));
        assert!(model.is_bot("BOB"));
        assert!(!model.is_bot("carol"));
    }

    #[test]
    fn test_bot_lookup_and_group_size() {
        let model = make_model("lobby", &["alice", "bob"]);
        assert_eq!(model.group_size(), 2);
        assert_eq!(model.bot("bob").map(|b| b.name.as_str()), Some("bob"));
        assert!(model.bot("carol").is_none());
        assert_eq!(model.bot_names().collect::<Vec<_>>(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_gates_channel_when_any_bot_speaks() {
        let mut model = make_model("lobby", &["alice", "bob"]);
        assert!(!model.gates_channel());
        model.bots[0].speaks_in_channel = true;
        assert!(model.gates_channel());
    }

    #[test]
    fn test_speaks_in_channel_defaults_off() {
        let json = serde_json::json!({
            "name": "alice",
            "prompt_template": "{usr_in}",
            "inputs": [],
        });
        let bot: BotDef = serde_json::from_value(json).unwrap();
        assert!(!bot.speaks_in_channel);
    }

    #[test]
    fn test_prompt_input_kinds() {
        assert_eq!(PromptInput::runtime("mood").fixed_value, None);
        assert_eq!(
            PromptInput::fixed("role", "guard").fixed_value.as_deref(),
            Some("guard")
        );
    }

    #[test]
    fn test_profile_fields_skipped_when_empty() {
        let json = serde_json::to_value(make_bot("alice")).unwrap();
        assert_eq!(json["profile"], serde_json::json!({}));
        assert_eq!(json["inputs"][0]["fixed_value"], "a guard");
    }
}
