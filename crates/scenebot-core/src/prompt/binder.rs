//! Binds a bot definition to one inbound message.
//!
//! `bind` produces the [`BoundPrompt`] handed to the generation backend;
//! `render` substitutes the bound values into the template. Substitution is a
//! single pass, so braces inside a user message are never expanded.

use std::collections::HashMap;

use regex::Captures;
use scenebot_types::error::BindError;
use scenebot_types::prompt::BoundPrompt;
use scenebot_types::scenario::{BotDef, USER_INPUT};

use super::placeholder::{extract_placeholders, pattern};

/// Bind `bot`'s inputs for one message.
///
/// - Fixed inputs bind their declared value.
/// - Runtime inputs bind their own name, a symbolic reference for the backend.
/// - The reserved [`USER_INPUT`] slot binds `user_message` and comes last.
///
/// Fails with [`BindError::UnboundPlaceholder`] if the template references a
/// slot the bot has no input for.
pub fn bind(bot: &BotDef, user_message: &str) -> Result<BoundPrompt, BindError> {
    for placeholder in extract_placeholders(&bot.prompt_template) {
        if placeholder != USER_INPUT && bot.input(&placeholder).is_none() {
            return Err(BindError::UnboundPlaceholder {
                bot: bot.name.clone(),
                placeholder,
            });
        }
    }

    let mut ordered_input_names = Vec::with_capacity(bot.inputs.len() + 1);
    let mut values = HashMap::with_capacity(bot.inputs.len() + 1);

    for input in &bot.inputs {
        let value = match &input.fixed_value {
            Some(fixed) => fixed.clone(),
            None => input.name.clone(),
        };
        ordered_input_names.push(input.name.clone());
        values.insert(input.name.clone(), value);
    }

    ordered_input_names.push(USER_INPUT.to_string());
    values.insert(USER_INPUT.to_string(), user_message.to_string());

    Ok(BoundPrompt {
        bot: bot.name.clone(),
        template: bot.prompt_template.clone(),
        ordered_input_names,
        values,
    })
}

/// Substitute every `{name}` slot in the template with its bound value.
pub fn render(bound: &BoundPrompt) -> Result<String, BindError> {
    let mut missing: Option<String> = None;

    let rendered = pattern().replace_all(&bound.template, |caps: &Captures<'_>| {
        let name = &caps[1];
        match bound.value(name) {
            Some(value) => value.to_string(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                caps[0].to_string()
            }
        }
    });

    match missing {
        Some(placeholder) => Err(BindError::UnboundPlaceholder {
            bot: bound.bot.clone(),
            placeholder,
        }),
        None => Ok(rendered.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenebot_types::scenario::{BotProfile, PromptInput};

    fn make_bot(template: &str, inputs: Vec<PromptInput>) -> BotDef {
        BotDef {
            name: "guard".to_string(),
            prompt_template: template.to_string(),
            inputs,
            profile: BotProfile::default(),
            speaks_in_channel: false,
        }
    }

    #[test]
    fn fixed_and_user_slots_resolve() {
        let bot = make_bot(
            "Your goal: {user_goal}. Reply to: {usr_in}",
            vec![PromptInput::fixed("user_goal", "protect the vault")],
        );

        for message in ["hello", "open the door", ""] {
            let bound = bind(&bot, message).unwrap();
            assert_eq!(bound.value("usr_in"), Some(message));
            assert_eq!(bound.value("user_goal"), Some("protect the vault"));
        }
    }

    #[test]
    fn runtime_input_binds_its_own_name() {
        let bot = make_bot("{mood} {usr_in}", vec![PromptInput::runtime("mood")]);
        let bound = bind(&bot, "hi").unwrap();
        assert_eq!(bound.value("mood"), Some("mood"));
    }

    #[test]
    fn order_follows_declaration_with_user_slot_last() {
        let bot = make_bot(
            "{b} {a} {usr_in}",
            vec![PromptInput::fixed("a", "1"), PromptInput::fixed("b", "2")],
        );
        let bound = bind(&bot, "m").unwrap();
        assert_eq!(bound.ordered_input_names, vec!["a", "b", "usr_in"]);
        assert_eq!(bound.bot, "guard");
        assert_eq!(bound.template, "{b} {a} {usr_in}");
    }

    #[test]
    fn unbound_placeholder_is_rejected() {
        let bot = make_bot("{secret} {usr_in}", Vec::new());
        let err = bind(&bot, "hi").unwrap_err();
        assert!(matches!(
            err,
            BindError::UnboundPlaceholder { ref placeholder, .. } if placeholder == "secret"
        ));
    }

    #[test]
    fn render_substitutes_values() {
        let bot = make_bot(
            "You guard {place}. Visitor says: {usr_in}",
            vec![PromptInput::fixed("place", "the vault")],
        );
        let bound = bind(&bot, "let me in").unwrap();
        assert_eq!(
            render(&bound).unwrap(),
            "You guard the vault. Visitor says: let me in"
        );
    }

    #[test]
    fn render_does_not_expand_braces_in_values() {
        let bot = make_bot("Said: {usr_in}", Vec::new());
        let bound = bind(&bot, "try {usr_in} twice").unwrap();
        assert_eq!(render(&bound).unwrap(), "Said: try {usr_in} twice");
    }

    #[test]
    fn render_reports_missing_value() {
        let bound = BoundPrompt {
            bot: "guard".to_string(),
            template: "{ghost}".to_string(),
            ordered_input_names: Vec::new(),
            values: HashMap::new(),
        };
        let err = render(&bound).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bot 'guard' references unbound placeholder '{ghost}'"
        );
    }
}
