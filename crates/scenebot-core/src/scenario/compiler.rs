//! Scenario compilation: document -> validated [`ScenarioModel`].
//!
//! Expected shape (element names are matched by local name, the root element
//! may have any name):
//!
//! ```xml
//! <scenario>
//!   <name>heist</name>
//!   <channel>lobby</channel>
//!   <bot>
//!     <name>guard</name>
//!     <prompt>You protect {asset}. Visitor: {usr_in}</prompt>
//!     <task>keep the vault closed</task>
//!     <prompt_items>
//!       <item><name>asset</name><value>the vault</value></item>
//!     </prompt_items>
//!   </bot>
//! </scenario>
//! ```
//!
//! Compilation is pure apart from logging.

use std::path::Path;

use scenebot_types::error::ScenarioError;
use scenebot_types::scenario::{BotDef, BotProfile, PromptInput, ScenarioModel, USER_INPUT};
use tracing::{debug, info, warn};

use super::xml::{Element, parse_document};
use crate::prompt::extract_placeholders;

/// Read and compile the scenario document at `path`.
pub fn compile(path: impl AsRef<Path>) -> Result<ScenarioModel, ScenarioError> {
    let path = path.as_ref();

    let source = std::fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), "Scenario path does not exist");
            ScenarioError::NotFound(path.to_path_buf())
        } else {
            ScenarioError::Parse(format!("failed to read {}: {err}", path.display()))
        }
    })?;

    let model = compile_str(&source)?;
    info!(
        scenario = %model.name,
        channel = %model.channel,
        bots = model.bots.len(),
        path = %path.display(),
        "Scenario compiled"
    );
    Ok(model)
}

/// Compile a scenario document held in memory.
pub fn compile_str(source: &str) -> Result<ScenarioModel, ScenarioError> {
    let root = parse_document(source)?;

    let name = required_text(&root, "name", "scenario")?;
    let channel = required_text(&root, "channel", &format!("scenario '{name}'"))?;

    let mut bots: Vec<BotDef> = Vec::new();
    for (index, element) in root.children_named("bot").enumerate() {
        let bot = compile_bot(element, index)?;
        if bots.iter().any(|b| b.name == bot.name) {
            return Err(ScenarioError::Malformed(format!(
                "bot name '{}' is declared more than once",
                bot.name
            )));
        }
        bots.push(bot);
    }

    if bots.is_empty() {
        return Err(ScenarioError::Malformed(format!(
            "scenario '{name}' declares no <bot> elements"
        )));
    }

    Ok(ScenarioModel {
        name,
        channel,
        bots,
    })
}

fn required_text(element: &Element, child: &str, owner: &str) -> Result<String, ScenarioError> {
    element
        .child_text(child)
        .map(str::to_owned)
        .ok_or_else(|| ScenarioError::Malformed(format!("{owner} is missing a <{child}> element")))
}

fn optional_text(element: &Element, child: &str) -> Option<String> {
    element.child_text(child).map(str::to_owned)
}

fn compile_bot(element: &Element, index: usize) -> Result<BotDef, ScenarioError> {
    let name = required_text(element, "name", &format!("bot #{}", index + 1))?;
    let prompt_template = required_text(element, "prompt", &format!("bot '{name}'"))?;

    let profile = BotProfile {
        expression: optional_text(element, "expression"),
        contacts: optional_text(element, "contacts"),
        task: optional_text(element, "task"),
        protects: optional_text(element, "protects"),
    };

    let declared = declared_inputs(&name, element)?;
    let inputs = resolve_inputs(&name, &prompt_template, declared);

    Ok(BotDef {
        name,
        prompt_template,
        inputs,
        profile,
        speaks_in_channel: element.child("SIP").is_some(),
    })
}

/// Inputs listed under `<prompt_items>`. A blank or missing `<value>` makes
/// the input runtime-bound.
fn declared_inputs(bot: &str, element: &Element) -> Result<Vec<PromptInput>, ScenarioError> {
    let Some(items) = element.child("prompt_items") else {
        return Ok(Vec::new());
    };

    let mut inputs: Vec<PromptInput> = Vec::with_capacity(items.children.len());
    for item in &items.children {
        let name = item.child_text("name").ok_or_else(|| {
            ScenarioError::Malformed(format!("bot '{bot}' has a prompt item without a <name>"))
        })?;

        if name == USER_INPUT {
            return Err(ScenarioError::Malformed(format!(
                "bot '{bot}' declares the reserved input '{USER_INPUT}'"
            )));
        }
        if inputs.iter().any(|i| i.name == name) {
            return Err(ScenarioError::Malformed(format!(
                "bot '{bot}' declares prompt item '{name}' more than once"
            )));
        }

        inputs.push(match item.child_text("value") {
            Some(value) => PromptInput::fixed(name, value),
            None => PromptInput::runtime(name),
        });
    }
    Ok(inputs)
}

/// Add a runtime input for every template placeholder that was not declared.
fn resolve_inputs(bot: &str, template: &str, mut inputs: Vec<PromptInput>) -> Vec<PromptInput> {
    let placeholders = extract_placeholders(template);

    for input in &inputs {
        if !placeholders.contains(&input.name) {
            warn!(bot, input = %input.name, "Prompt item is not referenced by the prompt");
        }
    }

    for placeholder in placeholders {
        if placeholder == USER_INPUT || inputs.iter().any(|i| i.name == placeholder) {
            continue;
        }
        debug!(bot, input = %placeholder, "Undeclared placeholder bound at message time");
        inputs.push(PromptInput::runtime(placeholder));
    }

    inputs
}
