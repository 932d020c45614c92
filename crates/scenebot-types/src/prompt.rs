//! Prompt binding output.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Everything a generation call needs for one message: the bot's template and
/// the value bound to each of its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundPrompt {
    /// Name of the bot the prompt was bound for.
    pub bot: String,
    pub template: String,
    /// Input names in declaration order, reserved user slot last.
    pub ordered_input_names: Vec<String>,
    pub values: HashMap<String, String>,
}

impl BoundPrompt {
    /// The value bound to `name`, if any.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}
