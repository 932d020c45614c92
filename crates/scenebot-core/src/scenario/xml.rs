//! Element tree construction for scenario documents.
//!
//! Element names are reduced to their local part, so `<sc:bot>` and `<bot>`
//! are the same element and namespace declarations never affect lookups.
//! Any DOCTYPE is refused outright, which also rules out external and custom
//! entity definitions; references to undeclared entities fail to unescape.

use quick_xml::Reader;
use quick_xml::events::Event;
use scenebot_types::error::ScenarioError;

#[derive(Debug, Default)]
pub(crate) struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// First child element named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements named `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first child named `name`; `None` if absent or blank.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }
}

/// Parse `source` into its root element.
pub(crate) fn parse_document(source: &str) -> Result<Element, ScenarioError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            ScenarioError::Parse(format!("{e} (at byte {})", reader.buffer_position()))
        })?;

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(parse_error("content after the root element"));
                }
                stack.push(Element::new(decode_name(start.local_name().as_ref())?));
            }
            Event::Empty(start) => {
                let element = Element::new(decode_name(start.local_name().as_ref())?);
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| parse_error("closing tag without a matching opening tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(|e| {
                    ScenarioError::Parse(format!("{e} (at byte {})", reader.buffer_position()))
                })?;
                push_text(&mut stack, &value)?;
            }
            Event::CData(data) => {
                let value = std::str::from_utf8(&data)
                    .map_err(|e| ScenarioError::Parse(format!("invalid UTF-8 in CDATA: {e}")))?;
                push_text(&mut stack, value)?;
            }
            Event::DocType(_) => {
                return Err(parse_error(
                    "DOCTYPE declarations are not permitted in scenario documents",
                ));
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        return Err(ScenarioError::Parse(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| parse_error("document has no root element"))
}

fn parse_error(message: &str) -> ScenarioError {
    ScenarioError::Parse(message.to_string())
}

fn decode_name(raw: &[u8]) -> Result<String, ScenarioError> {
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|e| ScenarioError::Parse(format!("invalid UTF-8 in element name: {e}")))
}

fn attach(
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ScenarioError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(parse_error("document has more than one root element")),
    }
}

fn push_text(stack: &mut [Element], value: &str) -> Result<(), ScenarioError> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(value);
            Ok(())
        }
        None => Err(parse_error("text outside the root element")),
    }
}
