//! Placeholder rendering for briefs and worker prompts.
//!
//! Templates use `{{name}}` placeholders. Rendering is fail-closed: a
//! placeholder with no matching variable is an error rather than silently
//! vanishing text, so a typo in a template surfaces at create-run time
//! instead of as a half-empty brief handed to a worker.
//!
//! Anything that is not a well-formed `{{name}}` placeholder is passed
//! through unchanged, so templates can contain ordinary braces.

use crate::error::BatonError;
use std::collections::BTreeMap;

/// Variables available to a template, name to value.
pub type Vars = BTreeMap<String, String>;

/// Error from rendering a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{{name}}` placeholder had no matching variable.
    UnknownPlaceholder { name: String },
    /// A `{{` was never closed by `}}`.
    UnclosedPlaceholder { position: usize },
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::UnknownPlaceholder { name } => {
                write!(f, "template references unknown placeholder '{{{{{}}}}}'", name)
            }
            TemplateError::UnclosedPlaceholder { position } => {
                write!(f, "unclosed '{{{{' at byte {} in template", position)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

impl From<TemplateError> for BatonError {
    fn from(e: TemplateError) -> Self {
        BatonError::UserError(e.to_string())
    }
}

/// Render a template, substituting every `{{name}}` placeholder.
pub fn render(template: &str, vars: &Vars) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];

        let close = after_open
            .find("}}")
            .ok_or(TemplateError::UnclosedPlaceholder {
                position: offset + open,
            })?;

        let name = after_open[..close].trim();
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => {
                return Err(TemplateError::UnknownPlaceholder {
                    name: name.to_string(),
                });
            }
        }

        offset += open + 2 + close + 2;
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Build a [`Vars`] map from key-value pairs.
pub fn vars<I, K, V>(pairs: I) -> Vars
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
