use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{CoreError, CoreErrorCode};
use crate::registry::{ArithmeticKind, Modifier, TagSuffix};

/// Tag text per modifier, used both for composing variant names and for
/// recognizing tags already embedded in a name. Tag texts must be
/// non-empty and unique across modifiers; otherwise stripping one tag
/// could eat another modifier's run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConfig {
    tag_texts: BTreeMap<Modifier, String>,
}

impl NamingConfig {
    pub fn new(tag_texts: BTreeMap<Modifier, String>) -> Result<Self, CoreError> {
        let mut full = BTreeMap::new();
        for modifier in Modifier::ALL {
            let text = tag_texts
                .get(&modifier)
                .map(String::as_str)
                .unwrap_or(modifier.spec().default_tag)
                .trim()
                .to_string();
            full.insert(modifier, text);
        }
        let config = Self { tag_texts: full };
        config.validate()?;
        Ok(config)
    }

    pub fn tag_text(&self, modifier: Modifier) -> &str {
        self.tag_texts
            .get(&modifier)
            .map(String::as_str)
            .unwrap_or(modifier.spec().default_tag)
    }

    pub fn set_tag_text(
        &mut self,
        modifier: Modifier,
        text: impl Into<String>,
    ) -> Result<(), CoreError> {
        let previous = self
            .tag_texts
            .insert(modifier, text.into().trim().to_string());
        if let Err(e) = self.validate() {
            if let Some(previous) = previous {
                self.tag_texts.insert(modifier, previous);
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn all_tag_texts(&self) -> Vec<&str> {
        self.tag_texts.values().map(String::as_str).collect()
    }

    fn validate(&self) -> Result<(), CoreError> {
        for (modifier, text) in &self.tag_texts {
            if text.is_empty() {
                return Err(CoreError::new(
                    CoreErrorCode::Settings,
                    format!("empty tag text for {}", modifier.spec().display_name),
                ));
            }
        }
        for (modifier, text) in &self.tag_texts {
            let shared = self
                .tag_texts
                .iter()
                .any(|(other, other_text)| other != modifier && other_text == text);
            if shared {
                return Err(CoreError::new(
                    CoreErrorCode::Settings,
                    format!("tag text '{text}' is used by more than one modifier"),
                ));
            }
        }
        Ok(())
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        let tag_texts = Modifier::ALL
            .iter()
            .map(|m| (*m, m.spec().default_tag.to_string()))
            .collect();
        Self { tag_texts }
    }
}

/// `"{tag_text} {value}{suffix}"`, e.g. `Size 150%` or `Dur 60s`.
pub fn compose_tag(tag_text: &str, suffix: TagSuffix, value: f64) -> String {
    format!("{tag_text} {}{}", format_tag_value(value), suffix.as_char())
}

fn format_tag_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Removes every recognizable `" TagText value..."` run from `name`,
/// for each configured tag, returning the clean base name. Matching is
/// word-boundary delimited so a tag never fires inside a longer word.
pub fn strip_known_tags(name: &str, known_tags: &[&str]) -> String {
    let mut base = name.to_string();
    for tag in known_tags {
        if tag.is_empty() {
            continue;
        }
        let pattern = format!(r" \b{}\b ", regex::escape(tag));
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        if let Some(m) = re.find(&base) {
            base.truncate(m.start());
        }
    }
    base.trim().to_string()
}

/// Computes the variant's scenario name from the current one.
///
/// Swap vs. stack: only a `Direct` modifier (Duration) replaces an
/// existing tag of its own kind in place. Every other kind appends,
/// even when a tag of that kind is already present; stacking repeated
/// runs (e.g. "Size 50% Size 150%") is intentional and left to the
/// caller to keep sensible.
pub fn compute_target_name(
    current_name: &str,
    modifier: Modifier,
    value: f64,
    config: &NamingConfig,
) -> String {
    let spec = modifier.spec();
    let tag_text = config.tag_text(modifier);
    let new_tag = compose_tag(tag_text, spec.suffix, value);
    let current_name = current_name.trim();

    if spec.arithmetic == ArithmeticKind::Direct {
        // Anchor on the literal suffix so Duration's `s` never matches
        // a percent tag and vice versa.
        let pattern = match spec.suffix {
            TagSuffix::Percent => format!(r" \b{}\b \d+%", regex::escape(tag_text)),
            TagSuffix::Seconds => format!(r" \b{}\b \d+s", regex::escape(tag_text)),
        };
        if let Ok(re) = Regex::new(&pattern) {
            if let Some(m) = re.find(current_name) {
                let mut out = String::with_capacity(current_name.len() + new_tag.len());
                out.push_str(&current_name[..m.start()]);
                out.push(' ');
                out.push_str(&new_tag);
                out.push_str(&current_name[m.end()..]);
                return out;
            }
        }
    }

    format!("{current_name} {new_tag}")
}
