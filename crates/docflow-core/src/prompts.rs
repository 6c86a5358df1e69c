//! Prompt templates
//!
//! Templates live in `prompts/` and are compiled into the binary.
//! Placeholders are `{name}`; substituted values are never rescanned, so
//! corpus text containing braces passes through untouched.

pub(crate) const DOCUMENT_SYSTEM: &str = include_str!("../prompts/document_system.md");
pub(crate) const DOCUMENT: &str = include_str!("../prompts/document.md");
pub(crate) const EXTRACT_SYSTEM: &str = include_str!("../prompts/extract_system.md");
pub(crate) const EXTRACT: &str = include_str!("../prompts/extract.md");
pub(crate) const SUMMARY_SYSTEM: &str = include_str!("../prompts/summary_system.md");
pub(crate) const SUMMARY: &str = include_str!("../prompts/summary.md");
pub(crate) const FLOW_SYSTEM: &str = include_str!("../prompts/flow_system.md");
pub(crate) const FLOW: &str = include_str!("../prompts/flow.md");

/// Fill `{name}` placeholders in one pass
///
/// Unknown placeholders are left as written.
pub(crate) fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let extra: usize = vars.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
