//! `translate` / `ngx-translate` directive usages in templates:
//!
//! ```html
//! <p translate="KEY"></p>
//! <p [translate]="'KEY'"></p>
//! <p translate>KEY</p>
//! ```

use super::{Extract, ParserName, collect_keys, script::template_sources, template};
use crate::core::{TranslationCollection, error::ParserError};

const DIRECTIVE_NAMES: &[&str] = &["translate", "ngx-translate"];

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveParser;

impl DirectiveParser {
    fn element_keys(element: &template::Element, keys: &mut Vec<String>) {
        for attribute in &element.attributes {
            if DIRECTIVE_NAMES.contains(&attribute.name.as_str()) {
                match attribute.value.as_deref().map(str::trim) {
                    Some(value) if !value.is_empty() => {
                        if !value.contains("{{") {
                            keys.push(value.to_string());
                        }
                    }
                    // Empty attribute: the element's own text is the key.
                    _ => keys.extend(
                        element
                            .texts
                            .iter()
                            .map(|text| text.trim())
                            .filter(|text| !text.is_empty() && !text.contains("{{"))
                            .map(String::from),
                    ),
                }
            } else if let Some(name) = attribute.bound_name()
                && DIRECTIVE_NAMES.contains(&name)
                && let Some(expression) = attribute.value.as_deref()
            {
                for ast in template::parse_expressions(expression) {
                    keys.extend(ast.literals());
                }
            }
        }
    }
}

impl Extract for DirectiveParser {
    fn name(&self) -> &str {
        ParserName::Directive.as_str()
    }

    fn extract(
        &self,
        content: &str,
        file_path: &str,
    ) -> Result<TranslationCollection, ParserError> {
        let mut keys = Vec::new();
        for source in template_sources(content, file_path)? {
            if !source.contains("translate") {
                continue;
            }
            for element in &template::scan(&source).elements {
                Self::element_keys(element, &mut keys);
            }
        }
        Ok(collect_keys(keys, file_path))
    }
}
