//! `translate` pipe usages in templates:
//!
//! ```html
//! {{ 'HELLO' | translate }}
//! <img [alt]="(isError ? 'ERROR' : 'OK') | translate">
//! @if (show) { {{ 'A' || 'B' | translate }} }
//! ```

use super::{Extract, ParserName, collect_keys, script::template_sources, template};
use crate::core::{TranslationCollection, error::ParserError};

const PIPE_NAME: &str = "translate";

#[derive(Debug, Clone, Copy, Default)]
pub struct PipeParser;

impl Extract for PipeParser {
    fn name(&self) -> &str {
        ParserName::Pipe.as_str()
    }

    fn extract(
        &self,
        content: &str,
        file_path: &str,
    ) -> Result<TranslationCollection, ParserError> {
        let mut keys = Vec::new();
        for source in template_sources(content, file_path)? {
            // Cheap rejection before scanning the template.
            if !source.contains(PIPE_NAME) {
                continue;
            }
            let template = template::scan(&source);
            for expression in &template.expressions {
                for ast in template::parse_expressions(expression) {
                    ast.walk(&mut |node| {
                        if let template::Ast::Pipe { input, name, .. } = node
                            && name == PIPE_NAME
                        {
                            keys.extend(input.literals());
                        }
                    });
                }
            }
        }
        Ok(collect_keys(keys, file_path))
    }
}
