//! Marker function calls in scripts.
//!
//! [`MarkerParser`] follows the `marker` export of the marker packages, whatever it
//! is imported as:
//!
//! ```ts
//! import { marker as _ } from '@colsen1991/ngx-translate-extract-marker';
//! import * as m from '@biesbjerg/ngx-translate-extract-marker';
//!
//! _('KEY');
//! m.marker('OTHER');
//! ```
//!
//! [`FunctionParser`] takes over when a custom marker name is configured and
//! matches plain calls to that name, imported or not.

use std::collections::HashSet;

use swc_ecma_ast::{
    CallExpr, Callee, Expr, ImportDecl, ImportSpecifier, MemberProp, Module, ModuleExportName,
};
use swc_ecma_visit::{Visit, VisitWith};

use super::{
    Extract, ParserName, collect_keys,
    script::{collect_literals, is_script_file, parse_script, unwrap_ts_expr},
};
use crate::core::{TranslationCollection, error::ParserError};

pub const MARKER_MODULES: &[&str] = &[
    "@colsen1991/ngx-translate-extract-marker",
    "@biesbjerg/ngx-translate-extract-marker",
    "@vendure/ngx-translate-extract-marker",
];

const MARKER_EXPORT: &str = "marker";

/// Local names bound to the marker export.
#[derive(Debug, Default)]
struct MarkerImports {
    functions: HashSet<String>,
    namespaces: HashSet<String>,
}

impl MarkerImports {
    fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.namespaces.is_empty()
    }
}

impl Visit for MarkerImports {
    fn visit_import_decl(&mut self, node: &ImportDecl) {
        let Some(module_path) = node.src.value.as_str() else {
            return;
        };
        if !MARKER_MODULES.contains(&module_path) {
            return;
        }
        for specifier in &node.specifiers {
            match specifier {
                ImportSpecifier::Named(named) => {
                    let imported = match &named.imported {
                        Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                        Some(ModuleExportName::Str(s)) => s.value.to_string_lossy().to_string(),
                        None => named.local.sym.to_string(),
                    };
                    if imported == MARKER_EXPORT {
                        self.functions.insert(named.local.sym.to_string());
                    }
                }
                ImportSpecifier::Namespace(ns) => {
                    self.namespaces.insert(ns.local.sym.to_string());
                }
                ImportSpecifier::Default(_) => {}
            }
        }
    }
}

/// Collects literal first arguments of calls whose callee matches.
struct CallCollector<F> {
    matches: F,
    keys: Vec<String>,
}

impl<F: Fn(&Expr) -> bool> Visit for CallCollector<F> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee
            && (self.matches)(unwrap_ts_expr(callee))
            && let Some(arg) = node.args.first()
        {
            collect_literals(&arg.expr, true, &mut self.keys);
        }
        node.visit_children_with(self);
    }
}

fn collect_calls(module: &Module, matches: impl Fn(&Expr) -> bool) -> Vec<String> {
    let mut collector = CallCollector {
        matches,
        keys: Vec::new(),
    };
    module.visit_with(&mut collector);
    collector.keys
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerParser;

impl Extract for MarkerParser {
    fn name(&self) -> &str {
        ParserName::Marker.as_str()
    }

    fn extract(
        &self,
        content: &str,
        file_path: &str,
    ) -> Result<TranslationCollection, ParserError> {
        if !is_script_file(file_path) || !content.contains("ngx-translate-extract-marker") {
            return Ok(TranslationCollection::new());
        }
        let module = parse_script(content, file_path)?;

        let mut imports = MarkerImports::default();
        module.visit_with(&mut imports);
        if imports.is_empty() {
            return Ok(TranslationCollection::new());
        }

        let keys = collect_calls(&module, |callee| match callee {
            Expr::Ident(ident) => imports.functions.contains(ident.sym.as_str()),
            Expr::Member(member) => {
                matches!(&*member.obj, Expr::Ident(ns) if imports.namespaces.contains(ns.sym.as_str()))
                    && matches!(&member.prop, MemberProp::Ident(p) if p.sym.as_str() == MARKER_EXPORT)
            }
            _ => false,
        });
        Ok(collect_keys(keys, file_path))
    }
}

/// Calls to a function with a configured name.
#[derive(Debug, Clone)]
pub struct FunctionParser {
    function_name: String,
}

impl FunctionParser {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
        }
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }
}

impl Extract for FunctionParser {
    fn name(&self) -> &str {
        "function"
    }

    fn extract(
        &self,
        content: &str,
        file_path: &str,
    ) -> Result<TranslationCollection, ParserError> {
        if !is_script_file(file_path) || !content.contains(self.function_name.as_str()) {
            return Ok(TranslationCollection::new());
        }
        let module = parse_script(content, file_path)?;
        let keys = collect_calls(&module, |callee| {
            matches!(callee, Expr::Ident(ident) if ident.sym.as_str() == self.function_name)
        });
        Ok(collect_keys(keys, file_path))
    }
}
