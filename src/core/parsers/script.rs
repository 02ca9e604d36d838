//! TypeScript/JavaScript support shared by the parsers (uses swc for AST generation).

use std::{path::Path, sync::Arc};

use swc_common::{FileName, GLOBALS, Globals, SourceMap};
use swc_ecma_ast::{
    BinaryOp, Callee, Class, Decorator, Expr, Lit, Module, ObjectLit, Prop, PropName, PropOrSpread,
    TsEntityName, TsType,
};
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::error::ParserError;

const SCRIPT_EXTENSIONS: &[&str] = &["ts", "mts", "cts", "tsx", "js", "mjs", "cjs", "jsx"];

/// Check if a file should be parsed as a script rather than as a template.
pub fn is_script_file(file_path: &str) -> bool {
    Path::new(file_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Parse TypeScript source into a module.
///
/// Each call uses its own `SourceMap` and `Globals`, so parsers stay independent
/// of each other and safe to run on any worker thread.
pub fn parse_script(code: &str, file_path: &str) -> Result<Module, ParserError> {
    let source_map: Arc<SourceMap> = Default::default();

    GLOBALS.set(&Globals::new(), || {
        let source_file =
            source_map.new_source_file(FileName::Real(file_path.into()).into(), code.to_string());

        let tsx = file_path.ends_with(".tsx") || file_path.ends_with(".jsx");
        let syntax = Syntax::Typescript(TsSyntax {
            tsx,
            decorators: true,
            ..Default::default()
        });

        let mut parser = Parser::new(syntax, StringInput::from(&*source_file), None);
        parser
            .parse_module()
            .map_err(|e| ParserError::Syntax(format!("{:?}", e)))
    })
}

/// Unwrap TypeScript-specific expression wrappers to get the inner expression.
pub fn unwrap_ts_expr(expr: &Expr) -> &Expr {
    match expr {
        Expr::TsAs(ts_as) => unwrap_ts_expr(&ts_as.expr),
        Expr::TsConstAssertion(ts_const) => unwrap_ts_expr(&ts_const.expr),
        Expr::TsSatisfies(ts_sat) => unwrap_ts_expr(&ts_sat.expr),
        Expr::TsNonNull(non_null) => unwrap_ts_expr(&non_null.expr),
        Expr::Paren(paren) => unwrap_ts_expr(&paren.expr),
        _ => expr,
    }
}

/// Literal string value of a string literal or a template literal without substitutions.
pub fn string_value(expr: &Expr) -> Option<String> {
    match unwrap_ts_expr(expr) {
        Expr::Lit(Lit::Str(s)) => s.value.as_str().map(|s| s.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => tpl
            .quasis
            .first()
            .and_then(|q| q.cooked.as_ref())
            .and_then(|s| s.as_str().map(|s| s.to_string())),
        _ => None,
    }
}

/// Collect every literal a call argument can evaluate to.
///
/// Conditionals contribute both branches, `||` and `??` both operands. Arrays are
/// only expanded when `arrays` is set. Anything computed is skipped.
pub fn collect_literals(expr: &Expr, arrays: bool, out: &mut Vec<String>) {
    if let Some(value) = string_value(expr) {
        out.push(value);
        return;
    }
    match unwrap_ts_expr(expr) {
        Expr::Cond(cond) => {
            collect_literals(&cond.cons, arrays, out);
            collect_literals(&cond.alt, arrays, out);
        }
        Expr::Bin(bin) if matches!(bin.op, BinaryOp::LogicalOr | BinaryOp::NullishCoalescing) => {
            collect_literals(&bin.left, arrays, out);
            collect_literals(&bin.right, arrays, out);
        }
        Expr::Array(array) if arrays => {
            for elem in array.elems.iter().flatten() {
                if elem.spread.is_none() {
                    collect_literals(&elem.expr, arrays, out);
                }
            }
        }
        _ => {}
    }
}

/// Check if a TypeScript type is a reference to `type_name`.
pub fn is_type_ref(ts_type: &TsType, type_name: &str) -> bool {
    match ts_type {
        TsType::TsTypeRef(type_ref) => match &type_ref.type_name {
            TsEntityName::Ident(ident) => ident.sym.as_str() == type_name,
            TsEntityName::TsQualifiedName(qualified) => qualified.right.sym.as_str() == type_name,
        },
        _ => false,
    }
}

/// Check if an expression is `fn_name(arg_ident)`, e.g. `inject(TranslateService)`.
pub fn is_call_with_ident(expr: &Expr, fn_name: &str, arg_ident: &str) -> bool {
    if let Expr::Call(call) = unwrap_ts_expr(expr)
        && let Callee::Expr(callee) = &call.callee
        && let Expr::Ident(ident) = &**callee
        && ident.sym.as_str() == fn_name
        && let Some(arg) = call.args.first()
        && let Expr::Ident(arg) = unwrap_ts_expr(&arg.expr)
    {
        return arg.sym.as_str() == arg_ident;
    }
    false
}

fn prop_name(name: &PropName) -> Option<&str> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.as_str()),
        PropName::Str(s) => s.value.as_str(),
        _ => None,
    }
}

/// Find the value of `key` in an object literal.
pub fn object_prop<'a>(object: &'a ObjectLit, key: &str) -> Option<&'a Expr> {
    object.props.iter().find_map(|prop| match prop {
        PropOrSpread::Prop(prop) => match &**prop {
            Prop::KeyValue(kv) if prop_name(&kv.key) == Some(key) => Some(&*kv.value),
            _ => None,
        },
        PropOrSpread::Spread(_) => None,
    })
}

/// Collects inline `template` strings of `@Component` decorators.
#[derive(Default)]
struct InlineTemplateCollector {
    templates: Vec<String>,
}

impl InlineTemplateCollector {
    fn check_decorator(&mut self, decorator: &Decorator) {
        if let Expr::Call(call) = &*decorator.expr
            && let Callee::Expr(callee) = &call.callee
            && let Expr::Ident(ident) = &**callee
            && ident.sym.as_str() == "Component"
            && let Some(arg) = call.args.first()
            && let Expr::Object(object) = unwrap_ts_expr(&arg.expr)
            && let Some(template) = object_prop(object, "template").and_then(string_value)
        {
            self.templates.push(template);
        }
    }
}

impl Visit for InlineTemplateCollector {
    fn visit_class(&mut self, node: &Class) {
        for decorator in &node.decorators {
            self.check_decorator(decorator);
        }
        node.visit_children_with(self);
    }
}

/// Inline component templates of a script file.
pub fn inline_templates(content: &str, file_path: &str) -> Result<Vec<String>, ParserError> {
    // Skip the AST entirely for files that cannot declare a component.
    if !content.contains("template") {
        return Ok(Vec::new());
    }
    let module = parse_script(content, file_path)?;
    let mut collector = InlineTemplateCollector::default();
    module.visit_with(&mut collector);
    Ok(collector.templates)
}

/// Template sources for a file: inline templates for scripts, the whole content otherwise.
pub fn template_sources(content: &str, file_path: &str) -> Result<Vec<String>, ParserError> {
    if is_script_file(file_path) {
        inline_templates(content, file_path)
    } else {
        Ok(vec![content.to_string()])
    }
}
