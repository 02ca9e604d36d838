//! `TranslateService` method calls in scripts:
//!
//! ```ts
//! constructor(private translate: TranslateService) {}
//! private readonly i18n = inject(TranslateService);
//!
//! this.translate.get('KEY');
//! this.i18n.instant(['A', 'B']);
//! ```
//!
//! A binding counts as a service when it is typed `TranslateService` or
//! initialized with `inject(TranslateService)`. Only such bindings are followed,
//! so unrelated `get()` calls are never reported.

use std::collections::HashSet;

use swc_ecma_ast::{
    CallExpr, Callee, ClassProp, Expr, MemberProp, Param, Pat, PrivateProp, PropName, TsParamProp,
    TsParamPropParam, TsTypeAnn, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use super::{
    Extract, ParserName, collect_keys,
    script::{
        collect_literals, is_call_with_ident, is_script_file, is_type_ref, parse_script,
        unwrap_ts_expr,
    },
};
use crate::core::{TranslationCollection, error::ParserError};

const SERVICE_TYPE: &str = "TranslateService";
const METHODS: &[&str] = &["get", "instant", "stream"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceParser;

impl Extract for ServiceParser {
    fn name(&self) -> &str {
        ParserName::Service.as_str()
    }

    fn extract(
        &self,
        content: &str,
        file_path: &str,
    ) -> Result<TranslationCollection, ParserError> {
        if !is_script_file(file_path) || !content.contains(SERVICE_TYPE) {
            return Ok(TranslationCollection::new());
        }
        let module = parse_script(content, file_path)?;

        let mut bindings = ServiceBindings::default();
        module.visit_with(&mut bindings);
        if bindings.names.is_empty() {
            return Ok(TranslationCollection::new());
        }

        let mut calls = ServiceCalls {
            names: &bindings.names,
            keys: Vec::new(),
        };
        module.visit_with(&mut calls);
        Ok(collect_keys(calls.keys, file_path))
    }
}

fn is_service_type(type_ann: Option<&TsTypeAnn>) -> bool {
    type_ann.is_some_and(|ann| is_type_ref(&ann.type_ann, SERVICE_TYPE))
}

fn is_injected(init: Option<&Expr>) -> bool {
    init.is_some_and(|expr| is_call_with_ident(expr, "inject", SERVICE_TYPE))
}

/// Names of every binding that holds a `TranslateService`.
#[derive(Default)]
struct ServiceBindings {
    names: HashSet<String>,
}

impl Visit for ServiceBindings {
    fn visit_class_prop(&mut self, node: &ClassProp) {
        if (is_service_type(node.type_ann.as_deref()) || is_injected(node.value.as_deref()))
            && let PropName::Ident(ident) = &node.key
        {
            self.names.insert(ident.sym.to_string());
        }
        node.visit_children_with(self);
    }

    fn visit_private_prop(&mut self, node: &PrivateProp) {
        if is_service_type(node.type_ann.as_deref()) || is_injected(node.value.as_deref()) {
            self.names.insert(format!("#{}", node.key.name));
        }
        node.visit_children_with(self);
    }

    fn visit_ts_param_prop(&mut self, node: &TsParamProp) {
        if let TsParamPropParam::Ident(ident) = &node.param
            && is_service_type(ident.type_ann.as_deref())
        {
            self.names.insert(ident.id.sym.to_string());
        }
        node.visit_children_with(self);
    }

    fn visit_param(&mut self, node: &Param) {
        if let Pat::Ident(ident) = &node.pat
            && is_service_type(ident.type_ann.as_deref())
        {
            self.names.insert(ident.id.sym.to_string());
        }
        node.visit_children_with(self);
    }

    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if let Pat::Ident(ident) = &node.name
            && (is_service_type(ident.type_ann.as_deref()) || is_injected(node.init.as_deref()))
        {
            self.names.insert(ident.id.sym.to_string());
        }
        node.visit_children_with(self);
    }
}

/// Keys passed to `get` / `instant` / `stream` on a known service binding.
struct ServiceCalls<'a> {
    names: &'a HashSet<String>,
    keys: Vec<String>,
}

impl ServiceCalls<'_> {
    /// Name of the service binding a method is called on: `this.name`, `this.#name` or `name`.
    fn receiver_name(expr: &Expr) -> Option<String> {
        match unwrap_ts_expr(expr) {
            Expr::Member(member) if matches!(&*member.obj, Expr::This(_)) => match &member.prop {
                MemberProp::Ident(ident) => Some(ident.sym.to_string()),
                MemberProp::PrivateName(private) => Some(format!("#{}", private.name)),
                MemberProp::Computed(_) => None,
            },
            Expr::Ident(ident) => Some(ident.sym.to_string()),
            _ => None,
        }
    }
}

impl Visit for ServiceCalls<'_> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee
            && let Expr::Member(member) = &**callee
            && let MemberProp::Ident(method) = &member.prop
            && METHODS.contains(&method.sym.as_str())
            && let Some(receiver) = Self::receiver_name(&member.obj)
            && self.names.contains(&receiver)
            && let Some(arg) = node.args.first()
        {
            collect_literals(&arg.expr, true, &mut self.keys);
        }
        node.visit_children_with(self);
    }
}
