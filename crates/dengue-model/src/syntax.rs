//! Backend spellings of a [`Formula`].

use crate::config::PrecisionPrior;
use crate::formula::{Formula, SmoothTerm, Term};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Renders a formula in the input language of an inference backend.
pub trait FormulaSyntax {
    /// Render a single term.
    fn render_term(&self, term: &Term, prior: &PrecisionPrior) -> String;

    /// Render the whole formula.
    fn render(&self, formula: &Formula) -> String;
}

/// R-INLA formula syntax.
///
/// The precision prior is written inline into every smoothing term, so the
/// rendered formula does not depend on any variable defined elsewhere in the
/// R session.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlaSyntax;

impl InlaSyntax {
    /// Create a new serializer.
    pub const fn new() -> Self {
        Self
    }

    /// `list(prec = list(prior = ..., param = c(...)))`
    pub fn render_prior(&self, prior: &PrecisionPrior) -> String {
        let params = prior
            .parameters
            .iter()
            .map(|p| format_number(*p))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "list(prec = list(prior = {}, param = c({params})))",
            quote(&prior.prior_family)
        )
    }

    fn render_smooth(&self, term: &SmoothTerm, prior: &PrecisionPrior) -> String {
        let covariate = r_name(&term.covariate);
        let index = match term.bins {
            Some(n) => format!("inla.group({covariate}, n = {n})"),
            None => covariate,
        };
        let mut args = vec![index, format!("model = {}", quote(term.model.name()))];
        if term.scale_model {
            args.push("scale.model = TRUE".to_string());
        }
        if term.cyclic {
            args.push("cyclic = TRUE".to_string());
        }
        args.push(format!("hyper = {}", self.render_prior(prior)));
        format!("f({})", args.join(", "))
    }

    /// Render `control.*` option groups as `control.<name> = list(...)` arguments.
    pub fn render_control(&self, control: &BTreeMap<String, Value>) -> Vec<String> {
        control
            .iter()
            .map(|(name, value)| format!("control.{name} = {}", r_literal(value)))
            .collect()
    }
}

impl FormulaSyntax for InlaSyntax {
    fn render_term(&self, term: &Term, prior: &PrecisionPrior) -> String {
        match term {
            Term::Smooth(smooth) => self.render_smooth(smooth, prior),
            Term::Intercept => "1".to_string(),
            Term::Offset(expr) => format!("offset({expr})"),
        }
    }

    fn render(&self, formula: &Formula) -> String {
        let rhs = formula
            .terms()
            .iter()
            .map(|t| self.render_term(t, formula.prior()))
            .collect::<Vec<_>>()
            .join(" + ");
        format!("{} ~ {rhs}", r_name(formula.response()))
    }
}

/// Render a YAML value as an R literal.
pub fn r_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), format_number),
        Value::String(s) => quote(s),
        Value::Sequence(items) => {
            let scalar = items
                .iter()
                .all(|v| !matches!(v, Value::Sequence(_) | Value::Mapping(_)));
            let inner = items.iter().map(r_literal).collect::<Vec<_>>().join(", ");
            if scalar {
                format!("c({inner})")
            } else {
                format!("list({inner})")
            }
        }
        Value::Mapping(map) => {
            let inner = map
                .iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::String(s) => r_name(s),
                        other => r_name(&r_literal(other)),
                    };
                    format!("{key} = {}", r_literal(v))
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("list({inner})")
        }
        Value::Tagged(tagged) => r_literal(&tagged.value),
    }
}

/// Quote a string as an R character literal.
pub fn quote(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Backtick-quote names R would not parse as a symbol.
pub fn r_name(name: &str) -> String {
    let mut chars = name.chars();
    let syntactic = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '.' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
        }
        _ => false,
    };
    if syntactic {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "\\`"))
    }
}

fn format_number(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}
