//! Binding policy: which (target kind, attribute) pairs may be bound, and
//! which result values are safe to apply.
//!
//! Rule resolution order for a pair:
//!
//! 1. `aria-*` attributes are always bindable, unconstrained.
//! 2. URL attributes are not bindable when URL bindings are disabled.
//! 3. Attributes bindable on any target.
//! 4. Attributes bindable on any `AMP-` target.
//! 5. The target's own attribute table.
//!
//! Target kinds are matched case-insensitively.

pub mod rules;
pub mod url;

pub use rules::{Constraint, Rule};
pub use url::{Srcset, SrcsetError, SrcsetSource};

use rules::{AMP_RULES, ELEMENT_RULES, GLOBAL_RULES, is_url_attribute};

use crate::values::Value;

/// Stateless policy checks over the static rule tables.
#[derive(Debug, Clone)]
pub struct Validator {
    allow_url_bindings: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Validator {
    pub fn new(allow_url_bindings: bool) -> Self {
        Self { allow_url_bindings }
    }

    pub fn allows_url_bindings(&self) -> bool {
        self.allow_url_bindings
    }

    /// Whether `attribute` on `target_kind` may be bound at all.
    pub fn can_bind(&self, target_kind: &str, attribute: &str) -> bool {
        self.rule_for(target_kind, attribute).is_some()
    }

    /// Whether `value` may be applied to `attribute` on `target_kind`.
    pub fn is_result_valid(&self, target_kind: &str, attribute: &str, value: &Value) -> bool {
        // Aliases are followed once; the aliased rule is used as is.
        let rule = match self.rule_for(target_kind, attribute) {
            Some(Rule::Constrained(Constraint {
                alias_of: Some(alias),
                ..
            })) => self.rule_for(target_kind, alias),
            rule => rule,
        };

        let constraint = match rule {
            None => return false,
            Some(Rule::Any) => return true,
            Some(Rule::Constrained(constraint)) => constraint,
        };

        let text = value.to_js_string();
        if value.truthy() && is_url_attribute(attribute) {
            let allowed = constraint.allowed_protocols;
            if attribute == "srcset" {
                let srcset = match Srcset::parse(&text) {
                    Ok(srcset) => srcset,
                    Err(e) => {
                        tracing::error!(error = %e, value = %text, "failed to parse srcset");
                        return false;
                    }
                };
                if !srcset.urls().all(|u| url::is_url_allowed(u, allowed)) {
                    return false;
                }
            } else if !url::is_url_allowed(&text, allowed) {
                return false;
            }
        }

        // Falsy values clear the attribute, so neither check applies to them.
        match &constraint.denylist {
            Some(denylist) if value.truthy() => !denylist.is_match(&text),
            _ => true,
        }
    }

    fn rule_for(&self, target_kind: &str, attribute: &str) -> Option<&'static Rule> {
        static ARIA: Rule = Rule::Any;

        if attribute.starts_with("aria-") {
            return Some(&ARIA);
        }
        if is_url_attribute(attribute) && !self.allow_url_bindings {
            return None;
        }
        if let Some(rule) = GLOBAL_RULES.get(attribute) {
            return Some(rule);
        }
        let target = target_kind.to_ascii_uppercase();
        if target.starts_with("AMP-") {
            if let Some(rule) = AMP_RULES.get(attribute) {
                return Some(rule);
            }
        }
        ELEMENT_RULES
            .get(target.as_str())
            .and_then(|rules| rules.get(attribute))
    }
}
