//! Kubernetes label selector parsing
//!
//! Converts the textual selector grammar (`app=web,tier in (a,b),!canary`)
//! into the structured form used by metric targets.

use crate::error::{GenerationError, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const LABEL_KEY: &str = r"[A-Za-z0-9](?:[-A-Za-z0-9_./]*[A-Za-z0-9])?";
const LABEL_VALUE: &str = r"(?:[A-Za-z0-9](?:[-A-Za-z0-9_.]*[A-Za-z0-9])?)?";

fn set_requirement() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^({LABEL_KEY})\s+(in|notin)\s*\((.*)\)$"))
            .expect("set requirement pattern is valid")
    })
}

fn equality_requirement() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^({LABEL_KEY})\s*(==|=|!=)\s*({LABEL_VALUE})$"))
            .expect("equality requirement pattern is valid")
    })
}

fn existence_requirement() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^(!?)\s*({LABEL_KEY})$"))
            .expect("existence requirement pattern is valid")
    })
}

fn label_value() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^{LABEL_VALUE}$")).expect("label value pattern is valid")
    })
}

/// Parse a textual label selector
///
/// An empty selector yields an empty structured selector (matching everything).
pub fn parse_label_selector(selector: &str) -> Result<LabelSelector> {
    let mut match_labels = BTreeMap::new();
    let mut match_expressions = Vec::new();

    for requirement in split_requirements(selector)? {
        let invalid = |reason: &str| GenerationError::InvalidLabelSelector {
            selector: selector.to_string(),
            reason: format!("{reason}: {requirement:?}"),
        };

        if let Some(caps) = set_requirement().captures(requirement) {
            let values = caps[3]
                .split(',')
                .map(str::trim)
                .map(|v| {
                    if label_value().is_match(v) {
                        Ok(v.to_string())
                    } else {
                        Err(invalid("invalid value"))
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            if values.iter().all(String::is_empty) {
                return Err(invalid("set requirement needs at least one value"));
            }
            let operator = if &caps[2] == "in" { "In" } else { "NotIn" };
            match_expressions.push(LabelSelectorRequirement {
                key: caps[1].to_string(),
                operator: operator.to_string(),
                values: Some(values),
            });
        } else if let Some(caps) = equality_requirement().captures(requirement) {
            if &caps[2] == "!=" {
                match_expressions.push(LabelSelectorRequirement {
                    key: caps[1].to_string(),
                    operator: "NotIn".to_string(),
                    values: Some(vec![caps[3].to_string()]),
                });
            } else {
                match_labels.insert(caps[1].to_string(), caps[3].to_string());
            }
        } else if let Some(caps) = existence_requirement().captures(requirement) {
            let operator = if caps[1].is_empty() { "Exists" } else { "DoesNotExist" };
            match_expressions.push(LabelSelectorRequirement {
                key: caps[2].to_string(),
                operator: operator.to_string(),
                values: None,
            });
        } else {
            return Err(invalid("unrecognized requirement"));
        }
    }

    Ok(LabelSelector {
        match_labels: (!match_labels.is_empty()).then_some(match_labels),
        match_expressions: (!match_expressions.is_empty()).then_some(match_expressions),
    })
}

/// Split on commas that are not inside a parenthesized value set
fn split_requirements(selector: &str) -> Result<Vec<&str>> {
    let mut requirements = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in selector.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| unbalanced(selector))?;
            }
            ',' if depth == 0 => {
                requirements.push(selector[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(unbalanced(selector));
    }
    requirements.push(selector[start..].trim());

    if requirements.len() == 1 && requirements[0].is_empty() {
        return Ok(Vec::new());
    }
    if requirements.iter().any(|r| r.is_empty()) {
        return Err(GenerationError::InvalidLabelSelector {
            selector: selector.to_string(),
            reason: "empty requirement".to_string(),
        });
    }
    Ok(requirements)
}

fn unbalanced(selector: &str) -> GenerationError {
    GenerationError::InvalidLabelSelector {
        selector: selector.to_string(),
        reason: "unbalanced parentheses".to_string(),
    }
}
