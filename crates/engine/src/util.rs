//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every write path enforces the same invariants before a DB
//! transaction is opened.

use std::collections::HashSet;

use crate::{CategoryAllocation, EngineError, MoneyCents, ResultEngine};

pub(crate) const DESCRIPTION_MAX_CHARS: usize = 200;

/// Reject negative amounts. `label` names the field in the error.
pub(crate) fn ensure_non_negative(amount: MoneyCents, label: &str) -> ResultEngine<()> {
    if amount.is_negative() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must be >= 0, got {amount}"
        )));
    }
    Ok(())
}

/// Trim a description and check it is non-empty and bounded.
pub(crate) fn normalize_description(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(
            "description must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(EngineError::InvalidInput(format!(
            "description must be at most {DESCRIPTION_MAX_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Trim tags, drop empty ones and keep the first occurrence of duplicates.
pub(crate) fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter_map(|tag| normalize_optional_text(Some(tag.as_ref())))
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Each allocated category appears once and no amount is negative.
pub(crate) fn validate_allocations(allocations: &[CategoryAllocation]) -> ResultEngine<()> {
    let mut seen = HashSet::new();
    for allocation in allocations {
        ensure_non_negative(
            allocation.amount,
            &format!("allocation for {}", allocation.category),
        )?;
        if !seen.insert(allocation.category) {
            return Err(EngineError::InvalidCategory(format!(
                "category {} allocated more than once",
                allocation.category
            )));
        }
    }
    Ok(())
}

pub(crate) fn tags_to_json(tags: &[String]) -> String {
    serde_json::Value::from(tags.to_vec()).to_string()
}

pub(crate) fn tags_from_json(raw: &str) -> ResultEngine<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|err| EngineError::InvalidInput(format!("invalid stored tags: {err}")))
}
