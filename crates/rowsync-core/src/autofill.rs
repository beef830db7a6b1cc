//! Derived field values.
//!
//! Some tables fill one column from another: picking a firewall command
//! selects the result that command is expected to produce. The lookup is a
//! pure function of the edited field, its new value and the loaded
//! reference options, and only ever touches the row being edited.

use rowsync_api::reference::find_by_name;
use rowsync_api::{Fields, OptionItem, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reference options keyed by lookup name.
pub type ReferenceOptions = HashMap<String, Vec<OptionItem>>;

/// Fill `target_field` with the id of the option named by `mapping` when
/// `trigger_field` is set to a known value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutofillRule {
    pub trigger_field: String,
    pub target_field: String,
    /// Reference lookup whose options hold the target ids
    pub reference_key: String,
    /// Trigger value -> option name
    pub mapping: Vec<(String, String)>,
}

impl AutofillRule {
    pub fn new(
        trigger_field: impl Into<String>,
        target_field: impl Into<String>,
        reference_key: impl Into<String>,
    ) -> Self {
        Self {
            trigger_field: trigger_field.into(),
            target_field: target_field.into(),
            reference_key: reference_key.into(),
            mapping: Vec::new(),
        }
    }

    pub fn map(mut self, trigger_value: impl Into<String>, option_name: impl Into<String>) -> Self {
        self.mapping.push((trigger_value.into(), option_name.into()));
        self
    }

    fn option_name_for(&self, value: &str) -> Option<&str> {
        let value = value.trim();
        self.mapping
            .iter()
            .find(|(trigger, _)| trigger.eq_ignore_ascii_case(value))
            .map(|(_, name)| name.as_str())
    }
}

/// Compute the derived fields for an edit of `field` to `value`.
///
/// A mapped value whose option is loaded yields that option's id. A value
/// the rule has no mapping for (including a cleared trigger) yields `Null`
/// for the target, so a previously derived id does not outlive the trigger
/// that produced it. A mapped value whose option is not loaded yields
/// nothing.
pub fn autofill(
    rules: &[AutofillRule],
    field: &str,
    value: &Value,
    options: &ReferenceOptions,
) -> Fields {
    rules
        .iter()
        .filter(|rule| rule.trigger_field == field)
        .filter_map(|rule| {
            let Some(name) = value.as_string().and_then(|text| rule.option_name_for(text)) else {
                return Some((rule.target_field.clone(), Value::Null));
            };
            let candidates = options.get(&rule.reference_key)?;
            let option = find_by_name(candidates, name)?;
            Some((rule.target_field.clone(), option.id.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn firewall_rules() -> Vec<AutofillRule> {
        vec![AutofillRule::new("commandInput", "expectedResultId", "expected_results")
            .map("show failover", "Active/Standby Ready")
            .map("show version", "Version Reported")]
    }

    fn options() -> ReferenceOptions {
        HashMap::from([(
            "expected_results".to_string(),
            vec![
                OptionItem::new(10, "Active/Standby Ready"),
                OptionItem::new(11, "Version Reported"),
            ],
        )])
    }

    #[test]
    fn test_known_command_fills_expected_result() {
        let filled = autofill(
            &firewall_rules(),
            "commandInput",
            &Value::from("Show Failover"),
            &options(),
        );
        assert_eq!(filled.get("expectedResultId"), Some(&Value::Integer(10)));
        assert_eq!(filled.len(), 1);
    }

    #[test]
    fn test_unmapped_value_clears_target() {
        let filled = autofill(&firewall_rules(), "commandInput", &Value::from("show run"), &options());
        assert_eq!(filled.get("expectedResultId"), Some(&Value::Null));

        let cleared = autofill(&firewall_rules(), "commandInput", &Value::Null, &options());
        assert_eq!(cleared.get("expectedResultId"), Some(&Value::Null));
    }

    #[test]
    fn test_other_fields_do_not_trigger() {
        let filled = autofill(&firewall_rules(), "doneId", &Value::from("show failover"), &options());
        assert!(filled.is_empty());
    }

    #[test]
    fn test_missing_options_fill_nothing() {
        let filled = autofill(
            &firewall_rules(),
            "commandInput",
            &Value::from("show failover"),
            &ReferenceOptions::new(),
        );
        assert!(filled.is_empty());
    }
}
