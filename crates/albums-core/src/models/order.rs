use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::constants::INVALID_ORDER_REASON;

/// One `{id, order}` pair of a reorder request.
///
/// Clients send both fields either as JSON numbers or as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    #[serde(deserialize_with = "int_or_string")]
    pub order: i32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

fn int_or_string<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(n) => n,
        IntOrString::Str(s) => s.trim().parse::<i64>().map_err(serde::de::Error::custom)?,
    };
    i32::try_from(value).map_err(serde::de::Error::custom)
}

/// Parse the textual `items` payload of a reorder request.
pub fn parse_order_items(raw: &str) -> Result<Vec<OrderItem>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Body of a reorder request; `items` holds the JSON list as text.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderRequest {
    pub items: String,
}

/// Structured result of a reorder request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReorderResult {
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReorderResult {
    pub fn done() -> Self {
        Self {
            done: true,
            reason: None,
        }
    }

    pub fn invalid() -> Self {
        Self {
            done: false,
            reason: Some(INVALID_ORDER_REASON.to_string()),
        }
    }
}

impl From<ReorderOutcome> for ReorderResult {
    fn from(outcome: ReorderOutcome) -> Self {
        match outcome {
            ReorderOutcome::Applied => ReorderResult::done(),
            _ => ReorderResult::invalid(),
        }
    }
}

/// What happened to a reorder batch. Nothing is written unless `Applied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    Applied,
    /// The id is not one of the owner's attachments
    UnknownAttachment(Uuid),
    /// Applying the batch would give two attachments this ordering value
    DuplicateOrder(i32),
}

/// Compute the ordering changes of a reorder batch.
///
/// `current` lists every attachment of the owner with its ordering value.
/// Returns only the rows whose value changes. Later items win when an id
/// is repeated.
pub fn plan_reorder(
    current: &[(Uuid, i32)],
    items: &[OrderItem],
) -> Result<Vec<(Uuid, i32)>, ReorderOutcome> {
    let mut resulting: HashMap<Uuid, i32> = current.iter().copied().collect();

    for item in items {
        match resulting.get_mut(&item.id) {
            Some(order) => *order = item.order,
            None => return Err(ReorderOutcome::UnknownAttachment(item.id)),
        }
    }

    let mut seen = HashSet::with_capacity(resulting.len());
    for order in resulting.values() {
        if !seen.insert(*order) {
            return Err(ReorderOutcome::DuplicateOrder(*order));
        }
    }

    let mut changes: Vec<(Uuid, i32)> = current
        .iter()
        .filter_map(|(id, before)| {
            let after = resulting[id];
            (after != *before).then_some((*id, after))
        })
        .collect();
    changes.sort_by_key(|(_, order)| *order);

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_accept_strings_and_numbers() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let raw = format!(r#"[{{"id": "{a}", "order": "2"}}, {{"id": "{b}", "order": 1}}]"#);

        let items = parse_order_items(&raw).unwrap();
        assert_eq!(items, vec![OrderItem { id: a, order: 2 }, OrderItem { id: b, order: 1 }]);
    }

    #[test]
    fn test_malformed_items_rejected() {
        assert!(parse_order_items("not json").is_err());
        assert!(parse_order_items(r#"[{"id": "nope", "order": 1}]"#).is_err());
        let id = Uuid::new_v4();
        assert!(parse_order_items(&format!(r#"[{{"id": "{id}", "order": "x"}}]"#)).is_err());
    }

    #[test]
    fn test_swap_plans_both_rows() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let changes = plan_reorder(
            &[(a, 1), (b, 2)],
            &[OrderItem { id: a, order: 2 }, OrderItem { id: b, order: 1 }],
        )
        .unwrap();

        assert_eq!(changes, vec![(b, 1), (a, 2)]);
    }

    #[test]
    fn test_foreign_id_rejects_whole_batch() {
        let a = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let result = plan_reorder(
            &[(a, 1)],
            &[OrderItem { id: a, order: 5 }, OrderItem { id: stranger, order: 1 }],
        );

        assert_eq!(result, Err(ReorderOutcome::UnknownAttachment(stranger)));
    }

    #[test]
    fn test_collision_with_untouched_row_rejected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let result = plan_reorder(&[(a, 1), (b, 2)], &[OrderItem { id: a, order: 2 }]);

        assert_eq!(result, Err(ReorderOutcome::DuplicateOrder(2)));
    }

    #[test]
    fn test_reorder_result_wire_format() {
        let ok = serde_json::to_value(ReorderResult::done()).unwrap();
        assert_eq!(ok, serde_json::json!({"done": true}));

        let failed = serde_json::to_value(ReorderResult::from(ReorderOutcome::DuplicateOrder(3)))
            .unwrap();
        assert_eq!(failed, serde_json::json!({"done": false, "reason": "Invalid data."}));
    }
}
