use serde_json::Value;

use crate::common::types::{NormalizedLogEntry, RawAuditRecord};

/// Project one audit record onto the five forwarded fields.
/// Absent fields become `null`; values are copied unchanged.
pub fn map_record(record: &RawAuditRecord) -> NormalizedLogEntry {
    let field = |v: &Option<Value>| v.clone().unwrap_or(Value::Null);
    NormalizedLogEntry {
        log_entry_id: field(&record.id),
        summary: field(&record.summary),
        created: field(&record.created),
        author: field(&record.author_key),
        remote_ip: field(&record.remote_address),
    }
}

/// Map every record, one entry per record, in source order
pub fn map_records(records: &[RawAuditRecord]) -> Vec<NormalizedLogEntry> {
    records.iter().map(map_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawAuditRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_map_full_record() {
        let record = raw(json!({
            "id": 4711,
            "summary": "User created",
            "created": "2025-04-15T09:56:12.000+0000",
            "authorKey": "5b10a2844c20165700ede21g",
            "remoteAddress": "10.0.0.1",
            "category": "user management",
            "eventSource": ""
        }));

        let entry = map_record(&record);
        assert_eq!(entry.log_entry_id, json!(4711));
        assert_eq!(entry.summary, json!("User created"));
        assert_eq!(entry.created, json!("2025-04-15T09:56:12.000+0000"));
        assert_eq!(entry.author, json!("5b10a2844c20165700ede21g"));
        assert_eq!(entry.remote_ip, json!("10.0.0.1"));
    }

    #[test]
    fn test_missing_fields_become_null() {
        let entry = map_record(&raw(json!({ "id": 1 })));
        assert_eq!(entry.log_entry_id, json!(1));
        assert_eq!(entry.summary, Value::Null);
        assert_eq!(entry.created, Value::Null);
        assert_eq!(entry.author, Value::Null);
        assert_eq!(entry.remote_ip, Value::Null);
    }

    #[test]
    fn test_order_and_count_preserved() {
        // Duplicates are forwarded as-is
        let records: Vec<RawAuditRecord> = [3, 1, 2, 2]
            .iter()
            .map(|id| raw(json!({ "id": id, "summary": format!("event {id}") })))
            .collect();

        let entries = map_records(&records);
        let ids: Vec<Value> = entries.iter().map(|e| e.log_entry_id.clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(1), json!(2), json!(2)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(map_records(&[]).is_empty());
    }
}
