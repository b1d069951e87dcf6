use crate::models::Record;

/// Records whose body contains `query`, ignoring case. An empty query matches nothing.
pub fn search_content<'a>(records: impl IntoIterator<Item = &'a Record>, query: &str) -> Vec<&'a Record> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    records
        .into_iter()
        .filter(|record| record.body.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn record(id: &str, body: &str) -> Record {
        Record {
            id: id.into(),
            rev: None,
            parent_ref: None,
            channel_id: None,
            topic: None,
            author: "alice".into(),
            display_name: "Alice".into(),
            avatar_ref: None,
            body: body.into(),
            attachment_ref: None,
            skill_level: None,
            created_at: Utc::now(),
            votes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_case_insensitive_substring() {
        let records = vec![
            record("1", "Borrow checker woes"),
            record("2", "async runtimes compared"),
            record("3", "The BORROW rules"),
        ];

        let hits: Vec<&str> = search_content(&records, "borrow")
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(hits, vec!["1", "3"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let records = vec![record("1", "hello")];
        assert!(search_content(&records, "goodbye").is_empty());
        assert!(search_content(&records, "").is_empty());
    }
}
