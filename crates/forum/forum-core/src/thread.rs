//! Reply threading.
//!
//! Replies are stored flat, each pointing at its parent. The builder indexes them by
//! parent once, then walks the tree from the post in pre-order with an explicit stack.
//! A visited set guards against malformed parent chains that loop back on themselves.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{Record, RecordView};

/// A reply and its distance from the root post (direct replies have depth 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreadEntry<'a> {
    pub reply: &'a Record,
    pub depth: usize,
}

/// Replies grouped by the record they answer, siblings oldest first
fn child_index(replies: &[Record]) -> HashMap<&str, Vec<&Record>> {
    let mut children: HashMap<&str, Vec<&Record>> = HashMap::new();

    for reply in replies {
        if let Some(parent) = reply.parent_ref.as_deref() {
            children.entry(parent).or_default().push(reply);
        }
    }

    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    }

    children
}

/// Walk the replies under `root_id` in pre-order.
///
/// Replies whose parent chain never reaches `root_id` are not visited. Each reply is
/// emitted at most once even if the parent references form a cycle.
pub fn build_tree<'a>(root_id: &str, replies: &'a [Record]) -> Vec<ThreadEntry<'a>> {
    let children = child_index(replies);

    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(root_id);

    let mut entries = Vec::new();
    let mut stack: Vec<ThreadEntry<'a>> = Vec::new();

    let push_children = |stack: &mut Vec<ThreadEntry<'a>>, parent: &str, depth: usize| {
        if let Some(siblings) = children.get(parent) {
            // Reversed so the oldest sibling is popped first
            for reply in siblings.iter().rev() {
                stack.push(ThreadEntry { reply: *reply, depth });
            }
        }
    };

    push_children(&mut stack, root_id, 1);

    while let Some(entry) = stack.pop() {
        if !visited.insert(entry.reply.id.as_str()) {
            continue;
        }

        entries.push(entry);
        push_children(&mut stack, &entry.reply.id, entry.depth + 1);
    }

    entries
}

/// A reply as served to clients, tagged with its depth under the post
#[derive(Debug, Clone, Serialize)]
pub struct ThreadReply {
    #[serde(flatten)]
    pub reply: RecordView,
    pub depth: usize,
}

impl From<ThreadEntry<'_>> for ThreadReply {
    fn from(entry: ThreadEntry<'_>) -> Self {
        Self {
            reply: RecordView::from(entry.reply.clone()),
            depth: entry.depth,
        }
    }
}

/// A post together with its replies in thread order
#[derive(Debug, Clone, Serialize)]
pub struct ThreadView {
    pub post: RecordView,
    pub replies: Vec<ThreadReply>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn reply(id: &str, parent: &str, minute: i64) -> Record {
        Record {
            id: id.into(),
            rev: None,
            parent_ref: Some(parent.into()),
            channel_id: None,
            topic: None,
            author: "alice".into(),
            display_name: "Alice".into(),
            avatar_ref: None,
            body: format!("reply {id}"),
            attachment_ref: None,
            skill_level: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minute),
            votes: BTreeMap::new(),
        }
    }

    fn ids_and_depths(entries: &[ThreadEntry<'_>]) -> Vec<(String, usize)> {
        entries
            .iter()
            .map(|e| (e.reply.id.clone(), e.depth))
            .collect()
    }

    #[test]
    fn test_pre_order_with_depths() {
        let replies = vec![
            reply("r1", "post", 1),
            reply("r2", "r1", 2),
            reply("r3", "post", 3),
        ];

        let tree = build_tree("post", &replies);
        assert_eq!(
            ids_and_depths(&tree),
            vec![("r1".into(), 1), ("r2".into(), 2), ("r3".into(), 1)]
        );
    }

    #[test]
    fn test_siblings_ordered_by_time_then_id() {
        // Input order is deliberately scrambled
        let replies = vec![
            reply("c", "post", 5),
            reply("b", "post", 1),
            reply("a", "post", 1),
        ];

        let tree = build_tree("post", &replies);
        let order: Vec<&str> = tree.iter().map(|e| e.reply.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unreachable_cycle_is_ignored() {
        let replies = vec![
            reply("r1", "post", 1),
            reply("a", "b", 2),
            reply("b", "a", 3),
        ];

        let tree = build_tree("post", &replies);
        assert_eq!(ids_and_depths(&tree), vec![("r1".into(), 1)]);
    }

    #[test]
    fn test_cycle_back_to_root_terminates() {
        // r2 claims the post's id as a child id, so the chain loops back
        let replies = vec![
            reply("r1", "post", 1),
            reply("r2", "r1", 2),
            reply("post", "r2", 3),
            reply("r1", "r2", 4),
        ];

        let tree = build_tree("post", &replies);
        assert_eq!(
            ids_and_depths(&tree),
            vec![("r1".into(), 1), ("r2".into(), 2)]
        );
    }

    #[test]
    fn test_orphans_and_other_threads_are_skipped() {
        let replies = vec![
            reply("r1", "post", 1),
            reply("x1", "other-post", 2),
            reply("orphan", "deleted", 3),
        ];

        let tree = build_tree("post", &replies);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut replies = vec![reply("n0", "post", 0)];
        for i in 1..20_000 {
            replies.push(reply(&format!("n{i}"), &format!("n{}", i - 1), i));
        }

        let tree = build_tree("post", &replies);
        assert_eq!(tree.len(), 20_000);
        assert_eq!(tree.last().unwrap().depth, 20_000);
    }

    #[test]
    fn test_deep_thread_serializes() {
        let mut replies = vec![reply("n0", "post", 0)];
        for i in 1..12_000 {
            replies.push(reply(&format!("n{i}"), &format!("n{}", i - 1), i));
        }

        let view: Vec<ThreadReply> = build_tree("post", &replies)
            .into_iter()
            .map(ThreadReply::from)
            .collect();
        assert_eq!(view.len(), 12_000);

        let json = serde_json::to_value(&view).unwrap();
        let items = json.as_array().unwrap();
        assert_eq!(items[0]["_id"], "n0");
        assert_eq!(items[0]["depth"], 1);
        assert_eq!(items[11_999]["_id"], "n11999");
        assert_eq!(items[11_999]["depth"], 12_000);
        assert_eq!(items[11_999]["parentId"], "n11998");
    }
}
