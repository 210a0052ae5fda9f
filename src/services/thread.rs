//! Reply threading.
//!
//! Comments reference their parent by id only. Threads are rebuilt by grouping
//! reply rows under their parent id, and only one level of replies is ever
//! materialized in a response.

use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{ChildComment, CommentDetail, CommentRow};

/// Upper bound on ancestor walks. Deeper chains are treated as cycles.
pub const MAX_THREAD_DEPTH: usize = 64;

/// Attach replies to their parents. `children` must already be oldest-first;
/// replies whose parent is not in `parents` are dropped.
pub fn assemble(parents: Vec<CommentRow>, children: Vec<CommentRow>) -> Vec<CommentDetail> {
    let mut by_parent: HashMap<Uuid, Vec<ChildComment>> = HashMap::new();
    for child in children {
        if let Some(parent_id) = child.comment.parent_comment_id {
            by_parent.entry(parent_id).or_default().push(child.into_child());
        }
    }

    parents
        .into_iter()
        .map(|row| {
            let replies = by_parent.remove(&row.comment.id).unwrap_or_default();
            row.into_detail(replies)
        })
        .collect()
}

pub fn ids(rows: &[CommentRow]) -> Vec<Uuid> {
    rows.iter().map(|r| r.comment.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Comment;
    use chrono::{Duration, Utc};

    fn row(id: Uuid, parent: Option<Uuid>, minutes: i64) -> CommentRow {
        let at = Utc::now() + Duration::minutes(minutes);
        CommentRow {
            comment: Comment {
                id,
                title: format!("comment {}", minutes),
                content: "body".to_string(),
                author_id: None,
                project_id: None,
                parent_comment_id: parent,
                created_at: at,
                updated_at: at,
            },
            author_name: None,
            author_email: None,
            author_image: None,
            project_name: None,
            parent_title: None,
            parent_author_id: None,
            parent_author_name: None,
            parent_author_email: None,
            child_count: 0,
        }
    }

    #[test]
    fn replies_land_under_their_parent_in_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let a1 = Uuid::new_v4();
        let a2 = Uuid::new_v4();
        let b1 = Uuid::new_v4();

        let threads = assemble(
            vec![row(b, None, 2), row(a, None, 1)],
            vec![row(a1, Some(a), 3), row(b1, Some(b), 4), row(a2, Some(a), 5)],
        );

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, b);
        assert_eq!(threads[1].comment.id, a);

        let under_a: Vec<Uuid> = threads[1].child_comments.iter().map(|c| c.comment.id).collect();
        assert_eq!(under_a, vec![a1, a2]);
        assert_eq!(threads[0].child_comments.len(), 1);
        assert_eq!(threads[0].child_comments[0].comment.id, b1);
    }

    #[test]
    fn orphan_replies_are_dropped() {
        let a = Uuid::new_v4();
        let threads = assemble(
            vec![row(a, None, 1)],
            vec![row(Uuid::new_v4(), Some(Uuid::new_v4()), 2)],
        );
        assert!(threads[0].child_comments.is_empty());
    }
}
