//! Topic comments.
//!
//! Each topic keeps at most `max_per_topic` comments, oldest dropped first.
//! New topics are refused once `max_topics` exist.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use crate::guard::{BoundedCount, Principal, ValidContent};
use crate::services::{unix_now, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: u64,
    pub topic_id: u64,
    pub author_id: u64,
    pub author: String,
    pub content: String,
    pub created_at: u64,
}

/// One page of a topic, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentPage {
    pub topic_id: u64,
    pub page: u64,
    pub per_page: u64,
    pub total: usize,
    pub comments: Vec<Comment>,
}

/// In-memory comment store keyed by topic id.
#[derive(Debug)]
pub struct CommentStore {
    by_topic: DashMap<u64, VecDeque<Comment>>,
    topic_count: AtomicUsize,
    next_id: AtomicU64,
    max_per_topic: usize,
    max_topics: usize,
}

impl CommentStore {
    pub fn new(max_per_topic: usize, max_topics: usize) -> Self {
        Self {
            by_topic: DashMap::new(),
            topic_count: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            max_per_topic,
            max_topics,
        }
    }

    pub fn put(
        &self,
        topic: BoundedCount,
        author: &Principal,
        content: ValidContent,
    ) -> Result<Comment, StoreError> {
        let mut comments = match self.by_topic.entry(topic.get()) {
            Entry::Occupied(entry) => entry.into_ref(),
            Entry::Vacant(entry) => {
                self.topic_count
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                        (n < self.max_topics).then_some(n + 1)
                    })
                    .map_err(|_| StoreError::CapacityExceeded(self.max_topics))?;
                entry.insert(VecDeque::new())
            }
        };

        let comment = Comment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            topic_id: topic.get(),
            author_id: author.user_id,
            author: author.username.clone(),
            content: content.into_string(),
            created_at: unix_now(),
        };
        comments.push_back(comment.clone());
        while comments.len() > self.max_per_topic {
            comments.pop_front();
        }
        Ok(comment)
    }

    /// Page `page` (1-based) of a topic with `per_page` comments.
    pub fn list(
        &self,
        topic: BoundedCount,
        page: BoundedCount,
        per_page: BoundedCount,
    ) -> Result<CommentPage, StoreError> {
        let (total, comments) = match self.by_topic.get(&topic.get()) {
            Some(all) => {
                let skip = (page.get() - 1).saturating_mul(per_page.get());
                let skip = usize::try_from(skip).unwrap_or(usize::MAX);
                let take = usize::try_from(per_page.get()).unwrap_or(usize::MAX);
                (all.len(), all.iter().skip(skip).take(take).cloned().collect())
            }
            None => (0, Vec::new()),
        };
        Ok(CommentPage {
            topic_id: topic.get(),
            page: page.get(),
            per_page: per_page.get(),
            total,
            comments,
        })
    }

    pub fn topic_count(&self) -> usize {
        self.topic_count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::content::{self, CharClass, ContentPolicy};
    use crate::guard::{bound, Role};
    use std::num::NonZeroU64;

    fn n(value: i64) -> BoundedCount {
        bound::check_int(value, NonZeroU64::new(100).unwrap()).unwrap()
    }

    fn text(raw: &str) -> ValidContent {
        content::check(raw, &ContentPolicy::new(1, 200, CharClass::PlainText)).unwrap()
    }

    fn author() -> Principal {
        Principal {
            user_id: 4,
            username: "erin".to_string(),
            role: Role::User,
        }
    }

    fn contents(page: &CommentPage) -> Vec<&str> {
        page.comments.iter().map(|c| c.content.as_str()).collect()
    }

    #[test]
    fn test_put_then_list_in_order() {
        let store = CommentStore::new(100, 100);
        store.put(n(1), &author(), text("first")).unwrap();
        store.put(n(1), &author(), text("second")).unwrap();
        store.put(n(2), &author(), text("elsewhere")).unwrap();

        let listed = store.list(n(1), n(1), n(50)).unwrap();
        assert_eq!(contents(&listed), vec!["first", "second"]);
        assert_eq!(listed.total, 2);
        assert_eq!(listed.comments[0].author, "erin");
        assert_eq!(listed.comments[0].id, 1);
    }

    #[test]
    fn test_unknown_topic_is_empty() {
        let page = CommentStore::new(10, 10).list(n(9), n(1), n(10)).unwrap();
        assert!(page.comments.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_pages_split_topic() {
        let store = CommentStore::new(100, 100);
        for body in ["a", "b", "c", "d", "e"] {
            store.put(n(1), &author(), text(body)).unwrap();
        }
        assert_eq!(contents(&store.list(n(1), n(1), n(2)).unwrap()), vec!["a", "b"]);
        assert_eq!(contents(&store.list(n(1), n(3), n(2)).unwrap()), vec!["e"]);
        assert!(store.list(n(1), n(4), n(2)).unwrap().comments.is_empty());
    }

    #[test]
    fn test_topic_keeps_newest_comments() {
        let store = CommentStore::new(3, 100);
        for body in ["a", "b", "c", "d", "e"] {
            store.put(n(1), &author(), text(body)).unwrap();
        }
        let page = store.list(n(1), n(1), n(10)).unwrap();
        assert_eq!(contents(&page), vec!["c", "d", "e"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_new_topics_refused_at_capacity() {
        let store = CommentStore::new(10, 2);
        store.put(n(1), &author(), text("a")).unwrap();
        store.put(n(2), &author(), text("b")).unwrap();
        assert_eq!(
            store.put(n(3), &author(), text("c")).unwrap_err(),
            StoreError::CapacityExceeded(2)
        );
        // Existing topics still accept comments.
        store.put(n(1), &author(), text("more")).unwrap();
        assert_eq!(store.topic_count(), 2);
    }
}
