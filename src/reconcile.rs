//! Merging locally-appended placeholders with server-confirmed records.
//!
//! Append-only lists (chat messages, notification feeds) insert a local
//! placeholder immediately, then learn the authoritative record either from
//! the owning request's response or from an out-of-band push event, in either
//! order. [`ReconcilingList`] guarantees that once reconciliation for a
//! placeholder has run, at most one item exists per confirmed id and no
//! placeholder tag survives, regardless of arrival order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::StudiaError, properties::EntryId};

/// Records held in a [`ReconcilingList`] expose their (possibly still local)
/// identity through this trait.
pub trait Identified {
    fn entry_id(&self) -> EntryId;
}

impl Identified for crate::properties::ChatMessage {
    fn entry_id(&self) -> EntryId {
        self.id
    }
}

/// An ordered, append-only list keyed by [`EntryId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilingList<T> {
    items: Vec<T>,
}

impl<T> Default for ReconcilingList<T> {
    fn default() -> Self {
        ReconcilingList { items: Vec::new() }
    }
}

impl<T: Identified> ReconcilingList<T> {
    pub fn new() -> Self {
        ReconcilingList::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_placeholders(&self) -> bool {
        self.items.iter().any(|item| item.entry_id().is_local())
    }

    /// Append a record without placeholder bookkeeping. Used when seeding the
    /// list from a server fetch, where every record is already confirmed.
    pub fn append(&mut self, item: T) {
        self.items.push(item);
    }

    /// Append a placeholder awaiting server confirmation and return its local
    /// tag, which the caller passes back to [`reconcile`](Self::reconcile)
    /// once the authoritative record is known.
    pub fn append_placeholder(&mut self, item: T) -> Result<Uuid, StudiaError> {
        match item.entry_id() {
            EntryId::Local(tag) => {
                self.items.push(item);
                Ok(tag)
            }
            EntryId::Confirmed(id) => Err(StudiaError::Command(format!(
                "placeholder must carry a local tag, got confirmed id {id}"
            ))),
        }
    }

    /// Append a confirmed record arriving out of band (push channel, another
    /// client's event). Deduplicates on the confirmed id, so an event racing
    /// the owning request's response never produces two copies.
    pub fn apply_remote_insert(&mut self, item: T) {
        if let Some(id) = item.entry_id().confirmed() {
            if self.contains_confirmed(id) {
                tracing::debug!(id, "duplicate out-of-band insert dropped");
                return;
            }
        }
        self.items.push(item);
    }

    /// Replace-or-drop the placeholder once the authoritative record is
    /// known.
    ///
    /// If the confirmed id is already present (inserted out of band before
    /// this response arrived), the placeholder is removed and no duplicate is
    /// inserted. Otherwise the placeholder is replaced in place. Calling this
    /// twice with the same arguments is a no-op the second time.
    pub fn reconcile(&mut self, placeholder: Uuid, authoritative: T) -> Result<(), StudiaError> {
        let Some(real) = authoritative.entry_id().confirmed() else {
            return Err(StudiaError::Command(
                "authoritative record must be server-confirmed".to_string(),
            ));
        };

        if self.contains_confirmed(real) {
            self.items
                .retain(|item| item.entry_id() != EntryId::Local(placeholder));
            return Ok(());
        }

        if let Some(slot) = self
            .items
            .iter_mut()
            .find(|item| item.entry_id() == EntryId::Local(placeholder))
        {
            *slot = authoritative;
        } else {
            // Neither the placeholder nor the confirmed record is present
            // (the list was rebuilt between request and response); keep the
            // authoritative record rather than dropping it.
            self.items.push(authoritative);
        }
        Ok(())
    }

    fn contains_confirmed(&self, id: i64) -> bool {
        self.items
            .iter()
            .any(|item| item.entry_id().confirmed() == Some(id))
    }
}

impl<T> From<Vec<T>> for ReconcilingList<T> {
    fn from(items: Vec<T>) -> Self {
        ReconcilingList { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::ChatMessage;

    fn confirmed(id: i64, body: &str) -> ChatMessage {
        ChatMessage {
            id: EntryId::Confirmed(id),
            thread: 7,
            body: body.to_string(),
            sent_at_ms: 1_000,
        }
    }

    #[test]
    fn placeholder_replaced_in_place() {
        let mut list = ReconcilingList::from(vec![confirmed(1, "hi")]);
        let tag = list
            .append_placeholder(ChatMessage::placeholder(7, "draft", 2_000))
            .unwrap();
        list.apply_remote_insert(confirmed(2, "interleaved"));

        list.reconcile(tag, confirmed(3, "draft")).unwrap();

        let ids: Vec<_> = list.items().iter().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![
                EntryId::Confirmed(1),
                EntryId::Confirmed(3),
                EntryId::Confirmed(2)
            ]
        );
        assert!(!list.has_placeholders());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut list = ReconcilingList::new();
        let tag = list
            .append_placeholder(ChatMessage::placeholder(7, "draft", 2_000))
            .unwrap();

        list.reconcile(tag, confirmed(9, "draft")).unwrap();
        let once = list.clone();
        list.reconcile(tag, confirmed(9, "draft")).unwrap();

        assert_eq!(list, once);
    }

    #[test]
    fn out_of_band_insert_commutes_with_reconcile() {
        // Push event first, response second.
        let mut push_first = ReconcilingList::new();
        let tag_a = push_first
            .append_placeholder(ChatMessage::placeholder(7, "draft", 2_000))
            .unwrap();
        push_first.apply_remote_insert(confirmed(5, "draft"));
        push_first.reconcile(tag_a, confirmed(5, "draft")).unwrap();

        // Response first, push event second.
        let mut response_first = ReconcilingList::new();
        let tag_b = response_first
            .append_placeholder(ChatMessage::placeholder(7, "draft", 2_000))
            .unwrap();
        response_first
            .reconcile(tag_b, confirmed(5, "draft"))
            .unwrap();
        response_first.apply_remote_insert(confirmed(5, "draft"));

        for list in [&push_first, &response_first] {
            let hits = list
                .items()
                .iter()
                .filter(|m| m.id == EntryId::Confirmed(5))
                .count();
            assert_eq!(hits, 1);
            assert!(!list.has_placeholders());
        }
    }

    #[test]
    fn confirmed_record_rejected_as_placeholder() {
        let mut list = ReconcilingList::new();
        let err = list.append_placeholder(confirmed(1, "hi")).unwrap_err();
        assert!(matches!(err, StudiaError::Command(_)));
    }

    #[test]
    fn reconcile_requires_confirmed_record() {
        let mut list = ReconcilingList::new();
        let tag = list
            .append_placeholder(ChatMessage::placeholder(7, "draft", 2_000))
            .unwrap();
        let err = list
            .reconcile(tag, ChatMessage::placeholder(7, "draft", 2_000))
            .unwrap_err();
        assert!(matches!(err, StudiaError::Command(_)));
    }
}
