//! Composite list model.
//!
//! A [`CompositeList`] is what a scrollable strip or list renders from: the
//! caller's real entities, then `placeholder_count` filler rows, then at most
//! one trailing action row. Positions map to a [`ListItem`] through a single
//! dispatch, so the layout rules live here rather than in every widget.
//!
//! Every mutation replaces state wholesale, bumps [`CompositeList::version`]
//! and notifies subscribed [`ListObserver`]s.

mod binding;

pub use binding::{BindTicket, PendingLoad, RowSlot, RowSlots};

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Entity Traits
// ============================================================================

/// Entities with an identity that survives list replacement.
pub trait Identified {
    fn id(&self) -> i64;
}

/// Entities that carry cover art and a fallback color seed.
pub trait Themed: Identified {
    /// Stable string used to pick a color when no artwork color exists.
    fn color_seed(&self) -> &str;

    /// Artwork reference (URL or path), if any.
    fn artwork(&self) -> Option<&str>;
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("Position {position} out of range for list of length {len}")]
    IndexOutOfRange { position: usize, len: usize },
}

// ============================================================================
// Items
// ============================================================================

/// Synthetic call-to-action row, always rendered last.
#[derive(Clone)]
pub struct TrailingAction {
    label: Arc<str>,
    action: Arc<dyn Fn() + Send + Sync>,
}

impl TrailingAction {
    pub fn new(label: impl Into<Arc<str>>, action: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            action: Arc::new(action),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Invoke the callback. Fire-and-forget.
    pub fn run(&self) {
        (self.action)();
    }
}

impl fmt::Debug for TrailingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrailingAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// What occupies a list position.
#[derive(Debug)]
pub enum ListItem<'a, E> {
    Real(&'a E),
    Placeholder,
    TrailingAction(&'a TrailingAction),
}

impl<E> ListItem<'_, E> {
    pub fn is_real(&self) -> bool {
        matches!(self, Self::Real(_))
    }
}

// ============================================================================
// Observers
// ============================================================================

/// Which setter produced a [`ListChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    RealItems,
    Placeholders,
    TrailingAction,
}

/// Whole-list invalidation notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListChange {
    pub version: u64,
    pub len: usize,
    pub cause: ChangeCause,
}

/// Receives whole-list invalidation notices.
pub trait ListObserver: Send {
    fn list_changed(&self, change: ListChange);
}

impl<F> ListObserver for F
where
    F: Fn(ListChange) + Send,
{
    fn list_changed(&self, change: ListChange) {
        self(change)
    }
}

/// Handle returned by [`CompositeList::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

// ============================================================================
// Composite List
// ============================================================================

pub struct CompositeList<E> {
    items: Arc<Vec<E>>,
    placeholder_count: usize,
    trailing: Option<TrailingAction>,
    long_pressed: Option<E>,
    version: u64,
    observers: Vec<(SubscriptionId, Box<dyn ListObserver>)>,
    next_subscription: u64,
}

impl<E> Default for CompositeList<E> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            placeholder_count: 0,
            trailing: None,
            long_pressed: None,
            version: 0,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for CompositeList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeList")
            .field("items", &self.items.len())
            .field("placeholder_count", &self.placeholder_count)
            .field("trailing", &self.trailing)
            .field("version", &self.version)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl<E> CompositeList<E> {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Replace every real item.
    pub fn set_real_items(&mut self, items: impl Into<Arc<Vec<E>>>) {
        self.items = items.into();
        self.changed(ChangeCause::RealItems);
    }

    pub fn set_placeholder_count(&mut self, count: usize) {
        self.placeholder_count = count;
        self.changed(ChangeCause::Placeholders);
    }

    /// Install, replace or (with `None`) remove the trailing action row.
    pub fn set_trailing_action(&mut self, action: Option<TrailingAction>) {
        self.trailing = action;
        self.changed(ChangeCause::TrailingAction);
    }

    fn changed(&mut self, cause: ChangeCause) {
        self.version += 1;
        let change = ListChange {
            version: self.version,
            len: self.len(),
            cause,
        };
        tracing::trace!(?change, "List changed");
        for (_, observer) in &self.observers {
            observer.list_changed(change);
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Total rows: real + placeholders + trailing.
    pub fn len(&self) -> usize {
        self.items.len() + self.placeholder_count + usize::from(self.trailing.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn real_items(&self) -> &Arc<Vec<E>> {
        &self.items
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholder_count
    }

    pub fn trailing_action(&self) -> Option<&TrailingAction> {
        self.trailing.as_ref()
    }

    /// Incremented by every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn kind_at(&self, position: usize) -> Result<ListItem<'_, E>, ListError> {
        let real = self.items.len();
        if let Some(entity) = self.items.get(position) {
            return Ok(ListItem::Real(entity));
        }
        if position < real + self.placeholder_count {
            return Ok(ListItem::Placeholder);
        }
        match &self.trailing {
            Some(action) if position == real + self.placeholder_count => {
                Ok(ListItem::TrailingAction(action))
            }
            _ => Err(ListError::IndexOutOfRange {
                position,
                len: self.len(),
            }),
        }
    }

    /// Iterate every row in position order.
    pub fn iter(&self) -> impl Iterator<Item = ListItem<'_, E>> + '_ {
        let real = self.items.iter().map(ListItem::Real);
        let filler = std::iter::repeat_with(|| ListItem::Placeholder).take(self.placeholder_count);
        let trailing = self.trailing.iter().map(ListItem::TrailingAction);
        real.chain(filler).chain(trailing)
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, observer: impl ListObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl<E: Identified> CompositeList<E> {
    /// Entity id for real rows, `None` for placeholders and the trailing row.
    pub fn stable_id_at(&self, position: usize) -> Result<Option<i64>, ListError> {
        Ok(match self.kind_at(position)? {
            ListItem::Real(entity) => Some(entity.id()),
            ListItem::Placeholder | ListItem::TrailingAction(_) => None,
        })
    }
}

impl<E: Clone> CompositeList<E> {
    /// Remember the real entity at `position` as long-pressed.
    ///
    /// Placeholder and trailing rows are ignored and leave the previous
    /// long-press in place. The stored entity is a snapshot: later list
    /// replacements do not revalidate it.
    pub fn record_long_press(&mut self, position: usize) -> Result<Option<&E>, ListError> {
        if let ListItem::Real(entity) = self.kind_at(position)? {
            let entity = entity.clone();
            self.long_pressed = Some(entity);
            return Ok(self.long_pressed.as_ref());
        }
        Ok(None)
    }

    pub fn long_pressed_item(&self) -> Option<&E> {
        self.long_pressed.as_ref()
    }

    pub fn clear_long_press(&mut self) {
        self.long_pressed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(i64);

    impl Identified for Item {
        fn id(&self) -> i64 {
            self.0
        }
    }

    fn kinds(list: &CompositeList<Item>) -> Vec<&'static str> {
        list.iter()
            .map(|item| match item {
                ListItem::Real(_) => "real",
                ListItem::Placeholder => "placeholder",
                ListItem::TrailingAction(_) => "trailing",
            })
            .collect()
    }

    #[test]
    fn empty_list() {
        let list: CompositeList<Item> = CompositeList::new();
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert_eq!(
            list.kind_at(0).unwrap_err(),
            ListError::IndexOutOfRange {
                position: 0,
                len: 0
            }
        );
    }

    #[test]
    fn layout_is_real_then_placeholders_then_trailing() {
        let mut list = CompositeList::new();
        list.set_real_items(vec![Item(1), Item(2)]);
        list.set_placeholder_count(2);
        list.set_trailing_action(Some(TrailingAction::new("See more", || {})));
        assert_eq!(
            kinds(&list),
            vec!["real", "real", "placeholder", "placeholder", "trailing"]
        );
        assert!(list.kind_at(5).is_err());
    }

    #[test]
    fn trailing_only() {
        let mut list: CompositeList<Item> = CompositeList::new();
        list.set_trailing_action(Some(TrailingAction::new("Add", || {})));
        assert_eq!(list.len(), 1);
        match list.kind_at(0).unwrap() {
            ListItem::TrailingAction(action) => assert_eq!(action.label(), "Add"),
            other => panic!("expected trailing action, got {other:?}"),
        }
    }

    #[test]
    fn removing_trailing_shrinks_list() {
        let mut list = CompositeList::new();
        list.set_real_items(vec![Item(1)]);
        list.set_trailing_action(Some(TrailingAction::new("More", || {})));
        assert_eq!(list.len(), 2);
        list.set_trailing_action(None);
        assert_eq!(list.len(), 1);
        assert!(list.kind_at(1).is_err());
    }

    #[test]
    fn stable_ids() {
        let mut list = CompositeList::new();
        list.set_real_items(vec![Item(10), Item(20)]);
        list.set_placeholder_count(1);
        list.set_trailing_action(Some(TrailingAction::new("More", || {})));
        assert_eq!(list.stable_id_at(0), Ok(Some(10)));
        assert_eq!(list.stable_id_at(1), Ok(Some(20)));
        assert_eq!(list.stable_id_at(2), Ok(None));
        assert_eq!(list.stable_id_at(3), Ok(None));
        assert!(list.stable_id_at(4).is_err());
    }

    #[test]
    fn trailing_action_runs_callback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let action = TrailingAction::new("Go", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        action.run();
        action.clone().run();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn every_mutation_notifies_with_version() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut list: CompositeList<Item> = CompositeList::new();
        list.subscribe(move |change: ListChange| sink.lock().unwrap().push(change));

        list.set_real_items(vec![Item(1)]);
        list.set_placeholder_count(3);
        list.set_trailing_action(None);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ListChange {
                    version: 1,
                    len: 1,
                    cause: ChangeCause::RealItems
                },
                ListChange {
                    version: 2,
                    len: 4,
                    cause: ChangeCause::Placeholders
                },
                ListChange {
                    version: 3,
                    len: 4,
                    cause: ChangeCause::TrailingAction
                },
            ]
        );
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut list: CompositeList<Item> = CompositeList::new();
        let id = list.subscribe(move |_: ListChange| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        list.set_placeholder_count(1);
        assert!(list.unsubscribe(id));
        assert!(!list.unsubscribe(id));
        list.set_placeholder_count(2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(list.observer_count(), 0);
    }

    #[test]
    fn long_press_records_real_items_only() {
        let mut list = CompositeList::new();
        list.set_real_items(vec![Item(1), Item(2)]);
        list.set_placeholder_count(1);

        assert_eq!(list.record_long_press(1), Ok(Some(&Item(2))));
        assert_eq!(list.record_long_press(2), Ok(None));
        assert_eq!(list.long_pressed_item(), Some(&Item(2)));
        assert!(list.record_long_press(9).is_err());
    }

    #[test]
    fn long_press_survives_replacement() {
        let mut list = CompositeList::new();
        list.set_real_items(vec![Item(1)]);
        list.record_long_press(0).unwrap();
        list.set_real_items(vec![Item(7)]);
        assert_eq!(list.long_pressed_item(), Some(&Item(1)));
        list.clear_long_press();
        assert_eq!(list.long_pressed_item(), None);
    }
}
