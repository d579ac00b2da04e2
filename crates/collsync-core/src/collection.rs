//! Managed collections and their insert/delete diffs.
//!
//! A managed collection is one side of a collection-valued relationship, bound
//! to a single owner. Between synchronization points it remembers what was
//! persisted (the snapshot) and what it holds now, and exposes the difference
//! as two ordered diffs:
//!
//! - **insert diff**: elements present now but absent from the snapshot
//! - **delete diff**: elements in the snapshot but absent now
//!
//! An element is identified by its key values. A persisted row matches an
//! element only when both its key and its association payload
//! ([`CollectionElement::row_values`]) are unchanged, so an element whose
//! payload changed shows up twice: the old instance in the delete diff and the
//! new one in the insert diff. Each element instance appears in at most one
//! diff.

use crate::relationship::CollectionMapping;
use crate::value::Value;

/// An entity that can live inside a managed collection.
pub trait CollectionElement {
    /// Key values identifying this element (its primary key, in column order).
    fn key_values(&self) -> Vec<Value>;

    /// Extra association columns stored alongside the keys (link-table payload).
    ///
    /// Most associations carry only keys, hence the empty default.
    fn row_values(&self) -> Vec<(&'static str, Value)> {
        Vec::new()
    }
}

/// Read-only view of a collection used by the persister.
///
/// The persister never mutates a collection; diff bookkeeping belongs to the
/// collection and the unit of work that owns it.
pub trait ManagedCollection {
    /// Element type.
    type Element: CollectionElement;

    /// Mapping metadata for this collection. Queried fresh on every write.
    fn mapping(&self) -> &CollectionMapping;

    /// Key values of the owning entity.
    fn owner_key(&self) -> &[Value];

    /// Every element currently in the collection.
    fn elements(&self) -> Vec<&Self::Element>;

    /// Elements added since the last synchronization point.
    fn insert_diff(&self) -> Vec<&Self::Element>;

    /// Elements removed since the last synchronization point.
    fn delete_diff(&self) -> Vec<&Self::Element>;
}

/// A snapshot-diffing collection.
///
/// # Example
///
/// ```ignore
/// let mut powers = PersistentCollection::hydrated(HERO_POWERS, vec![Value::BigInt(1)], loaded);
/// powers.add(fireball);
/// powers.remove_by_key(&[Value::BigInt(7)]);
///
/// persister.update(&cx, &powers).await?;
/// powers.take_snapshot();
/// ```
#[derive(Debug, Clone)]
pub struct PersistentCollection<T> {
    mapping: CollectionMapping,
    owner_key: Vec<Value>,
    elements: Vec<T>,
    snapshot: Vec<T>,
}

impl<T: CollectionElement + Clone> PersistentCollection<T> {
    /// Create a new, empty and clean collection (e.g., for a freshly instantiated owner).
    #[must_use]
    pub fn new(mapping: CollectionMapping, owner_key: Vec<Value>) -> Self {
        Self {
            mapping,
            owner_key,
            elements: Vec::new(),
            snapshot: Vec::new(),
        }
    }

    /// Create a collection hydrated from storage: the loaded elements are both
    /// the current state and the snapshot.
    ///
    /// Duplicate keys are collapsed, keeping the first occurrence.
    #[must_use]
    pub fn hydrated(mapping: CollectionMapping, owner_key: Vec<Value>, loaded: Vec<T>) -> Self {
        let elements = dedup_by_key(loaded);
        Self {
            mapping,
            owner_key,
            snapshot: elements.clone(),
            elements,
        }
    }

    /// Get the mapping metadata.
    #[must_use]
    pub fn mapping(&self) -> &CollectionMapping {
        &self.mapping
    }

    /// Get the owner key values.
    #[must_use]
    pub fn owner_key(&self) -> &[Value] {
        &self.owner_key
    }

    /// Set the owner key (e.g., once the owner's generated id is known).
    pub fn set_owner_key(&mut self, key: Vec<Value>) {
        self.owner_key = key;
    }

    /// Add an element. Returns `false` if an element with the same key is
    /// already present.
    pub fn add(&mut self, element: T) -> bool {
        if self.contains_key(&element.key_values()) {
            return false;
        }
        self.elements.push(element);
        true
    }

    /// Insert an element, replacing any element with the same key. Returns the
    /// replaced element.
    pub fn put(&mut self, element: T) -> Option<T> {
        let key = element.key_values();
        match self.elements.iter().position(|e| e.key_values() == key) {
            Some(idx) => Some(std::mem::replace(&mut self.elements[idx], element)),
            None => {
                self.elements.push(element);
                None
            }
        }
    }

    /// Remove the element with the given key, returning it if present.
    pub fn remove_by_key(&mut self, key: &[Value]) -> Option<T> {
        let idx = self
            .elements
            .iter()
            .position(|e| e.key_values().as_slice() == key)?;
        Some(self.elements.remove(idx))
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Replace the current elements wholesale. The snapshot is kept, so the
    /// diffs describe the full replacement.
    pub fn replace(&mut self, elements: Vec<T>) {
        self.elements = dedup_by_key(elements);
    }

    /// Check whether an element with the given key is present.
    #[must_use]
    pub fn contains_key(&self, key: &[Value]) -> bool {
        self.elements
            .iter()
            .any(|e| e.key_values().as_slice() == key)
    }

    /// Number of current elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over the current elements.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    /// Elements as of the last synchronization point.
    #[must_use]
    pub fn snapshot(&self) -> &[T] {
        &self.snapshot
    }

    /// Check whether the collection differs from its snapshot.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.insert_diff().is_empty() || !self.delete_diff().is_empty()
    }

    /// Mark the current elements as persisted. Called by the unit of work after
    /// a successful flush; both diffs are empty afterwards.
    #[tracing::instrument(level = "trace", skip(self), fields(field = self.mapping.field_name))]
    pub fn take_snapshot(&mut self) {
        tracing::trace!(elements = self.elements.len(), "Taking collection snapshot");
        self.snapshot = self.elements.clone();
    }

    /// Elements with no matching persisted row, in current-element order.
    #[must_use]
    pub fn insert_diff(&self) -> Vec<&T> {
        let persisted: Vec<RowImage> = self.snapshot.iter().map(row_image).collect();
        self.elements
            .iter()
            .filter(|e| !persisted.contains(&row_image(*e)))
            .collect()
    }

    /// Persisted rows no current element matches, in snapshot order.
    #[must_use]
    pub fn delete_diff(&self) -> Vec<&T> {
        let current: Vec<RowImage> = self.elements.iter().map(row_image).collect();
        self.snapshot
            .iter()
            .filter(|e| !current.contains(&row_image(*e)))
            .collect()
    }
}

impl<T: CollectionElement + Clone> ManagedCollection for PersistentCollection<T> {
    type Element = T;

    fn mapping(&self) -> &CollectionMapping {
        &self.mapping
    }

    fn owner_key(&self) -> &[Value] {
        &self.owner_key
    }

    fn elements(&self) -> Vec<&T> {
        self.elements.iter().collect()
    }

    fn insert_diff(&self) -> Vec<&T> {
        PersistentCollection::insert_diff(self)
    }

    fn delete_diff(&self) -> Vec<&T> {
        PersistentCollection::delete_diff(self)
    }
}

/// Key values plus association payload: what a stored row holds.
type RowImage = (Vec<Value>, Vec<(&'static str, Value)>);

fn row_image<T: CollectionElement>(element: &T) -> RowImage {
    (element.key_values(), element.row_values())
}

fn dedup_by_key<T: CollectionElement>(elements: Vec<T>) -> Vec<T> {
    let mut seen: Vec<Vec<Value>> = Vec::with_capacity(elements.len());
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        let key = element.key_values();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(element);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::{LinkTableInfo, RelationshipKind};

    #[derive(Debug, Clone, PartialEq)]
    struct Power {
        id: i64,
        name: &'static str,
    }

    impl CollectionElement for Power {
        fn key_values(&self) -> Vec<Value> {
            vec![Value::BigInt(self.id)]
        }
    }

    const HERO_POWERS: CollectionMapping =
        CollectionMapping::new("powers", "powers", RelationshipKind::ManyToMany)
            .link_table(LinkTableInfo::new("hero_powers", "hero_id", "power_id"));

    fn power(id: i64, name: &'static str) -> Power {
        Power { id, name }
    }

    fn ids(elements: &[&Power]) -> Vec<i64> {
        elements.iter().map(|p| p.id).collect()
    }

    fn loaded() -> PersistentCollection<Power> {
        PersistentCollection::hydrated(
            HERO_POWERS,
            vec![Value::BigInt(1)],
            vec![power(1, "flight"), power(2, "strength"), power(3, "speed")],
        )
    }

    #[test]
    fn test_new_collection_is_clean() {
        let coll: PersistentCollection<Power> =
            PersistentCollection::new(HERO_POWERS, vec![Value::BigInt(1)]);
        assert!(coll.is_empty());
        assert!(!coll.is_dirty());
        assert!(coll.insert_diff().is_empty());
        assert!(coll.delete_diff().is_empty());
    }

    #[test]
    fn test_hydrated_collection_is_clean() {
        let coll = loaded();
        assert_eq!(coll.len(), 3);
        assert_eq!(coll.snapshot().len(), 3);
        assert!(!coll.is_dirty());
    }

    #[test]
    fn test_hydrated_collapses_duplicate_keys() {
        let coll = PersistentCollection::hydrated(
            HERO_POWERS,
            vec![Value::BigInt(1)],
            vec![power(1, "flight"), power(1, "flight again")],
        );
        assert_eq!(coll.len(), 1);
        assert_eq!(coll.iter().next().map(|p| p.name), Some("flight"));
    }

    #[test]
    fn test_add_and_remove_produce_diffs() {
        let mut coll = loaded();
        assert!(coll.add(power(4, "telepathy")));
        assert_eq!(coll.remove_by_key(&[Value::BigInt(2)]), Some(power(2, "strength")));

        assert!(coll.is_dirty());
        assert_eq!(ids(&coll.insert_diff()), vec![4]);
        assert_eq!(ids(&coll.delete_diff()), vec![2]);
    }

    #[test]
    fn test_add_duplicate_key_is_ignored() {
        let mut coll = loaded();
        assert!(!coll.add(power(1, "flight")));
        assert_eq!(coll.len(), 3);
        assert!(!coll.is_dirty());
    }

    #[test]
    fn test_add_then_remove_cancels_out() {
        let mut coll = loaded();
        coll.add(power(9, "invisibility"));
        coll.remove_by_key(&[Value::BigInt(9)]);
        assert!(!coll.is_dirty());
    }

    #[test]
    fn test_remove_then_readd_cancels_out() {
        let mut coll = loaded();
        let removed = coll.remove_by_key(&[Value::BigInt(3)]).unwrap();
        coll.add(removed);
        assert!(coll.insert_diff().is_empty());
        assert!(coll.delete_diff().is_empty());
    }

    #[test]
    fn test_clear_deletes_everything_in_snapshot_order() {
        let mut coll = loaded();
        coll.clear();
        assert!(coll.insert_diff().is_empty());
        assert_eq!(ids(&coll.delete_diff()), vec![1, 2, 3]);
    }

    #[test]
    fn test_replace_computes_full_diff() {
        let mut coll = loaded();
        coll.replace(vec![power(3, "speed"), power(5, "x-ray"), power(6, "healing")]);
        assert_eq!(ids(&coll.insert_diff()), vec![5, 6]);
        assert_eq!(ids(&coll.delete_diff()), vec![1, 2]);
    }

    #[test]
    fn test_take_snapshot_clears_diffs() {
        let mut coll = loaded();
        coll.add(power(4, "telepathy"));
        coll.remove_by_key(&[Value::BigInt(1)]);
        coll.take_snapshot();

        assert!(!coll.is_dirty());
        assert_eq!(coll.snapshot().len(), 3);
    }

    #[test]
    fn test_diffs_never_share_an_instance() {
        let mut coll = loaded();
        coll.remove_by_key(&[Value::BigInt(1)]);
        coll.add(power(7, "cold"));
        coll.replace(vec![power(7, "cold"), power(2, "strength"), power(8, "heat")]);

        let inserted: Vec<Vec<Value>> =
            coll.insert_diff().iter().map(|p| p.key_values()).collect();
        let deleted: Vec<Vec<Value>> =
            coll.delete_diff().iter().map(|p| p.key_values()).collect();
        assert!(inserted.iter().all(|k| !deleted.contains(k)));

        let mut grants = grants();
        grants.put(Grant { role_id: 3, granted_by: "bob" });
        let deleted = grants.delete_diff();
        assert!(grants
            .insert_diff()
            .iter()
            .all(|i| deleted.iter().all(|d| !std::ptr::eq(*i, *d))));
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Grant {
        role_id: i64,
        granted_by: &'static str,
    }

    impl CollectionElement for Grant {
        fn key_values(&self) -> Vec<Value> {
            vec![Value::BigInt(self.role_id)]
        }

        fn row_values(&self) -> Vec<(&'static str, Value)> {
            vec![("granted_by", Value::from(self.granted_by))]
        }
    }

    fn grants() -> PersistentCollection<Grant> {
        PersistentCollection::hydrated(
            HERO_POWERS,
            vec![Value::BigInt(1)],
            vec![
                Grant { role_id: 3, granted_by: "alice" },
                Grant { role_id: 4, granted_by: "alice" },
            ],
        )
    }

    #[test]
    fn test_changed_payload_appears_in_both_diffs() {
        let mut coll = grants();
        coll.remove_by_key(&[Value::BigInt(3)]);
        coll.add(Grant { role_id: 3, granted_by: "bob" });

        assert!(coll.is_dirty());
        assert_eq!(
            coll.delete_diff(),
            vec![&Grant { role_id: 3, granted_by: "alice" }]
        );
        assert_eq!(
            coll.insert_diff(),
            vec![&Grant { role_id: 3, granted_by: "bob" }]
        );
    }

    #[test]
    fn test_put_replaces_by_key() {
        let mut coll = grants();
        let old = coll.put(Grant { role_id: 4, granted_by: "carol" });
        assert_eq!(old, Some(Grant { role_id: 4, granted_by: "alice" }));
        assert_eq!(coll.len(), 2);
        assert_eq!(coll.delete_diff().len(), 1);
        assert_eq!(coll.insert_diff().len(), 1);

        assert_eq!(coll.put(Grant { role_id: 5, granted_by: "carol" }), None);
        assert_eq!(coll.len(), 3);

        coll.take_snapshot();
        assert!(!coll.is_dirty());
    }

    #[test]
    fn test_unchanged_payload_is_clean() {
        let mut coll = grants();
        coll.put(Grant { role_id: 3, granted_by: "alice" });
        assert!(!coll.is_dirty());
    }

    #[test]
    fn test_managed_collection_view_matches_inherent_api() {
        let mut coll = loaded();
        coll.add(power(4, "telepathy"));
        coll.set_owner_key(vec![Value::BigInt(42)]);

        assert_eq!(ManagedCollection::elements(&coll).len(), 4);
        assert_eq!(ManagedCollection::owner_key(&coll), &[Value::BigInt(42)]);
        assert_eq!(ids(&ManagedCollection::insert_diff(&coll)), vec![4]);
        assert!(ManagedCollection::mapping(&coll).is_owning_side());
    }
}
