use crate::model::Record;
use im::Vector;

/// Ordered records of one kind, keyed by record id.
///
/// Backed by a persistent vector, so cloning a collection (a rollback
/// snapshot) shares structure with the live copy instead of copying records.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T: Clone> {
    records: Vector<T>,
}

impl<T: Clone> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: Vector::new(),
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<T>) -> Self {
        let mut collection = Self::new();
        for record in records {
            collection.insert(record);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.position(id).map(|index| &self.records[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.records.iter()
    }

    /// Records in display order: explicit `order` ascending first, then the
    /// rest in insertion order.
    pub fn to_vec(&self) -> Vec<T> {
        let mut records: Vec<T> = self.records.iter().cloned().collect();
        records.sort_by_key(|record| match record.sort_order() {
            Some(order) => (0, order),
            None => (1, 0),
        });
        records
    }

    /// Append a record. An id already present is replaced in place so the
    /// id-to-record mapping stays one-to-one.
    pub fn insert(&mut self, record: T) {
        match self.position(record.id()) {
            Some(index) => {
                self.records.set(index, record);
            }
            None => self.records.push_back(record),
        }
    }

    /// Replace the record stored under `id`. Unknown ids are ignored.
    pub fn replace(&mut self, id: &str, record: T) -> bool {
        match self.position(id) {
            Some(index) => {
                self.records.set(index, record);
                true
            }
            None => false,
        }
    }

    /// Insert or replace, keyed by the record's own id
    pub fn upsert(&mut self, record: T) {
        self.insert(record);
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.position(id).map(|index| self.records.remove(index))
    }

    pub fn update<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        match self.position(id) {
            Some(index) => {
                let mut record = self.records[index].clone();
                f(&mut record);
                self.records.set(index, record);
                true
            }
            None => false,
        }
    }

    pub fn replace_all(&mut self, records: Vec<T>) {
        *self = Self::from_records(records);
    }
}
