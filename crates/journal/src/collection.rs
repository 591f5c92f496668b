use crate::error::JournalError;
use core_types::{Owned, Record, UserId, Validate};
use uuid::Uuid;

/// An ordered list of records of one kind, addressed by id.
///
/// Insertion order is preserved. Records are only ever replaced whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    kind: &'static str,
    records: Vec<Record<T>>,
}

impl<T: Validate> Collection<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    /// Validates `body`, stores it under a fresh id and returns the stored record.
    pub fn insert(&mut self, body: T) -> Result<&Record<T>, JournalError> {
        body.validate()?;
        let id = Uuid::new_v4();
        self.records.push(Record { id, body });
        tracing::debug!(kind = self.kind, %id, "Record added.");
        Ok(&self.records[self.records.len() - 1])
    }

    /// Adds a record that already has an id, e.g. one read from a document.
    pub(crate) fn restore(&mut self, record: Record<T>) -> Result<(), JournalError> {
        record.body.validate()?;
        if self.get(record.id).is_some() {
            return Err(JournalError::DuplicateId {
                kind: self.kind,
                id: record.id,
            });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn replace(&mut self, id: Uuid, body: T) -> Result<&Record<T>, JournalError> {
        body.validate()?;
        let kind = self.kind;
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(JournalError::NotFound { kind, id })?;
        record.body = body;
        tracing::debug!(kind, %id, "Record replaced.");
        Ok(&*record)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Record<T>, JournalError> {
        let index = self.position(id)?;
        tracing::debug!(kind = self.kind, %id, "Record removed.");
        Ok(self.records.remove(index))
    }

    pub(crate) fn get_mut(&mut self, id: Uuid) -> Result<&mut Record<T>, JournalError> {
        let index = self.position(id)?;
        Ok(&mut self.records[index])
    }

    fn position(&self, id: Uuid) -> Result<usize, JournalError> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(JournalError::NotFound {
                kind: self.kind,
                id,
            })
    }
}

impl<T> Collection<T> {
    pub fn get(&self, id: Uuid) -> Option<&Record<T>> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn as_slice(&self) -> &[Record<T>] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record<T>> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Owned> Collection<T> {
    pub fn for_user(&self, user_id: UserId) -> impl Iterator<Item = &Record<T>> {
        self.records.iter().filter(move |r| r.user_id() == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::Mistake;

    fn mistake(user_id: UserId, kind: &str) -> Mistake {
        Mistake {
            user_id,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            time: None,
            mistake_type: kind.to_string(),
            description: String::new(),
            trade_id: None,
        }
    }

    #[test]
    fn insert_replace_remove() {
        let mut mistakes = Collection::new("mistake");
        let id = mistakes.insert(mistake(1, "FOMO")).unwrap().id;
        mistakes.insert(mistake(2, "Overtrading")).unwrap();

        mistakes.replace(id, mistake(1, "Revenge Trading")).unwrap();
        assert_eq!(mistakes.get(id).unwrap().body.mistake_type, "Revenge Trading");
        assert_eq!(mistakes.as_slice()[0].id, id);

        assert_eq!(mistakes.for_user(2).count(), 1);
        mistakes.remove(id).unwrap();
        assert_eq!(mistakes.len(), 1);
        assert!(matches!(
            mistakes.remove(id),
            Err(JournalError::NotFound { kind: "mistake", .. })
        ));
    }

    #[test]
    fn invalid_bodies_never_land() {
        let mut mistakes = Collection::new("mistake");
        assert!(mistakes.insert(mistake(1, " ")).is_err());
        assert!(mistakes.is_empty());
    }

    #[test]
    fn restore_rejects_duplicate_ids() {
        let mut mistakes = Collection::new("mistake");
        let record = Record { id: Uuid::nil(), body: mistake(1, "FOMO") };
        mistakes.restore(record.clone()).unwrap();
        assert!(matches!(
            mistakes.restore(record),
            Err(JournalError::DuplicateId { .. })
        ));
    }
}
