use super::capability::TrackKind;
use super::entry::EntryId;

/// A lane of same-kind entries. Tracks are fixed for a session; only their
/// entry lists change.
#[derive(Clone, PartialEq, Debug)]
pub struct Track {
    pub kind: TrackKind,
    pub name: String,
    pub color: String,
    entry_ids: Vec<EntryId>,
}

impl Track {
    pub fn new(kind: TrackKind) -> Self {
        let def = kind.definition();
        Self {
            kind,
            name: def.name.to_string(),
            color: def.color.to_string(),
            entry_ids: Vec::new(),
        }
    }

    /// Entry ids in insertion order. Not sorted by time.
    pub fn entry_ids(&self) -> &[EntryId] {
        &self.entry_ids
    }

    pub fn len(&self) -> usize {
        self.entry_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_ids.is_empty()
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.entry_ids.contains(id)
    }

    pub(crate) fn push(&mut self, id: EntryId) {
        self.entry_ids.push(id);
    }

    pub(crate) fn insert_after(&mut self, anchor: &EntryId, id: EntryId) {
        match self.entry_ids.iter().position(|e| e == anchor) {
            Some(pos) => self.entry_ids.insert(pos + 1, id),
            None => self.entry_ids.push(id),
        }
    }

    pub(crate) fn set_order(&mut self, ids: Vec<EntryId>) {
        self.entry_ids = ids;
    }

    pub(crate) fn remove(&mut self, id: &EntryId) -> bool {
        if let Some(pos) = self.entry_ids.iter().position(|e| e == id) {
            self.entry_ids.remove(pos);
            true
        } else {
            false
        }
    }
}
