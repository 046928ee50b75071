use crate::model::{Track, TrackId};

/// Ordered play queue. Insertion order drives next/previous and identifiers
/// are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    tracks: Vec<Track>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a queue from `tracks`, keeping the first occurrence of each id.
    pub fn from_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let mut queue = Self::new();
        for track in tracks {
            queue.push(track);
        }
        queue
    }

    /// Appends `track` unless its id is already queued. Returns whether it was added.
    pub fn push(&mut self, track: Track) -> bool {
        if self.contains(&track.id) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    pub fn get(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    pub fn successor(&self, id: &TrackId) -> Option<&Track> {
        self.position(id).and_then(|i| self.tracks.get(i + 1))
    }

    pub fn predecessor(&self, id: &TrackId) -> Option<&Track> {
        self.position(id)
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.tracks.get(i))
    }

    pub fn first(&self) -> Option<&Track> {
        self.tracks.first()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }
}

impl<'a> IntoIterator for &'a Queue {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
