//! Single-slot cache of the most recently fetched object descriptor

use super::object::StorageObject;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ObjectCache {
    #[default]
    Empty,
    Cached { path: String, object: StorageObject },
}

impl ObjectCache {
    /// Cached descriptor for `path`, if the slot holds exactly that path
    pub fn lookup(&self, path: &str) -> Option<&StorageObject> {
        match self {
            ObjectCache::Cached {
                path: cached,
                object,
            } if cached == path => Some(object),
            _ => None,
        }
    }

    pub fn object(&self) -> Option<&StorageObject> {
        match self {
            ObjectCache::Cached { object, .. } => Some(object),
            ObjectCache::Empty => None,
        }
    }

    /// Successful fetch: replace the slot wholesale
    pub fn store(&mut self, path: &str, object: StorageObject) {
        *self = ObjectCache::Cached {
            path: path.to_string(),
            object,
        };
    }

    /// Miss, failed fetch, or reconfiguration
    pub fn clear(&mut self) {
        *self = ObjectCache::Empty;
    }

    /// Drop the entry only if it belongs to `path`
    pub fn invalidate(&mut self, path: &str) {
        if self.lookup(path).is_some() {
            self.clear();
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        matches!(self, ObjectCache::Empty)
    }
}
