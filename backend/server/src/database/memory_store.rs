use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use super::StoreError;
use crate::models::{Article, Comment};

/// In-process stand-in for Redis. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    articles: Mutex<HashMap<String, Article>>,
    opened: AtomicUsize,
    open: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let db = Self::new();

        if let Ok(mut articles) = db.inner.articles.lock() {
            for name in names {
                articles.insert(name.to_string(), Article::new(name));
            }
        }

        db
    }

    /// While offline every connection attempt fails with [`StoreError::Unavailable`].
    #[cfg(test)]
    pub(crate) fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Total connections handed out so far.
    #[cfg(test)]
    pub(crate) fn connections_opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    /// Connections handed out and not yet dropped.
    #[cfg(test)]
    pub(crate) fn open_connections(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    pub(super) fn connect(&self) -> Result<MemoryConnection, StoreError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }

        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        self.inner.open.fetch_add(1, Ordering::SeqCst);

        Ok(MemoryConnection {
            inner: self.inner.clone(),
        })
    }
}

pub struct MemoryConnection {
    inner: Arc<Inner>,
}

impl MemoryConnection {
    fn articles(&self) -> Result<MutexGuard<'_, HashMap<String, Article>>, StoreError> {
        self.inner
            .articles
            .lock()
            .map_err(|_| StoreError::Unavailable)
    }

    pub fn find_article(&self, name: &str) -> Result<Option<Article>, StoreError> {
        Ok(self.articles()?.get(name).cloned())
    }

    pub fn increment_upvotes(&self, name: &str) -> Result<bool, StoreError> {
        Ok(match self.articles()?.get_mut(name) {
            Some(article) => {
                article.upvotes += 1;
                true
            }
            None => false,
        })
    }

    pub fn append_comment(&self, name: &str, comment: &Comment) -> Result<bool, StoreError> {
        Ok(match self.articles()?.get_mut(name) {
            Some(article) => {
                article.comments.push(comment.clone());
                true
            }
            None => false,
        })
    }

    pub fn insert_article(&self, article: &Article, overwrite: bool) -> Result<bool, StoreError> {
        Ok(match self.articles()?.entry(article.name.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(article.clone());
                true
            }
            Entry::Occupied(mut entry) if overwrite => {
                entry.insert(article.clone());
                true
            }
            Entry::Occupied(_) => false,
        })
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.inner.open.fetch_sub(1, Ordering::SeqCst);
    }
}
