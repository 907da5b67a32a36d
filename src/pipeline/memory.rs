use std::collections::{HashMap, VecDeque};

use crate::patterns::normalize_lang;
use crate::service::TranslateResponse;

type MemoryKey = (String, String);

/// Translations already fetched during this run, keyed by (language, source text).
/// Oldest entries are evicted first once `capacity` is reached.
#[derive(Clone, Debug)]
pub struct TranslationMemory {
    capacity: usize,
    entries: HashMap<MemoryKey, TranslateResponse>,
    order: VecDeque<MemoryKey>,
}

impl TranslationMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, lang: &str, source: &str) -> Option<&TranslateResponse> {
        self.entries.get(&key(lang, source))
    }

    pub fn insert(&mut self, lang: &str, source: &str, response: TranslateResponse) {
        if self.capacity == 0 {
            return;
        }
        let k = key(lang, source);
        if let Some(slot) = self.entries.get_mut(&k) {
            *slot = response;
            return;
        }
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.order.push_back(k.clone());
        self.entries.insert(k, response);
    }

    /// Drop one language's entries, or everything with `None`.
    pub fn clear(&mut self, lang: Option<&str>) {
        match lang {
            None => {
                self.entries.clear();
                self.order.clear();
            }
            Some(lang) => {
                let lang = normalize_lang(lang);
                self.entries.retain(|(l, _), _| *l != lang);
                self.order.retain(|(l, _)| *l != lang);
            }
        }
    }
}

fn key(lang: &str, source: &str) -> MemoryKey {
    (normalize_lang(lang), source.to_string())
}
