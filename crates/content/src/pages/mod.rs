//! Per-page bootstrapping.

pub mod common;

pub use common::{CommonBoot, CommonPage};

use crate::inject::InjectError;
use dom_watch::WatchError;
use std::cell::RefCell;
use std::collections::HashMap;

/// The site page the script was loaded on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Written to `body[data-btr-page]`.
    pub name: String,
    /// Extra stylesheets under `css/`.
    pub css: Vec<String>,
}

impl PageInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            css: Vec::new(),
        }
    }

    pub fn with_css(mut self, file: &str) -> Self {
        self.css.push(file.to_string());
        self
    }
}

/// Tab-scoped string storage.
#[derive(Debug, Default)]
pub struct SessionStorage {
    items: RefCell<HashMap<String, String>>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    pub fn set_item(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    pub fn remove_item(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Inject(#[from] InjectError),
    #[error(transparent)]
    Watch(#[from] WatchError),
}
