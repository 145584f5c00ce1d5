//! Read-mostly view of the extension settings.
//!
//! Keys are dotted `section.name` paths (`general.theme`). Values come from
//! a TOML document layered over built-in defaults; writes only live in
//! memory and notify `on_change` listeners.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use toml::Value;

pub type ChangeListener = Box<dyn FnMut(&Value)>;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error("setting {key} must be a {expected}")]
    WrongType { key: String, expected: &'static str },
}

pub trait Settings {
    fn get(&self, key: &str) -> Option<Value>;

    fn on_change(&self, key: &str, listener: ChangeListener);

    fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_string))
    }
}

fn defaults() -> BTreeMap<String, Value> {
    [
        ("general.theme", Value::from("default")),
        ("general.hideAds", Value::from(false)),
        ("general.hideChat", Value::from(false)),
        ("general.smallChatButton", Value::from(false)),
        ("general.fastSearch", Value::from(false)),
        ("navigation.enabled", Value::from(true)),
        ("navigation.noHamburger", Value::from(false)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

pub struct SettingsStore {
    values: RefCell<BTreeMap<String, Value>>,
    listeners: RefCell<Vec<(String, ChangeListener)>>,
    // Changes made while listeners run are delivered after the current one.
    pending: RefCell<VecDeque<(String, Value)>>,
    notifying: Cell<bool>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            values: RefCell::new(defaults()),
            listeners: RefCell::new(Vec::new()),
            pending: RefCell::new(VecDeque::new()),
            notifying: Cell::new(false),
        }
    }

    // input:
    //   [general]
    //   theme = "dark"
    // output: "general.theme" = "dark", everything else default
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let table: toml::Table = toml::from_str(text)?;
        let store = Self::new();
        {
            let mut values = store.values.borrow_mut();
            for (section, entries) in table {
                let Value::Table(entries) = entries else {
                    log::warn!(target: "btr.settings", "ignoring top-level key {section}");
                    continue;
                };
                for (name, value) in entries {
                    let key = format!("{section}.{name}");
                    match values.get(&key) {
                        Some(default) if !same_type(default, &value) => {
                            return Err(SettingsError::WrongType {
                                key,
                                expected: default.type_str(),
                            });
                        }
                        Some(_) => {}
                        None => log::warn!(target: "btr.settings", "unknown setting {key}"),
                    }
                    values.insert(key, value);
                }
            }
        }
        Ok(store)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Update a value and notify its listeners when it changed.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let previous = self.values.borrow_mut().insert(key.to_string(), value.clone());
        if previous.as_ref() == Some(&value) {
            return;
        }
        self.pending.borrow_mut().push_back((key.to_string(), value));
        if self.notifying.replace(true) {
            return;
        }

        // Listeners may read settings, subscribe or set other keys while running.
        let mut listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        while let Some((changed, value)) = self.next_pending() {
            for (watched, listener) in listeners.iter_mut() {
                if *watched == changed {
                    listener(&value);
                }
            }
            // Pick up subscriptions made during this round.
            listeners.append(&mut self.listeners.borrow_mut());
        }
        *self.listeners.borrow_mut() = listeners;
        self.notifying.set(false);
    }

    fn next_pending(&self) -> Option<(String, Value)> {
        self.pending.borrow_mut().pop_front()
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings for SettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    fn on_change(&self, key: &str, listener: ChangeListener) {
        self.listeners.borrow_mut().push((key.to_string(), listener));
    }
}

fn same_type(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn defaults_apply_without_file() {
        let store = SettingsStore::new();
        assert_eq!(store.get_string("general.theme").as_deref(), Some("default"));
        assert!(store.get_bool("navigation.enabled"));
        assert!(!store.get_bool("general.hideAds"));
        assert!(!store.get_bool("no.such.key"));
    }

    #[test]
    fn toml_overrides_defaults() {
        let store = SettingsStore::from_toml_str(
            "[general]\ntheme = \"dark\"\nhideChat = true\n\n[navigation]\nenabled = false\n",
        )
        .unwrap();
        assert_eq!(store.get_string("general.theme").as_deref(), Some("dark"));
        assert!(store.get_bool("general.hideChat"));
        assert!(!store.get_bool("navigation.enabled"));
        assert!(!store.get_bool("general.smallChatButton"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = SettingsStore::from_toml_str("[general]\nhideAds = \"yes\"\n").err().unwrap();
        assert_eq!(err.to_string(), "setting general.hideAds must be a boolean");
    }

    #[test]
    fn syntax_errors_surface() {
        assert!(matches!(
            SettingsStore::from_toml_str("[general\n"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn listeners_fire_on_change_only() {
        let store = Rc::new(SettingsStore::new());
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let reader = Rc::clone(&store);
        store.on_change(
            "general.theme",
            Box::new(move |value| {
                assert_eq!(reader.get("general.theme").as_ref(), Some(value));
                seen.set(seen.get() + 1);
            }),
        );
        store.set("general.theme", "dark");
        store.set("general.theme", "dark");
        store.set("general.hideAds", true);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn listeners_see_changes_made_by_other_listeners() {
        let store = Rc::new(SettingsStore::new());
        let chat_changes = Rc::new(Cell::new(0));

        let writer = Rc::clone(&store);
        store.on_change(
            "general.hideChat",
            Box::new(move |value| {
                if value.as_bool() == Some(true) {
                    writer.set("general.smallChatButton", false);
                    writer.set("general.hideAds", true);
                }
            }),
        );
        let seen = Rc::clone(&chat_changes);
        store.on_change("general.hideAds", Box::new(move |_| seen.set(seen.get() + 1)));

        store.set("general.hideChat", true);
        assert_eq!(chat_changes.get(), 1);
        assert!(store.get_bool("general.hideAds"));

        store.set("general.hideAds", false);
        assert_eq!(chat_changes.get(), 2);
    }
}
