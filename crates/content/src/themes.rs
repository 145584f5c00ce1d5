use crate::settings::Settings;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub const DEFAULT_THEME: &str = "default";

/// Where stylesheet paths get attached to and detached from the page.
pub trait StyleHost {
    fn inject_css(&self, paths: &[String]);
    fn remove_css(&self, paths: &[String]);
}

/// [`StyleHost`] that only tracks which sheets are attached, in order.
#[derive(Debug, Default)]
pub struct ActiveStyles {
    sheets: RefCell<Vec<String>>,
}

impl ActiveStyles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> Vec<String> {
        self.sheets.borrow().clone()
    }
}

impl StyleHost for ActiveStyles {
    fn inject_css(&self, paths: &[String]) {
        let mut sheets = self.sheets.borrow_mut();
        for path in paths {
            if !sheets.contains(path) {
                sheets.push(path.clone());
            }
        }
    }

    fn remove_css(&self, paths: &[String]) {
        self.sheets.borrow_mut().retain(|s| !paths.contains(s));
    }
}

pub struct ThemeManager {
    host: Rc<dyn StyleHost>,
    css_files: RefCell<Vec<String>>,
    theme_styles: RefCell<Vec<String>>,
}

impl ThemeManager {
    pub fn new(host: Rc<dyn StyleHost>) -> Rc<Self> {
        Rc::new(Self {
            host,
            css_files: RefCell::new(vec!["main.css".to_string()]),
            theme_styles: RefCell::new(Vec::new()),
        })
    }

    /// Attach the base sheets, apply the configured theme and follow
    /// changes to `general.theme`.
    pub fn init(self: &Rc<Self>, page_css: &[String], settings: &dyn Settings) {
        self.css_files.borrow_mut().extend(page_css.iter().cloned());
        let base: Vec<String> = self
            .css_files
            .borrow()
            .iter()
            .map(|file| format!("css/{file}"))
            .collect();
        self.host.inject_css(&base);

        self.set_theme(DEFAULT_THEME);
        if let Some(theme) = settings.get_string("general.theme") {
            self.set_theme(&theme);
        }

        let this: Weak<Self> = Rc::downgrade(self);
        settings.on_change(
            "general.theme",
            Box::new(move |value| {
                let (Some(manager), Some(theme)) = (this.upgrade(), value.as_str()) else {
                    return;
                };
                manager.set_theme(theme);
            }),
        );
    }

    pub fn set_theme(&self, theme: &str) {
        let old = std::mem::take(&mut *self.theme_styles.borrow_mut());
        self.host.remove_css(&old);

        let styles: Vec<String> = if theme == DEFAULT_THEME {
            Vec::new()
        } else {
            self.css_files
                .borrow()
                .iter()
                .map(|file| format!("css/{theme}/{file}"))
                .collect()
        };
        log::debug!(target: "btr.themes", "theme {theme:?}: {} sheet(s)", styles.len());
        self.host.inject_css(&styles);
        *self.theme_styles.borrow_mut() = styles;
    }

    pub fn css_files(&self) -> Vec<String> {
        self.css_files.borrow().clone()
    }

    pub fn theme_styles(&self) -> Vec<String> {
        self.theme_styles.borrow().clone()
    }
}
