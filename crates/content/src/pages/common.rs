//! Bootstrap shared by every site page.

use super::{PageError, PageInfo, SessionStorage};
use crate::inject::{InjectDescriptor, PendingInjection, ReactInjector};
use crate::settings::Settings;
use dom_watch::{WatchOptions, Watcher};
use html::{DomError, LiveDom, NodeKey};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::Cell;
use std::rc::Rc;
use url::Url;

pub const SETTINGS_ENTRY_HTML: &str =
    r#"<li><a class="rbx-menu-item btr-settings-toggle">BTR Settings</a></li>"#;
pub const SETTINGS_OPEN_PARAM: &str = "btr_settings_open";
pub const SETTINGS_OPEN_FLAG: &str = "btr-settings-open";

const EXTRA_LINK_HOSTS: &str = r"|twitter\.com|youtube\.com|youtu\.be|twitch\.tv";
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

static SHOPROBLOX_ALTERNATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|[^|]*shoproblox\\.com").unwrap());

/// What the host should do after [`CommonPage::init`].
#[derive(Debug)]
pub struct CommonBoot {
    pub settings_entry: PendingInjection,
    /// Address to put in history with the settings flag removed.
    pub replace_url: Option<String>,
    pub open_settings: bool,
}

pub struct CommonPage {
    watcher: Rc<dyn Watcher>,
    injector: Rc<ReactInjector>,
    settings: Rc<dyn Settings>,
    session: Rc<SessionStorage>,
    // None until the user-data meta tag (or document ready) decides.
    user_id: Rc<Cell<Option<i64>>>,
}

impl CommonPage {
    pub fn new(
        watcher: Rc<dyn Watcher>,
        injector: Rc<ReactInjector>,
        settings: Rc<dyn Settings>,
        session: Rc<SessionStorage>,
    ) -> Self {
        Self {
            watcher,
            injector,
            settings,
            session,
            user_id: Rc::new(Cell::new(None)),
        }
    }

    pub fn init(&self, page: Option<&PageInfo>, url: &str) -> Result<CommonBoot, PageError> {
        let settings_entry = self
            .injector
            .inject(InjectDescriptor::new("#settings-popover-menu", SETTINGS_ENTRY_HTML).at_index(0))?;

        let replace_url = strip_settings_param(url);
        if replace_url.is_some() {
            self.session.set_item(SETTINGS_OPEN_FLAG, "true");
        }
        let open_settings = self.session.get_item(SETTINGS_OPEN_FLAG).is_some();

        self.watch_body(page.map(|p| p.name.clone()))?;

        let user_id = Rc::clone(&self.user_id);
        self.watcher.watch(
            r#"head meta[name="user-data"]"#,
            WatchOptions::once(),
            Box::new(move |dom, meta| {
                let id = parse_user_id(dom.data(meta, "userid"));
                log::debug!(target: "btr.page", "logged in user {id}");
                user_id.set(Some(id));
            }),
        )?;

        Ok(CommonBoot {
            settings_entry,
            replace_url,
            open_settings,
        })
    }

    fn watch_body(&self, page_name: Option<String>) -> Result<(), PageError> {
        let watcher = Rc::clone(&self.watcher);
        let settings = Rc::clone(&self.settings);
        self.watcher.watch(
            "body",
            WatchOptions::once(),
            Box::new(move |dom, body| {
                if let Err(err) = decorate_body(dom, body, settings.as_ref(), page_name.as_deref()) {
                    log::warn!(target: "btr.page", "cannot decorate body: {err}");
                }
                if let Err(err) = watch_body_children(watcher.as_ref(), settings.as_ref()) {
                    log::warn!(target: "btr.page", "body watches failed: {err}");
                }
            }),
        )?;
        Ok(())
    }

    /// The document finished loading; a missing user-data tag means logged out.
    pub fn document_ready(&self) {
        if self.user_id.get().is_none() {
            self.user_id.set(Some(-1));
        }
    }

    pub fn logged_in_user(&self) -> Option<i64> {
        self.user_id.get()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id.get().is_some_and(|id| id != -1)
    }
}

fn decorate_body(
    dom: &mut LiveDom,
    body: NodeKey,
    settings: &dyn Settings,
    page_name: Option<&str>,
) -> Result<(), DomError> {
    dom.toggle_class(body, "btr-no-hamburger", settings.get_bool("navigation.noHamburger"))?;
    dom.toggle_class(body, "btr-hide-ads", settings.get_bool("general.hideAds"))?;
    if let Some(name) = page_name {
        dom.set_data(body, "btrPage", name)?;
    }
    Ok(())
}

fn watch_body_children(watcher: &dyn Watcher, settings: &dyn Settings) -> Result<(), PageError> {
    watcher.watch(
        "body #roblox-linkify",
        WatchOptions::once(),
        Box::new(|dom, linkify| {
            if let Err(err) = patch_linkify(dom, linkify) {
                log::warn!(target: "btr.page", "cannot patch linkify: {err}");
            }
        }),
    )?;

    if settings.get_bool("general.hideChat") {
        watcher.watch(
            "body #chat-container",
            WatchOptions::once(),
            Box::new(|dom, chat| {
                if let Err(err) = dom.remove(chat) {
                    log::warn!(target: "btr.page", "cannot hide chat: {err}");
                }
            }),
        )?;
    } else if settings.get_bool("general.smallChatButton") {
        watcher.watch(
            "body #chat-container",
            WatchOptions::once(),
            Box::new(|dom, chat| {
                if let Err(err) = dom.add_class(chat, "btr-small-chat-button") {
                    log::warn!(target: "btr.page", "cannot shrink chat: {err}");
                }
            }),
        )?;
    }
    Ok(())
}

fn patch_linkify(dom: &mut LiveDom, linkify: NodeKey) -> Result<(), DomError> {
    let regex = dom.data(linkify, "regex").unwrap_or_default();
    let Some(extended) = extend_linkify_regex(regex) else {
        log::warn!(target: "btr.page", "linkify regex is not compatible");
        return Ok(());
    };
    dom.set_data(linkify, "regex", &extended)?;
    // An empty asHttpRegex matches every link.
    if dom.data(linkify, "asHttpRegex").is_none_or(str::is_empty) {
        dom.set_data(linkify, "asHttpRegex", "^$")?;
    }
    Ok(())
}

/// Add the extra video and social hosts before the shop alternative.
pub fn extend_linkify_regex(regex: &str) -> Option<String> {
    let at = SHOPROBLOX_ALTERNATIVE_RE.find(regex)?.start();
    Some(format!("{}{EXTRA_LINK_HOSTS}{}", &regex[..at], &regex[at..]))
}

/// Returns the cleaned address when `url` asks for the settings modal.
pub fn strip_settings_param(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let requested = parsed
        .query_pairs()
        .find(|(key, _)| key.as_ref() == SETTINGS_OPEN_PARAM)
        .is_some_and(|(_, value)| !value.is_empty());
    if !requested {
        return None;
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key.as_ref() != SETTINGS_OPEN_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    Some(parsed.to_string())
}

/// `data-userid` as a safe integer, or -1.
pub fn parse_user_id(raw: Option<&str>) -> i64 {
    raw.and_then(|text| text.trim().parse::<f64>().ok())
        .filter(|id| id.fract() == 0.0 && id.abs() <= MAX_SAFE_INTEGER)
        .map_or(-1, |id| id as i64)
}
