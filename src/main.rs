//! Boot the content script against a recorded page and print the result.
//!
//! ```text
//! RUST_LOG=btr=debug btroblox crates/page_sim/fixtures/home.toml
//! ```

use bus::Bus;
use content::pages::{CommonPage, PageInfo, SessionStorage};
use content::{ActiveStyles, ReactInjector, SettingsStore, ThemeManager};
use core_types::Counter;
use dom_watch::DomWatcher;
use html::LiveDom;
use html::dom_utils::outline_from_dom;
use page_sim::{PageFixture, PageRealm, diff_lines};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::{env, fs};

const OUTLINE_CAP: usize = 500;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let Some(path) = env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: btroblox <fixture.toml>");
        return ExitCode::from(2);
    };
    match run(&path) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{}: {err}", path.display());
            ExitCode::from(2)
        }
    }
}

// Ok(false) when the fixture has an expected outline and it differs.
fn run(path: &Path) -> Result<bool, Box<dyn Error>> {
    let fixture = PageFixture::from_toml_str(&fs::read_to_string(path)?)?;
    let settings = Rc::new(SettingsStore::from_toml_str(&fixture.settings)?);

    let bus = Bus::new();
    let watcher = Rc::new(DomWatcher::new());
    let injector = Rc::new(ReactInjector::new(
        watcher.clone(),
        Rc::new(bus.boundary()),
        Rc::new(Counter::new()),
    ));
    let page = CommonPage::new(
        watcher.clone(),
        injector,
        settings.clone(),
        Rc::new(SessionStorage::new()),
    );
    let info = PageInfo {
        name: fixture.page.clone(),
        css: fixture.css.clone(),
    };

    let mut dom = LiveDom::parse(&fixture.html);
    let boot = page.init(Some(&info), &fixture.url)?;
    let styles = Rc::new(ActiveStyles::new());
    let themes = ThemeManager::new(styles.clone());
    themes.init(&info.css, settings.as_ref());

    let mut realm = PageRealm::new();
    loop {
        let inserted = realm.pump(&bus, &mut dom);
        let fired = watcher.flush(&mut dom);
        log::debug!(target: "btr.page", "pump: {inserted} inserted, {fired} fired");
        if inserted == 0 && fired == 0 {
            break;
        }
    }
    page.document_ready();

    let outline = outline_from_dom(&dom.materialize(dom.root())?, OUTLINE_CAP);
    for line in &outline {
        println!("{line}");
    }
    println!();
    println!("user: {}", page.logged_in_user().unwrap_or(-1));
    if let Some(url) = &boot.replace_url {
        println!("replace url: {url}");
    }
    println!("settings open: {}", boot.open_settings);
    println!("pending watches: {}", watcher.len());
    for sheet in styles.sheets() {
        println!("css: {sheet}");
    }

    let expected = fixture.expected_lines();
    if expected.is_empty() || expected == outline {
        return Ok(true);
    }
    eprintln!("{}", diff_lines(&expected, &outline));
    Ok(false)
}
