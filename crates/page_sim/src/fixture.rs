use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A recorded page: markup, address, settings and the expected result.
///
/// ```toml
/// page = "home"
/// url = "https://www.roblox.com/home"
/// settings = """
/// [general]
/// hideChat = true
/// """
/// html = "<html>...</html>"
/// expected = """
/// #document
///   <html>
/// """
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageFixture {
    pub page: String,
    pub url: String,
    #[serde(default)]
    pub css: Vec<String>,
    /// Settings TOML; empty means defaults.
    #[serde(default)]
    pub settings: String,
    pub html: String,
    /// DOM outline after bootstrapping, one node per line.
    #[serde(default)]
    pub expected: String,
}

impl PageFixture {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn expected_lines(&self) -> Vec<String> {
        self.expected
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load `fixtures/<name>.toml`, panicking with the path on any problem.
pub fn load_fixture(name: &str) -> PageFixture {
    let path = fixtures_dir().join(format!("{name}.toml"));
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read fixture {path:?}: {err}"));
    let fixture = PageFixture::from_toml_str(&content)
        .unwrap_or_else(|err| panic!("invalid fixture {path:?}: {err}"));
    assert!(
        !fixture.html.trim().is_empty(),
        "fixture {path:?} has no html"
    );
    fixture
}
