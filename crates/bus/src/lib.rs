use core_types::ElemId;
use selector::CompiledSelector;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::mpsc::{self, Receiver, Sender};

/// Requests sent from the content script to code running in the page realm.
///
/// Serialised as `{"action": "reactInject", "data": {..}}`. Nothing crosses
/// the boundary except this JSON text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum PageCommand {
    // Injection coordinator -> page realm
    #[serde(rename = "reactInject")]
    ReactInject(InjectRequest),
    // Linkify the element carrying this marker class
    #[serde(rename = "linkify")]
    Linkify(String),
}

impl PageCommand {
    pub fn action(&self) -> &'static str {
        match self {
            PageCommand::ReactInject(_) => "reactInject",
            PageCommand::Linkify(_) => "linkify",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectRequest {
    pub selector: CompiledSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<InsertIndex>,
    /// Lowercase tag of the placeholder the page realm should create.
    pub elem_type: String,
    pub elem_id: ElemId,
    /// Caller fields forwarded untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where among the anchor's children the placeholder goes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertIndex {
    Position(i64),
    Matching(IndexSelector),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexSelector {
    pub selector: CompiledSelector,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fire-and-forget channel into the page realm.
pub trait Boundary {
    fn send(&self, command: PageCommand);
}

/// [`Boundary`] over an mpsc channel of JSON strings.
#[derive(Clone)]
pub struct ChannelBoundary {
    tx: Sender<String>,
}

impl ChannelBoundary {
    pub fn new(tx: Sender<String>) -> Self {
        Self { tx }
    }
}

impl Boundary for ChannelBoundary {
    fn send(&self, command: PageCommand) {
        let json = match serde_json::to_string(&command) {
            Ok(json) => json,
            Err(err) => {
                log::warn!(target: "btr.bus", "dropping {}: {err}", command.action());
                return;
            }
        };
        log::debug!(target: "btr.bus", "send {json}");
        if self.tx.send(json).is_err() {
            log::warn!(target: "btr.bus", "page realm disconnected; dropped {}", command.action());
        }
    }
}

pub fn encode_command(command: &PageCommand) -> Result<String, serde_json::Error> {
    serde_json::to_string(command)
}

pub fn decode_command(json: &str) -> Result<PageCommand, serde_json::Error> {
    serde_json::from_str(json)
}

pub struct Bus {
    pub cmd_tx: Sender<String>,
    pub cmd_rx: Receiver<String>,
}

impl Bus {
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        Self { cmd_tx, cmd_rx }
    }

    pub fn boundary(&self) -> ChannelBoundary {
        ChannelBoundary::new(self.cmd_tx.clone())
    }

    /// Everything sent so far, without blocking.
    pub fn drain(&self) -> Vec<String> {
        self.cmd_rx.try_iter().collect()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
