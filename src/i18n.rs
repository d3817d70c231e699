use crate::error::{Result, TdError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const FALLBACK_LANG: &str = "en";

const BUILTIN: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en.json")),
    ("zh", include_str!("../locales/zh.json")),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    AppTitle,
    Loading,
    NoTasks,
    AddTaskPrompt,
    EditTaskPrompt,
    MessageAdded,
    MessageEdited,
    MessageToggled,
    MessageDeleted,
    MessageMoved,
    MessageIndented,
    MessageOutdented,
    MessageNoParent,
    MessageCannotDemoteFirst,
    MessageEmptyLabel,
    ControlsList,
    ControlsAdd,
}

impl Key {
    pub fn as_str(self) -> &'static str {
        match self {
            Key::AppTitle => "appTitle",
            Key::Loading => "loading",
            Key::NoTasks => "noTasks",
            Key::AddTaskPrompt => "addTaskPrompt",
            Key::EditTaskPrompt => "editTaskPrompt",
            Key::MessageAdded => "messageAdded",
            Key::MessageEdited => "messageEdited",
            Key::MessageToggled => "messageToggled",
            Key::MessageDeleted => "messageDeleted",
            Key::MessageMoved => "messageMoved",
            Key::MessageIndented => "messageIndented",
            Key::MessageOutdented => "messageOutdented",
            Key::MessageNoParent => "messageNoParent",
            Key::MessageCannotDemoteFirst => "messageCannotDemoteFirst",
            Key::MessageEmptyLabel => "messageEmptyLabel",
            Key::ControlsList => "controlsList",
            Key::ControlsAdd => "controlsAdd",
        }
    }
}

/// A loaded string table for one language.
#[derive(Debug, Clone)]
pub struct Translations {
    lang: String,
    table: HashMap<String, String>,
}

impl Translations {
    /// Load the table for `lang`.
    ///
    /// Lookup order: `<locales_dir>/<lang>.json`, the built-in table, then
    /// the same two places for the fallback language. A table that exists
    /// but does not parse is an error.
    pub fn load(lang: &str, locales_dir: Option<&Path>) -> Result<Self> {
        if let Some(found) = Self::find(lang, locales_dir)? {
            return Ok(found);
        }
        warn!(lang, "no translations found, falling back to {}", FALLBACK_LANG);
        Self::find(FALLBACK_LANG, locales_dir)?.ok_or_else(|| {
            TdError::Locale(format!("no translations for \"{}\"", FALLBACK_LANG))
        })
    }

    fn find(lang: &str, locales_dir: Option<&Path>) -> Result<Option<Self>> {
        if let Some(dir) = locales_dir {
            let path: PathBuf = dir.join(format!("{}.json", lang));
            if path.is_file() {
                let content = std::fs::read_to_string(&path)?;
                debug!(lang, path = %path.display(), "loading translations");
                return Self::from_json(lang, &content).map(Some);
            }
        }
        BUILTIN
            .iter()
            .find(|(name, _)| *name == lang)
            .map(|(name, content)| Self::from_json(name, content))
            .transpose()
    }

    pub fn from_json(lang: &str, content: &str) -> Result<Self> {
        let table: HashMap<String, String> = serde_json::from_str(content)
            .map_err(|e| TdError::Locale(format!("{}: {}", lang, e)))?;
        Ok(Self {
            lang: lang.to_string(),
            table,
        })
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Look up `key` and substitute each `{name}` placeholder.
    /// Unknown keys render as the key name.
    pub fn translate(&self, key: Key, params: &[(&str, &str)]) -> String {
        let mut text = self
            .table
            .get(key.as_str())
            .cloned()
            .unwrap_or_else(|| key.as_str().to_string());
        for (name, value) in params {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }
}
