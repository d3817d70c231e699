use crate::error::{Result, TdError};
use crate::i18n::{Key, Translations};
use crate::parser::Task;
use crate::writeback::WriteBack;
use crate::writer;

use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Loading,
    List,
    Add,
    Edit,
    /// Terminal: entered on a load or write-back failure and never left.
    Error,
}

/// Owner of the task list and the interaction state around it.
///
/// Every mutation queues a snapshot on the write-back worker. A failed
/// write moves the store into [`Mode::Error`].
pub struct Store {
    tasks: Vec<Task>,
    selected: usize,
    mode: Mode,
    input: String,
    message: Option<String>,
    file_path: PathBuf,
    locales_dir: Option<PathBuf>,
    translations: Option<Translations>,
    writeback: Option<WriteBack>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            selected: 0,
            mode: Mode::Loading,
            input: String::new(),
            message: None,
            file_path: PathBuf::new(),
            locales_dir: None,
            translations: None,
            writeback: None,
        }
    }

    pub fn with_locales_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.locales_dir = dir;
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.tasks.get(self.selected)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn translate(&self, key: Key, params: &[(&str, &str)]) -> String {
        match &self.translations {
            Some(translations) => translations.translate(key, params),
            None => key.as_str().to_string(),
        }
    }

    pub fn t(&self, key: Key) -> String {
        self.translate(key, &[])
    }

    /// Load translations and the task file, then enter [`Mode::List`].
    /// Any failure lands in [`Mode::Error`] with the failure as the message.
    pub fn init(&mut self, lang: &str, file_path: &Path) {
        if self.mode != Mode::Loading {
            return;
        }
        match self.load(lang, file_path) {
            Ok(()) => info!(
                lang,
                path = %self.file_path.display(),
                count = self.tasks.len(),
                "store ready"
            ),
            Err(e) => self.fail(&e),
        }
    }

    fn load(&mut self, lang: &str, file_path: &Path) -> Result<()> {
        let translations = Translations::load(lang, self.locales_dir.as_deref())?;
        debug!(requested = lang, resolved = translations.lang(), "translations loaded");
        let path = writer::resolve_path(file_path)?;
        let tasks = writer::read_tasks(&path)?;

        self.translations = Some(translations);
        self.tasks = tasks;
        self.selected = 0;
        self.writeback = Some(WriteBack::spawn(path.clone()));
        self.file_path = path;
        self.mode = Mode::List;
        Ok(())
    }

    /// Switch modes. Pre-filling the input for [`Mode::Edit`] is up to the
    /// caller. [`Mode::Error`] is never left.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == Mode::Error {
            return;
        }
        self.mode = mode;
    }

    pub fn set_input_value(&mut self, value: impl Into<String>) {
        self.input = value.into();
    }

    /// Drop the status line. The error text stays up in [`Mode::Error`].
    pub fn clear_message(&mut self) {
        if self.mode != Mode::Error {
            self.message = None;
        }
    }

    /// Point the selection at `index`. Returns `false` when out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if self.mode != Mode::List || index >= self.tasks.len() {
            return false;
        }
        self.selected = index;
        true
    }

    pub fn move_up(&mut self) {
        if self.mode != Mode::List || self.tasks.is_empty() {
            return;
        }
        let len = self.tasks.len();
        self.selected = (self.selected + len - 1) % len;
    }

    pub fn move_down(&mut self) {
        if self.mode != Mode::List || self.tasks.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.tasks.len();
    }

    pub fn move_task_up(&mut self) {
        if self.mode != Mode::List || self.tasks.len() < 2 || self.selected == 0 {
            return;
        }
        self.tasks.swap(self.selected, self.selected - 1);
        self.selected -= 1;
        self.announce_selected(Key::MessageMoved);
        self.persist();
    }

    pub fn move_task_down(&mut self) {
        if self.mode != Mode::List || self.selected + 1 >= self.tasks.len() {
            return;
        }
        self.tasks.swap(self.selected, self.selected + 1);
        self.selected += 1;
        self.announce_selected(Key::MessageMoved);
        self.persist();
    }

    /// Outdent: take the level of the nearest earlier task that sits
    /// shallower than the selected one.
    pub fn indent_promote(&mut self) {
        if self.mode != Mode::List {
            return;
        }
        let Some(current) = self.tasks.get(self.selected) else {
            return;
        };
        let level = current.level;
        let parent_level = self.tasks[..self.selected]
            .iter()
            .rev()
            .find(|task| task.level < level)
            .map(|task| task.level);

        match parent_level {
            Some(new_level) => {
                self.tasks[self.selected].level = new_level;
                self.announce_selected(Key::MessageOutdented);
                self.persist();
            }
            None => self.announce_selected(Key::MessageNoParent),
        }
    }

    /// Indent relative to the task above.
    ///
    /// A top-level task becomes a child of its predecessor. An already
    /// indented task moves to the predecessor's level when that is
    /// shallower, otherwise one level up.
    pub fn indent_demote(&mut self) {
        if self.mode != Mode::List || self.tasks.is_empty() {
            return;
        }
        if self.selected == 0 {
            self.message = Some(self.t(Key::MessageCannotDemoteFirst));
            return;
        }
        let previous = self.tasks[self.selected - 1].level;
        let current = self.tasks[self.selected].level;
        let new_level = if current == 0 {
            previous + 1
        } else if previous < current {
            previous
        } else {
            current - 1
        };

        self.tasks[self.selected].level = new_level;
        self.announce_selected(Key::MessageIndented);
        self.persist();
    }

    /// Commit the input buffer: rename the selected task in
    /// [`Mode::Edit`], append a new one in [`Mode::Add`]. Always returns to
    /// [`Mode::List`] with an empty buffer.
    pub fn add_task(&mut self) {
        let editing = match self.mode {
            Mode::Edit => true,
            Mode::Add => false,
            Mode::Loading | Mode::List | Mode::Error => return,
        };
        let label = single_line(&std::mem::take(&mut self.input));
        self.mode = Mode::List;

        if label.is_empty() {
            self.message = Some(self.t(Key::MessageEmptyLabel));
            return;
        }

        if editing {
            let Some(task) = self.tasks.get_mut(self.selected) else {
                return;
            };
            task.label = label;
            self.announce_selected(Key::MessageEdited);
        } else {
            self.tasks.push(Task::new(label));
            let index = self.tasks.len() - 1;
            self.announce(Key::MessageAdded, index);
        }
        self.persist();
    }

    pub fn toggle_task(&mut self) {
        if self.mode != Mode::List {
            return;
        }
        let Some(task) = self.tasks.get_mut(self.selected) else {
            return;
        };
        task.completed = !task.completed;
        self.announce_selected(Key::MessageToggled);
        self.persist();
    }

    pub fn delete_task(&mut self) {
        if self.mode != Mode::List || self.selected >= self.tasks.len() {
            return;
        }
        let removed = self.tasks.remove(self.selected);
        if self.selected >= self.tasks.len() && !self.tasks.is_empty() {
            self.selected = self.tasks.len() - 1;
        }
        self.message = Some(
            self.translate(Key::MessageDeleted, &[("task", removed.label.as_str())]),
        );
        self.persist();
    }

    /// Rename the selected task directly, outside the input flow.
    pub fn edit_task(&mut self, new_label: &str) {
        if matches!(self.mode, Mode::Loading | Mode::Error) {
            return;
        }
        let new_label = single_line(new_label);
        if new_label.is_empty() {
            return;
        }
        let Some(task) = self.tasks.get_mut(self.selected) else {
            return;
        };
        task.label = new_label;
        self.announce_selected(Key::MessageEdited);
        self.persist();
    }

    /// Pick up finished write-backs. Call once per loop iteration.
    pub fn poll_writeback(&mut self) {
        let result = match self.writeback.as_mut() {
            Some(writeback) => writeback.poll(),
            None => Ok(()),
        };
        if let Err(e) = result {
            self.fail(&e);
        }
    }

    /// Wait for every queued write-back.
    pub fn flush(&mut self) -> Result<()> {
        let result = match self.writeback.as_mut() {
            Some(writeback) => writeback.flush(),
            None => Ok(()),
        };
        if let Err(e) = &result {
            self.fail(e);
        }
        result
    }

    /// Flush pending writes and stop the worker.
    pub fn shutdown(mut self) -> Result<()> {
        match self.writeback.take() {
            Some(writeback) => writeback.shutdown(),
            None => Ok(()),
        }
    }

    fn persist(&mut self) {
        let result = match self.writeback.as_mut() {
            Some(writeback) => writeback.submit(self.tasks.clone()),
            None => Err(TdError::WorkerGone),
        };
        if let Err(e) = result {
            self.fail(&e);
        }
    }

    fn announce(&mut self, key: Key, index: usize) {
        if let Some(task) = self.tasks.get(index) {
            self.message = Some(self.translate(key, &[("task", task.label.as_str())]));
        }
    }

    fn announce_selected(&mut self, key: Key) {
        self.announce(key, self.selected);
    }

    fn fail(&mut self, err: &TdError) {
        error!("{}", err);
        self.mode = Mode::Error;
        self.input.clear();
        self.message = Some(err.to_string());
    }
}

/// Collapse `raw` onto one line: each line is trimmed and the non-empty
/// ones are joined with a space. A task occupies exactly one file line.
fn single_line(raw: &str) -> String {
    raw.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
