use regex::Regex;
use std::sync::LazyLock;

static TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^( *)- \[([ x])\] (.*)$").unwrap());

/// Heading written above a non-empty list.
pub const TITLE: &str = "# TODO";

/// Spaces per nesting level.
pub const INDENT_WIDTH: usize = 2;

const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub label: String,
    pub completed: bool,
    pub level: usize,
}

impl Task {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            completed: false,
            level: 0,
        }
    }

    pub fn checkbox(&self) -> &'static str {
        if self.completed {
            "[x]"
        } else {
            "[ ]"
        }
    }
}

/// Ordered `key: value` lines of a front-matter block.
///
/// Lines are kept verbatim so fields this program does not know about
/// survive a rewrite untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrontMatter {
    lines: Vec<String>,
}

impl FrontMatter {
    pub fn parse(meta: &str) -> Self {
        Self {
            lines: meta.lines().map(str::to_string).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .find_map(|line| match line.split_once(':') {
                Some((k, v)) if k.trim() == key => Some(v.trim()),
                _ => None,
            })
    }

    /// Replace the first `key:` line in place, or append one.
    pub fn set(&mut self, key: &str, value: &str) {
        let entry = format!("{}: {}", key, value);
        let existing = self.lines.iter_mut().find(|line| {
            line.split_once(':')
                .is_some_and(|(k, _)| k.trim() == key)
        });
        match existing {
            Some(line) => *line = entry,
            None => self.lines.push(entry),
        }
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Split a leading `---` block off the document.
/// Returns `(metadata, body)`, or `None` when the document has no closed block.
pub fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

pub fn parse_task_line(line: &str) -> Option<Task> {
    let caps = TASK_RE.captures(line.trim_end_matches('\r'))?;
    let label = caps[3].trim();
    if label.is_empty() {
        return None;
    }
    Some(Task {
        label: label.to_string(),
        completed: &caps[2] == "x",
        level: caps[1].len() / INDENT_WIDTH,
    })
}

/// Parse a document into its tasks. Front matter and any line that is not
/// a checkbox item are skipped.
pub fn parse_tasks(content: &str) -> Vec<Task> {
    let body = match split_front_matter(content) {
        Some((_, body)) => body,
        None => content,
    };
    body.lines().filter_map(parse_task_line).collect()
}

pub fn format_task_line(task: &Task) -> String {
    format!(
        "{}- {} {}",
        " ".repeat(task.level * INDENT_WIDTH),
        task.checkbox(),
        task.label
    )
}

/// Render the document body. An empty list renders as an empty body.
pub fn format_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = tasks.iter().map(format_task_line).collect();
    format!("{}\n\n{}\n", TITLE, lines.join("\n"))
}
