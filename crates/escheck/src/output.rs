//! Collected rule reports and their renderings

use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::BTreeMap;

/// Path under which whole-run (exit) rules report.
pub const EXIT_PATH: &str = "*";

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    /// Like text, written to stderr
    Stderr,
    Json,
    Html,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "stderr" => Some(Self::Stderr),
            "json" => Some(Self::Json),
            "html" => Some(Self::Html),
            _ => None,
        }
    }

    /// File name used when the rendering is written to the output directory.
    pub fn file_name(&self) -> Option<&'static str> {
        match self {
            Self::Json => Some("report.json"),
            Self::Html => Some("index.html"),
            Self::Text | Self::Stderr => None,
        }
    }
}

/// Top-level grouping of reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupBy {
    #[default]
    File,
    Rule,
}

impl GroupBy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "file" => Some(Self::File),
            "rule" => Some(Self::Rule),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
struct FileReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    rules: BTreeMap<String, Vec<String>>,
}

/// Messages by page path, then by rule.
#[derive(Debug, Default, Clone)]
pub struct Reports {
    files: BTreeMap<String, FileReport>,
}

/// `outer key -> inner key -> messages`, in either grouping.
pub type Grouped<'a> = BTreeMap<&'a str, BTreeMap<&'a str, &'a [String]>>;

impl Reports {
    pub fn add(&mut self, path: &str, title: Option<&str>, rule: &str, messages: Vec<String>) {
        if messages.is_empty() {
            return;
        }
        let file = self.files.entry(path.to_string()).or_default();
        if file.title.is_none() {
            file.title = title.map(str::to_string);
        }
        file.rules
            .entry(rule.to_string())
            .or_default()
            .extend(messages);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of paths with at least one message.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Total number of messages.
    pub fn message_count(&self) -> usize {
        self.files
            .values()
            .flat_map(|file| file.rules.values())
            .map(Vec::len)
            .sum()
    }

    pub fn messages(&self, path: &str, rule: &str) -> &[String] {
        self.files
            .get(path)
            .and_then(|file| file.rules.get(rule))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn title(&self, path: &str) -> Option<&str> {
        self.files.get(path)?.title.as_deref()
    }

    pub fn grouped(&self, by: GroupBy) -> Grouped<'_> {
        let mut grouped: Grouped<'_> = BTreeMap::new();
        for (path, file) in &self.files {
            for (rule, messages) in &file.rules {
                let (outer, inner) = match by {
                    GroupBy::File => (path.as_str(), rule.as_str()),
                    GroupBy::Rule => (rule.as_str(), path.as_str()),
                };
                grouped
                    .entry(outer)
                    .or_default()
                    .insert(inner, messages.as_slice());
            }
        }
        grouped
    }
}

/// Render reports in the specified format
pub fn render_report(reports: &Reports, format: OutputFormat, by: GroupBy) -> String {
    match format {
        OutputFormat::Text | OutputFormat::Stderr => render_text(reports, by),
        OutputFormat::Json => render_json(reports, by),
        OutputFormat::Html => render_html(reports, by),
    }
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}\n", prefix, line))
        .collect()
}

fn render_text(reports: &Reports, by: GroupBy) -> String {
    let mut output = String::new();

    if reports.is_empty() {
        output.push_str(&format!("{} No issues found\n", "OK".green().bold()));
        return output;
    }

    for (outer, inner) in reports.grouped(by) {
        output.push_str(&format!("{}\n", outer.cyan().bold()));
        for (key, messages) in inner {
            output.push_str(&format!("  {}\n", key.yellow()));
            for message in messages {
                let (first, rest) = message.split_once('\n').unwrap_or((message, ""));
                output.push_str(&format!("    {} {}\n", "-".red(), first));
                output.push_str(&indent(rest, "      "));
            }
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "{} {} issues in {} files\n",
        "!".red().bold(),
        reports.message_count().to_string().red(),
        reports.len()
    ));
    output
}

fn render_json(reports: &Reports, by: GroupBy) -> String {
    let json = match by {
        GroupBy::File => serde_json::to_string_pretty(&reports.files),
        GroupBy::Rule => serde_json::to_string_pretty(&reports.grouped(by)),
    };
    json.expect("JSON serialization failed")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_html(reports: &Reports, by: GroupBy) -> String {
    let mut output = String::new();

    output.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    output.push_str("<meta charset=\"utf-8\">\n");
    output.push_str("<title>escheck report</title>\n");
    output.push_str("<style>\n");
    output.push_str("body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }\n");
    output.push_str("summary { cursor: pointer; }\n");
    output.push_str("details details { margin-left: 1.5rem; }\n");
    output.push_str("pre { background: #f0f0f0; padding: 0.4em 0.6em; border-radius: 3px; white-space: pre-wrap; }\n");
    output.push_str(".count { color: #888; }\n");
    output.push_str("</style>\n");
    output.push_str("</head>\n<body>\n");

    output.push_str("<h1>escheck report</h1>\n");
    output.push_str(&format!(
        "<p><strong>{}</strong> issues in <strong>{}</strong> files</p>\n",
        reports.message_count(),
        reports.len()
    ));

    for (outer, inner) in reports.grouped(by) {
        let count: usize = inner.values().map(|m| m.len()).sum();
        let label = match (by, reports.title(outer)) {
            (GroupBy::File, Some(title)) => format!(
                "<code>{}</code> {}",
                escape_html(outer),
                escape_html(title)
            ),
            _ => format!("<code>{}</code>", escape_html(outer)),
        };
        output.push_str(&format!(
            "<details>\n<summary>{} <span class=\"count\">({})</span></summary>\n",
            label, count
        ));
        for (key, messages) in inner {
            output.push_str(&format!(
                "<details open>\n<summary><code>{}</code></summary>\n",
                escape_html(key)
            ));
            for message in messages {
                output.push_str(&format!("<pre>{}</pre>\n", escape_html(message)));
            }
            output.push_str("</details>\n");
        }
        output.push_str("</details>\n");
    }

    output.push_str("</body>\n</html>\n");
    output
}
