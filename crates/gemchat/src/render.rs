//! Terminal rendering of chat messages.
//!
//! The message text is never modified before it gets here. This module
//! understands the subset of markdown the bot tends to produce: headings,
//! bullet and numbered lists, bold, inline code and links, and fenced code
//! blocks with a language tag. Anything else passes through as is.

use chrono::Local;
use gemchat_core::{Message, Sender};
use owo_colors::OwoColorize;

const BAR_CHAR: &str = "▎";
const FENCE: &str = "```";

/// Highlighting theme of a fenced code block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodeTheme {
    /// Rust.
    Rust,
    /// Python.
    Python,
    /// JavaScript and TypeScript.
    JavaScript,
    /// POSIX shells.
    Shell,
    /// JSON.
    Json,
    /// No highlighting, for unknown or missing tags.
    Plain,
}

impl CodeTheme {
    /// Selects the theme for a fence's language tag.
    ///
    /// Only the first word of the tag is considered, case-insensitively.
    pub fn for_language(tag: &str) -> Self {
        let lang = tag.split_whitespace().next().unwrap_or_default();
        match lang.to_ascii_lowercase().as_str() {
            "rust" | "rs" => CodeTheme::Rust,
            "python" | "py" => CodeTheme::Python,
            "javascript" | "js" | "typescript" | "ts" | "jsx" | "tsx" => {
                CodeTheme::JavaScript
            }
            "sh" | "bash" | "shell" | "zsh" | "console" => CodeTheme::Shell,
            "json" => CodeTheme::Json,
            _ => CodeTheme::Plain,
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            CodeTheme::Rust => &[
                "as", "async", "await", "break", "const", "continue", "crate",
                "else", "enum", "false", "fn", "for", "if", "impl", "in",
                "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
                "return", "self", "Self", "static", "struct", "super",
                "trait", "true", "type", "unsafe", "use", "where", "while",
            ],
            CodeTheme::Python => &[
                "and", "as", "assert", "async", "await", "break", "class",
                "continue", "def", "elif", "else", "except", "False",
                "finally", "for", "from", "if", "import", "in", "is",
                "lambda", "None", "not", "or", "pass", "raise", "return",
                "True", "try", "while", "with", "yield",
            ],
            CodeTheme::JavaScript => &[
                "async", "await", "break", "case", "class", "const",
                "continue", "default", "else", "export", "extends", "false",
                "for", "function", "if", "import", "interface", "let", "new",
                "null", "return", "switch", "this", "throw", "true", "try",
                "type", "undefined", "var", "while",
            ],
            CodeTheme::Shell => &[
                "case", "do", "done", "echo", "elif", "else", "esac",
                "export", "fi", "for", "function", "if", "in", "local",
                "then", "while",
            ],
            CodeTheme::Json => &["true", "false", "null"],
            CodeTheme::Plain => &[],
        }
    }

    fn line_comment(self) -> Option<&'static str> {
        match self {
            CodeTheme::Rust | CodeTheme::JavaScript => Some("//"),
            CodeTheme::Python | CodeTheme::Shell => Some("#"),
            CodeTheme::Json | CodeTheme::Plain => None,
        }
    }

    fn block_comment(self) -> Option<(&'static str, &'static str)> {
        match self {
            CodeTheme::Rust | CodeTheme::JavaScript => Some(("/*", "*/")),
            _ => None,
        }
    }

    /// String delimiters, longest first, and whether the string may span
    /// several lines.
    fn string_delimiters(self) -> &'static [(&'static str, bool)] {
        match self {
            CodeTheme::Rust => &[("\"", true)],
            CodeTheme::Python => &[
                ("\"\"\"", true),
                ("'''", true),
                ("\"", false),
                ("'", false),
            ],
            CodeTheme::JavaScript => {
                &[("`", true), ("\"", false), ("'", false)]
            }
            CodeTheme::Shell => &[("\"", true), ("'", true)],
            CodeTheme::Json => &[("\"", false)],
            CodeTheme::Plain => &[],
        }
    }
}

/// A construct that may continue on the next line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Region {
    Comment { close: &'static str },
    Str { close: &'static str, multiline: bool },
}

impl Region {
    fn paint(self, text: &str) -> String {
        match self {
            Region::Comment { .. } => text.dimmed().to_string(),
            Region::Str { .. } => text.green().to_string(),
        }
    }
}

/// Highlights the lines of one code block, in order.
///
/// Block comments and multi-line strings carry over from one line to the
/// next, so a block must go through a single highlighter.
#[derive(Debug)]
pub struct Highlighter {
    theme: CodeTheme,
    open: Option<Region>,
}

impl Highlighter {
    /// Creates a highlighter at the start of a block.
    #[inline]
    pub fn new(theme: CodeTheme) -> Self {
        Self { theme, open: None }
    }

    /// Highlights the next line of the block.
    pub fn line(&mut self, line: &str) -> String {
        if self.theme == CodeTheme::Plain {
            return line.to_owned();
        }

        let mut out = String::with_capacity(line.len() * 2);
        let mut rest = line;
        if let Some(region) = self.open.take() {
            let len = self.scan_region(region, rest);
            let text = &rest[..len];
            out.push_str(&region.paint(text));
            rest = &rest[len..];
        }

        let keywords = self.theme.keywords();
        while let Some(ch) = rest.chars().next() {
            if let Some(prefix) = self.theme.line_comment() {
                if rest.starts_with(prefix) {
                    out.push_str(&rest.dimmed().to_string());
                    break;
                }
            }

            let opened = self.open_region(rest);
            let consumed = if let Some((region, open_len)) = opened {
                let len =
                    open_len + self.scan_region(region, &rest[open_len..]);
                let text = &rest[..len];
                out.push_str(&region.paint(text));
                len
            } else if ch.is_ascii_digit() {
                let len = token_len(rest, |c| {
                    c.is_ascii_alphanumeric() || c == '.' || c == '_'
                });
                let number = &rest[..len];
                out.push_str(&number.yellow().to_string());
                len
            } else if is_ident_char(ch) {
                let len = token_len(rest, is_ident_char);
                let word = &rest[..len];
                if keywords.contains(&word) {
                    out.push_str(&word.magenta().bold().to_string());
                } else {
                    out.push_str(word);
                }
                len
            } else {
                out.push(ch);
                ch.len_utf8()
            };
            rest = &rest[consumed..];
        }
        out
    }

    /// Returns the region opening at the start of `s` and the length of
    /// its opening delimiter.
    fn open_region(&self, s: &str) -> Option<(Region, usize)> {
        if let Some((open, close)) = self.theme.block_comment() {
            if s.starts_with(open) {
                return Some((Region::Comment { close }, open.len()));
            }
        }
        self.theme
            .string_delimiters()
            .iter()
            .find(|(delim, _)| s.starts_with(delim))
            .map(|&(delim, multiline)| {
                (
                    Region::Str {
                        close: delim,
                        multiline,
                    },
                    delim.len(),
                )
            })
    }

    /// Returns how much of `s` belongs to `region`. If the region doesn't
    /// close on this line and may span lines, it stays open.
    fn scan_region(&mut self, region: Region, s: &str) -> usize {
        let (close, escapes, multiline) = match region {
            Region::Comment { close } => (close, false, true),
            Region::Str { close, multiline } => (close, true, multiline),
        };
        if let Some(len) = region_end(s, close, escapes) {
            return len;
        }
        if multiline {
            self.open = Some(region);
        }
        s.len()
    }
}

#[inline]
fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn token_len(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.char_indices()
        .find(|&(_, c)| !pred(c))
        .map_or(s.len(), |(idx, _)| idx)
}

/// Offset just past the first unescaped `close` in `s`.
fn region_end(s: &str, close: &str, escapes: bool) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if escapes && c == '\\' {
            escaped = true;
        } else if s[idx..].starts_with(close) {
            return Some(idx + close.len());
        }
    }
    None
}

/// Renders markdown text for the terminal, one output line per input
/// line.
pub fn render_markdown(text: &str) -> String {
    let mut lines = Vec::new();
    let mut code: Option<Highlighter> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(tag) = trimmed.strip_prefix(FENCE) {
            if code.take().is_none() {
                let tag = tag.trim();
                code = Some(Highlighter::new(CodeTheme::for_language(tag)));
                let label = if tag.is_empty() { "code" } else { tag };
                lines.push(format!("{}", label.dimmed().italic()));
            }
            continue;
        }

        let rendered = match &mut code {
            Some(highlighter) => format!("  {}", highlighter.line(line)),
            None => render_line(line),
        };
        lines.push(rendered);
    }
    lines.join("\n")
}

fn render_line(line: &str) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    let heading = trimmed.trim_start_matches('#');
    let level = trimmed.len() - heading.len();
    if (1..=6).contains(&level) && heading.starts_with(' ') {
        let heading = render_inline(heading.trim());
        return format!("{indent}{}", heading.bold().underline());
    }

    for marker in ["- ", "* ", "+ "] {
        if let Some(item) = trimmed.strip_prefix(marker) {
            return format!("{indent}{} {}", "•".cyan(), render_inline(item));
        }
    }

    let digits = token_len(trimmed, |c| c.is_ascii_digit());
    if digits > 0 {
        let after = &trimmed[digits..];
        let item =
            after.strip_prefix(". ").or_else(|| after.strip_prefix(") "));
        if let Some(item) = item {
            let number = &trimmed[..digits + 1];
            return format!("{indent}{} {}", number.cyan(), render_inline(item));
        }
    }

    format!("{indent}{}", render_inline(trimmed))
}

/// Renders `**bold**`, `` `code` `` and `[text](url)` spans. Unmatched
/// markers are left untouched.
fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let next = [
            ("**", rest.find("**")),
            ("`", rest.find('`')),
            ("[", rest.find('[')),
        ]
        .into_iter()
        .filter_map(|(marker, start)| Some((start?, marker)))
        .min_by_key(|&(start, _)| start);
        let Some((start, marker)) = next else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        if marker == "[" {
            let Some((label, url, len)) = parse_link(rest) else {
                out.push('[');
                rest = &rest[1..];
                continue;
            };
            let url = format!("({url})");
            out.push_str(&label.underline().to_string());
            out.push(' ');
            out.push_str(&url.dimmed().to_string());
            rest = &rest[len..];
            continue;
        }

        let body = &rest[marker.len()..];
        let Some(len) = body.find(marker) else {
            out.push_str(marker);
            rest = body;
            continue;
        };
        let inner = &body[..len];
        if marker == "`" {
            out.push_str(&inner.bright_yellow().to_string());
        } else {
            out.push_str(&inner.bold().to_string());
        }
        rest = &body[len + marker.len()..];
    }
    out.push_str(rest);
    out
}

/// Parses `[label](url)` at the start of `s`, returning the label, the URL
/// and the length of the whole link.
fn parse_link(s: &str) -> Option<(&str, &str, usize)> {
    let label_end = s.find("](")?;
    let label = &s[1..label_end];
    if label.contains('[') {
        return None;
    }
    let url_start = label_end + 2;
    let url_len = s[url_start..].find(')')?;
    let url = &s[url_start..url_start + url_len];
    Some((label, url, url_start + url_len + 1))
}

/// Renders a message with its sender label and local `HH:MM` time.
pub fn render_message(msg: &Message) -> String {
    let time = msg.timestamp().with_timezone(&Local).format("%H:%M");
    let (bar, label) = match msg.sender() {
        Sender::User => (
            BAR_CHAR.bright_green().to_string(),
            "You".bright_green().bold().to_string(),
        ),
        Sender::Bot => (
            BAR_CHAR.bright_cyan().to_string(),
            "Bot".bright_cyan().bold().to_string(),
        ),
    };

    let mut out = format!("{bar}{label} {}", time.dimmed());
    for line in render_markdown(msg.text()).lines() {
        out.push('\n');
        out.push_str(&bar);
        out.push_str(line);
    }
    out
}
