// In-process rich-text widget.
//
// The document is a flat run of styled characters. A '\n' separates two
// paragraphs and never carries a style. Offsets in selections are character
// offsets into that run.
//
// Two serializations are offered:
// - `get_html` writes the small HTML subset drafts are stored in
//   (<p>, <strong>, <em>, <u>); `set_content` reads it back, also accepting
//   <b>, <i>, <br>, <div> and common entities.
// - `get_text` gives plain text with paragraphs separated by a blank line.

use std::ops::Range;

pub const DEFAULT_PLACEHOLDER: &str = "Start writing here...";

const UNDO_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl InlineStyle {
    fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline
    }
}

/// Buttons on the editor toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarCommand {
    Bold,
    Italic,
    Underline,
    Undo,
    Redo,
}

type Content = Vec<(char, InlineStyle)>;

pub struct RichTextEditor {
    content: Content,
    selection: Range<usize>,
    focused: bool,
    placeholder: String,
    undo_stack: Vec<Content>,
    redo_stack: Vec<Content>,
}

impl Default for RichTextEditor {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER)
    }
}

impl RichTextEditor {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            content: Vec::new(),
            selection: 0..0,
            focused: false,
            placeholder: placeholder.into(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    // ---- focus & selection ------------------------------------------------

    pub fn focus(&mut self) {
        self.focused = true;
    }

    #[cfg(test)]
    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Selects `start..end`, clamped to the document. Reversed bounds are
    /// swapped.
    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.content.len();
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.selection = start.min(len)..end.min(len);
    }

    pub fn select_all(&mut self) {
        self.selection = 0..self.content.len();
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    #[cfg(test)]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    // ---- editing ----------------------------------------------------------

    /// Types `text` at the caret, replacing a non-empty selection. New
    /// characters take the style of the character before the caret within
    /// the same paragraph.
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.checkpoint();

        let start = self.selection.start;
        self.content.drain(self.selection.clone());

        let style = match start.checked_sub(1).map(|i| self.content[i]) {
            Some((c, style)) if c != '\n' => style,
            _ => InlineStyle::default(),
        };

        let inserted: Content = text
            .chars()
            .filter(|c| *c != '\r')
            .map(|c| if c == '\n' { (c, InlineStyle::default()) } else { (c, style) })
            .collect();
        let caret = start + inserted.len();
        self.content.splice(start..start, inserted);
        self.selection = caret..caret;
    }

    /// Deletes the selection, or the character before the caret.
    pub fn delete_backward(&mut self) {
        let range = if self.selection.is_empty() {
            match self.selection.start.checked_sub(1) {
                Some(prev) => prev..self.selection.start,
                None => return,
            }
        } else {
            self.selection.clone()
        };
        self.checkpoint();
        let caret = range.start;
        self.content.drain(range);
        self.selection = caret..caret;
    }

    /// Runs a toolbar command. Returns false when the command had nothing to
    /// act on: the widget is unfocused, a format command has no selection, or
    /// the history is empty.
    pub fn apply(&mut self, command: ToolbarCommand) -> bool {
        if !self.focused {
            return false;
        }
        match command {
            ToolbarCommand::Bold => self.toggle(|s| &mut s.bold),
            ToolbarCommand::Italic => self.toggle(|s| &mut s.italic),
            ToolbarCommand::Underline => self.toggle(|s| &mut s.underline),
            ToolbarCommand::Undo => self.undo(),
            ToolbarCommand::Redo => self.redo(),
        }
    }

    fn toggle(&mut self, attr: fn(&mut InlineStyle) -> &mut bool) -> bool {
        let range = self.selection.clone();
        if range.is_empty() {
            return false;
        }

        // Set everywhere unless every character already has it.
        let mut styled = self.content[range.clone()]
            .iter()
            .filter(|(c, _)| *c != '\n')
            .peekable();
        if styled.peek().is_none() {
            return false;
        }
        let all_set = styled.all(|(_, style)| *attr(&mut style.clone()));

        self.checkpoint();
        for (c, style) in &mut self.content[range] {
            if *c != '\n' {
                *attr(style) = !all_set;
            }
        }
        true
    }

    fn checkpoint(&mut self) {
        self.undo_stack.push(self.content.clone());
        if self.undo_stack.len() > UNDO_DEPTH {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.content, previous);
        self.redo_stack.push(current);
        self.clamp_selection();
        true
    }

    fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.content, next);
        self.undo_stack.push(current);
        self.clamp_selection();
        true
    }

    fn clamp_selection(&mut self) {
        let len = self.content.len();
        self.selection = self.selection.start.min(len)..self.selection.end.min(len);
    }

    // ---- serialization ----------------------------------------------------

    fn paragraphs(&self) -> impl Iterator<Item = &[(char, InlineStyle)]> {
        self.content.split(|(c, _)| *c == '\n')
    }

    /// Plain text, paragraphs separated by a blank line.
    pub fn get_text(&self) -> String {
        if self.content.is_empty() {
            return String::new();
        }
        self.paragraphs()
            .map(|p| p.iter().map(|(c, _)| *c).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn get_html(&self) -> String {
        let mut html = String::new();
        for paragraph in self.paragraphs() {
            html.push_str("<p>");
            for run in paragraph.chunk_by(|a, b| a.1 == b.1) {
                let style = run[0].1;
                open_tags(&mut html, style);
                for (c, _) in run {
                    escape_into(&mut html, *c);
                }
                close_tags(&mut html, style);
            }
            html.push_str("</p>");
        }
        html
    }

    /// Replaces the document with parsed `html`. The replacement can be
    /// undone.
    pub fn set_content(&mut self, html: &str) {
        self.checkpoint();
        self.content = parse_html(html);
        let end = self.content.len();
        self.selection = end..end;
    }

    /// Terminal rendering with ANSI styling, or the dimmed placeholder.
    pub fn render_ansi(&self) -> String {
        if self.content.is_empty() {
            return format!("\x1b[2m{}\x1b[0m", self.placeholder);
        }
        let mut out = String::new();
        for run in self.content.chunk_by(|a, b| a.1 == b.1) {
            let style = run[0].1;
            if style.bold {
                out.push_str("\x1b[1m");
            }
            if style.italic {
                out.push_str("\x1b[3m");
            }
            if style.underline {
                out.push_str("\x1b[4m");
            }
            out.extend(run.iter().map(|(c, _)| *c));
            if !style.is_plain() {
                out.push_str("\x1b[0m");
            }
        }
        out
    }
}

fn open_tags(html: &mut String, style: InlineStyle) {
    if style.bold {
        html.push_str("<strong>");
    }
    if style.italic {
        html.push_str("<em>");
    }
    if style.underline {
        html.push_str("<u>");
    }
}

fn close_tags(html: &mut String, style: InlineStyle) {
    if style.underline {
        html.push_str("</u>");
    }
    if style.italic {
        html.push_str("</em>");
    }
    if style.bold {
        html.push_str("</strong>");
    }
}

fn escape_into(html: &mut String, c: char) {
    match c {
        '&' => html.push_str("&amp;"),
        '<' => html.push_str("&lt;"),
        '>' => html.push_str("&gt;"),
        '"' => html.push_str("&quot;"),
        '\'' => html.push_str("&#39;"),
        _ => html.push(c),
    }
}

// =============================================================================
// HTML SUBSET PARSER
// =============================================================================

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Open(String),
    Close(String),
    Text(&'a str),
}

fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = html;

    while !rest.is_empty() {
        match rest.find('<') {
            Some(0) => match rest.find('>') {
                Some(end) => {
                    let inner = rest[1..end].trim().trim_end_matches('/').trim();
                    if let Some(name) = inner.strip_prefix('/') {
                        tokens.push(Token::Close(tag_name(name)));
                    } else if !inner.starts_with('!') {
                        tokens.push(Token::Open(tag_name(inner)));
                    }
                    rest = &rest[end + 1..];
                }
                None => {
                    tokens.push(Token::Text(rest));
                    rest = "";
                }
            },
            Some(lt) => {
                tokens.push(Token::Text(&rest[..lt]));
                rest = &rest[lt..];
            }
            None => {
                tokens.push(Token::Text(rest));
                rest = "";
            }
        }
    }
    tokens
}

fn tag_name(inner: &str) -> String {
    inner
        .split(|c: char| c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn parse_html(html: &str) -> Content {
    let tokens = tokenize(html);
    let mut content = Content::new();
    let mut bold = 0u32;
    let mut italic = 0u32;
    let mut underline = 0u32;
    let mut started = false;

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open(name) => match name.as_str() {
                "p" | "div" => {
                    if started {
                        content.push(('\n', InlineStyle::default()));
                    }
                    started = true;
                }
                // A trailing <br> is how an empty paragraph is written.
                "br" => {
                    let closes_block = matches!(
                        tokens.get(i + 1),
                        Some(Token::Close(next)) if next == "p" || next == "div"
                    );
                    if !closes_block {
                        content.push(('\n', InlineStyle::default()));
                    }
                    started = true;
                }
                "strong" | "b" => bold += 1,
                "em" | "i" => italic += 1,
                "u" => underline += 1,
                _ => {}
            },
            Token::Close(name) => match name.as_str() {
                "strong" | "b" => bold = bold.saturating_sub(1),
                "em" | "i" => italic = italic.saturating_sub(1),
                "u" => underline = underline.saturating_sub(1),
                _ => {}
            },
            Token::Text(text) => {
                let style = InlineStyle {
                    bold: bold > 0,
                    italic: italic > 0,
                    underline: underline > 0,
                };
                for c in decode_entities(text).chars() {
                    match c {
                        '\r' => {}
                        '\n' => content.push((' ', style)),
                        _ => content.push((c, style)),
                    }
                }
                started = true;
            }
        }
    }
    content
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi))
        });

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(text: &str) -> RichTextEditor {
        let mut editor = RichTextEditor::default();
        editor.focus();
        editor.insert_text(text);
        editor
    }

    #[test]
    fn empty_editor_shows_placeholder() {
        let editor = RichTextEditor::default();
        assert!(editor.is_empty());
        assert_eq!(editor.get_text(), "");
        assert_eq!(editor.placeholder(), "Start writing here...");
        assert!(editor.render_ansi().contains("Start writing here..."));
    }

    #[test]
    fn plain_text_separates_paragraphs_with_blank_line() {
        let editor = editor_with("Dear Sir,\nThank you.");
        assert_eq!(editor.get_text(), "Dear Sir,\n\nThank you.");
        assert_eq!(editor.get_html(), "<p>Dear Sir,</p><p>Thank you.</p>");
    }

    #[test]
    fn bold_toggles_on_then_off() {
        let mut editor = editor_with("Hello world");
        editor.select(0, 5);

        assert!(editor.apply(ToolbarCommand::Bold));
        assert_eq!(editor.get_html(), "<p><strong>Hello</strong> world</p>");

        assert!(editor.apply(ToolbarCommand::Bold));
        assert_eq!(editor.get_html(), "<p>Hello world</p>");
    }

    #[test]
    fn mixed_selection_is_fully_styled() {
        let mut editor = editor_with("abcd");
        editor.select(0, 2);
        editor.apply(ToolbarCommand::Italic);
        editor.select(0, 4);
        editor.apply(ToolbarCommand::Italic);

        assert_eq!(editor.get_html(), "<p><em>abcd</em></p>");
    }

    #[test]
    fn commands_need_focus_and_selection() {
        let mut editor = editor_with("Hello");
        editor.select(0, 0);
        assert!(!editor.apply(ToolbarCommand::Underline));

        editor.select(0, 5);
        editor.blur();
        assert!(!editor.apply(ToolbarCommand::Underline));
        assert!(!editor.apply(ToolbarCommand::Undo));
        assert_eq!(editor.get_html(), "<p>Hello</p>");
    }

    #[test]
    fn undo_and_redo_walk_history() {
        let mut editor = editor_with("Hi");
        editor.select(0, 2);
        editor.apply(ToolbarCommand::Underline);

        assert!(editor.apply(ToolbarCommand::Undo));
        assert_eq!(editor.get_html(), "<p>Hi</p>");
        assert!(editor.apply(ToolbarCommand::Redo));
        assert_eq!(editor.get_html(), "<p><u>Hi</u></p>");

        assert!(editor.apply(ToolbarCommand::Undo));
        assert!(editor.apply(ToolbarCommand::Undo));
        assert!(editor.is_empty());
        assert!(!editor.apply(ToolbarCommand::Undo));
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut editor = editor_with("a");
        editor.apply(ToolbarCommand::Undo);
        editor.insert_text("b");
        assert!(!editor.apply(ToolbarCommand::Redo));
        assert_eq!(editor.get_text(), "b");
    }

    #[test]
    fn typing_continues_the_previous_style() {
        let mut editor = editor_with("Hi");
        editor.select(0, 2);
        editor.apply(ToolbarCommand::Bold);
        editor.select(2, 2);
        editor.insert_text("!");

        assert_eq!(editor.get_html(), "<p><strong>Hi!</strong></p>");
    }

    #[test]
    fn delete_backward_removes_selection_or_previous_char() {
        let mut editor = editor_with("Hello");
        editor.delete_backward();
        assert_eq!(editor.get_text(), "Hell");

        editor.select(0, 2);
        editor.delete_backward();
        assert_eq!(editor.get_text(), "ll");
    }

    #[test]
    fn set_content_reads_the_stored_subset() {
        let mut editor = RichTextEditor::default();
        editor.set_content("<p><b>Dear</b> <i>Sir</i> &amp; <u>Madam</u></p><p><br></p><p>x&lt;y</p>");

        assert_eq!(editor.get_text(), "Dear Sir & Madam\n\n\n\nx<y");
        assert_eq!(
            editor.get_html(),
            "<p><strong>Dear</strong> <em>Sir</em> &amp; <u>Madam</u></p><p></p><p>x&lt;y</p>"
        );
    }

    #[test]
    fn set_content_accepts_bare_text_and_can_be_undone() {
        let mut editor = editor_with("draft one");
        editor.set_content("Hello");
        assert_eq!(editor.get_html(), "<p>Hello</p>");

        editor.focus();
        editor.apply(ToolbarCommand::Undo);
        assert_eq!(editor.get_text(), "draft one");
    }

    #[test]
    fn html_output_reads_back_identically() {
        let mut editor = editor_with("One\n\nTwo \"quoted\"");
        editor.select(5, 8);
        editor.apply(ToolbarCommand::Bold);
        editor.apply(ToolbarCommand::Underline);
        let html = editor.get_html();

        let mut copy = RichTextEditor::default();
        copy.set_content(&html);
        assert_eq!(copy.get_html(), html);
    }

    #[test]
    fn numeric_entities_and_stray_ampersands() {
        assert_eq!(decode_entities("&#65;&#x42; & &bogus;"), "AB & &bogus;");
    }
}
