//! Bash code block with token highlighting and a copy button.
//!
//! Highlighting is a small lexer over the command text:
//! - First word of a command (line start, after `|`, `&&`, `;`)
//! - Flags (`-x`, `--name`)
//! - Quoted strings, `$VAR`/`${VAR}` references, `{placeholder}` templates
//! - Comments (`# ...`)
//!
//! A trailing `\` continues the command on the next line.

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_icons::Icon;

use crate::components::icons as ic;
use crate::utils::dom::copy_to_clipboard;

stylance::import_crate_style!(css, "src/components/widgets/widgets.module.css");

const COPIED_RESET_MS: u32 = 2_000;

// =============================================================================
// Highlighting
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanKind {
    Command,
    Flag,
    String,
    Variable,
    Placeholder,
    Operator,
    Comment,
    Text,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub text: String,
}

/// Split bash source into highlighted spans; concatenated texts equal `code`.
pub fn highlight_bash(code: &str) -> Vec<Span> {
    Highlighter::new(code).run()
}

fn is_operator(c: char) -> bool {
    matches!(c, '|' | ';' | '&')
}

fn is_word_end(c: char) -> bool {
    c.is_whitespace() || is_operator(c) || c == '"' || c == '\''
}

struct Highlighter<'a> {
    input: &'a str,
    pos: usize,
    spans: Vec<Span>,
    expect_command: bool,
    /// Last word was a line continuation.
    continued: bool,
}

impl<'a> Highlighter<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            spans: Vec::new(),
            expect_command: true,
            continued: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        let rest = &self.input[start..];
        let len = rest.find(|c| !keep(c)).unwrap_or(rest.len());
        self.pos += len;
        &self.input[start..self.pos]
    }

    fn push(&mut self, kind: SpanKind, text: &str) {
        if text.is_empty() {
            return;
        }
        if kind == SpanKind::Text
            && let Some(last) = self.spans.last_mut()
            && last.kind == SpanKind::Text
        {
            last.text.push_str(text);
            return;
        }
        self.spans.push(Span {
            kind,
            text: text.to_string(),
        });
    }

    fn run(mut self) -> Vec<Span> {
        while let Some(c) = self.peek() {
            match c {
                '\n' => {
                    self.pos += 1;
                    self.push(SpanKind::Text, "\n");
                    self.expect_command = !self.continued;
                    self.continued = false;
                }
                c if c.is_whitespace() => {
                    let text = self.take_while(|c| c.is_whitespace() && c != '\n');
                    self.push(SpanKind::Text, text);
                }
                '#' => {
                    let text = self.take_while(|c| c != '\n');
                    self.push(SpanKind::Comment, text);
                }
                '"' | '\'' => self.quoted(c),
                c if is_operator(c) => {
                    let text = self.take_while(is_operator);
                    self.push(SpanKind::Operator, text);
                    self.expect_command = true;
                }
                '$' => self.variable(),
                '{' => self.placeholder(),
                _ => self.word(),
            }
        }
        self.spans
    }

    fn quoted(&mut self, quote: char) {
        let start = self.pos;
        let rest = &self.input[start + 1..];
        // Unterminated quotes run to the end of the input.
        let len = rest.find(quote).map_or(rest.len(), |end| end + 1);
        self.pos = start + 1 + len;
        let text = &self.input[start..self.pos];
        self.push(SpanKind::String, text);
        self.expect_command = false;
        self.continued = false;
    }

    fn variable(&mut self) {
        let start = self.pos;
        self.pos += 1;
        if self.peek() == Some('{') {
            let rest = &self.input[self.pos..];
            self.pos += rest.find('}').map_or(rest.len(), |end| end + 1);
        } else {
            self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        }
        let text = &self.input[start..self.pos];
        let kind = if text.len() > 1 {
            SpanKind::Variable
        } else {
            SpanKind::Text
        };
        self.push(kind, text);
        self.expect_command = false;
        self.continued = false;
    }

    fn placeholder(&mut self) {
        let rest = &self.input[self.pos..];
        let closing = rest.find('}');
        let closed_in_word = closing.is_some_and(|end| !rest[..end].contains(char::is_whitespace));
        match closing {
            Some(end) if closed_in_word => {
                let text = &rest[..=end];
                self.pos += end + 1;
                self.push(SpanKind::Placeholder, text);
                self.expect_command = false;
                self.continued = false;
            }
            _ => self.word(),
        }
    }

    fn word(&mut self) {
        let start = self.pos;
        // Always consume at least one character.
        let first = self.peek().map_or(0, char::len_utf8);
        self.pos += first;
        self.take_while(|c| !is_word_end(c));
        let text = &self.input[start..self.pos];

        let kind = if self.expect_command {
            self.expect_command = false;
            SpanKind::Command
        } else if text.starts_with('-') {
            SpanKind::Flag
        } else {
            SpanKind::Text
        };
        self.continued = text == "\\";
        self.push(kind, text);
    }
}

fn span_class(kind: SpanKind) -> &'static str {
    match kind {
        SpanKind::Command => css::tokenCommand,
        SpanKind::Flag => css::tokenFlag,
        SpanKind::String => css::tokenString,
        SpanKind::Variable => css::tokenVariable,
        SpanKind::Placeholder => css::tokenPlaceholder,
        SpanKind::Operator => css::tokenOperator,
        SpanKind::Comment => css::tokenComment,
        SpanKind::Text => "",
    }
}

// =============================================================================
// Component
// =============================================================================

/// Highlighted, copyable shell command.
#[component]
pub fn BashCodeBlock(#[prop(into)] code: Signal<String>) -> impl IntoView {
    let (copied, set_copied) = signal(false);

    let on_copy = move |_: leptos::ev::MouseEvent| {
        let text = code.get_untracked();
        spawn_local(async move {
            match copy_to_clipboard(&text).await {
                Ok(()) => {
                    set_copied.set(true);
                    Timeout::new(COPIED_RESET_MS, move || set_copied.set(false)).forget();
                }
                Err(error) => tracing::warn!(%error, "clipboard write failed"),
            }
        });
    };

    view! {
        <div class=css::codeBlock>
            <pre class=css::code>
                <code>
                    {move || {
                        highlight_bash(&code.get())
                            .into_iter()
                            .map(|span| view! { <span class=span_class(span.kind)>{span.text}</span> })
                            .collect_view()
                    }}
                </code>
            </pre>
            <button class=css::copyButton on:click=on_copy title="Copy to clipboard">
                <Icon icon=ic::COPY />
                {move || if copied.get() { "Copied" } else { "Copy" }}
            </button>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(code: &str) -> Vec<(SpanKind, String)> {
        highlight_bash(code)
            .into_iter()
            .map(|s| (s.kind, s.text))
            .collect()
    }

    fn span(kind: SpanKind, text: &str) -> (SpanKind, String) {
        (kind, text.to_string())
    }

    #[test]
    fn test_configure_command() {
        use SpanKind::*;
        assert_eq!(
            kinds("pipe configure --auth-token {user.jwt.token} --api 'https://x/'"),
            vec![
                span(Command, "pipe"),
                span(Text, " configure "),
                span(Flag, "--auth-token"),
                span(Text, " "),
                span(Placeholder, "{user.jwt.token}"),
                span(Text, " "),
                span(Flag, "--api"),
                span(Text, " "),
                span(String, "'https://x/'"),
            ]
        );
    }

    #[test]
    fn test_pipes_variables_and_comments() {
        use SpanKind::*;
        assert_eq!(
            kinds("ls -la | grep x && echo $HOME # done\nnext"),
            vec![
                span(Command, "ls"),
                span(Text, " "),
                span(Flag, "-la"),
                span(Text, " "),
                span(Operator, "|"),
                span(Text, " "),
                span(Command, "grep"),
                span(Text, " x "),
                span(Operator, "&&"),
                span(Text, " "),
                span(Command, "echo"),
                span(Text, " "),
                span(Variable, "$HOME"),
                span(Text, " "),
                span(Comment, "# done"),
                span(Text, "\n"),
                span(Command, "next"),
            ]
        );
    }

    #[test]
    fn test_line_continuation_keeps_arguments() {
        let spans = highlight_bash("pip install \\\n  pkg");
        let commands: Vec<_> = spans
            .iter()
            .filter(|s| s.kind == SpanKind::Command)
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(commands, vec!["pip"]);
    }

    #[test]
    fn test_spans_cover_input() {
        for code in ["echo \"unterminated", "a {b c} ${X", "$ {} -", "ünï | cödé"] {
            let joined: String = highlight_bash(code).into_iter().map(|s| s.text).collect();
            assert_eq!(joined, code);
        }
    }
}
