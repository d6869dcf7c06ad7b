//! Indentation state machine for code output.
//!
//! Named-chunk substitution must re-indent every substituted line to the
//! column where the reference appeared, while the fragment of text
//! already written on that line must not be indented twice. The tracker
//! keeps a stack of indent widths, the pending indent for the next line
//! started, and whether the last write left a line unterminated.

/// Indentation context shared by the concrete emitters.
#[derive(Debug)]
pub(crate) struct IndentTracker {
    /// Stack of indent widths; the top applies to continuation lines.
    context: Vec<usize>,
    /// Indent pending for the next written line. Cleared once a line
    /// fragment is underway.
    last_indent: usize,
    /// A line fragment is unterminated.
    fragment: bool,
}

impl IndentTracker {
    pub fn new() -> Self {
        Self {
            context: vec![0],
            last_indent: 0,
            fragment: false,
        }
    }

    /// Drops all indentation state, as when a new destination opens.
    pub fn reset(&mut self) {
        self.context = vec![0];
        self.last_indent = 0;
        self.fragment = false;
    }

    pub fn add_indent(&mut self, spaces: usize) {
        let top = self.top();
        self.last_indent = top + spaces;
        self.context.push(self.last_indent);
    }

    pub fn set_indent(&mut self, spaces: usize) {
        self.context.push(spaces);
        self.last_indent = spaces;
    }

    pub fn clr_indent(&mut self) {
        if self.context.len() > 1 {
            self.context.pop();
        }
        self.last_indent = self.top();
    }

    fn top(&self) -> usize {
        self.context.last().copied().unwrap_or(0)
    }

    /// Appends a block of code, indenting each new line to the current
    /// context. A trailing fragment (text without a final newline)
    /// suppresses indentation of whatever continues the line.
    pub fn code_block(&mut self, text: &str, out: &mut String) {
        let indent = self.top();
        if !text.contains('\n') {
            push_spaces(out, self.last_indent);
            out.push_str(text);
            self.last_indent = 0;
            self.fragment = true;
            return;
        }

        let lines: Vec<&str> = text.split('\n').collect();
        push_spaces(out, self.last_indent);
        out.push_str(lines[0]);
        out.push('\n');
        for line in &lines[1..lines.len() - 1] {
            push_spaces(out, indent);
            out.push_str(line);
            out.push('\n');
        }
        let last = lines[lines.len() - 1];
        if last.is_empty() {
            self.last_indent = indent;
            self.fragment = false;
        } else {
            push_spaces(out, indent);
            out.push_str(last);
            self.last_indent = 0;
            self.fragment = true;
        }
    }

    /// Terminates a pending line fragment.
    pub fn finish(&mut self, out: &mut String) {
        if self.fragment {
            self.fragment = false;
            out.push('\n');
        }
    }
}

fn push_spaces(out: &mut String, count: usize) {
    for _ in 0..count {
        out.push(' ');
    }
}
