//! The web-document reader: token stream to chunk graph.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

use crate::errors::{Result, WeftError};
use crate::model::{Chunk, Command, Web};
use crate::options::{Arity, OptionDef, OptionParser, ARGUMENT};
use crate::tokenizer::Tokenizer;

static OUTPUT_OPTIONS: Lazy<OptionParser> = Lazy::new(|| {
    OptionParser::new(vec![
        OptionDef::new("-start", Arity::Exactly(1)),
        OptionDef::new("-end", Arity::Exactly(1)),
        OptionDef::new(ARGUMENT, Arity::Variable),
    ])
});

static NAMED_OPTIONS: Lazy<OptionParser> = Lazy::new(|| {
    OptionParser::new(vec![
        OptionDef::new("-indent", Arity::Exactly(0)),
        OptionDef::new("-noindent", Arity::Exactly(0)),
        OptionDef::new(ARGUMENT, Arity::Variable),
    ])
});

/// Parses web documents into a [`Web`].
///
/// The grammar is flat: `@o`/`@d` open a definition, `@}` closes it, and
/// everything between markers is content. Included documents (`@i`)
/// parse into the same web, with paths resolved against the including
/// document's directory.
#[derive(Debug, Default)]
pub struct WebReader {
    base_dir: PathBuf,
}

impl WebReader {
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("."),
        }
    }

    /// Loads a web document from a file. The first loaded path names the
    /// web's woven destination.
    pub fn load(&self, web: &mut Web, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)?;
        if web.source_path.is_none() {
            web.source_path = Some(path.to_path_buf());
        }
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        Parser { web, base_dir }.parse(&text)
    }

    /// Parses document text directly, resolving includes against the
    /// reader's base directory.
    pub fn load_str(&self, web: &mut Web, text: &str) -> Result<()> {
        Parser {
            web,
            base_dir: self.base_dir.clone(),
        }
        .parse(text)
    }
}

fn syntax(line: usize, message: impl Into<String>) -> WeftError {
    WeftError::Syntax {
        line,
        message: message.into(),
    }
}

struct Parser<'w> {
    web: &'w mut Web,
    base_dir: PathBuf,
}

impl Parser<'_> {
    fn parse(&mut self, text: &str) -> Result<()> {
        let mut tokens = Tokenizer::new(text);
        let mut current = Chunk::anonymous();
        let mut quoting = false;
        let mut in_definition = false;
        let mut line = 1;

        while let Some(token) = tokens.next() {
            line = tokens.line_number() + 1;
            match token {
                "@@" => append_literal(&mut current, "@", line, quoting),
                "@o" => {
                    let args = tokens
                        .next()
                        .ok_or_else(|| syntax(line, "@o without a file name"))?;
                    let options = OUTPUT_OPTIONS.parse(args)?;
                    let name = options
                        .get(ARGUMENT)
                        .map(|words| words.join(" "))
                        .ok_or_else(|| syntax(line, "@o without a file name"))?;
                    expect_open(&mut tokens, line)?;
                    self.flush(&mut current, &mut in_definition)?;
                    let start = options.get("-start").and_then(|v| v.first()).cloned();
                    let end = options.get("-end").and_then(|v| v.first()).cloned();
                    current = Chunk::output(name, start, end);
                    in_definition = true;
                }
                "@d" => {
                    let args = tokens
                        .next()
                        .ok_or_else(|| syntax(line, "@d without a chunk name"))?;
                    let options = NAMED_OPTIONS.parse(args)?;
                    let name = options
                        .get(ARGUMENT)
                        .map(|words| words.join(" "))
                        .ok_or_else(|| syntax(line, "@d without a chunk name"))?;
                    expect_open(&mut tokens, line)?;
                    self.flush(&mut current, &mut in_definition)?;
                    current = if options.contains_key("-noindent") {
                        Chunk::named_no_indent(name)
                    } else {
                        Chunk::named(name)
                    };
                    in_definition = true;
                }
                "@{" => return Err(syntax(line, "@{ outside @o or @d")),
                "@}" => {
                    if !in_definition {
                        return Err(syntax(line, "@} without a matching @{"));
                    }
                    self.web.add(std::mem::replace(&mut current, Chunk::anonymous()))?;
                    in_definition = false;
                }
                "@[" => quoting = true,
                "@]" => quoting = false,
                "@<" => {
                    let name = read_until(&mut tokens, "@>")?;
                    let name = name.trim().to_string();
                    // An abbreviated reference to an already-defined name
                    // resolves now; anything else stays verbatim for the
                    // closure pass to resolve or report.
                    let name = match self.web.add_def_name(&name)? {
                        Some(full) => full,
                        None => name,
                    };
                    current.append(Command::Reference { name, line });
                }
                "@>" => return Err(syntax(line, "@> without a matching @<")),
                "@f" => current.append(Command::FileXref { line }),
                "@m" => current.append(Command::MacroXref { line }),
                "@u" => current.append(Command::UserIdXref { line }),
                "@|" => {
                    if !in_definition {
                        return Err(syntax(line, "@| outside a chunk definition"));
                    }
                    let ids = read_until(&mut tokens, "@}")?;
                    current.set_user_id_refs(&ids);
                    self.web.add(std::mem::replace(&mut current, Chunk::anonymous()))?;
                    in_definition = false;
                }
                "@i" => {
                    if in_definition {
                        return Err(syntax(line, "@i inside a chunk definition"));
                    }
                    let arg = tokens
                        .next()
                        .ok_or_else(|| syntax(line, "@i without a file name"))?;
                    self.flush(&mut current, &mut in_definition)?;
                    self.include(arg.trim(), line)?;
                }
                marker if marker.len() == 2 && marker.starts_with('@') => {
                    tracing::warn!(line, marker, "unrecognized directive kept as text");
                    append_literal(&mut current, marker, line, quoting);
                }
                _ => append_literal(&mut current, token, line, quoting),
            }
        }

        if in_definition {
            return Err(syntax(line, "unterminated chunk definition at end of input"));
        }
        if !current.commands().is_empty() {
            self.web.add(current)?;
        }
        Ok(())
    }

    /// Registers the current (anonymous) chunk and starts a fresh one.
    fn flush(&mut self, current: &mut Chunk, in_definition: &mut bool) -> Result<()> {
        if *in_definition {
            // Unreachable from the grammar; directives that open a
            // definition first require the previous one to close.
            return Err(WeftError::Structural(
                "definition opened inside a definition".to_string(),
            ));
        }
        if !current.commands().is_empty() {
            let chunk = std::mem::replace(current, Chunk::anonymous());
            self.web.add(chunk)?;
        }
        Ok(())
    }

    fn include(&mut self, name: &str, line: usize) -> Result<()> {
        let path = self.base_dir.join(name);
        tracing::debug!(path = %path.display(), "including");
        let text = fs::read_to_string(&path)
            .map_err(|err| syntax(line, format!("cannot include {}: {err}", path.display())))?;
        let nested_base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let saved = std::mem::replace(&mut self.base_dir, nested_base);
        let result = self.parse(&text);
        self.base_dir = saved;
        result
    }
}

fn append_literal(chunk: &mut Chunk, text: &str, line: usize, quoting: bool) {
    if quoting {
        chunk.append_code(text, line);
    } else {
        chunk.append_text(text, line);
    }
}

/// Skips blank tokens up to the `@{` opening a definition body.
fn expect_open(tokens: &mut Tokenizer, line: usize) -> Result<()> {
    for token in tokens.by_ref() {
        if token == "@{" {
            return Ok(());
        }
        if !token.trim().is_empty() {
            return Err(syntax(line, format!("expected @{{, found {token:?}")));
        }
    }
    Err(syntax(line, "expected @{, found end of input"))
}

/// Collects tokens verbatim up to a closing marker.
fn read_until(tokens: &mut Tokenizer, end: &str) -> Result<String> {
    let mut collected = String::new();
    for token in tokens.by_ref() {
        if token == end {
            return Ok(collected);
        }
        collected.push_str(token);
    }
    Err(syntax(
        tokens.line_number() + 1,
        format!("missing {end} before end of input"),
    ))
}
