//! Directive-argument parsing.
//!
//! `@o` and `@d` directives carry a short argument string: leading
//! options with a declared arity, then positional text (a file name or a
//! chunk name). This is far too small for a real argv parser, so the
//! splitting lives here.

use std::collections::HashMap;

use crate::errors::{Result, WeftError};

/// Key under which unmatched trailing words are collected.
pub const ARGUMENT: &str = "argument";

/// Number of argument words an option consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many following words.
    Exactly(usize),
    /// Everything that is left.
    Variable,
}

/// One declared option.
#[derive(Debug, Clone)]
pub struct OptionDef {
    pub name: &'static str,
    pub arity: Arity,
}

impl OptionDef {
    pub fn new(name: &'static str, arity: Arity) -> Self {
        Self { name, arity }
    }
}

/// Parses a directive's trailing argument text against a declared set of
/// options.
///
/// Option matching is greedy and positional: while the next word names a
/// declared option, that option consumes its declared number of following
/// words. The first word that is not an option name ends option matching;
/// it and every remaining word land in the `"argument"` list.
#[derive(Debug, Clone)]
pub struct OptionParser {
    options: Vec<OptionDef>,
}

impl OptionParser {
    pub fn new(options: Vec<OptionDef>) -> Self {
        Self { options }
    }

    pub fn parse(&self, text: &str) -> Result<HashMap<String, Vec<String>>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        let mut words = text.split_whitespace().peekable();

        while let Some(&word) = words.peek() {
            let Some(def) = self.find_fixed(word) else {
                break;
            };
            words.next();
            let Arity::Exactly(n) = def.arity else {
                unreachable!("find_fixed only returns fixed-arity options")
            };
            let mut args = Vec::with_capacity(n);
            for _ in 0..n {
                let arg = words.next().ok_or_else(|| {
                    WeftError::OptionParse(format!(
                        "option {} expects {} argument(s) in {:?}",
                        def.name, n, text
                    ))
                })?;
                args.push(arg.to_string());
            }
            result.insert(def.name.to_string(), args);
        }

        let trailing: Vec<String> = words.map(str::to_string).collect();
        if !trailing.is_empty() {
            result.insert(ARGUMENT.to_string(), trailing);
        }
        Ok(result)
    }

    fn find_fixed(&self, word: &str) -> Option<&OptionDef> {
        self.options
            .iter()
            .find(|d| d.name == word && matches!(d.arity, Arity::Exactly(_)))
    }
}
