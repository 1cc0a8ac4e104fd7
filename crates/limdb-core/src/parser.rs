//! Limit-monitor revision parser
//!
//! Reads the line-oriented directive format into a [`ParsedRevision`].
//! Only the closed directive vocabulary below is interpreted; every other
//! line (equations, expressions, short `MLOAD` lines) is skipped.
//!
//! | Directive   | Scope                                  |
//! |-------------|----------------------------------------|
//! | `MLOAD`     | opens an entity (exactly two tokens)   |
//! | `MMSID`     | opens an entity                        |
//! | `MLIMIT`    | set on the current entity              |
//! | `MLMTOL`    | current entity tolerance               |
//! | `MLIMSW`    | current entity switch msid             |
//! | `MLMENABLE` | current entity enable flag             |
//! | `MLMDEFTOL` | file-wide default tolerance            |
//! | `MLMTHROW`  | file-wide pass-through scalar          |

#![allow(clippy::result_large_err)]

use crate::errors::{ExError, ExErrorKind, LimitsError, Result};
use crate::model::{Entity, EntityType, LimitSet, ParsedRevision, RevisionDate, Set, SetValues};
use regex::Regex;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

static REVISION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*\$Revision\s*:\s*([0-9.]+)").expect("revision regex is valid")
});

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$Date\s*:\s*([0-9]+)/([0-9]+)/([0-9]+)\s+([0-9]+):([0-9]+):([0-9]+)")
        .expect("date regex is valid")
});

/// Parse a revision file from disk
///
/// # Errors
///
/// `NotFound` if the file does not exist, `Io` for other read failures, and
/// the structural parse errors of [`parse_revision`].
pub fn parse_revision_file(path: &Path) -> std::result::Result<ParsedRevision, ExError> {
    let bytes = std::fs::read(path).map_err(|e| {
        let kind = if e.kind() == std::io::ErrorKind::NotFound {
            ExErrorKind::NotFound
        } else {
            ExErrorKind::Io
        };
        ExError::new(kind)
            .with_op("read_revision")
            .with_message(format!("{}: {}", path.display(), e))
    })?;
    Ok(parse_revision(&String::from_utf8_lossy(&bytes))?)
}

/// Parse revision text
///
/// # Errors
///
/// Structural errors only: a set/scalar directive with no open entity, a
/// missing or non-numeric operand, or an entity mixing limit and
/// expected-state sets.
pub fn parse_revision(text: &str) -> Result<ParsedRevision> {
    let mut parser = RevisionParser::default();
    for (index, line) in text.lines().enumerate() {
        parser.feed(index + 1, line)?;
    }
    Ok(parser.out)
}

#[derive(Default)]
struct RevisionParser {
    out: ParsedRevision,
    /// Name of the entity currently being populated
    current: Option<String>,
}

impl RevisionParser {
    fn feed(&mut self, line: usize, raw: &str) -> Result<()> {
        let (code, comment) = match raw.find('#') {
            Some(i) => raw.split_at(i),
            None => (raw, ""),
        };
        let words: Vec<&str> = code.split_whitespace().collect();

        let Some(&keyword) = words.first() else {
            self.read_metadata(comment);
            return Ok(());
        };

        match keyword {
            "MLOAD" if words.len() == 2 => self.open_entity(words[1]),
            "MMSID" => {
                let name = operand(line, keyword, &words, 1, "name")?;
                self.open_entity(name);
            }
            "MLIMIT" => self.read_set(line, &words)?,
            "MLMTOL" => {
                let value = number(line, keyword, &words, 1, "tolerance")?;
                self.current_entity(line, keyword)?.mlmtol = Some(value);
            }
            "MLIMSW" => {
                let value = operand(line, keyword, &words, 1, "switch msid")?.to_string();
                self.current_entity(line, keyword)?.mlimsw = Some(value);
            }
            "MLMENABLE" => {
                let value = number(line, keyword, &words, 1, "enable flag")?;
                self.current_entity(line, keyword)?.mlmenable = Some(value);
            }
            "MLMDEFTOL" => {
                self.out.mlmdeftol = Some(number(line, keyword, &words, 1, "tolerance")?);
            }
            "MLMTHROW" => {
                self.out.mlmthrow = Some(number(line, keyword, &words, 1, "value")?);
            }
            _ => {}
        }
        Ok(())
    }

    fn open_entity(&mut self, name: &str) {
        self.out
            .entities
            .insert(name.to_string(), Entity::new(name));
        self.current = Some(name.to_string());
    }

    fn current_entity(&mut self, line: usize, directive: &str) -> Result<&mut Entity> {
        self.current
            .as_ref()
            .and_then(|name| self.out.entities.get_mut(name))
            .ok_or_else(|| LimitsError::NoCurrentEntity {
                line,
                directive: directive.to_string(),
            })
    }

    fn read_set(&mut self, line: usize, words: &[&str]) -> Result<()> {
        let entity = self.current_entity(line, "MLIMIT")?;
        let setnum: i64 = number(line, "MLIMIT", words, 2, "set number")?;
        let options = &words[3..];

        let mut set = Set::default();
        let mut set_type = EntityType::Undefined;

        if let Some(i) = find(options, "PPENG") {
            set.values = SetValues::Limit(LimitSet {
                warning_low: Some(threshold(line, options, i + 1, "warning_low")?),
                caution_low: Some(threshold(line, options, i + 2, "caution_low")?),
                caution_high: Some(threshold(line, options, i + 3, "caution_high")?),
                warning_high: Some(threshold(line, options, i + 4, "warning_high")?),
            });
            set_type = EntityType::Limit;
        }

        if let Some(i) = find(options, "EXPST") {
            if set_type == EntityType::Limit {
                return Err(LimitsError::TypeConflict {
                    line,
                    msid: entity.name.clone(),
                });
            }
            let state = operand(line, "EXPST", options, i + 1, "state")?;
            set = Set::state(state);
            set_type = EntityType::ExpectedState;
        }

        if let Some(i) = find(options, "SWITCHSTATE") {
            let state = operand(line, "SWITCHSTATE", options, i + 1, "state")?;
            set.switchstate = Some(state.to_string());
        }

        if set_type != EntityType::Undefined {
            if entity.entity_type != EntityType::Undefined && entity.entity_type != set_type {
                return Err(LimitsError::TypeConflict {
                    line,
                    msid: entity.name.clone(),
                });
            }
            entity.entity_type = set_type;
        }

        if options.contains(&"DEFAULT") {
            entity.default_set = Some(setnum);
        }

        entity.put_set(setnum, set);
        Ok(())
    }

    fn read_metadata(&mut self, comment: &str) {
        if let Some(caps) = REVISION_PATTERN.captures(comment) {
            let revision = caps[1].trim().to_string();
            self.out.revision = Some(revision.clone());
            self.out.version = Some(revision);
        }
        if let Some(caps) = DATE_PATTERN.captures(comment) {
            let date = [&caps[1], &caps[2], &caps[3]];
            let time = [&caps[4], &caps[5], &caps[6]];
            if let Some(date) = RevisionDate::from_captures(date, time) {
                self.out.date = Some(date);
            }
        }
    }
}

fn find(words: &[&str], keyword: &str) -> Option<usize> {
    words.iter().position(|w| *w == keyword)
}

fn operand<'a>(
    line: usize,
    directive: &str,
    words: &[&'a str],
    index: usize,
    name: &str,
) -> Result<&'a str> {
    words
        .get(index)
        .copied()
        .ok_or_else(|| LimitsError::MissingOperand {
            line,
            directive: directive.to_string(),
            operand: name.to_string(),
        })
}

/// A finite `PPENG` operand; `nan` and `inf` parse as `f64` but cannot be stored
fn threshold(line: usize, words: &[&str], index: usize, name: &str) -> Result<f64> {
    let value: f64 = number(line, "PPENG", words, index, name)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LimitsError::InvalidNumber {
            line,
            directive: "PPENG".to_string(),
            value: words[index].to_string(),
        })
    }
}

fn number<T: FromStr>(
    line: usize,
    directive: &str,
    words: &[&str],
    index: usize,
    name: &str,
) -> Result<T> {
    let raw = operand(line, directive, words, index, name)?;
    raw.parse().map_err(|_| LimitsError::InvalidNumber {
        line,
        directive: directive.to_string(),
        value: raw.to_string(),
    })
}
