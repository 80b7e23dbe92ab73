//! Line-oriented text formats.
//!
//! Cohesion model:
//! ```text
//! # parameters(left_min_length left_max_length right_min_length right_max_length)
//! 1 10 1 6
//! # L count
//! word<TAB>count
//! # R count
//! word<TAB>count
//! ```
//!
//! Branching entropy model, with ids resolved through a separate encoder file:
//! ```text
//! # parameters (min_length max_length)
//! 2 7
//! # left side extension
//! word_id extension_id count
//! # right side extension
//! word_id extension_id count
//! ```
//!
//! Encoder: one string per line, line `i` holding id `i`, with `\` and line breaks escaped.
//!
//! Every save goes through a temporary file in the destination directory that is renamed
//! over the target once fully written.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use rustc_hash::FxHashMap;
use tempfile::NamedTempFile;

use crate::branching::{Branch, BranchingEntropyModel};
use crate::cohesion::CohesionModel;
use crate::config::{BranchingConfig, CohesionConfig};
use crate::counter::SubstringCounter;
use crate::encoder::{EncodedId, IntegerEncoder};
use crate::error::{LexsegError, Result};

const COHESION_HEADER: &str =
    "# parameters(left_min_length left_max_length right_min_length right_max_length)";
const LEFT_COUNT_MARKER: &str = "# L count";
const RIGHT_COUNT_MARKER: &str = "# R count";
const BRANCHING_HEADER: &str = "# parameters (min_length max_length)";
const LEFT_EXTENSION_MARKER: &str = "# left side extension";
const RIGHT_EXTENSION_MARKER: &str = "# right side extension";

/// Writes a [`CohesionModel`] to `path`.
pub fn save_cohesion<P: AsRef<Path>>(model: &CohesionModel, path: P) -> Result<()> {
    let cfg = model.config();
    write_atomically(path.as_ref(), |out| {
        writeln!(out, "{COHESION_HEADER}")?;
        writeln!(
            out,
            "{} {} {} {}",
            cfg.left_min_length, cfg.left_max_length, cfg.right_min_length, cfg.right_max_length
        )?;
        writeln!(out, "{LEFT_COUNT_MARKER}")?;
        write_counter(out, model.left_counter())?;
        writeln!(out, "{RIGHT_COUNT_MARKER}")?;
        write_counter(out, model.right_counter())
    })
}

/// Reads a [`CohesionModel`] from `path`.
pub fn load_cohesion<P: AsRef<Path>>(path: P) -> Result<CohesionModel> {
    let path = path.as_ref();
    let contents = read_file(path)?;
    let mut lines = NumberedLines::new(&contents);

    expect_comment(path, &mut lines)?;
    let (number, params) = lines.expect_line(path, "length parameters")?;
    let values = parse_numbers::<usize>(path, number, params, 4)?;
    let config = CohesionConfig {
        left_min_length: values[0],
        left_max_length: values[1],
        right_min_length: values[2],
        right_max_length: values[3],
    };
    config
        .validate()
        .map_err(|err| LexsegError::malformed(path, number, err.to_string()))?;
    expect_marker(path, &mut lines, LEFT_COUNT_MARKER)?;

    let mut left = SubstringCounter::new();
    let mut right = SubstringCounter::new();
    let mut in_right = false;
    for (number, line) in lines {
        if line == RIGHT_COUNT_MARKER {
            if in_right {
                return Err(LexsegError::malformed(path, number, "duplicate '# R count' marker"));
            }
            in_right = true;
            continue;
        }
        let (word, count) = line
            .split_once('\t')
            .ok_or_else(|| LexsegError::malformed(path, number, "expected 'word<TAB>count'"))?;
        let count = count
            .trim_end()
            .parse::<usize>()
            .map_err(|err| LexsegError::malformed(path, number, format!("invalid count: {err}")))?;
        let counter = if in_right { &mut right } else { &mut left };
        counter.insert(word.to_owned(), count);
    }
    if !in_right {
        return Err(LexsegError::malformed(
            path,
            contents.lines().count() + 1,
            "missing '# R count' marker",
        ));
    }

    Ok(CohesionModel::from_counters(config, left, right))
}

/// Writes the encoder to `encoder_path` and the model to `model_path`.
///
/// Both files are staged next to their targets before either target is replaced; the model
/// file is replaced last.
pub fn save_branching<P: AsRef<Path>, Q: AsRef<Path>>(
    model: &BranchingEntropyModel,
    model_path: P,
    encoder_path: Q,
) -> Result<()> {
    let encoder_path = encoder_path.as_ref();
    let model_path = model_path.as_ref();
    let cfg = model.config();
    let staged_encoder = stage(encoder_path, |out| write_encoder(out, model.encoder()))?;
    let staged_model = stage(model_path, |out| {
        writeln!(out, "{BRANCHING_HEADER}")?;
        writeln!(out, "{} {}", cfg.min_length, cfg.max_length)?;
        writeln!(out, "{LEFT_EXTENSION_MARKER}")?;
        write_branches(out, model.left_branches())?;
        writeln!(out, "{RIGHT_EXTENSION_MARKER}")?;
        write_branches(out, model.right_branches())
    })?;
    persist(staged_encoder, encoder_path)?;
    persist(staged_model, model_path)
}

/// Reads a [`BranchingEntropyModel`] and the encoder its ids refer to.
pub fn load_branching<P: AsRef<Path>, Q: AsRef<Path>>(
    model_path: P,
    encoder_path: Q,
) -> Result<BranchingEntropyModel> {
    let encoder = load_encoder(encoder_path)?;
    let path = model_path.as_ref();
    let contents = read_file(path)?;
    let mut lines = NumberedLines::new(&contents);

    expect_comment(path, &mut lines)?;
    let (number, params) = lines.expect_line(path, "window parameters")?;
    let values = parse_numbers::<usize>(path, number, params, 2)?;
    let config = BranchingConfig {
        min_length: values[0],
        max_length: values[1],
    };
    config
        .validate()
        .map_err(|err| LexsegError::malformed(path, number, err.to_string()))?;
    expect_marker(path, &mut lines, LEFT_EXTENSION_MARKER)?;

    let mut left: FxHashMap<EncodedId, Branch> = FxHashMap::default();
    let mut right: FxHashMap<EncodedId, Branch> = FxHashMap::default();
    let mut in_right = false;
    for (number, line) in lines {
        if line == RIGHT_EXTENSION_MARKER {
            if in_right {
                return Err(LexsegError::malformed(
                    path,
                    number,
                    "duplicate '# right side extension' marker",
                ));
            }
            in_right = true;
            continue;
        }
        let ids = parse_numbers::<usize>(path, number, line, 3)?;
        let word = known_id(path, number, &encoder, ids[0])?;
        let extension = known_id(path, number, &encoder, ids[1])?;
        let side = if in_right { &mut right } else { &mut left };
        side.entry(word).or_default().insert(extension, ids[2]);
    }
    if !in_right {
        return Err(LexsegError::malformed(
            path,
            contents.lines().count() + 1,
            "missing '# right side extension' marker",
        ));
    }

    Ok(BranchingEntropyModel::from_parts(config, encoder, left, right))
}

/// Writes an [`IntegerEncoder`] to `path`.
pub fn save_encoder<P: AsRef<Path>>(encoder: &IntegerEncoder, path: P) -> Result<()> {
    write_atomically(path.as_ref(), |out| write_encoder(out, encoder))
}

/// Reads an [`IntegerEncoder`] from `path`.
pub fn load_encoder<P: AsRef<Path>>(path: P) -> Result<IntegerEncoder> {
    let path = path.as_ref();
    let contents = read_file(path)?;
    let body = contents.strip_suffix('\n').unwrap_or(&contents);
    let mut encoder = IntegerEncoder::new();
    if contents.is_empty() {
        return Ok(encoder);
    }
    for (idx, line) in body.split('\n').enumerate() {
        let text = unescape(line)
            .ok_or_else(|| LexsegError::malformed(path, idx + 1, "invalid escape sequence"))?;
        if encoder.fit(&text) as usize != idx {
            return Err(LexsegError::malformed(path, idx + 1, "duplicate entry"));
        }
    }
    Ok(encoder)
}

fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let temp = stage(path, write)?;
    persist(temp, path)
}

/// Writes a temporary file next to `path` without replacing `path`.
fn stage<F>(path: &Path, write: F) -> Result<NamedTempFile>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let io_error = |err: io::Error| LexsegError::io(err, Some(path.to_path_buf()));
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(parent).map_err(io_error)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        write(&mut writer).map_err(io_error)?;
        writer.flush().map_err(io_error)?;
    }
    Ok(temp)
}

fn persist(temp: NamedTempFile, path: &Path) -> Result<()> {
    temp.persist(path)
        .map_err(|err| LexsegError::io(err.error, Some(path.to_path_buf())))?;
    Ok(())
}

fn write_encoder(out: &mut dyn Write, encoder: &IntegerEncoder) -> io::Result<()> {
    for (_, text) in encoder.iter() {
        writeln!(out, "{}", escape(text))?;
    }
    Ok(())
}

fn write_counter(out: &mut dyn Write, counter: &SubstringCounter) -> io::Result<()> {
    let mut entries: Vec<(&str, usize)> = counter.iter().collect();
    entries.sort_unstable();
    for (word, count) in entries {
        writeln!(out, "{word}\t{count}")?;
    }
    Ok(())
}

fn write_branches(out: &mut dyn Write, side: &FxHashMap<EncodedId, Branch>) -> io::Result<()> {
    let mut entries: Vec<(EncodedId, EncodedId, usize)> = side
        .iter()
        .flat_map(|(&word, branch)| {
            branch
                .iter()
                .map(move |(&extension, &count)| (word, extension, count))
        })
        .collect();
    entries.sort_unstable();
    for (word, extension, count) in entries {
        writeln!(out, "{word} {extension} {count}")?;
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| LexsegError::io(err, Some(path.to_path_buf())))
}

/// Lines of a file paired with their 1-based numbers.
struct NumberedLines<'a> {
    inner: std::str::Lines<'a>,
    number: usize,
}

impl<'a> NumberedLines<'a> {
    fn new(contents: &'a str) -> Self {
        Self {
            inner: contents.lines(),
            number: 0,
        }
    }

    /// Next line, or a `Malformed` error pointing one past the last line.
    fn expect_line(&mut self, path: &Path, expected: &str) -> Result<(usize, &'a str)> {
        self.next().ok_or_else(|| {
            LexsegError::malformed(
                path,
                self.number + 1,
                format!("unexpected end of file, expected {expected}"),
            )
        })
    }
}

impl<'a> Iterator for NumberedLines<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.inner.next()?;
        self.number += 1;
        Some((self.number, line))
    }
}

fn expect_comment(path: &Path, lines: &mut NumberedLines<'_>) -> Result<()> {
    let (number, text) = lines.expect_line(path, "header comment")?;
    if text.starts_with('#') {
        Ok(())
    } else {
        Err(LexsegError::malformed(path, number, "expected '#' header comment"))
    }
}

fn expect_marker(path: &Path, lines: &mut NumberedLines<'_>, marker: &str) -> Result<()> {
    let (number, text) = lines.expect_line(path, marker)?;
    if text.trim_end() == marker {
        Ok(())
    } else {
        Err(LexsegError::malformed(path, number, format!("expected '{marker}'")))
    }
}

fn parse_numbers<T: std::str::FromStr>(
    path: &Path,
    number: usize,
    line: &str,
    expected: usize,
) -> Result<Vec<T>> {
    let values = line
        .split_whitespace()
        .map(str::parse::<T>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| LexsegError::malformed(path, number, "expected non-negative integers"))?;
    if values.len() != expected {
        return Err(LexsegError::malformed(
            path,
            number,
            format!("expected {expected} integers, found {}", values.len()),
        ));
    }
    Ok(values)
}

fn known_id(path: &Path, number: usize, encoder: &IntegerEncoder, id: usize) -> Result<EncodedId> {
    match EncodedId::try_from(id) {
        Ok(id) if (id as usize) < encoder.len() => Ok(id),
        _ => Err(LexsegError::malformed(
            path,
            number,
            format!("id {id} is not in the encoder table"),
        )),
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape(text: &str) -> Option<String> {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            unescaped.push(ch);
            continue;
        }
        match chars.next()? {
            '\\' => unescaped.push('\\'),
            'n' => unescaped.push('\n'),
            'r' => unescaped.push('\r'),
            _ => return None,
        }
    }
    Some(unescaped)
}
