//! Text encoding of the candidate pool and labels for the trainer.
//!
//! Data file:
//!
//! ```text
//! n_items: 2
//! n_samples: 4
//! {0=1}  1 0 1 0
//! {0=1,1=0}  1 0 0 0
//! ```
//!
//! Label file:
//!
//! ```text
//! n_items: 2
//! n_samples: 4
//! {label=0} 0 1 0 1
//! {label=1} 1 0 1 0
//! ```
//!
//! The trainer reads these byte for byte: header keys, their order, the two
//! spaces after a data item and the single space after a label item matter.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use crate::error::{Result, RuleListError};
use crate::pool::CandidatePool;

const ITEMS_KEY: &str = "n_items:";
const SAMPLES_KEY: &str = "n_samples:";

fn bit_string(bits: impl IntoIterator<Item = bool>) -> String {
    bits.into_iter()
        .map(|bit| if bit { "1" } else { "0" })
        .join(" ")
}

/// Write the mined candidates (not the implicit default) and their masks.
pub fn write_data<W: Write>(mut w: W, pool: &CandidatePool) -> Result<()> {
    writeln!(w, "{} {}", ITEMS_KEY, pool.n_mined())?;
    writeln!(w, "{} {}", SAMPLES_KEY, pool.n_samples())?;
    for (candidate, mask) in pool.mined() {
        writeln!(
            w,
            "{}  {}",
            candidate.item_str(),
            bit_string(mask.iter().copied())
        )?;
    }
    w.flush()?;
    Ok(())
}

/// Write one indicator line per class in `0..n_classes`.
pub fn write_labels<W: Write>(mut w: W, y: &[usize], n_classes: usize) -> Result<()> {
    writeln!(w, "{} {}", ITEMS_KEY, n_classes)?;
    writeln!(w, "{} {}", SAMPLES_KEY, y.len())?;
    for label in 0..n_classes {
        writeln!(
            w,
            "{{label={}}} {}",
            label,
            bit_string(y.iter().map(|&l| l == label))
        )?;
    }
    w.flush()?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn write_data_file(path: impl AsRef<Path>, pool: &CandidatePool) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    write_data(BufWriter::new(File::create(path)?), pool)
}

pub fn write_label_file(path: impl AsRef<Path>, y: &[usize], n_classes: usize) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    write_labels(BufWriter::new(File::create(path)?), y, n_classes)
}

/// Contents of an encoded data or label file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedItems {
    pub names: Vec<String>,
    pub masks: Vec<Vec<bool>>,
    pub n_samples: usize,
}

impl EncodedItems {
    pub fn n_items(&self) -> usize {
        self.names.len()
    }
}

fn header_value<R: BufRead>(lines: &mut std::io::Lines<R>, key: &str) -> Result<usize> {
    let line = lines
        .next()
        .ok_or_else(|| RuleListError::format(format!("missing `{}` header", key)))??;
    let value = line
        .strip_prefix(key)
        .ok_or_else(|| RuleListError::format(format!("expected `{}` header, got {:?}", key, line)))?;
    value
        .trim()
        .parse()
        .map_err(|_| RuleListError::format(format!("invalid `{}` value {:?}", key, value.trim())))
}

/// Parse either file format back. Item names end at the first space, which is
/// how the trainer splits them.
pub fn read_encoded<R: BufRead>(r: R) -> Result<EncodedItems> {
    let mut lines = r.lines();
    let n_items = header_value(&mut lines, ITEMS_KEY)?;
    let n_samples = header_value(&mut lines, SAMPLES_KEY)?;

    let mut names = Vec::with_capacity(n_items);
    let mut masks = Vec::with_capacity(n_items);
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (name, bits) = line
            .split_once(' ')
            .ok_or_else(|| RuleListError::format(format!("item line without bits: {:?}", line)))?;
        let mask = bits
            .split_whitespace()
            .map(|bit| match bit {
                "1" => Ok(true),
                "0" => Ok(false),
                other => Err(RuleListError::format(format!(
                    "invalid bit {:?} for item {}",
                    other, name
                ))),
            })
            .collect::<Result<Vec<bool>>>()?;
        if mask.len() != n_samples {
            return Err(RuleListError::format(format!(
                "item {} has {} bits, expected {}",
                name,
                mask.len(),
                n_samples
            )));
        }
        names.push(name.to_string());
        masks.push(mask);
    }

    if names.len() != n_items {
        return Err(RuleListError::format(format!(
            "header declares {} items, found {}",
            n_items,
            names.len()
        )));
    }
    Ok(EncodedItems {
        names,
        masks,
        n_samples,
    })
}

pub fn read_data_file(path: impl AsRef<Path>) -> Result<EncodedItems> {
    read_encoded(BufReader::new(File::open(path)?))
}

pub fn read_label_file(path: impl AsRef<Path>) -> Result<EncodedItems> {
    read_encoded(BufReader::new(File::open(path)?))
}
