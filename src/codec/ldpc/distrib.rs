// Copyright 2025 The unboxing authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Column weight distributions for parity-check construction.

use crate::error::{Result, UnboxError};
use crate::strutil;

/// One entry of a weight distribution: a proportion of columns and the
/// number of 1s each of those columns carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistribEntry {
    /// Fraction of the columns covered by this entry.
    pub prop: f64,
    /// 1s per column for this entry.
    pub num: usize,
}

/// A column weight distribution.
///
/// Parsed from either a plain count (`"3"`: every column carries three 1s)
/// or a `/`-separated list of `proportion x count` entries such as
/// `"0.4x2/0.6x3"`. Proportions must sum to one.
#[derive(Debug, Clone)]
pub struct Distribution {
    entries: Vec<DistribEntry>,
}

impl Distribution {
    /// Parses a distribution specification.
    pub fn from_spec(spec: &str) -> Result<Self> {
        if let Some(num) = strutil::to_integer(spec) {
            if num == 0 {
                return Err(UnboxError::Construction(
                    "column weight must be positive".to_owned(),
                ));
            }
            return Ok(Self {
                entries: vec![DistribEntry {
                    prop: 1.0,
                    num: num as usize,
                }],
            });
        }

        let mut entries = Vec::new();
        for part in strutil::split(spec, "/") {
            let fields = strutil::split(&part, "x");
            if fields.len() != 2 {
                return Err(UnboxError::Construction(format!(
                    "bad distribution entry '{part}'"
                )));
            }
            let prop: f64 = fields[0].parse().map_err(|_| {
                UnboxError::Construction(format!("bad proportion '{}'", fields[0]))
            })?;
            let num = strutil::to_integer(&fields[1]).ok_or_else(|| {
                UnboxError::Construction(format!("bad column weight '{}'", fields[1]))
            })?;
            if !(0.0..=1.0).contains(&prop) || num == 0 {
                return Err(UnboxError::Construction(format!(
                    "distribution entry '{part}' out of range"
                )));
            }
            entries.push(DistribEntry {
                prop,
                num: num as usize,
            });
        }

        let total: f64 = entries.iter().map(|e| e.prop).sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(UnboxError::Construction(format!(
                "distribution proportions sum to {total}, expected 1"
            )));
        }
        Ok(Self { entries })
    }

    /// Number of entries.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Column weight of entry `z`.
    pub fn num(&self, z: usize) -> usize {
        self.entries[z].num
    }

    /// Column proportion of entry `z`.
    pub fn prop(&self, z: usize) -> f64 {
        self.entries[z].prop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_count() {
        let d = Distribution::from_spec("3").unwrap();
        assert_eq!(d.size(), 1);
        assert_eq!(d.num(0), 3);
        assert_eq!(d.prop(0), 1.0);
    }

    #[test]
    fn test_entry_list() {
        let d = Distribution::from_spec("0.4x2/0.6x3").unwrap();
        assert_eq!(d.size(), 2);
        assert_eq!(d.num(0), 2);
        assert_eq!(d.prop(1), 0.6);
    }

    #[test]
    fn test_rejects_bad_specs() {
        assert!(Distribution::from_spec("0").is_err());
        assert!(Distribution::from_spec("").is_err());
        assert!(Distribution::from_spec("0.5x2").is_err());
        assert!(Distribution::from_spec("0.5x2/0.6x3").is_err());
        assert!(Distribution::from_spec("ax2/bx3").is_err());
    }
}
