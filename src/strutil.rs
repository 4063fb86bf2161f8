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

//! Small string helpers used by property parsing.
//!
//! Codec properties and weight distributions arrive as text taken from frame
//! format descriptors; these helpers implement the exact splitting and
//! integer-parsing rules that format expects.

/// Deep-copies an optional string.
///
/// Returns `None` when the input is absent.
pub fn clone_str(string: Option<&str>) -> Option<String> {
    string.map(str::to_owned)
}

/// Splits `string` into substrings on every occurrence of `separator`.
///
/// An empty separator, or one longer than the input, yields a single-element
/// vector holding a copy of the input. When the input ends with the
/// separator, a trailing empty substring is emitted.
pub fn split(string: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() || separator.len() > string.len() {
        return vec![string.to_owned()];
    }

    let mut parts = Vec::new();
    let mut rest = string;
    while let Some(pos) = rest.find(separator) {
        parts.push(rest[..pos].to_owned());
        rest = &rest[pos + separator.len()..];
    }
    parts.push(rest.to_owned());
    parts
}

/// Parses an unsigned decimal integer.
///
/// Rejects the empty string and any input containing a non-digit character
/// (including signs and surrounding whitespace), as well as values that do
/// not fit in a `u64`.
pub fn to_integer(string: &str) -> Option<u64> {
    if string.is_empty() {
        return None;
    }

    let mut value: u64 = 0;
    for byte in string.bytes() {
        if !byte.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_add(u64::from(byte - b'0'))?;
    }
    Some(value)
}
