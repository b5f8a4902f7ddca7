// Copyright 2019 Dmitry Tantsur <dtantsur@protonmail.com>
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

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash of a secret suitable for debug output.
pub fn secret_hash(secret: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    secret.hash(&mut hasher);
    hasher.finish()
}

/// Quote a string, escaping backslashes and double quotes.
pub fn quote(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    result.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            result.push('\\');
        }
        result.push(c);
    }
    result.push('"');
    result
}

/// Strip surrounding double quotes and undo the escaping done by `quote`.
///
/// Returns `None` if the value is not quoted. Unknown escapes are kept as they are.
pub fn unquote(value: &str) -> Option<String> {
    let inner = value.strip_prefix('"')?.strip_suffix('"')?;
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some(next) if next == '"' || next == '\\' => result.push(next),
            Some(next) => {
                result.push(c);
                result.push(next);
            }
            None => result.push(c),
        }
    }
    Some(result)
}

#[cfg(test)]
pub mod test {
    use super::{quote, secret_hash, unquote};

    #[test]
    fn test_secret_hash() {
        assert_eq!(secret_hash("abc"), secret_hash("abc"));
        assert_ne!(secret_hash("abc"), secret_hash("abd"));
    }

    #[test]
    fn test_quote_unquote() {
        assert_eq!(quote(r#"a "b" c\d"#), r#""a \"b\" c\\d""#);
        assert_eq!(unquote(r#""a \"b\" c\\d""#).unwrap(), r#"a "b" c\d"#);
        assert_eq!(unquote(r#""C:\\temp\n""#).unwrap(), r#"C:\temp\n"#);
        assert_eq!(unquote(r#""\\""#).unwrap(), "\\");
        assert_eq!(unquote(r#""""#).unwrap(), "");
        assert!(unquote("plain").is_none());
        assert!(unquote("\"").is_none());
    }
}
