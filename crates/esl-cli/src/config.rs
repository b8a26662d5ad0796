//! Minimal `[section]` / `key = value` ini reader for the demo CLI.
//!
//! Purely an ambient convenience: the core library never reads files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone)]
pub struct Config {
    sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    fn parse(text: &str) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut section = String::new();

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(stripped) = line.strip_prefix('[') {
                if let Some(name) = stripped.strip_suffix(']') {
                    section = name.trim().to_string();
                    sections.entry(section.clone()).or_default();
                    continue;
                }
            }

            let (key, value) = if let Some((k, v)) = line.split_once("=>") {
                (k, v)
            } else if let Some((k, v)) = line.split_once('=') {
                (k, v)
            } else {
                continue;
            };

            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }

        Self { sections }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }
}

/// Decodes a `sig:<0|1>{4}` config value into a 4-bit pattern, e.g.
/// `"sig:1010"` -> `0b1010`. Returns `None` for anything else (wrong
/// prefix, wrong length, or a digit other than `0`/`1`).
pub fn parse_cas_bits(value: &str) -> Option<u8> {
    let digits = value.strip_prefix("sig:")?;
    if digits.len() != 4 {
        return None;
    }
    let mut bits = 0u8;
    for c in digits.chars() {
        bits <<= 1;
        match c {
            '0' => {}
            '1' => bits |= 1,
            _ => return None,
        }
    }
    Some(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_both_separators() {
        let cfg = Config::parse(
            "# comment\n[connection]\nhost = 127.0.0.1\nport=>8021\n\n[auth]\npassword = ClueCon\n",
        );
        assert_eq!(cfg.get("connection", "host"), Some("127.0.0.1"));
        assert_eq!(cfg.get("connection", "port"), Some("8021"));
        assert_eq!(cfg.get("auth", "password"), Some("ClueCon"));
        assert_eq!(cfg.get("auth", "missing"), None);
    }

    #[test]
    fn ignores_blank_and_comment_lines() {
        let cfg = Config::parse("\n# top-level comment\nkey = value\n");
        assert_eq!(cfg.get("", "key"), Some("value"));
    }

    #[test]
    fn cas_bits_decodes_valid_pattern_and_rejects_malformed() {
        assert_eq!(parse_cas_bits("sig:1010"), Some(0b1010));
        assert_eq!(parse_cas_bits("sig:10A0"), None);
        assert_eq!(parse_cas_bits("sig:101"), None);
        assert_eq!(parse_cas_bits("nope"), None);
    }
}
