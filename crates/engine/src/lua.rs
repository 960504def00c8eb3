//! Decoder for the Lua table text that addons write as SavedVariables.
//!
//! Only the data subset of Lua is understood: global assignments whose values
//! are tables, strings, numbers, booleans or `nil`. Table entries keep the
//! order in which they appear in the file, which is the order the addon
//! recorded them in.

use std::fmt;

use pest::Parser;
use pest_derive::Parser;

use crate::{EngineError, ResultEngine};

#[derive(Parser)]
#[grammar = "lua.pest"]
struct LuaParser;

type Pair<'i> = pest::iterators::Pair<'i, Rule>;

/// Key of a table entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LuaKey {
    /// `[1] = ...` or a positional entry.
    Index(i64),
    /// `["name"] = ...` or `name = ...`.
    Name(String),
    /// Any other key (booleans, fractional numbers), kept in text form.
    Other(String),
}

impl fmt::Display for LuaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Name(name) => write!(f, "[{name:?}]"),
            Self::Other(text) => write!(f, "[{text}]"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LuaValue {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Table(LuaTable),
}

impl LuaValue {
    pub fn as_table(&self) -> Option<&LuaTable> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Short name of the value type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Table(_) => "table",
        }
    }
}

/// Ordered list of table entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LuaTable {
    entries: Vec<(LuaKey, LuaValue)>,
}

impl LuaTable {
    pub fn new(entries: Vec<(LuaKey, LuaValue)>) -> Self {
        Self { entries }
    }

    /// Value stored under a string key.
    pub fn get(&self, name: &str) -> Option<&LuaValue> {
        self.entries.iter().find_map(|(key, value)| match key {
            LuaKey::Name(key) if key == name => Some(value),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LuaKey, &LuaValue)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A whole SavedVariables file: the globals it assigns, in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LuaDocument {
    globals: Vec<(String, LuaValue)>,
}

impl LuaDocument {
    pub fn global(&self, name: &str) -> Option<&LuaValue> {
        self.globals
            .iter()
            .find_map(|(global, value)| (global == name).then_some(value))
    }
}

/// Parses a SavedVariables document.
///
/// A syntax error anywhere in the text fails the whole document.
pub fn parse(text: &str) -> ResultEngine<LuaDocument> {
    let mut pairs = LuaParser::parse(Rule::document, text)
        .map_err(|err| EngineError::Decode(err.to_string()))?;
    let document = pairs
        .next()
        .ok_or_else(|| EngineError::Decode("empty document".to_string()))?;

    let mut globals = Vec::new();
    for pair in document.into_inner() {
        match pair.as_rule() {
            Rule::assignment => {
                let mut inner = pair.into_inner();
                let (Some(name), Some(value)) = (inner.next(), inner.next()) else {
                    return Err(EngineError::Decode("incomplete assignment".to_string()));
                };
                globals.push((name.as_str().to_string(), decode_value(value)?));
            }
            Rule::EOI => break,
            rule => return Err(unexpected(rule)),
        }
    }

    Ok(LuaDocument { globals })
}

fn unexpected(rule: Rule) -> EngineError {
    EngineError::Decode(format!("unexpected {rule:?}"))
}

fn decode_value(pair: Pair<'_>) -> ResultEngine<LuaValue> {
    match pair.as_rule() {
        Rule::nil => Ok(LuaValue::Nil),
        Rule::boolean => Ok(LuaValue::Boolean(pair.as_str() == "true")),
        Rule::number => decode_number(pair.as_str()),
        Rule::string => {
            let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(LuaValue::String(unescape(raw)))
        }
        Rule::table => decode_table(pair).map(LuaValue::Table),
        rule => Err(unexpected(rule)),
    }
}

fn decode_number(text: &str) -> ResultEngine<LuaValue> {
    let invalid = || EngineError::Decode(format!("invalid number: {text}"));
    if !text.contains(['.', 'e', 'E'])
        && let Ok(value) = text.parse::<i64>()
    {
        return Ok(LuaValue::Integer(value));
    }
    text.parse::<f64>()
        .map(LuaValue::Float)
        .map_err(|_| invalid())
}

fn decode_table(pair: Pair<'_>) -> ResultEngine<LuaTable> {
    let mut entries = Vec::new();
    let mut next_index = 1;

    for field in pair.into_inner() {
        match field.as_rule() {
            Rule::keyed_field => {
                let mut inner = field.into_inner();
                let (Some(key), Some(value)) = (inner.next(), inner.next()) else {
                    return Err(EngineError::Decode("incomplete table entry".to_string()));
                };
                let key = table_key(decode_value(key)?)?;
                entries.push((key, decode_value(value)?));
            }
            Rule::named_field => {
                let mut inner = field.into_inner();
                let (Some(name), Some(value)) = (inner.next(), inner.next()) else {
                    return Err(EngineError::Decode("incomplete table entry".to_string()));
                };
                entries.push((
                    LuaKey::Name(name.as_str().to_string()),
                    decode_value(value)?,
                ));
            }
            Rule::positional_field => {
                let value = field
                    .into_inner()
                    .next()
                    .ok_or_else(|| EngineError::Decode("empty table entry".to_string()))?;
                entries.push((LuaKey::Index(next_index), decode_value(value)?));
                next_index += 1;
            }
            rule => return Err(unexpected(rule)),
        }
    }

    Ok(LuaTable { entries })
}

fn table_key(value: LuaValue) -> ResultEngine<LuaKey> {
    match value {
        LuaValue::Integer(index) => Ok(LuaKey::Index(index)),
        LuaValue::String(name) => Ok(LuaKey::Name(name)),
        LuaValue::Float(number) if number.fract() == 0.0 && number.abs() < i64::MAX as f64 => {
            Ok(LuaKey::Index(number as i64))
        }
        LuaValue::Float(number) => Ok(LuaKey::Other(number.to_string())),
        LuaValue::Boolean(flag) => Ok(LuaKey::Other(flag.to_string())),
        other => Err(EngineError::Decode(format!(
            "{} is not a valid table key",
            other.type_name()
        ))),
    }
}

/// Resolves Lua escape sequences. Strings are byte strings in Lua, so a
/// decimal or hex escape that does not form valid UTF-8 is replaced.
fn unescape(raw: &str) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(raw.len());
    let bytes = raw.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'\\' || i + 1 == bytes.len() {
            out.push(byte);
            i += 1;
            continue;
        }

        let escaped = bytes[i + 1];
        i += 2;
        match escaped {
            b'n' | b'\n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'x' => {
                let end = (i + 2).min(bytes.len());
                match std::str::from_utf8(&bytes[i..end])
                    .ok()
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                {
                    Some(value) => {
                        out.push(value);
                        i = end;
                    }
                    None => out.extend_from_slice(b"\\x"),
                }
            }
            b'z' => {
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
            }
            digit if digit.is_ascii_digit() => {
                let mut value = u32::from(digit - b'0');
                let mut taken = 1;
                while taken < 3 && i < bytes.len() && bytes[i].is_ascii_digit() {
                    value = value * 10 + u32::from(bytes[i] - b'0');
                    i += 1;
                    taken += 1;
                }
                out.push(u8::try_from(value).unwrap_or(u8::MAX));
            }
            other => out.push(other),
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
GBLDataSavedVariables =
{
    ["Default"] =
    {
        ["@leader"] =
        {
            ["$AccountWide"] =
            {
                ["version"] = 1.5,
                ["history"] =
                {
                    ["Guild One"] =
                    {
                        [1] = "1700000000\t@alice\tdep_gold\t5001\tnil\t\t\tnil\t101",
                        [2] = "1700000100\t@bob\tdep_item\tnil\t3\tPotion\t|H1:item|h|h\t12.7\t102",
                    },
                },
            },
        },
    },
}
"#;

    #[test]
    fn parses_nested_saved_variables() {
        let doc = parse(SAMPLE).unwrap();
        let root = doc.global("GBLDataSavedVariables").unwrap().as_table().unwrap();
        let account_wide = root
            .get("Default")
            .and_then(LuaValue::as_table)
            .and_then(|t| t.get("@leader"))
            .and_then(LuaValue::as_table)
            .and_then(|t| t.get("$AccountWide"))
            .and_then(LuaValue::as_table)
            .unwrap();
        assert_eq!(account_wide.get("version"), Some(&LuaValue::Float(1.5)));

        let guild = account_wide
            .get("history")
            .and_then(LuaValue::as_table)
            .and_then(|t| t.get("Guild One"))
            .and_then(LuaValue::as_table)
            .unwrap();
        assert_eq!(guild.len(), 2);
        let (key, first) = guild.iter().next().unwrap();
        assert_eq!(key, &LuaKey::Index(1));
        assert_eq!(
            first.as_str(),
            Some("1700000000\t@alice\tdep_gold\t5001\tnil\t\t\tnil\t101")
        );
    }

    #[test]
    fn positional_and_named_entries() {
        let doc = parse("X = { 10, \"a\", name = true, nil, [7] = -2 }").unwrap();
        let table = doc.global("X").unwrap().as_table().unwrap();
        let entries: Vec<_> = table.iter().collect();
        assert_eq!(entries[0], (&LuaKey::Index(1), &LuaValue::Integer(10)));
        assert_eq!(
            entries[1],
            (&LuaKey::Index(2), &LuaValue::String("a".to_string()))
        );
        assert_eq!(
            entries[2],
            (&LuaKey::Name("name".to_string()), &LuaValue::Boolean(true))
        );
        assert_eq!(entries[3], (&LuaKey::Index(3), &LuaValue::Nil));
        assert_eq!(entries[4], (&LuaKey::Index(7), &LuaValue::Integer(-2)));
    }

    #[test]
    fn escapes_are_resolved() {
        let doc = parse(r#"S = { "a\"b\\c\65\x42\n" }"#).unwrap();
        let table = doc.global("S").unwrap().as_table().unwrap();
        let (_, value) = table.iter().next().unwrap();
        assert_eq!(value.as_str(), Some("a\"b\\cAB\n"));
    }

    #[test]
    fn comments_and_empty_tables() {
        let doc = parse("-- written by the client\nA = {}\nB = { {}, }").unwrap();
        assert!(doc.global("A").unwrap().as_table().unwrap().is_empty());
        assert_eq!(doc.global("B").unwrap().as_table().unwrap().len(), 1);
    }

    #[test]
    fn syntax_error_fails_document() {
        let err = parse("A = { [1] = }").unwrap_err();
        assert!(matches!(err, EngineError::Decode(_)));
    }

    #[test]
    fn empty_text_is_an_empty_document() {
        let doc = parse("   \n").unwrap();
        assert_eq!(doc, LuaDocument::default());
    }
}
