//! TOML configuration file: the static user table and symbol allow-list. Parsed with `serde` + `toml`,
//! the way `unicity-astrid`'s config crate parses its own static TOML files. Unknown keys anywhere in the file are
//! fatal, enforced per-table with `#[serde(deny_unknown_fields)]`.

//local shortcuts
use crate::errors::ConfigError;

//third-party shortcuts
use regex::Regex;
use serde::Deserialize;

//standard shortcuts
use std::collections::HashMap;
use std::path::Path;

//-------------------------------------------------------------------------------------------------------------------

/// A single entry of `[users.<key>]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRecord
{
    pub component: String,
    pub username: String,
    /// Shared secret or plaintext password, depending on `--client.auth_method`; consumed only by
    /// [`crate::crypto::validate`].
    pub password: String,
    pub strategy_id: u32,
    #[serde(default)]
    pub accounts: Vec<String>,
}

//-------------------------------------------------------------------------------------------------------------------

/// `username -> UserRecord`, built from the `[users]` table at startup and mutable thereafter via
/// [`crate::shared::Shared::insert_user`] / [`crate::shared::Shared::remove_user`].
#[derive(Debug, Default, Clone)]
pub struct UserTable(HashMap<String, UserRecord>);

impl UserTable
{
    pub fn get(&self, username: &str) -> Option<&UserRecord>
    {
        self.0.get(username)
    }

    pub fn insert(&mut self, record: UserRecord)
    {
        self.0.insert(record.username.clone(), record);
    }

    pub fn remove(&mut self, username: &str) -> Option<UserRecord>
    {
        self.0.remove(username)
    }
}

//-------------------------------------------------------------------------------------------------------------------

/// Compiled `[symbols]` allow-list: each configured entry is a regular expression matched against an instrument
/// symbol. An empty list matches nothing; use [`SymbolAllowList::allow_all`] for "no restriction".
#[derive(Debug, Default)]
pub struct SymbolAllowList
{
    patterns: Vec<Regex>,
}

impl SymbolAllowList
{
    pub fn compile(patterns: &[String]) -> Result<Self, ConfigError>
    {
        let compiled = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::BadSymbolPattern{
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self{ patterns: compiled })
    }

    pub fn allow_all() -> Self
    {
        Self{ patterns: vec![Regex::new(".*").expect("static pattern is valid")] }
    }

    pub fn is_allowed(&self, symbol: &str) -> bool
    {
        self.patterns.iter().any(|pattern| pattern.is_match(symbol))
    }
}

//-------------------------------------------------------------------------------------------------------------------

/// One raw value or a list of values; `[symbols]` may be written either way in the TOML file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany
{
    One(String),
    Many(Vec<String>),
}

impl OneOrMany
{
    fn into_vec(self) -> Vec<String>
    {
        match self
        {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

//-------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfigFile
{
    #[serde(default)]
    symbols: Option<OneOrMany>,
    #[serde(default)]
    users: HashMap<String, UserRecord>,
}

//-------------------------------------------------------------------------------------------------------------------

/// The fully parsed and compiled contents of the TOML config file.
#[derive(Debug)]
pub struct ConfigFile
{
    pub symbols: SymbolAllowList,
    pub users: UserTable,
}

impl ConfigFile
{
    pub fn load(path: &Path) -> Result<Self, ConfigError>
    {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io{ path: path.to_path_buf(), source })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError>
    {
        let raw: RawConfigFile = toml::from_str(text)
            .map_err(|source| ConfigError::Toml{ path: path.to_path_buf(), source: Box::new(source) })?;

        let pattern_list = raw.symbols.map(OneOrMany::into_vec).unwrap_or_default();
        let symbols = SymbolAllowList::compile(&pattern_list)?;

        let mut users = UserTable::default();
        for (key, mut record) in raw.users
        {
            if record.username.is_empty() { record.username = key; }
            users.insert(record);
        }

        Ok(Self{ symbols, users })
    }
}

//-------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn parses_single_symbol_value_and_user_table()
    {
        let toml = r#"
            symbols = "^ES.*"

            [users.alice]
            component = "ALICE_CO"
            username = "alice"
            password = "s3cret"
            strategy_id = 42
        "#;

        let parsed = ConfigFile::parse(toml, Path::new("test.toml")).expect("should parse");
        assert!(parsed.symbols.is_allowed("ESU24"));
        assert!(!parsed.symbols.is_allowed("CLU24"));

        let alice = parsed.users.get("alice").expect("alice should exist");
        assert_eq!(alice.strategy_id, 42);
    }

    #[test]
    fn parses_symbol_list_form()
    {
        let toml = r#"symbols = ["^ES.*", "^CL.*"]"#;
        let parsed = ConfigFile::parse(toml, Path::new("test.toml")).expect("should parse");
        assert!(parsed.symbols.is_allowed("CLU24"));
    }

    #[test]
    fn unknown_top_level_key_is_fatal()
    {
        let toml = r#"unexpected = true"#;
        assert!(ConfigFile::parse(toml, Path::new("test.toml")).is_err());
    }

    #[test]
    fn unknown_user_field_is_fatal()
    {
        let toml = r#"
            [users.alice]
            component = "ALICE_CO"
            username = "alice"
            password = "s3cret"
            strategy_id = 42
            extra_unknown_field = true
        "#;
        assert!(ConfigFile::parse(toml, Path::new("test.toml")).is_err());
    }

    #[test]
    fn bad_regex_pattern_is_fatal()
    {
        let toml = r#"symbols = "(unterminated""#;
        assert!(ConfigFile::parse(toml, Path::new("test.toml")).is_err());
    }
}
