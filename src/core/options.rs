//! Build options - feature toggles passed to `Configure`.
//!
//! The vocabulary is closed: unknown option names are rejected rather than
//! ignored, so a typo in a profile cannot silently produce a different
//! library.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::BuildError;

/// A known build option, in `Configure` rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuildOption {
    NoThreads,
    NoZlib,
    Shared,
    NoAsm,
    I386,
    NoSse2,
    NoBf,
    NoCast,
    NoDes,
    NoDh,
    NoDsa,
    NoHmac,
    NoMd2,
    NoMd5,
    NoMdc2,
    NoRc2,
    NoRc4,
    NoRc5,
    NoRsa,
    NoSha,
}

impl BuildOption {
    pub const ALL: [BuildOption; 20] = [
        BuildOption::NoThreads,
        BuildOption::NoZlib,
        BuildOption::Shared,
        BuildOption::NoAsm,
        BuildOption::I386,
        BuildOption::NoSse2,
        BuildOption::NoBf,
        BuildOption::NoCast,
        BuildOption::NoDes,
        BuildOption::NoDh,
        BuildOption::NoDsa,
        BuildOption::NoHmac,
        BuildOption::NoMd2,
        BuildOption::NoMd5,
        BuildOption::NoMdc2,
        BuildOption::NoRc2,
        BuildOption::NoRc4,
        BuildOption::NoRc5,
        BuildOption::NoRsa,
        BuildOption::NoSha,
    ];

    /// Option name as used in profiles and `-o name=value`.
    pub fn name(&self) -> &'static str {
        match self {
            BuildOption::NoThreads => "no_threads",
            BuildOption::NoZlib => "no_zlib",
            BuildOption::Shared => "shared",
            BuildOption::NoAsm => "no_asm",
            BuildOption::I386 => "386",
            BuildOption::NoSse2 => "no_sse2",
            BuildOption::NoBf => "no_bf",
            BuildOption::NoCast => "no_cast",
            BuildOption::NoDes => "no_des",
            BuildOption::NoDh => "no_dh",
            BuildOption::NoDsa => "no_dsa",
            BuildOption::NoHmac => "no_hmac",
            BuildOption::NoMd2 => "no_md2",
            BuildOption::NoMd5 => "no_md5",
            BuildOption::NoMdc2 => "no_mdc2",
            BuildOption::NoRc2 => "no_rc2",
            BuildOption::NoRc4 => "no_rc4",
            BuildOption::NoRc5 => "no_rc5",
            BuildOption::NoRsa => "no_rsa",
            BuildOption::NoSha => "no_sha",
        }
    }

    /// `Configure` token: underscores become hyphens.
    pub fn configure_token(&self) -> String {
        self.name().replace('_', "-")
    }
}

impl fmt::Display for BuildOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildOption {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildOption::ALL
            .into_iter()
            .find(|opt| opt.name() == s)
            .ok_or_else(|| BuildError::UnknownOption {
                name: s.to_string(),
            })
    }
}

/// Values for every known option. Only enabled options are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OptionSet {
    enabled: BTreeSet<BuildOption>,
}

impl OptionSet {
    /// All options off.
    pub fn new() -> Self {
        OptionSet::default()
    }

    /// Build from name/value pairs, rejecting unknown names.
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        let mut set = OptionSet::new();
        for (name, value) in pairs {
            set.set_by_name(name.as_ref(), value)?;
        }
        Ok(set)
    }

    /// Parse a `name=value` assignment (value `true`/`false`, any case).
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), BuildError> {
        let (name, value) = match assignment.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => (assignment.trim(), "true"),
        };
        let value = match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => return Err(BuildError::invalid_setting(name, value)),
        };
        self.set_by_name(name, value)
    }

    pub fn set(&mut self, option: BuildOption, value: bool) {
        if value {
            self.enabled.insert(option);
        } else {
            self.enabled.remove(&option);
        }
    }

    pub fn with(mut self, option: BuildOption, value: bool) -> Self {
        self.set(option, value);
        self
    }

    pub fn set_by_name(&mut self, name: &str, value: bool) -> Result<(), BuildError> {
        let option: BuildOption = name.parse()?;
        self.set(option, value);
        Ok(())
    }

    pub fn get(&self, option: BuildOption) -> bool {
        self.enabled.contains(&option)
    }

    pub fn shared(&self) -> bool {
        self.get(BuildOption::Shared)
    }

    pub fn no_zlib(&self) -> bool {
        self.get(BuildOption::NoZlib)
    }

    pub fn no_asm(&self) -> bool {
        self.get(BuildOption::NoAsm)
    }

    /// Enabled options in declaration order.
    pub fn enabled(&self) -> impl Iterator<Item = BuildOption> + '_ {
        self.enabled.iter().copied()
    }

    /// `Configure` tokens for every enabled option, in declaration order.
    pub fn configure_tokens(&self) -> Vec<String> {
        self.enabled().map(|opt| opt.configure_token()).collect()
    }
}

impl Serialize for OptionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(BuildOption::ALL.len()))?;
        for opt in BuildOption::ALL {
            map.serialize_entry(opt.name(), &self.get(opt))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OptionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, bool>::deserialize(deserializer)?;
        OptionSet::from_pairs(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_false() {
        let set = OptionSet::new();
        assert!(BuildOption::ALL.iter().all(|o| !set.get(*o)));
        assert!(set.configure_tokens().is_empty());
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = OptionSet::from_pairs([("no_idea", true)]).unwrap_err();
        assert!(matches!(err, BuildError::UnknownOption { ref name } if name == "no_idea"));
    }

    #[test]
    fn test_tokens_follow_declaration_order() {
        let set = OptionSet::from_pairs([("no_sha", true), ("386", true), ("no_threads", true)])
            .unwrap();
        assert_eq!(set.configure_tokens(), vec!["no-threads", "386", "no-sha"]);
    }

    #[test]
    fn test_apply_assignment() {
        let mut set = OptionSet::new();
        set.apply_assignment("shared=True").unwrap();
        set.apply_assignment("no_asm").unwrap();
        set.apply_assignment("no_zlib=false").unwrap();
        assert!(set.shared());
        assert!(set.no_asm());
        assert!(!set.no_zlib());
        assert!(set.apply_assignment("shared=maybe").is_err());
        assert!(set.apply_assignment("bogus=true").is_err());
    }

    #[test]
    fn test_deserialize_rejects_unknown_keys() {
        let ok: OptionSet = toml::from_str("shared = true\nno_md2 = false").unwrap();
        assert!(ok.shared());

        let err = toml::from_str::<OptionSet>("sharde = true").unwrap_err();
        assert!(err.to_string().contains("sharde"));
    }
}
