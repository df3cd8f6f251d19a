//! Channel names correlating a command with its outcome

use std::borrow::{Borrow, Cow};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies the logical channel a command reports its outcome on.
///
/// Channel names are not unique per call, only per command type: two
/// concurrent dispatches of the same command share a channel. By convention
/// the channel is the command's [`Action::name`](crate::Action::name).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelName(Cow<'static, str>);

impl ChannelName {
    /// Create a channel name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ChannelName {
    fn from(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

impl From<String> for ChannelName {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

impl From<&ChannelName> for ChannelName {
    fn from(name: &ChannelName) -> Self {
        name.clone()
    }
}

impl Borrow<str> for ChannelName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ChannelName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ChannelName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name_conversions() {
        let a = ChannelName::from("[Data] Load data");
        let b = ChannelName::from(String::from("[Data] Load data"));
        let c = ChannelName::new("[Data] Load data");

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a, "[Data] Load data");
        assert_eq!(a.to_string(), "[Data] Load data");
    }

    #[test]
    fn test_channel_name_serde_is_transparent() {
        let name = ChannelName::from("load");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"load\"");

        let back: ChannelName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
