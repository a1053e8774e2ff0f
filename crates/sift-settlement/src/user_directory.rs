//! Static Slack user id to display name table.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

fn mention_regex() -> &'static Regex {
    static MENTION: OnceLock<Regex> = OnceLock::new();
    MENTION.get_or_init(|| Regex::new(r"<@(U\w+)>").expect("mention regex"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
/// Immutable user directory injected at startup.
pub struct UserDirectory {
    users: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One `<@U…>` reference replaced by `@Display Name`.
///
/// Offsets count UTF-16 code units, the unit spreadsheet text runs use.
pub struct ResolvedMention {
    pub user_id: String,
    pub display_name: String,
    pub start_utf16: u32,
    pub end_utf16: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApproverLine {
    pub text: String,
    pub mentions: Vec<ResolvedMention>,
}

impl UserDirectory {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            users: entries
                .into_iter()
                .map(|(id, name)| (id.into(), name.into()))
                .collect(),
        }
    }

    pub fn display_name(&self, user_id: &str) -> Option<&str> {
        self.users.get(user_id).map(String::as_str)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Replaces known `<@U…>` mentions with `@Name`; unknown ids keep their
    /// bracket form.
    pub fn resolve_mentions(&self, text: &str) -> ApproverLine {
        let mut resolved = String::with_capacity(text.len());
        let mut mentions = Vec::new();
        let mut cursor = 0;
        for captures in mention_regex().captures_iter(text) {
            let (Some(whole), Some(user_id)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            resolved.push_str(&text[cursor..whole.start()]);
            match self.display_name(user_id.as_str()) {
                Some(name) => {
                    let start_utf16 = utf16_len(&resolved);
                    resolved.push('@');
                    resolved.push_str(name);
                    mentions.push(ResolvedMention {
                        user_id: user_id.as_str().to_string(),
                        display_name: name.to_string(),
                        start_utf16,
                        end_utf16: utf16_len(&resolved),
                    });
                }
                None => resolved.push_str(whole.as_str()),
            }
            cursor = whole.end();
        }
        resolved.push_str(&text[cursor..]);
        ApproverLine {
            text: resolved,
            mentions,
        }
    }
}

fn utf16_len(value: &str) -> u32 {
    u32::try_from(value.encode_utf16().count()).unwrap_or(u32::MAX)
}
