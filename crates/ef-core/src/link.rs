//! Link normalization.
//!
//! Link columns arrive in several shapes: plain URL strings, HTML anchor
//! fragments, or objects whose URL/label keys vary between producers. Every
//! shape is parsed into [`LinkLike`] and normalized to an [`ExternalLink`].

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a[^>]*href=["']([^"']+)["'][^>]*>(.*?)</a>"#)
        .expect("anchor pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExternalLink {
    pub url: String,
    pub label: String,
}

impl ExternalLink {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// Object form of a link. Candidate keys are tried in declaration order.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LinkFields {
    pub url: Option<String>,
    pub href: Option<String>,
    pub link: Option<String>,
    pub path: Option<String>,
    pub value: Option<String>,
    pub label: Option<String>,
    pub text: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LinkLike {
    Text(String),
    Fields(LinkFields),
    Other(serde_json::Value),
}

fn first_non_empty<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|s| !s.is_empty())
}

/// True when the string is an absolute http(s) URL or a rooted path.
pub fn looks_like_url(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || s.starts_with('/')
}

impl LinkLike {
    pub fn to_link(&self) -> Option<ExternalLink> {
        match self {
            LinkLike::Text(text) => {
                if let Some(caps) = ANCHOR.captures(text) {
                    let url = caps.get(1)?.as_str();
                    let label = caps
                        .get(2)
                        .map(|m| m.as_str())
                        .filter(|l| !l.is_empty())
                        .unwrap_or(url);
                    return Some(ExternalLink::new(url, label));
                }
                looks_like_url(text).then(|| ExternalLink::new(text.as_str(), text.as_str()))
            }
            LinkLike::Fields(fields) => {
                let url = first_non_empty(&[
                    &fields.url,
                    &fields.href,
                    &fields.link,
                    &fields.path,
                    &fields.value,
                ])?;
                let label = first_non_empty(&[
                    &fields.label,
                    &fields.text,
                    &fields.name,
                    &fields.title,
                ])
                .unwrap_or(url);
                Some(ExternalLink::new(url, label))
            }
            LinkLike::Other(_) => None,
        }
    }
}

/// Normalize a list of link-like values, dropping entries with no URL.
pub fn to_link_list(values: &[LinkLike]) -> Vec<ExternalLink> {
    values.iter().filter_map(LinkLike::to_link).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<LinkLike>),
    One(LinkLike),
}

pub(crate) fn deserialize_links<'de, D>(deserializer: D) -> Result<Vec<ExternalLink>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<OneOrMany>::deserialize(deserializer)?;
    Ok(match raw {
        None => Vec::new(),
        Some(OneOrMany::Many(values)) => to_link_list(&values),
        Some(OneOrMany::One(value)) => value.to_link().into_iter().collect(),
    })
}
