//! Permalink templates.
//!
//! A permalink is a path template with named placeholders, e.g.
//! `/:year/:month/:day/:slug/` or `/tag/:slug`. It works in both
//! directions:
//!
//! - **compile**: substitute a resource's locator fields to produce the
//!   concrete path (`/2024/01/15/0th-post/`)
//! - **match**: test a request path against the template and extract the
//!   placeholder values

use regex::Regex;

use crate::core::RouteError;
use crate::resource::{Locator, Resource, ResourceId};

/// Placeholder variables a permalink may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermalinkVar {
    Slug,
    Year,
    Month,
    Day,
    PrimaryTag,
    PrimaryAuthor,
    Id,
}

impl PermalinkVar {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "slug" => Self::Slug,
            "year" => Self::Year,
            "month" => Self::Month,
            "day" => Self::Day,
            "primary_tag" => Self::PrimaryTag,
            "primary_author" => Self::PrimaryAuthor,
            "id" => Self::Id,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Slug => "slug",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::PrimaryTag => "primary_tag",
            Self::PrimaryAuthor => "primary_author",
            Self::Id => "id",
        }
    }

    fn value(self, id: ResourceId, locator: &Locator) -> String {
        match self {
            Self::Slug => locator.slug.clone(),
            Self::Year => locator.year.clone(),
            Self::Month => locator.month.clone(),
            Self::Day => locator.day.clone(),
            Self::PrimaryTag => locator.primary_tag.clone(),
            Self::PrimaryAuthor => locator.primary_author.clone(),
            Self::Id => id.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum Token {
    Literal(String),
    Var(PermalinkVar),
}

/// A parsed permalink template.
#[derive(Debug, Clone)]
pub struct Permalink {
    source: String,
    tokens: Vec<Token>,
}

impl Permalink {
    /// Parse a template. Unknown placeholder names are validation errors
    /// (fatal at router-construction time).
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        if !template.starts_with('/') {
            return Err(RouteError::validation(format!(
                "permalink `{template}` must start with `/`"
            )));
        }

        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            if c != ':' {
                literal.push(c);
                continue;
            }

            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }

            let mut name = String::new();
            while let Some(&(_, nc)) = chars.peek() {
                if nc.is_ascii_alphanumeric() || nc == '_' {
                    name.push(nc);
                    chars.next();
                } else {
                    break;
                }
            }

            let var = PermalinkVar::from_name(&name).ok_or_else(|| {
                RouteError::validation(format!(
                    "permalink `{template}` references unknown variable `:{name}`"
                ))
            })?;
            tokens.push(Token::Var(var));
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            tokens,
        })
    }

    /// The template this permalink was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template contains any placeholder at all.
    pub fn has_vars(&self) -> bool {
        self.tokens.iter().any(|t| matches!(t, Token::Var(_)))
    }

    /// Compile the template against a resource's locator fields.
    ///
    /// Fails on config resources (no locator); this is the per-node hard
    /// error the collect pass propagates.
    pub fn compile(&self, resource: &Resource) -> Result<String, RouteError> {
        let locator = resource.locator().ok_or_else(|| {
            RouteError::validation(format!(
                "cannot compile permalink `{}` for `{}` resource",
                self.source,
                resource.kind()
            ))
        })?;
        Ok(self.compile_with(resource.id(), locator))
    }

    /// Compile against locator fields that are not wrapped in a resource
    /// yet (used while the collect pass is still deriving records).
    pub(crate) fn compile_with(&self, id: ResourceId, locator: &Locator) -> String {
        let mut out = String::with_capacity(self.source.len());
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Var(var) => out.push_str(&var.value(id, locator)),
            }
        }
        out
    }

    /// Build the reverse matcher for this template.
    pub fn matcher(&self) -> Result<PermalinkMatcher, RouteError> {
        let mut pattern = String::from("^");
        let mut params = Vec::new();

        for token in &self.tokens {
            match token {
                Token::Literal(text) => {
                    pattern.push_str(&regex::escape(text.trim_end_matches('/')));
                    if text.ends_with('/') {
                        pattern.push('/');
                    }
                }
                Token::Var(var) => {
                    pattern.push_str("([^/]+)");
                    params.push(var.name());
                }
            }
        }

        // Requests normalize to a trailing slash; templates may omit it.
        let pattern = format!("{}/?$", pattern.trim_end_matches('/'));
        let regex = Regex::new(&pattern)
            .map_err(|e| RouteError::validation(format!("permalink `{}`: {e}", self.source)))?;

        Ok(PermalinkMatcher { regex, params })
    }
}

/// Compiled reverse matcher: request path -> placeholder values.
#[derive(Debug, Clone)]
pub struct PermalinkMatcher {
    regex: Regex,
    params: Vec<&'static str>,
}

impl PermalinkMatcher {
    /// Match a canonical request path, extracting placeholder values.
    pub fn match_path(&self, path: &str) -> Option<Vec<(&'static str, String)>> {
        let captures = self.regex.captures(path)?;
        Some(
            self.params
                .iter()
                .zip(captures.iter().skip(1))
                .filter_map(|(name, m)| m.map(|m| (*name, m.as_str().to_string())))
                .collect(),
        )
    }
}
