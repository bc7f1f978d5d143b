use std::collections::BTreeMap;

use crate::layout::{HookCapability, Layout};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Dynamic(String),
}

/// RoutePattern
///
/// A page route such as `/reset-password/[token]`. Bracketed segments match any
/// single non-empty path segment and are captured by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Self {
        let segments = split_path(raw)
            .map(|s| match s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                Some(name) => Segment::Dynamic(name.to_string()),
                None => Segment::Static(s.to_string()),
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Captured params when `path` matches, `None` otherwise.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Static(s) if s == part => {}
                Segment::Static(_) => return None,
                Segment::Dynamic(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }

    fn static_segments(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Static(_)))
            .count()
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// PageRegistration
///
/// One page of the site: its route, the layout it declares (if any), and whether
/// it has an initial-props hook. The capability is fixed here, at registration.
#[derive(Clone)]
pub struct PageRegistration {
    pub name: String,
    pub pattern: RoutePattern,
    pub layout: Option<Layout>,
    pub hooks: HookCapability,
}

impl PageRegistration {
    pub fn new(name: impl Into<String>, pattern: &str) -> Self {
        Self {
            name: name.into(),
            pattern: RoutePattern::parse(pattern),
            layout: None,
            hooks: HookCapability::NoInitialProps,
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_hooks(mut self, hooks: HookCapability) -> Self {
        self.hooks = hooks;
        self
    }
}

/// A registered page matched against a concrete path.
pub struct MatchedPage<'a> {
    pub page: &'a PageRegistration,
    pub params: BTreeMap<String, String>,
}

/// PageRegistry
#[derive(Clone, Default)]
pub struct PageRegistry {
    pages: Vec<PageRegistration>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, page: PageRegistration) -> Self {
        self.pages.push(page);
        self
    }

    /// find
    ///
    /// Resolves a concrete path. When several patterns match, the most specific
    /// one (most static segments) wins, then registration order.
    pub fn find(&self, path: &str) -> Option<MatchedPage<'_>> {
        let mut best: Option<MatchedPage<'_>> = None;
        for page in &self.pages {
            let Some(params) = page.pattern.matches(path) else {
                continue;
            };
            let better = best.as_ref().map_or(true, |b| {
                page.pattern.static_segments() > b.page.pattern.static_segments()
            });
            if better {
                best = Some(MatchedPage { page, params });
            }
        }
        best
    }

    /// route_for
    ///
    /// What the navigation guard classifies for `path`: the matched page's route
    /// pattern, or `path` itself when no page matches.
    pub fn route_for<'a>(&'a self, path: &'a str) -> &'a str {
        self.find(path).map_or(path, |m| m.page.pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
