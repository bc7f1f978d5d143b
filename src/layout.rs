use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, sync::Arc};

use crate::{error::ShellError, pages::PageRegistration};

/// Initial props are JSON objects merged key by key.
pub type Props = Map<String, Value>;

/// Name of the shell layout used by pages that declare none.
pub const DEFAULT_LAYOUT: &str = "MainLayout";

/// AppContext
///
/// What initial-props hooks see about the current navigation. For the layout
/// hook, `page_props` already holds the merged app and page props.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    /// Route pattern of the matched page.
    pub pathname: String,
    /// The concrete requested path.
    pub as_path: String,
    /// Route params and query string, route params winning on conflict.
    pub query: BTreeMap<String, String>,
    pub credential_present: bool,
    pub page_props: Props,
}

/// InitialPropsHook
///
/// An async data requirement of the app, a page, or a layout.
#[async_trait]
pub trait InitialPropsHook: Send + Sync {
    fn name(&self) -> &str;
    async fn initial_props(&self, ctx: &AppContext) -> Result<Props, ShellError>;
}

/// HookCapability
///
/// Whether a component has an initial-props hook, decided once when it is
/// registered rather than probed on every call.
#[derive(Clone, Default)]
pub enum HookCapability {
    HasInitialProps(Arc<dyn InitialPropsHook>),
    #[default]
    NoInitialProps,
}

impl HookCapability {
    pub fn from_hook(hook: impl InitialPropsHook + 'static) -> Self {
        HookCapability::HasInitialProps(Arc::new(hook))
    }

    pub async fn run(&self, ctx: &AppContext) -> Result<Props, ShellError> {
        match self {
            HookCapability::HasInitialProps(hook) => {
                tracing::debug!(hook = hook.name(), path = %ctx.as_path, "running initial props hook");
                hook.initial_props(ctx).await
            }
            HookCapability::NoInitialProps => Ok(Props::new()),
        }
    }
}

/// Layout
///
/// A wrapper component pages render inside.
#[derive(Clone)]
pub struct Layout {
    pub name: String,
    pub hooks: HookCapability,
}

impl Layout {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: HookCapability::NoInitialProps,
        }
    }

    pub fn with_initial_props(name: impl Into<String>, hook: impl InitialPropsHook + 'static) -> Self {
        Self {
            name: name.into(),
            hooks: HookCapability::from_hook(hook),
        }
    }
}

/// StaticProps
///
/// A hook that always yields the same props.
pub struct StaticProps {
    name: String,
    props: Props,
}

impl StaticProps {
    pub fn new(name: impl Into<String>, props: Value) -> Self {
        let props = match props {
            Value::Object(map) => map,
            _ => Props::new(),
        };
        Self {
            name: name.into(),
            props,
        }
    }
}

#[async_trait]
impl InitialPropsHook for StaticProps {
    fn name(&self) -> &str {
        &self.name
    }

    async fn initial_props(&self, _ctx: &AppContext) -> Result<Props, ShellError> {
        Ok(self.props.clone())
    }
}

/// ResolvedPageContext
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPageContext {
    pub layout: String,
    pub page_props: Props,
}

/// Shallow merge: keys of `overlay` replace keys of `base`.
pub fn merge_props(mut base: Props, overlay: Props) -> Props {
    for (key, value) in overlay {
        base.insert(key, value);
    }
    base
}

/// LayoutResolver
///
/// Picks the layout for a page and computes its merged initial props.
#[derive(Clone)]
pub struct LayoutResolver {
    app: HookCapability,
    default_layout: Layout,
}

impl Default for LayoutResolver {
    fn default() -> Self {
        Self::new(HookCapability::NoInitialProps, Layout::plain(DEFAULT_LAYOUT))
    }
}

impl LayoutResolver {
    pub fn new(app: HookCapability, default_layout: Layout) -> Self {
        Self { app, default_layout }
    }

    pub fn layout_for<'a>(&'a self, page: &'a PageRegistration) -> &'a Layout {
        page.layout.as_ref().unwrap_or(&self.default_layout)
    }

    /// resolve
    ///
    /// Runs the app hook, then the page hook, then the layout hook (which sees the
    /// page props), merging each result over the previous ones.
    pub async fn resolve(
        &self,
        page: &PageRegistration,
        ctx: &AppContext,
    ) -> Result<ResolvedPageContext, ShellError> {
        let app_props = self.app.run(ctx).await?;
        let page_props = page.hooks.run(ctx).await?;
        let props = merge_props(app_props, page_props);

        let layout = self.layout_for(page);
        let layout_ctx = AppContext {
            page_props: props.clone(),
            ..ctx.clone()
        };
        let layout_props = layout.hooks.run(&layout_ctx).await?;

        Ok(ResolvedPageContext {
            layout: layout.name.clone(),
            page_props: merge_props(props, layout_props),
        })
    }
}
