use serde_json::json;

use crate::{
    layout::{DEFAULT_LAYOUT, HookCapability, Layout, LayoutResolver, StaticProps},
    pages::{PageRegistration, PageRegistry},
};

/// Layout for the sign-in family of pages: no navigation chrome.
pub const AUTH_LAYOUT: &str = "AuthLayout";

/// The portfolio site's pages.
///
/// Page content lives in the front-end; only routes, declared layouts and the
/// static initial props the shell hands over are known here.
pub fn registry() -> PageRegistry {
    let auth_layout = || Layout::plain(AUTH_LAYOUT);

    PageRegistry::new()
        .register(PageRegistration::new("Home", "/").with_hooks(HookCapability::from_hook(
            StaticProps::new("Home", json!({ "sections": ["hero", "projects"] })),
        )))
        .register(PageRegistration::new("Dashboard", "/dashboard"))
        .register(PageRegistration::new("Login", "/login").with_layout(auth_layout()))
        .register(PageRegistration::new("LoginFirst", "/login-first").with_layout(auth_layout()))
        .register(PageRegistration::new("SignUp", "/sign-up").with_layout(auth_layout()))
        .register(
            PageRegistration::new("ForgotPassword", "/forgot-password").with_layout(auth_layout()),
        )
        .register(
            PageRegistration::new("ResetPassword", "/reset-password").with_layout(auth_layout()),
        )
        .register(
            PageRegistration::new("ResetPasswordToken", "/reset-password/[token]")
                .with_layout(auth_layout()),
        )
        .register(PageRegistration::new("VerifyEmail", "/verify-email").with_layout(auth_layout()))
        .register(
            PageRegistration::new("VerifyEmailToken", "/verify-email/[token]")
                .with_layout(auth_layout()),
        )
}

/// The default shell layout carries the site chrome as its initial props.
pub fn resolver() -> LayoutResolver {
    LayoutResolver::new(
        HookCapability::NoInitialProps,
        Layout::with_initial_props(
            DEFAULT_LAYOUT,
            StaticProps::new(
                DEFAULT_LAYOUT,
                json!({ "navigation": ["/", "/#projects", "/dashboard"] }),
            ),
        ),
    )
}
