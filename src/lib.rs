//! SHELF Application Library
//!
//! Project modules plus the bootstrap shared by the `shelf-app` binary and
//! the CLI.

pub mod modules;

use anyhow::Context;
use axum::Router;
use shelf_authz::{with_trusted_headers, IdentityHeaders};
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Registry with every project module registered
pub fn registry(settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings);
    registry
}

/// Full HTTP application: module routes, middleware, and identity forwarding
pub fn app(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<Router> {
    let identity_headers = IdentityHeaders::from_settings(&settings.auth)
        .context("invalid auth settings")?;
    let router = shelf_http::build_router(registry, settings);
    Ok(with_trusted_headers(router, identity_headers))
}

/// Run the service until Ctrl-C, driving the module lifecycle around the server
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let registry = registry(&settings);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = match app(&registry, &settings) {
        Ok(router) => shelf_http::serve(router, &settings, shelf_http::shutdown_signal()).await,
        Err(error) => Err(error),
    };

    // Stop modules even when serving failed, then report the first error.
    let stopped = registry.stop_all().await;
    served?;
    stopped
}
