use crate::api::routes;
use crate::config::SharedConfig;
use crate::provider::SharedProvider;
use axum::Router;
use std::future::Future;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: SharedConfig,
    pub provider: SharedProvider,
}

/// The webhook [`Router`], without a listener attached.
pub fn router(config: SharedConfig, provider: SharedProvider) -> Router {
    routes::new(AppState { config, provider })
}

pub fn new(
    config: SharedConfig,
    provider: SharedProvider,
) -> impl Future<Output = hyper::Result<()>> {
    axum::Server::bind(&config.listen_addr)
        .serve(router(config.clone(), provider).into_make_service())
}
