pub mod error;
pub mod health;
pub mod rest_api;
pub mod state;

use axum::{routing::get, Router};

use crate::{error::ApiError, state::AppState};

#[macro_export]
macro_rules! repository_from_request {
    ($repo:ty) => {
        impl axum::extract::FromRequestParts<$crate::state::AppState> for $repo {
            type Rejection = http::StatusCode;

            fn from_request_parts(
                _parts: &mut http::request::Parts,
                state: &$crate::state::AppState,
            ) -> impl std::future::Future<Output = std::result::Result<Self, Self::Rejection>>
                   + core::marker::Send {
                futures::future::ready(std::result::Result::Ok(
                    <$repo>::new(state.pool().clone())
                        .with_query_timeout(state.config().query_timeout),
                ))
            }
        }
    };
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub fn main_router(state: AppState) -> Router<()> {
    Router::new()
        .route("/v1/healthcheck", get(health::healthcheck))
        .nest("/v1/movies", rest_api::movie::router())
        .fallback(not_found)
        .with_state(state)
}
