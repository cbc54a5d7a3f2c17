use cinedex_dal::movie::MovieRepository;

use crate::state::AppState;
#[allow(unused_imports)]
use axum::routing::{delete, get, patch, post};
crate::repository_from_request!(MovieRepository);

mod crud_api {
    use super::*;
    use crate::error::{ApiError, ApiResult};
    use crate::rest_api::ListQuery;
    use axum::{
        extract::{
            rejection::{JsonRejection, PathRejection, QueryRejection},
            Path, Query, State,
        },
        response::IntoResponse,
        Json,
    };
    use cinedex_dal::movie::{CreateMovie, UpdateMovie};
    use garde::Validate as _;
    use http::{header, StatusCode};
    use serde_json::json;
    use tracing::debug;

    fn movie_id(id: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
        let Path(id) = id.map_err(|e| {
            debug!("Invalid movie id: {e}");
            ApiError::NotFound
        })?;
        Ok(id)
    }

    pub async fn list(
        repository: MovieRepository,
        State(state): State<AppState>,
        query: Result<Query<ListQuery>, QueryRejection>,
    ) -> ApiResult<impl IntoResponse> {
        let Query(query) = query.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
        debug!("Listing query: {:#?}", query);
        let query = query.into_movie_query(state.config().default_page_size)?;
        let listing = repository
            .get_all(&query.title, &query.genres, &query.filters)
            .await?;
        Ok((StatusCode::OK, Json(listing)))
    }

    pub async fn create(
        repository: MovieRepository,
        payload: Result<Json<CreateMovie>, JsonRejection>,
    ) -> ApiResult<impl IntoResponse> {
        let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let record = repository.create(payload).await?;
        let location = format!("/v1/movies/{}", record.id);

        Ok((
            StatusCode::CREATED,
            [(header::LOCATION, location)],
            Json(json!({ "movie": record })),
        ))
    }

    pub async fn get(
        id: Result<Path<i64>, PathRejection>,
        repository: MovieRepository,
    ) -> ApiResult<impl IntoResponse> {
        let record = repository.get(movie_id(id)?).await?;

        Ok((StatusCode::OK, Json(json!({ "movie": record }))))
    }

    pub async fn update(
        id: Result<Path<i64>, PathRejection>,
        repository: MovieRepository,
        payload: Result<Json<UpdateMovie>, JsonRejection>,
    ) -> ApiResult<impl IntoResponse> {
        let id = movie_id(id)?;
        let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let mut record = repository.get(id).await?;
        payload.apply_to(&mut record)?;
        record.validate()?;
        repository.update(&mut record).await?;

        Ok((StatusCode::OK, Json(json!({ "movie": record }))))
    }

    pub async fn delete(
        id: Result<Path<i64>, PathRejection>,
        repository: MovieRepository,
    ) -> ApiResult<impl IntoResponse> {
        repository.delete(movie_id(id)?).await?;

        Ok((
            StatusCode::OK,
            Json(json!({ "message": "movie successfully deleted" })),
        ))
    }
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(crud_api::list).post(crud_api::create))
        .route(
            "/{id}",
            get(crud_api::get)
                .patch(crud_api::update)
                .delete(crud_api::delete),
        )
}
