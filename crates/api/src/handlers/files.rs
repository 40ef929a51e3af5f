//! Filesystem helpers for the job form.

use axum::extract::Query;
use axum::Json;
use csvtx_core::preflight;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct PathExists {
    pub path: String,
    pub exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct DefaultOutputRequest {
    pub input_path: String,
}

#[derive(Debug, Serialize)]
pub struct DefaultOutput {
    pub output_path: String,
}

/// GET /files/exists?path=...
pub async fn path_exists(
    Query(query): Query<PathQuery>,
) -> AppResult<Json<DataResponse<PathExists>>> {
    if query.path.is_empty() {
        return Err(AppError::BadRequest("path is required".to_string()));
    }

    let exists = preflight::path_exists(&query.path);
    Ok(Json(DataResponse {
        data: PathExists {
            path: query.path,
            exists,
        },
    }))
}

/// POST /files/default-output
///
/// `list.csv` -> `list_translated.csv`.
pub async fn default_output(
    Json(input): Json<DefaultOutputRequest>,
) -> AppResult<Json<DataResponse<DefaultOutput>>> {
    if input.input_path.trim().is_empty() {
        return Err(AppError::BadRequest("input_path is required".to_string()));
    }

    Ok(Json(DataResponse {
        data: DefaultOutput {
            output_path: preflight::default_output_path(&input.input_path),
        },
    }))
}
