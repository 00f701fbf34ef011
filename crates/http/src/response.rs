//! Response envelope shared by every JSON endpoint.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

/// Either `{ "data": T }` or `{ "error": "message" }`, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope<T> {
    Data(T),
    Error(String),
}

/// Status plus a `data` envelope, the success shape of every handler.
pub type DataResponse<T> = (StatusCode, Json<Envelope<T>>);

pub fn respond<T: Serialize>(status: StatusCode, data: T) -> DataResponse<T> {
    (status, Json(Envelope::Data(data)))
}
