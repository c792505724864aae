use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

use crate::{
    models::RelationKind,
    response::{ApiResponse, Meta},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("You cannot subscribe to yourself")]
    SelfReference,

    #[error("This {0} already exists")]
    DuplicateRelation(RelationKind),

    #[error("This {0} does not exist")]
    MissingRelation(RelationKind),

    #[error("Shopping cart is empty, nothing to download")]
    EmptyCart,

    #[error("Ingredient amount must be at least 1")]
    InvalidAmount,

    #[error("Cooking time must be at least 1 minute")]
    InvalidDuration,

    #[error("The {0} list must not be empty")]
    EmptyCollection(&'static str),

    #[error("ORM error")]
    OrmError(#[from] DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Map a failed relation insert, turning a unique-index hit into a duplicate error.
    pub fn from_relation_insert(err: DbErr, kind: RelationKind) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateRelation(kind),
            _ => AppError::OrmError(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_)
            | AppError::SelfReference
            | AppError::DuplicateRelation(_)
            | AppError::MissingRelation(_)
            | AppError::EmptyCart
            | AppError::InvalidAmount
            | AppError::InvalidDuration
            | AppError::EmptyCollection(_) => StatusCode::BAD_REQUEST,
            AppError::OrmError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                AppError::OrmError(err) => tracing::error!(error = %err, "database failure"),
                AppError::Internal(err) => tracing::error!(error = %err, "internal failure"),
                _ => {}
            }
        }

        let message = self.to_string();
        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
