use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::{self, Debug};

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn is_invalid_input_error(&self) -> bool {
        self.code == INVALID_INPUT
    }

    pub fn is_invalid_invocation_error(&self) -> bool {
        self.code == INVALID_INVOCATION
    }

    pub fn status_code(&self) -> StatusCode {
        match self.code {
            1..=99 => StatusCode::INTERNAL_SERVER_ERROR,
            NOT_FOUND => StatusCode::NOT_FOUND,
            UNAUTHORIZED => StatusCode::FORBIDDEN,
            UNAUTHENTICATED => StatusCode::UNAUTHORIZED,
            BICYCLE_UNAVAILABLE => StatusCode::CONFLICT,
            INSUFFICIENT_BALANCE => StatusCode::PAYMENT_REQUIRED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        authorizor_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self.code {
            1..=99 => "Internal Server Error",
            _ => self.message.as_str(),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

const INVALID_INVOCATION: i32 = 100;
const INVALID_INPUT: i32 = 101;
const UNAUTHORIZED: i32 = 102;
const UNAUTHENTICATED: i32 = 103;
const NOT_FOUND: i32 = 104;
const BICYCLE_UNAVAILABLE: i32 = 105;
const INSUFFICIENT_BALANCE: i32 = 106;

pub fn invalid_invocation_error() -> Error {
    Error {
        code: INVALID_INVOCATION,
        message: "invalid invocation".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: INVALID_INPUT,
        message: "invalid input".into(),
    }
}

pub fn unauthorized_error() -> Error {
    Error {
        code: UNAUTHORIZED,
        message: "unauthorized".into(),
    }
}

pub fn unauthenticated_error() -> Error {
    Error {
        code: UNAUTHENTICATED,
        message: "missing or malformed identity".into(),
    }
}

pub fn not_found_error() -> Error {
    Error {
        code: NOT_FOUND,
        message: "not found".into(),
    }
}

pub fn bicycle_unavailable_error() -> Error {
    Error {
        code: BICYCLE_UNAVAILABLE,
        message: "bicycle is no longer available".into(),
    }
}

pub fn insufficient_balance_error() -> Error {
    Error {
        code: INSUFFICIENT_BALANCE,
        message: "insufficient wallet balance".into(),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn database_error<T: Debug>(err: T) -> Error {
    tracing::error!("database error: {:?}", err);

    Error {
        code: 2,
        message: "database error".into(),
    }
}

pub fn reqwest_error(err: reqwest::Error) -> Error {
    tracing::warn!("reqwest error: {:?}", err);

    Error {
        code: 3,
        message: "reqwest error".into(),
    }
}

pub fn upstream_error() -> Error {
    Error {
        code: 4,
        message: "upstream error".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

pub fn geolocation_unavailable_error() -> Error {
    Error {
        code: 6,
        message: "geolocation unavailable".into(),
    }
}

pub fn authorizor_error(err: oso::OsoError) -> Error {
    tracing::error!("authorizor error: {:?}", err);

    Error {
        code: 7,
        message: "authorizor error".into(),
    }
}

pub fn config_error(name: &str) -> Error {
    Error {
        code: 8,
        message: format!("invalid configuration value for {}", name),
    }
}
