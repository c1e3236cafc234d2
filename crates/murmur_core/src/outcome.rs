/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use murmur_protocol::ApiResponse;

/// Result of every engine operation. Store errors end up in `Failed`; nothing
/// is raised past this type. Rejected caller input is `Invalid`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done { message: String, data: Option<T> },
    Noop(String),
    NotFound(String),
    Invalid(String),
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn done(message: impl Into<String>, data: T) -> Self {
        Self::Done {
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn noop(message: impl Into<String>) -> Self {
        Self::Noop(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn failed(err: &anyhow::Error) -> Self {
        Self::Failed(format!("{err:#}"))
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Noop(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Done { message, .. } => message,
            Self::Noop(m) | Self::NotFound(m) | Self::Invalid(m) | Self::Failed(m) => m,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Done { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Done { data, .. } => data,
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Done { message, data } => Outcome::Done {
                message,
                data: data.map(f),
            },
            Self::Noop(m) => Outcome::Noop(m),
            Self::NotFound(m) => Outcome::NotFound(m),
            Self::Invalid(m) => Outcome::Invalid(m),
            Self::Failed(m) => Outcome::Failed(m),
        }
    }

    pub fn into_response(self) -> ApiResponse<T> {
        match self {
            Self::Done { message, data } => ApiResponse {
                message: Some(message),
                data,
                error: None,
                token: None,
            },
            Self::Noop(m) | Self::NotFound(m) | Self::Invalid(m) => ApiResponse::message(m),
            Self::Failed(e) => ApiResponse::error(e),
        }
    }
}
