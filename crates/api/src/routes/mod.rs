//! HTTP route handlers.

use serde::Serialize;

pub mod auth;
pub mod calendar;
pub mod circles;
pub mod health;
pub mod medications;
pub mod tasks;

/// Envelope for list endpoints.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub count: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(data: Vec<T>) -> Self {
        let count = data.len();
        Self { data, count }
    }
}
