//! Wire types shared with the upstream directory service.

use serde::{Deserialize, Serialize};

use crate::upstream::error::{DomainError, DomainResult};

/// An employee record as stored by the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    #[serde(rename = "employee_name", alias = "name")]
    pub name: String,
    #[serde(rename = "employee_salary", alias = "salary")]
    pub salary: u32,
    #[serde(rename = "employee_age", alias = "age")]
    pub age: u32,
    #[serde(rename = "employee_title", alias = "title")]
    pub title: String,
    #[serde(rename = "employee_email", alias = "email", default)]
    pub email: Option<String>,
}

/// Payload accepted when creating an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEmployeeInput {
    pub name: String,
    pub salary: u32,
    pub age: u32,
    pub title: String,
}

impl CreateEmployeeInput {
    pub const MIN_AGE: u32 = 16;
    pub const MAX_AGE: u32 = 75;

    /// Reject input the upstream would refuse, before anything is sent.
    pub fn validate(&self) -> DomainResult<()> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("name must not be blank".to_string());
        }
        if self.salary < 1 {
            problems.push("salary must be at least 1".to_string());
        }
        if !(Self::MIN_AGE..=Self::MAX_AGE).contains(&self.age) {
            problems.push(format!("age must be between {} and {}", Self::MIN_AGE, Self::MAX_AGE));
        }
        if self.title.trim().is_empty() {
            problems.push("title must not be blank".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(DomainError::validation(format!("Validation failed: {}", problems.join(", "))))
        }
    }
}

/// Body of a delete-by-name request.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteByNameRequest<'a> {
    pub name: &'a str,
}

/// Status text the upstream uses for failed requests.
pub const STATUS_FAILED: &str = "Failed";

/// `{ data, status, message }` wrapper used by the upstream and by this gateway's error bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            data: None,
            status: Some(STATUS_FAILED.to_string()),
            message: Some(message.into()),
        }
    }
}
