//! Employee endpoints.

use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::http::server::AppState;
use crate::observability::TraceId;
use crate::upstream::{CreateEmployeeInput, DomainResult, Employee};

pub async fn list_employees(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
) -> DomainResult<Json<Vec<Employee>>> {
    state.service.all(&trace).await.map(Json)
}

pub async fn search_employees(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
    Path(fragment): Path<String>,
) -> DomainResult<Json<Vec<Employee>>> {
    state.service.search_by_name(&fragment, &trace).await.map(Json)
}

pub async fn get_employee(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
    Path(id): Path<String>,
) -> DomainResult<Json<Employee>> {
    state.service.by_id(&id, &trace).await.map(Json)
}

pub async fn highest_salary(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
) -> DomainResult<Json<u32>> {
    state.service.highest_salary(&trace).await.map(Json)
}

pub async fn top_earner_names(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
) -> DomainResult<Json<Vec<String>>> {
    state.service.top_earner_names(&trace).await.map(Json)
}

pub async fn create_employee(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
    Json(input): Json<CreateEmployeeInput>,
) -> DomainResult<Json<Employee>> {
    state.service.create(&input, &trace).await.map(Json)
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
    Path(id): Path<String>,
) -> DomainResult<Json<String>> {
    state.service.delete_by_id(&id, &trace).await.map(Json)
}
