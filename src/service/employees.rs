//! Employee queries built on the upstream client.

use std::sync::Arc;

use crate::observability::TraceId;
use crate::upstream::{CreateEmployeeInput, DomainError, DomainResult, Employee, ErrorKind, UpstreamClient};

/// Number of names returned by [`EmployeeService::top_earner_names`].
pub const TOP_EARNERS: usize = 10;

/// Business operations over the employee directory.
#[derive(Debug, Clone)]
pub struct EmployeeService {
    client: Arc<UpstreamClient>,
}

impl EmployeeService {
    pub fn new(client: Arc<UpstreamClient>) -> Self {
        Self { client }
    }

    pub async fn all(&self, trace: &TraceId) -> DomainResult<Vec<Employee>> {
        let employees = self.client.list_all(trace).await?;
        tracing::info!(trace_id = %trace, count = employees.len(), "Fetched employees");
        Ok(employees)
    }

    /// Case-insensitive substring match on the name. A blank fragment matches nothing.
    pub async fn search_by_name(&self, fragment: &str, trace: &TraceId) -> DomainResult<Vec<Employee>> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Ok(Vec::new());
        }
        let employees = self.all(trace).await?;
        Ok(filter_by_name(employees, fragment))
    }

    pub async fn by_id(&self, id: &str, trace: &TraceId) -> DomainResult<Employee> {
        self.client.get_by_id(id, trace).await
    }

    pub async fn highest_salary(&self, trace: &TraceId) -> DomainResult<u32> {
        let employees = self.all(trace).await?;
        employees
            .iter()
            .map(|e| e.salary)
            .max()
            .ok_or_else(|| DomainError::not_found("No employees found"))
    }

    pub async fn top_earner_names(&self, trace: &TraceId) -> DomainResult<Vec<String>> {
        let employees = self.all(trace).await?;
        Ok(top_earners(employees, TOP_EARNERS))
    }

    pub async fn create(&self, input: &CreateEmployeeInput, trace: &TraceId) -> DomainResult<Employee> {
        self.client.create(input, trace).await
    }

    /// Look the employee up by id, then delete by name. Returns the deleted name.
    pub async fn delete_by_id(&self, id: &str, trace: &TraceId) -> DomainResult<String> {
        let employee = self.client.get_by_id(id, trace).await?;
        if employee.name.trim().is_empty() {
            return Err(DomainError::new(ErrorKind::OperationFailed, "Employee deletion failed"));
        }

        tracing::info!(trace_id = %trace, id = %id, name = %employee.name, "Deleting employee");
        self.client.delete_by_name(&employee.name, trace).await?;
        Ok(employee.name)
    }
}

fn filter_by_name(employees: Vec<Employee>, fragment: &str) -> Vec<Employee> {
    let needle = fragment.to_lowercase();
    employees
        .into_iter()
        .filter(|e| e.name.to_lowercase().contains(&needle))
        .collect()
}

fn top_earners(mut employees: Vec<Employee>, limit: usize) -> Vec<String> {
    employees.sort_by(|a, b| b.salary.cmp(&a.salary));
    employees.into_iter().take(limit).map(|e| e.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(name: &str, salary: u32) -> Employee {
        Employee {
            id: format!("id-{name}"),
            name: name.to_string(),
            salary,
            age: 30,
            title: "Engineer".to_string(),
            email: None,
        }
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let employees = vec![employee("Alice Main", 10), employee("Bob", 20), employee("MALIK", 30)];
        let names: Vec<String> = filter_by_name(employees, "ali")
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Alice Main", "MALIK"]);
    }

    #[test]
    fn test_top_earners_orders_and_limits() {
        let employees: Vec<Employee> = (1..=12).map(|i| employee(&format!("E{i}"), i * 100)).collect();
        let top = top_earners(employees, TOP_EARNERS);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0], "E12");
        assert!(!top.contains(&"E1".to_string()));
        assert!(!top.contains(&"E2".to_string()));
    }

    #[test]
    fn test_top_earners_with_few_employees() {
        let top = top_earners(vec![employee("Solo", 5)], TOP_EARNERS);
        assert_eq!(top, vec!["Solo"]);
    }
}
