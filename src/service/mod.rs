//! Business logic over the upstream directory.

pub mod employees;

pub use employees::EmployeeService;
