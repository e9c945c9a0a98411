//! The user-directory seam.
//!
//! Flow construction needs to resolve approver templates to concrete users.
//! The directory lives outside this crate (a database in production, an
//! in-memory map in tests), so it is modeled as an async trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use expenso_shared::error::AppResult;
use expenso_shared::types::{CompanyId, UserId};

use crate::expense::types::{ApproverRole, EmployeeRole};

/// A directory view of one employee, scoped to what approval routing needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier.
    pub id: UserId,
    /// Role the employee holds in the company.
    pub role: EmployeeRole,
    /// Department, if assigned.
    pub department: Option<String>,
    /// The employee's manager, if assigned.
    pub manager_id: Option<UserId>,
    /// Whether the account is active. Inactive users never receive steps.
    pub is_active: bool,
}

/// Read-only access to the company user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Looks up a user by id.
    async fn find_user_by_id(&self, id: UserId) -> AppResult<Option<Employee>>;

    /// Finds the first active user holding `role` in the company.
    ///
    /// "First" is the directory's natural order; with multiple candidates the
    /// choice is arbitrary but stable for a given directory state.
    async fn find_active_user_by_role(
        &self,
        company_id: CompanyId,
        role: ApproverRole,
    ) -> AppResult<Option<Employee>>;

    /// Finds the first active user in `department` holding any of `roles`.
    async fn find_active_user_by_department_and_role(
        &self,
        company_id: CompanyId,
        department: &str,
        roles: &[EmployeeRole],
    ) -> AppResult<Option<Employee>>;
}
