//! Business logic services

pub mod books;
pub mod loans;
pub mod members;

use crate::{
    config::LoanRulesConfig,
    error::{AppError, AppResult},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BookService,
    pub members: members::MemberService,
    pub loans: loans::LoanService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, loan_rules: LoanRulesConfig) -> Self {
        Self {
            books: books::BookService::new(repository.clone()),
            members: members::MemberService::new(repository.clone()),
            loans: loans::LoanService::new(repository, loan_rules),
        }
    }
}

/// Collapse a violation list into a single validation error at the service
/// boundary
pub(crate) fn fold_violations(errors: Vec<String>) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors.join(", ")))
    }
}
