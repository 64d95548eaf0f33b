//! Loan business-rule service
//!
//! Checkout runs a pre-condition chain over wholesale reads; overdue age
//! is computed in whole days since the loan timestamp and never blocks a
//! return.

use chrono::Utc;

use crate::{
    config::LoanRulesConfig,
    error::{AppError, AppResult},
    models::loan::{Loan, LoanStatistics, NewLoan},
    repository::Repository,
};

use super::fold_violations;

/// Violation list for a loan payload; empty means valid
pub fn validate_loan(loan: &NewLoan) -> Vec<String> {
    let mut errors = Vec::new();
    if loan.book_id.trim().is_empty() {
        errors.push("ID del libro es requerido".to_string());
    }
    if loan.member_id.trim().is_empty() {
        errors.push("ID del usuario es requerido".to_string());
    }
    errors
}

#[derive(Clone)]
pub struct LoanService {
    repository: Repository,
    rules: LoanRulesConfig,
}

impl LoanService {
    pub fn new(repository: Repository, rules: LoanRulesConfig) -> Self {
        Self { repository, rules }
    }

    /// Active loans, newest first
    pub async fn active(&self) -> AppResult<Vec<Loan>> {
        self.repository
            .loans
            .list_active()
            .await
            .map_err(|e| e.context("Error al obtener préstamos activos"))
    }

    /// Returned loans, most recently returned first
    pub async fn history(&self) -> AppResult<Vec<Loan>> {
        self.repository
            .loans
            .history()
            .await
            .map_err(|e| e.context("Error al obtener historial de préstamos"))
    }

    /// Pre-condition chain before checkout: book exists, member exists,
    /// book not already out, book available, member under the loan limit.
    /// The first failing step aborts with its own message. The active-loan
    /// probe runs before the availability check so an already-loaned book
    /// reports as loaned, not merely unavailable.
    async fn check_business_rules(&self, loan: &NewLoan) -> AppResult<()> {
        let op = "Error en reglas de negocio";

        let books = self.repository.books.list().await.map_err(|e| e.context(op))?;
        let book = books
            .iter()
            .find(|b| b.id == loan.book_id)
            .ok_or_else(|| AppError::NotFound("El libro no existe".to_string()).context(op))?;

        let members = self
            .repository
            .members
            .list()
            .await
            .map_err(|e| e.context(op))?;
        if !members.iter().any(|m| m.id == loan.member_id) {
            return Err(AppError::NotFound("El usuario no existe".to_string()).context(op));
        }

        let active = self
            .repository
            .loans
            .list_active()
            .await
            .map_err(|e| e.context(op))?;
        if active.iter().any(|l| l.book_id == loan.book_id) {
            return Err(
                AppError::BusinessRule("Este libro ya está prestado".to_string()).context(op)
            );
        }

        if !book.available {
            return Err(
                AppError::BusinessRule("El libro no está disponible".to_string()).context(op)
            );
        }

        let held = active
            .iter()
            .filter(|l| l.member_id == loan.member_id)
            .count();
        if held >= self.rules.max_loans_per_member {
            return Err(AppError::BusinessRule(format!(
                "El usuario ya tiene el máximo de préstamos permitidos ({})",
                self.rules.max_loans_per_member
            ))
            .context(op));
        }

        Ok(())
    }

    /// Validate, run the rule chain, then register the loan
    pub async fn create(&self, loan: &NewLoan) -> AppResult<String> {
        let op = "Error al agregar préstamo";
        fold_violations(validate_loan(loan)).map_err(|e| e.context(op))?;
        self.check_business_rules(loan).await.map_err(|e| e.context(op))?;
        self.repository.loans.add(loan).await.map_err(|e| e.context(op))
    }

    /// Return an active loan. A late return is flagged in the log, never
    /// blocked.
    pub async fn return_loan(&self, id: &str) -> AppResult<()> {
        let op = "Error al devolver préstamo";
        if id.is_empty() {
            return Err(
                AppError::Validation("ID del préstamo es requerido".to_string()).context(op)
            );
        }

        let active = self
            .repository
            .loans
            .list_active()
            .await
            .map_err(|e| e.context(op))?;
        let loan = active.iter().find(|l| l.id == id).ok_or_else(|| {
            AppError::NotFound("El préstamo no existe o ya fue devuelto".to_string()).context(op)
        })?;

        let days_out = loan.days_out(Utc::now());
        if days_out > self.rules.overdue_after_days {
            tracing::warn!(
                "Préstamo devuelto con {} días de retraso (límite: {} días)",
                days_out,
                self.rules.overdue_after_days
            );
        }

        self.repository
            .loans
            .return_loan(id)
            .await
            .map_err(|e| e.context(op))
    }

    /// Delete a loan row after checking it is a known active loan
    pub async fn remove(&self, id: &str) -> AppResult<()> {
        let op = "Error al eliminar préstamo";
        if id.is_empty() {
            return Err(
                AppError::Validation("ID del préstamo es requerido".to_string()).context(op)
            );
        }

        let active = self
            .repository
            .loans
            .list_active()
            .await
            .map_err(|e| e.context(op))?;
        if !active.iter().any(|l| l.id == id) {
            return Err(AppError::NotFound("El préstamo no existe".to_string()).context(op));
        }

        self.repository.loans.delete(id).await.map_err(|e| e.context(op))
    }

    /// Loan counters: active, lifetime total, and overdue among the active
    pub async fn statistics(&self) -> AppResult<LoanStatistics> {
        let op = "Error al obtener estadísticas";
        let active = self
            .repository
            .loans
            .list_active()
            .await
            .map_err(|e| e.context(op))?;
        let history = self.repository.loans.history().await.map_err(|e| e.context(op))?;

        let now = Utc::now();
        let overdue = active
            .iter()
            .filter(|l| l.is_overdue(now, self.rules.overdue_after_days))
            .count();

        Ok(LoanStatistics {
            active_loans: active.len(),
            total_loans: active.len() + history.len(),
            overdue_loans: overdue,
        })
    }

    /// Case-insensitive substring search across active loans and history,
    /// by book title or member name
    pub async fn search(&self, term: &str) -> AppResult<Vec<Loan>> {
        let op = "Error al buscar préstamos";
        let mut loans = self
            .repository
            .loans
            .list_active()
            .await
            .map_err(|e| e.context(op))?;
        loans.extend(self.repository.loans.history().await.map_err(|e| e.context(op))?);

        let term = term.to_lowercase();
        Ok(loans
            .into_iter()
            .filter(|l| {
                l.book_title.to_lowercase().contains(&term)
                    || l.member_name.to_lowercase().contains(&term)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::*;
    use crate::{
        models::{LoanStatus, NewBook, NewMember},
        services::Services,
        store::{DocumentStore, MemoryStore, PRESTAMOS},
    };

    fn fixture() -> (Services, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let repository = Repository::new(store.clone());
        (Services::new(repository, LoanRulesConfig::default()), store)
    }

    async fn seed_book(services: &Services, title: &str) -> String {
        services
            .books
            .add(&NewBook {
                title: title.to_string(),
                author: "Gabriel García Márquez".to_string(),
            })
            .await
            .unwrap()
    }

    async fn seed_member(services: &Services, name: &str, email: &str) -> String {
        services
            .members
            .add(&NewMember {
                name: name.to_string(),
                email: email.to_string(),
            })
            .await
            .unwrap()
    }

    #[test]
    fn validate_reports_missing_ids() {
        let errors = validate_loan(&NewLoan {
            book_id: "".to_string(),
            member_id: " ".to_string(),
        });
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn create_requires_an_existing_book() {
        let (services, _) = fixture();
        let err = services
            .loans
            .create(&NewLoan {
                book_id: "missing".to_string(),
                member_id: "missing".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.message().contains("El libro no existe"));
    }

    #[tokio::test]
    async fn create_requires_an_existing_member() {
        let (services, _) = fixture();
        let book_id = seed_book(&services, "Cien años de soledad").await;

        let err = services
            .loans
            .create(&NewLoan {
                book_id,
                member_id: "missing".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.message().contains("El usuario no existe"));
    }

    #[tokio::test]
    async fn second_checkout_of_the_same_book_fails() {
        let (services, _) = fixture();
        let book_id = seed_book(&services, "Cien años de soledad").await;
        let ana = seed_member(&services, "Ana Pérez", "ana@mail.com").await;
        let luis = seed_member(&services, "Luis Gómez", "luis@mail.com").await;

        services
            .loans
            .create(&NewLoan {
                book_id: book_id.clone(),
                member_id: ana,
            })
            .await
            .unwrap();

        let err = services
            .loans
            .create(&NewLoan {
                book_id,
                member_id: luis,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
        assert!(err.message().contains("ya está prestado"));
    }

    #[tokio::test]
    async fn member_loan_limit_is_enforced() {
        let (services, _) = fixture();
        let ana = seed_member(&services, "Ana Pérez", "ana@mail.com").await;

        for i in 0..5 {
            let book_id = seed_book(&services, &format!("Tomo {}", i + 1)).await;
            services
                .loans
                .create(&NewLoan {
                    book_id,
                    member_id: ana.clone(),
                })
                .await
                .unwrap();
        }

        let sixth = seed_book(&services, "Tomo 6").await;
        let err = services
            .loans
            .create(&NewLoan {
                book_id: sixth,
                member_id: ana,
            })
            .await
            .unwrap_err();
        assert!(err
            .message()
            .contains("máximo de préstamos permitidos (5)"));
    }

    #[tokio::test]
    async fn return_sets_status_and_rejects_a_second_attempt() {
        let (services, _) = fixture();
        let book_id = seed_book(&services, "Cien años de soledad").await;
        let ana = seed_member(&services, "Ana Pérez", "ana@mail.com").await;

        let loan_id = services
            .loans
            .create(&NewLoan {
                book_id,
                member_id: ana,
            })
            .await
            .unwrap();

        services.loans.return_loan(&loan_id).await.unwrap();

        let history = services.loans.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, LoanStatus::Returned);
        assert!(history[0].returned_at.is_some());

        let err = services.loans.return_loan(&loan_id).await.unwrap_err();
        assert!(err.message().contains("ya fue devuelto"));
    }

    #[tokio::test]
    async fn statistics_count_only_old_active_loans_as_overdue() {
        let (services, store) = fixture();
        let book_id = seed_book(&services, "Cien años de soledad").await;
        let ana = seed_member(&services, "Ana Pérez", "ana@mail.com").await;

        // Fresh active loan through the service
        services
            .loans
            .create(&NewLoan {
                book_id,
                member_id: ana,
            })
            .await
            .unwrap();

        // Back-dated active loan and one returned loan, seeded directly
        store
            .insert(
                PRESTAMOS,
                json!({
                    "libroId": "b-old",
                    "usuarioId": "m-old",
                    "libroTitulo": "La casa de los espíritus",
                    "libroAutor": "Isabel Allende",
                    "usuarioNombre": "Luis Gómez",
                    "usuarioEmail": "luis@mail.com",
                    "fechaPrestamo": Utc::now() - Duration::days(40),
                    "fechaDevolucion": null,
                    "estado": "activo",
                }),
            )
            .await
            .unwrap();
        store
            .insert(
                PRESTAMOS,
                json!({
                    "libroId": "b-done",
                    "usuarioId": "m-done",
                    "libroTitulo": "Ficciones",
                    "libroAutor": "Jorge Luis Borges",
                    "usuarioNombre": "Eva Torres",
                    "usuarioEmail": "eva@mail.com",
                    "fechaPrestamo": Utc::now() - Duration::days(60),
                    "fechaDevolucion": Utc::now() - Duration::days(20),
                    "estado": "devuelto",
                }),
            )
            .await
            .unwrap();

        let stats = services.loans.statistics().await.unwrap();
        assert_eq!(stats.active_loans, 2);
        assert_eq!(stats.total_loans, 3);
        assert_eq!(stats.overdue_loans, 1);
    }

    #[tokio::test]
    async fn a_loan_exactly_at_the_threshold_is_not_overdue() {
        let (services, store) = fixture();
        store
            .insert(
                PRESTAMOS,
                json!({
                    "libroId": "b1",
                    "usuarioId": "m1",
                    "libroTitulo": "Ficciones",
                    "libroAutor": "Jorge Luis Borges",
                    "usuarioNombre": "Ana Pérez",
                    "usuarioEmail": "ana@mail.com",
                    "fechaPrestamo": Utc::now() - Duration::days(30),
                    "fechaDevolucion": null,
                    "estado": "activo",
                }),
            )
            .await
            .unwrap();

        let stats = services.loans.statistics().await.unwrap();
        assert_eq!(stats.overdue_loans, 0);
    }

    #[tokio::test]
    async fn search_spans_active_and_history() {
        let (services, _) = fixture();
        let book_id = seed_book(&services, "Cien años de soledad").await;
        let ana = seed_member(&services, "Ana Pérez", "ana@mail.com").await;

        let loan_id = services
            .loans
            .create(&NewLoan {
                book_id: book_id.clone(),
                member_id: ana.clone(),
            })
            .await
            .unwrap();
        services.loans.return_loan(&loan_id).await.unwrap();
        services
            .loans
            .create(&NewLoan {
                book_id,
                member_id: ana,
            })
            .await
            .unwrap();

        let matches = services.loans.search("cien años").await.unwrap();
        assert_eq!(matches.len(), 2);

        let by_member = services.loans.search("pérez").await.unwrap();
        assert_eq!(by_member.len(), 2);
    }
}
