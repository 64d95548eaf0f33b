//! Application coordinator
//!
//! Wraps every service call in a uniform try/notify/rethrow pattern and
//! merges independent parallel reads into composite views.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    error::AppResult,
    models::{Book, Loan, LoanStatistics, Member, NewBook, NewLoan, NewMember},
    notify::{NotificationKind, Notifier},
    services::Services,
};

/// Merged result of the four dashboard reads plus statistics
#[derive(Debug, Clone, Serialize)]
pub struct FullSnapshot {
    pub books: Vec<Book>,
    pub members: Vec<Member>,
    pub active_loans: Vec<Loan>,
    pub history: Vec<Loan>,
    pub statistics: LoanStatistics,
}

/// Merged result of the loan-screen refresh reads
#[derive(Debug, Clone, Serialize)]
pub struct LoanDashboard {
    pub active_loans: Vec<Loan>,
    pub history: Vec<Loan>,
    pub available_books: Vec<Book>,
    pub active_members: Vec<Member>,
}

/// Outcome of the cross-reference integrity check
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    #[serde(rename = "valido")]
    pub valid: bool,
    #[serde(rename = "problemas")]
    pub problems: Vec<String>,
}

/// Application coordinator over the business services
#[derive(Clone)]
pub struct BibliotecaApp {
    services: Services,
    notifier: Arc<dyn Notifier>,
}

impl BibliotecaApp {
    pub fn new(services: Services, notifier: Arc<dyn Notifier>) -> Self {
        Self { services, notifier }
    }

    /// Uniform wrapper: acknowledge mutating successes, surface every
    /// failure, and re-propagate the error either way
    fn report<T>(&self, result: AppResult<T>, success: Option<&str>) -> AppResult<T> {
        match result {
            Ok(value) => {
                if let Some(message) = success {
                    self.notifier.notify(message, NotificationKind::Success);
                }
                Ok(value)
            }
            Err(e) => {
                self.notifier.notify(&e.message(), NotificationKind::Error);
                Err(e)
            }
        }
    }

    // Books

    pub async fn load_books(&self) -> AppResult<Vec<Book>> {
        self.report(self.services.books.list().await, None)
    }

    pub async fn add_book(&self, book: &NewBook) -> AppResult<String> {
        self.report(
            self.services.books.add(book).await,
            Some("Libro agregado exitosamente"),
        )
    }

    pub async fn edit_book(&self, id: &str, book: &NewBook) -> AppResult<()> {
        self.report(
            self.services.books.edit(id, book).await,
            Some("Libro actualizado exitosamente"),
        )
    }

    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        self.report(
            self.services.books.remove(id).await,
            Some("Libro eliminado exitosamente"),
        )
    }

    pub async fn available_books(&self) -> AppResult<Vec<Book>> {
        self.report(self.services.books.available().await, None)
    }

    // Members

    pub async fn load_members(&self) -> AppResult<Vec<Member>> {
        self.report(self.services.members.list().await, None)
    }

    pub async fn add_member(&self, member: &NewMember) -> AppResult<String> {
        self.report(
            self.services.members.add(member).await,
            Some("Usuario registrado exitosamente"),
        )
    }

    pub async fn edit_member(&self, id: &str, member: &NewMember) -> AppResult<()> {
        self.report(
            self.services.members.edit(id, member).await,
            Some("Usuario actualizado exitosamente"),
        )
    }

    pub async fn delete_member(&self, id: &str) -> AppResult<()> {
        self.report(
            self.services.members.remove(id).await,
            Some("Usuario eliminado exitosamente"),
        )
    }

    pub async fn active_members(&self) -> AppResult<Vec<Member>> {
        self.report(self.services.members.active().await, None)
    }

    // Loans

    pub async fn active_loans(&self) -> AppResult<Vec<Loan>> {
        self.report(self.services.loans.active().await, None)
    }

    pub async fn loan_history(&self) -> AppResult<Vec<Loan>> {
        self.report(self.services.loans.history().await, None)
    }

    pub async fn create_loan(&self, loan: &NewLoan) -> AppResult<String> {
        self.report(
            self.services.loans.create(loan).await,
            Some("Préstamo registrado exitosamente"),
        )
    }

    pub async fn return_loan(&self, id: &str) -> AppResult<()> {
        self.report(
            self.services.loans.return_loan(id).await,
            Some("Libro devuelto exitosamente"),
        )
    }

    pub async fn delete_loan(&self, id: &str) -> AppResult<()> {
        self.report(
            self.services.loans.remove(id).await,
            Some("Préstamo eliminado exitosamente"),
        )
    }

    // Searches

    pub async fn search_books(&self, term: &str) -> AppResult<Vec<Book>> {
        self.report(self.services.books.search(term).await, None)
    }

    pub async fn search_members(&self, term: &str) -> AppResult<Vec<Member>> {
        self.report(self.services.members.search(term).await, None)
    }

    pub async fn search_loans(&self, term: &str) -> AppResult<Vec<Loan>> {
        self.report(self.services.loans.search(term).await, None)
    }

    // Composite reads

    /// Dashboard view: four independent reads joined, then statistics.
    /// Any single failure fails the whole group.
    pub async fn full_snapshot(&self) -> AppResult<FullSnapshot> {
        self.notifier.show_loader("Cargando datos completos...");
        let result = self.full_snapshot_inner().await;
        self.notifier.hide_loader();
        match result {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                self.notifier
                    .notify("Error al cargar datos completos", NotificationKind::Error);
                Err(e)
            }
        }
    }

    async fn full_snapshot_inner(&self) -> AppResult<FullSnapshot> {
        let (books, members, active_loans, history) = tokio::try_join!(
            self.load_books(),
            self.load_members(),
            self.active_loans(),
            self.loan_history(),
        )?;
        let statistics = self.services.loans.statistics().await?;
        Ok(FullSnapshot {
            books,
            members,
            active_loans,
            history,
            statistics,
        })
    }

    /// Loan-screen refresh: four independent reads joined
    pub async fn refresh_loan_data(&self) -> AppResult<LoanDashboard> {
        self.notifier.show_loader("Cargando datos de préstamos...");
        let result = tokio::try_join!(
            self.active_loans(),
            self.loan_history(),
            self.available_books(),
            self.active_members(),
        );
        self.notifier.hide_loader();
        match result {
            Ok((active_loans, history, available_books, active_members)) => Ok(LoanDashboard {
                active_loans,
                history,
                available_books,
                active_members,
            }),
            Err(e) => {
                self.notifier.notify(
                    "Error al refrescar datos de préstamos",
                    NotificationKind::Error,
                );
                Err(e)
            }
        }
    }

    /// Cross-reference the merged snapshot for the two known inconsistency
    /// classes: unavailable books without a matching active loan, and
    /// inactive members holding one
    pub async fn check_integrity(&self) -> AppResult<IntegrityReport> {
        let snapshot = match self.full_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.notifier.notify(
                    "Error al validar integridad de datos",
                    NotificationKind::Error,
                );
                return Err(e);
            }
        };

        let mut problems = Vec::new();

        let loaned_books: Vec<&str> = snapshot
            .active_loans
            .iter()
            .map(|l| l.book_id.as_str())
            .collect();
        for book in snapshot.books.iter().filter(|b| !b.available) {
            if !loaned_books.contains(&book.id.as_str()) {
                problems.push(format!(
                    "Libro \"{}\" marcado como no disponible pero sin préstamos activos",
                    book.title
                ));
            }
        }

        let borrowing_members: Vec<&str> = snapshot
            .active_loans
            .iter()
            .map(|l| l.member_id.as_str())
            .collect();
        for member in snapshot.members.iter().filter(|m| !m.active) {
            if borrowing_members.contains(&member.id.as_str()) {
                problems.push(format!(
                    "Usuario \"{}\" inactivo pero con préstamos activos",
                    member.name
                ));
            }
        }

        Ok(IntegrityReport {
            valid: problems.is_empty(),
            problems,
        })
    }
}
