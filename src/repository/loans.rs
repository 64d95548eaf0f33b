//! Loans repository against the `prestamos` collection

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        loan::{Loan, NewLoan},
        member::Member,
    },
    store::{DocumentStore, Filter, LIBROS, PRESTAMOS, USUARIOS},
};

use super::{decode_all, store_failure};

#[derive(Clone)]
pub struct LoansRepository {
    store: Arc<dyn DocumentStore>,
}

impl LoansRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Active loans, newest first
    pub async fn list_active(&self) -> AppResult<Vec<Loan>> {
        let docs = self
            .store
            .find(PRESTAMOS, &[Filter::IsNull("fechaDevolucion")])
            .await
            .map_err(store_failure("Error al obtener préstamos activos"))?;
        let mut loans: Vec<Loan> = decode_all(docs)?;
        loans.sort_by(|a, b| b.loaned_at.cmp(&a.loaned_at));
        Ok(loans)
    }

    /// Returned loans, most recently returned first
    pub async fn history(&self) -> AppResult<Vec<Loan>> {
        let docs = self
            .store
            .find(PRESTAMOS, &[Filter::NotNull("fechaDevolucion")])
            .await
            .map_err(store_failure("Error al obtener historial de préstamos"))?;
        let mut loans: Vec<Loan> = decode_all(docs)?;
        loans.sort_by(|a, b| b.returned_at.cmp(&a.returned_at));
        Ok(loans)
    }

    /// Fetch a single loan
    pub async fn get(&self, id: &str) -> AppResult<Loan> {
        let doc = self
            .store
            .get(PRESTAMOS, id)
            .await
            .map_err(store_failure("Error al obtener préstamo"))?
            .ok_or_else(|| AppError::NotFound("El préstamo no existe.".to_string()))?;
        Ok(doc.decode()?)
    }

    /// Active loans held by one member
    pub async fn active_for_member(&self, member_id: &str) -> AppResult<Vec<Loan>> {
        let docs = self
            .store
            .find(
                PRESTAMOS,
                &[
                    Filter::Eq("usuarioId", json!(member_id)),
                    Filter::IsNull("fechaDevolucion"),
                ],
            )
            .await
            .map_err(store_failure("Error al obtener préstamos del usuario"))?;
        decode_all(docs)
    }

    /// Register a loan: existence probes, the active-loan probe, then a
    /// denormalized insert that also flips the book's availability flag.
    ///
    /// The probe and the writes are separate store calls; two concurrent
    /// checkouts of the same book can race between them. The store offers
    /// no transaction to close that gap and none is simulated here.
    pub async fn add(&self, loan: &NewLoan) -> AppResult<String> {
        if loan.book_id.is_empty() || loan.member_id.is_empty() {
            return Err(AppError::Validation(
                "ID del libro y usuario son requeridos.".to_string(),
            ));
        }

        let book: Book = self
            .store
            .get(LIBROS, &loan.book_id)
            .await
            .map_err(store_failure("Error al agregar préstamo"))?
            .ok_or_else(|| AppError::NotFound("El libro no existe.".to_string()))?
            .decode()?;

        let member: Member = self
            .store
            .get(USUARIOS, &loan.member_id)
            .await
            .map_err(store_failure("Error al agregar préstamo"))?
            .ok_or_else(|| AppError::NotFound("El usuario no existe.".to_string()))?
            .decode()?;

        let active = self
            .store
            .find(
                PRESTAMOS,
                &[
                    Filter::Eq("libroId", json!(loan.book_id)),
                    Filter::IsNull("fechaDevolucion"),
                ],
            )
            .await
            .map_err(store_failure("Error al agregar préstamo"))?;
        if !active.is_empty() {
            return Err(AppError::BusinessRule(
                "Este libro ya está prestado.".to_string(),
            ));
        }

        let data = json!({
            "libroId": loan.book_id,
            "usuarioId": loan.member_id,
            "libroTitulo": book.title,
            "libroAutor": book.author,
            "usuarioNombre": member.name,
            "usuarioEmail": member.email,
            "fechaPrestamo": Utc::now(),
            "fechaDevolucion": null,
            "estado": "activo",
        });
        let id = self
            .store
            .insert(PRESTAMOS, data)
            .await
            .map_err(store_failure("Error al agregar préstamo"))?;

        // The book now carries an active loan
        self.store
            .update(LIBROS, &loan.book_id, json!({ "disponible": false }))
            .await
            .map_err(store_failure("Error al agregar préstamo"))?;

        tracing::info!("Préstamo {} registrado para libro {}", id, loan.book_id);
        Ok(id)
    }

    /// Mark a loan returned and restore the book's availability. A second
    /// return attempt is rejected.
    pub async fn return_loan(&self, id: &str) -> AppResult<()> {
        if id.is_empty() {
            return Err(AppError::Validation(
                "ID del préstamo es requerido.".to_string(),
            ));
        }

        let loan = self.get(id).await?;
        if loan.returned_at.is_some() {
            return Err(AppError::BusinessRule(
                "Este préstamo ya fue devuelto.".to_string(),
            ));
        }

        self.store
            .update(
                PRESTAMOS,
                id,
                json!({
                    "fechaDevolucion": Utc::now(),
                    "estado": "devuelto",
                }),
            )
            .await
            .map_err(store_failure("Error al devolver préstamo"))?;

        // No active loan references the book anymore
        self.store
            .update(LIBROS, &loan.book_id, json!({ "disponible": true }))
            .await
            .map_err(store_failure("Error al devolver préstamo"))?;

        tracing::info!("Préstamo {} devuelto", id);
        Ok(())
    }

    /// Delete a loan row; loans have no dependents
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if id.is_empty() {
            return Err(AppError::Validation("ID es requerido.".to_string()));
        }
        self.store
            .delete(PRESTAMOS, id)
            .await
            .map_err(store_failure("Error al eliminar préstamo"))
    }
}
