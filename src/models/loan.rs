//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Loan lifecycle status stored in `estado`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    #[serde(rename = "activo")]
    Active,
    #[serde(rename = "devuelto")]
    Returned,
}

/// Loan record from the `prestamos` collection. Book and member display
/// fields are denormalized at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "libroId")]
    pub book_id: String,
    #[serde(rename = "usuarioId")]
    pub member_id: String,
    #[serde(rename = "libroTitulo")]
    pub book_title: String,
    #[serde(rename = "libroAutor")]
    pub book_author: String,
    #[serde(rename = "usuarioNombre")]
    pub member_name: String,
    #[serde(rename = "usuarioEmail")]
    pub member_email: String,
    #[serde(rename = "fechaPrestamo")]
    pub loaned_at: DateTime<Utc>,
    #[serde(rename = "fechaDevolucion")]
    pub returned_at: Option<DateTime<Utc>>,
    #[serde(rename = "estado")]
    pub status: LoanStatus,
}

impl Loan {
    /// A loan is active while its return timestamp is unset
    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Whole days since checkout
    pub fn days_out(&self, now: DateTime<Utc>) -> i64 {
        (now - self.loaned_at).num_days()
    }

    /// Active and out longer than the given threshold
    pub fn is_overdue(&self, now: DateTime<Utc>, threshold_days: i64) -> bool {
        self.is_active() && self.days_out(now) > threshold_days
    }
}

/// Create loan request
#[derive(Debug, Clone, Deserialize)]
pub struct NewLoan {
    pub book_id: String,
    pub member_id: String,
}

/// Derived loan counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoanStatistics {
    #[serde(rename = "prestamosActivos")]
    pub active_loans: usize,
    #[serde(rename = "totalPrestamos")]
    pub total_loans: usize,
    #[serde(rename = "prestamosVencidos")]
    pub overdue_loans: usize,
}
