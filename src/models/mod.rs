//! Typed records for the biblioteca collections
//!
//! Field names are English in code and Spanish on the wire, matching the
//! documents stored in `libros`, `usuarios`, and `prestamos`.

pub mod book;
pub mod loan;
pub mod member;

pub use book::{Book, BookUpdate, NewBook};
pub use loan::{Loan, LoanStatistics, LoanStatus, NewLoan};
pub use member::{Member, MemberUpdate, NewMember};
