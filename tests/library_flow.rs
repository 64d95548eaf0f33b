//! End-to-end flows over the in-memory store

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use serde_json::json;

use biblioteca::{
    app::BibliotecaApp,
    config::LoanRulesConfig,
    models::{LoanStatus, NewBook, NewLoan, NewMember},
    notify::{NotificationKind, Notifier},
    repository::Repository,
    services::Services,
    store::{DocumentStore, MemoryStore, PRESTAMOS},
};

/// Notifier capturing every toast for later assertions
#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<(String, NotificationKind)>>,
}

impl RecordingNotifier {
    fn contains(&self, needle: &str, kind: NotificationKind) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|(msg, k)| *k == kind && msg.contains(needle))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), kind));
    }
}

fn wire() -> (BibliotecaApp, Arc<MemoryStore>, Arc<RecordingNotifier>) {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let services = Services::new(Repository::new(store.clone()), LoanRulesConfig::default());
    let app = BibliotecaApp::new(services, notifier.clone());
    (app, store, notifier)
}

fn new_book(title: &str, author: &str) -> NewBook {
    NewBook {
        title: title.to_string(),
        author: author.to_string(),
    }
}

fn new_member(name: &str, email: &str) -> NewMember {
    NewMember {
        name: name.to_string(),
        email: email.to_string(),
    }
}

#[tokio::test]
async fn checkout_and_return_flow() {
    let (app, _, notifier) = wire();

    let book_id = app
        .add_book(&new_book("Cien años de soledad", "Gabriel García Márquez"))
        .await
        .unwrap();
    let member_id = app
        .add_member(&new_member("Ana Pérez", "Ana@Mail.com"))
        .await
        .unwrap();

    // Email is stored normalized lowercase
    let members = app.load_members().await.unwrap();
    assert_eq!(members[0].email, "ana@mail.com");

    let loan_id = app
        .create_loan(&NewLoan {
            book_id: book_id.clone(),
            member_id: member_id.clone(),
        })
        .await
        .unwrap();
    assert!(notifier.contains("Préstamo registrado exitosamente", NotificationKind::Success));

    // The book is no longer available
    let books = app.load_books().await.unwrap();
    assert!(!books[0].available);
    assert!(app.available_books().await.unwrap().is_empty());

    // A second checkout of the same book fails
    let other = app
        .add_member(&new_member("Luis Gómez", "luis@mail.com"))
        .await
        .unwrap();
    let err = app
        .create_loan(&NewLoan {
            book_id: book_id.clone(),
            member_id: other,
        })
        .await
        .unwrap_err();
    assert!(err.message().contains("ya está prestado"));
    assert!(notifier.contains("ya está prestado", NotificationKind::Error));

    // Returning restores availability and closes the loan
    app.return_loan(&loan_id).await.unwrap();
    let books = app.load_books().await.unwrap();
    assert!(books[0].available);

    let history = app.loan_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, LoanStatus::Returned);
    assert!(history[0].returned_at.is_some());

    // A second return attempt is rejected
    let err = app.return_loan(&loan_id).await.unwrap_err();
    assert!(err.message().contains("ya fue devuelto"));
}

#[tokio::test]
async fn deleting_a_book_with_an_active_loan_is_rejected() {
    let (app, _, notifier) = wire();

    let book_id = app
        .add_book(&new_book("El túnel", "Ernesto Sabato"))
        .await
        .unwrap();
    let member_id = app
        .add_member(&new_member("Ana Pérez", "ana@mail.com"))
        .await
        .unwrap();
    let loan_id = app
        .create_loan(&NewLoan {
            book_id: book_id.clone(),
            member_id,
        })
        .await
        .unwrap();

    let err = app.delete_book(&book_id).await.unwrap_err();
    assert!(err
        .message()
        .contains("No se puede eliminar un libro que tiene préstamos activos"));
    assert!(notifier.contains("No se puede eliminar", NotificationKind::Error));

    // Once returned, the delete goes through
    app.return_loan(&loan_id).await.unwrap();
    app.delete_book(&book_id).await.unwrap();
    assert!(app.load_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn a_member_cannot_hold_more_than_five_loans() {
    let (app, _, _) = wire();

    let member_id = app
        .add_member(&new_member("Ana Pérez", "ana@mail.com"))
        .await
        .unwrap();

    for i in 0..5 {
        let book_id = app
            .add_book(&new_book(&format!("Tomo {}", i + 1), "Benito Pérez Galdós"))
            .await
            .unwrap();
        app.create_loan(&NewLoan {
            book_id,
            member_id: member_id.clone(),
        })
        .await
        .unwrap();
    }

    let sixth = app
        .add_book(&new_book("Tomo 6", "Benito Pérez Galdós"))
        .await
        .unwrap();
    let err = app
        .create_loan(&NewLoan {
            book_id: sixth,
            member_id,
        })
        .await
        .unwrap_err();
    assert!(err.message().contains("máximo de préstamos permitidos (5)"));
}

#[tokio::test]
async fn refresh_and_statistics_reflect_the_store() {
    let (app, store, _) = wire();

    let book_id = app
        .add_book(&new_book("Ficciones", "Jorge Luis Borges"))
        .await
        .unwrap();
    let member_id = app
        .add_member(&new_member("Ana Pérez", "ana@mail.com"))
        .await
        .unwrap();
    app.create_loan(&NewLoan {
        book_id,
        member_id,
    })
    .await
    .unwrap();

    // Back-dated active loan seeded directly into the store
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
                "fechaPrestamo": Utc::now() - Duration::days(45),
                "fechaDevolucion": null,
                "estado": "activo",
            }),
        )
        .await
        .unwrap();

    let dashboard = app.refresh_loan_data().await.unwrap();
    assert_eq!(dashboard.active_loans.len(), 2);
    assert!(dashboard.history.is_empty());
    assert!(dashboard.available_books.is_empty());
    assert_eq!(dashboard.active_members.len(), 1);

    let snapshot = app.full_snapshot().await.unwrap();
    assert_eq!(snapshot.statistics.active_loans, 2);
    assert_eq!(snapshot.statistics.total_loans, 2);
    assert_eq!(snapshot.statistics.overdue_loans, 1);

    // Active loans come back newest first
    assert_eq!(snapshot.active_loans[0].book_title, "Ficciones");
}
