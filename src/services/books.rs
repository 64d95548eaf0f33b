//! Book business-rule service

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookUpdate, NewBook},
    repository::Repository,
};

use super::fold_violations;

/// Charset shared by titles and author names: letters including the
/// Spanish accented forms, digits, whitespace, and common punctuation
static TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[a-zA-Z0-9\sáéíóúÁÉÍÓÚñÑüÜ.,;:()\-'"]+$"#).unwrap());

/// Violation list for a book payload; empty means valid
pub fn validate_book(book: &NewBook) -> Vec<String> {
    let mut errors = Vec::new();
    let title = book.title.trim();
    let author = book.author.trim();

    if title.is_empty() {
        errors.push("El título es requerido".to_string());
    } else if title.chars().count() < 2 {
        errors.push("El título debe tener al menos 2 caracteres".to_string());
    } else if title.chars().count() > 200 {
        errors.push("El título no puede exceder 200 caracteres".to_string());
    }

    if author.is_empty() {
        errors.push("El autor es requerido".to_string());
    } else if author.chars().count() < 2 {
        errors.push("El autor debe tener al menos 2 caracteres".to_string());
    } else if author.chars().count() > 100 {
        errors.push("El autor no puede exceder 100 caracteres".to_string());
    }

    if !title.is_empty() && !TEXT_RE.is_match(title) {
        errors.push("El título contiene caracteres no válidos".to_string());
    }
    if !author.is_empty() && !TEXT_RE.is_match(author) {
        errors.push("El autor contiene caracteres no válidos".to_string());
    }

    errors
}

#[derive(Clone)]
pub struct BookService {
    repository: Repository,
}

impl BookService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All books, ordered by title
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository
            .books
            .list()
            .await
            .map_err(|e| e.context("Error al obtener libros"))
    }

    /// Validate and register a new book
    pub async fn add(&self, book: &NewBook) -> AppResult<String> {
        let op = "Error al agregar libro";
        fold_violations(validate_book(book)).map_err(|e| e.context(op))?;
        self.repository.books.add(book).await.map_err(|e| e.context(op))
    }

    /// Validate and apply an edit; both fields are required, as on create
    pub async fn edit(&self, id: &str, book: &NewBook) -> AppResult<()> {
        let op = "Error al editar libro";
        if id.is_empty() {
            return Err(AppError::Validation("ID del libro es requerido".to_string()).context(op));
        }
        fold_violations(validate_book(book)).map_err(|e| e.context(op))?;

        let changes = BookUpdate {
            title: Some(book.title.clone()),
            author: Some(book.author.clone()),
        };
        self.repository
            .books
            .update(id, &changes)
            .await
            .map_err(|e| e.context(op))
    }

    /// Delete a book after checking it exists
    pub async fn remove(&self, id: &str) -> AppResult<()> {
        let op = "Error al eliminar libro";
        if id.is_empty() {
            return Err(AppError::Validation("ID del libro es requerido".to_string()).context(op));
        }

        let books = self.repository.books.list().await.map_err(|e| e.context(op))?;
        if !books.iter().any(|b| b.id == id) {
            return Err(AppError::NotFound("El libro no existe".to_string()).context(op));
        }

        self.repository.books.delete(id).await.map_err(|e| e.context(op))
    }

    /// Books currently available for checkout
    pub async fn available(&self) -> AppResult<Vec<Book>> {
        self.repository
            .books
            .list_available()
            .await
            .map_err(|e| e.context("Error al obtener libros disponibles"))
    }

    /// Case-insensitive substring search over title and author
    pub async fn search(&self, term: &str) -> AppResult<Vec<Book>> {
        let books = self
            .repository
            .books
            .list()
            .await
            .map_err(|e| e.context("Error al buscar libros"))?;
        let term = term.to_lowercase();
        Ok(books
            .into_iter()
            .filter(|b| {
                b.title.to_lowercase().contains(&term) || b.author.to_lowercase().contains(&term)
            })
            .collect())
    }
}
