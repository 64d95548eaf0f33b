//! Books repository against the `libros` collection

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookUpdate, NewBook},
    store::{DocumentStore, Filter, LIBROS, PRESTAMOS},
};

use super::{decode_all, store_failure};

#[derive(Clone)]
pub struct BooksRepository {
    store: Arc<dyn DocumentStore>,
}

impl BooksRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All books, sorted by title client-side (the store has no usable
    /// index for the ordering contract)
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let docs = self
            .store
            .fetch_all(LIBROS)
            .await
            .map_err(store_failure("Error al obtener libros"))?;
        let mut books: Vec<Book> = decode_all(docs)?;
        books.sort_by_key(|b| b.title.to_lowercase());
        Ok(books)
    }

    /// Books currently flagged available, sorted by title
    pub async fn list_available(&self) -> AppResult<Vec<Book>> {
        let docs = self
            .store
            .find(LIBROS, &[Filter::Eq("disponible", json!(true))])
            .await
            .map_err(store_failure("Error al obtener libros disponibles"))?;
        let mut books: Vec<Book> = decode_all(docs)?;
        books.sort_by_key(|b| b.title.to_lowercase());
        Ok(books)
    }

    /// Insert a new book after the duplicate-identity probe
    pub async fn add(&self, book: &NewBook) -> AppResult<String> {
        let title = book.title.trim();
        let author = book.author.trim();
        if title.is_empty() || author.is_empty() {
            return Err(AppError::Validation(
                "Título y autor son requeridos.".to_string(),
            ));
        }

        // Identity is the case-sensitive title+author pair
        let existing = self
            .store
            .find(
                LIBROS,
                &[
                    Filter::Eq("titulo", json!(title)),
                    Filter::Eq("autor", json!(author)),
                ],
            )
            .await
            .map_err(store_failure("Error al agregar libro"))?;
        if !existing.is_empty() {
            return Err(AppError::Conflict(
                "Este libro ya existe en la biblioteca.".to_string(),
            ));
        }

        let data = json!({
            "titulo": title,
            "autor": author,
            "fechaCreacion": Utc::now(),
            "disponible": true,
        });
        self.store
            .insert(LIBROS, data)
            .await
            .map_err(store_failure("Error al agregar libro"))
    }

    /// Apply a partial update; string fields empty after trim are rejected
    pub async fn update(&self, id: &str, changes: &BookUpdate) -> AppResult<()> {
        if id.is_empty() {
            return Err(AppError::Validation("ID es requerido.".to_string()));
        }

        let mut clean = serde_json::Map::new();
        if let Some(ref title) = changes.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation(
                    "El título no puede estar vacío.".to_string(),
                ));
            }
            clean.insert("titulo".to_string(), json!(title.trim()));
        }
        if let Some(ref author) = changes.author {
            if author.trim().is_empty() {
                return Err(AppError::Validation(
                    "El autor no puede estar vacío.".to_string(),
                ));
            }
            clean.insert("autor".to_string(), json!(author.trim()));
        }

        self.store
            .update(LIBROS, id, Value::Object(clean))
            .await
            .map_err(store_failure("Error al editar libro"))
    }

    /// Delete a book, rejecting when dependent active loans exist
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if id.is_empty() {
            return Err(AppError::Validation("ID es requerido.".to_string()));
        }

        let active = self
            .store
            .find(
                PRESTAMOS,
                &[
                    Filter::Eq("libroId", json!(id)),
                    Filter::IsNull("fechaDevolucion"),
                ],
            )
            .await
            .map_err(store_failure("Error al eliminar libro"))?;
        if !active.is_empty() {
            return Err(AppError::Conflict(
                "No se puede eliminar un libro que tiene préstamos activos.".to_string(),
            ));
        }

        self.store
            .delete(LIBROS, id)
            .await
            .map_err(store_failure("Error al eliminar libro"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryStore;

    fn repository() -> BooksRepository {
        BooksRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn update_rejects_empty_after_trim() {
        let repo = repository();
        let id = repo
            .add(&NewBook {
                title: "Ficciones".to_string(),
                author: "Jorge Luis Borges".to_string(),
            })
            .await
            .unwrap();

        let err = repo
            .update(
                &id,
                &BookUpdate {
                    title: Some("   ".to_string()),
                    author: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.message().contains("no puede estar vacío"));
    }

    #[tokio::test]
    async fn update_touches_only_the_given_fields() {
        let repo = repository();
        let id = repo
            .add(&NewBook {
                title: "Ficciones".to_string(),
                author: "Jorge Luis Borges".to_string(),
            })
            .await
            .unwrap();

        repo.update(
            &id,
            &BookUpdate {
                title: Some("El Aleph".to_string()),
                author: None,
            },
        )
        .await
        .unwrap();

        let books = repo.list().await.unwrap();
        assert_eq!(books[0].title, "El Aleph");
        assert_eq!(books[0].author, "Jorge Luis Borges");
    }

    #[tokio::test]
    async fn duplicate_probe_is_case_sensitive() {
        let repo = repository();
        let new = NewBook {
            title: "Rayuela".to_string(),
            author: "Julio Cortázar".to_string(),
        };
        repo.add(&new).await.unwrap();

        let err = repo.add(&new).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // A different casing is a different identity
        repo.add(&NewBook {
            title: "rayuela".to_string(),
            author: "Julio Cortázar".to_string(),
        })
        .await
        .unwrap();
    }
}
