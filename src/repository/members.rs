//! Members repository against the `usuarios` collection

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::member::{is_valid_email, Member, MemberUpdate, NewMember},
    store::{DocumentStore, Filter, PRESTAMOS, USUARIOS},
};

use super::{decode_all, store_failure};

#[derive(Clone)]
pub struct MembersRepository {
    store: Arc<dyn DocumentStore>,
}

impl MembersRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All members, sorted by name client-side
    pub async fn list(&self) -> AppResult<Vec<Member>> {
        let docs = self
            .store
            .fetch_all(USUARIOS)
            .await
            .map_err(store_failure("Error al obtener usuarios"))?;
        let mut members: Vec<Member> = decode_all(docs)?;
        members.sort_by_key(|m| m.name.to_lowercase());
        Ok(members)
    }

    /// Members currently flagged active, sorted by name
    pub async fn list_active(&self) -> AppResult<Vec<Member>> {
        let docs = self
            .store
            .find(USUARIOS, &[Filter::Eq("activo", json!(true))])
            .await
            .map_err(store_failure("Error al obtener usuarios activos"))?;
        let mut members: Vec<Member> = decode_all(docs)?;
        members.sort_by_key(|m| m.name.to_lowercase());
        Ok(members)
    }

    /// Insert a new member after the email-uniqueness probe. The email is
    /// stored normalized lowercase.
    pub async fn add(&self, member: &NewMember) -> AppResult<String> {
        let name = member.name.trim();
        let email = member.email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() {
            return Err(AppError::Validation(
                "Nombre y email son requeridos.".to_string(),
            ));
        }
        if !is_valid_email(&email) {
            return Err(AppError::Validation(
                "El formato del email no es válido.".to_string(),
            ));
        }

        let existing = self
            .store
            .find(USUARIOS, &[Filter::Eq("email", json!(email))])
            .await
            .map_err(store_failure("Error al agregar usuario"))?;
        if !existing.is_empty() {
            return Err(AppError::Conflict(
                "Ya existe un usuario con este email.".to_string(),
            ));
        }

        let data = json!({
            "nombre": name,
            "email": email,
            "fechaRegistro": Utc::now(),
            "activo": true,
        });
        self.store
            .insert(USUARIOS, data)
            .await
            .map_err(store_failure("Error al agregar usuario"))
    }

    /// Apply a partial update; string fields empty after trim are rejected
    /// and a changed email is re-checked and normalized
    pub async fn update(&self, id: &str, changes: &MemberUpdate) -> AppResult<()> {
        if id.is_empty() {
            return Err(AppError::Validation("ID es requerido.".to_string()));
        }

        let mut clean = serde_json::Map::new();
        if let Some(ref name) = changes.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation(
                    "El nombre no puede estar vacío.".to_string(),
                ));
            }
            clean.insert("nombre".to_string(), json!(name.trim()));
        }
        if let Some(ref email) = changes.email {
            if !is_valid_email(email.trim()) {
                return Err(AppError::Validation(
                    "El formato del email no es válido.".to_string(),
                ));
            }
            clean.insert("email".to_string(), json!(email.trim().to_lowercase()));
        }

        self.store
            .update(USUARIOS, id, Value::Object(clean))
            .await
            .map_err(store_failure("Error al editar usuario"))
    }

    /// Delete a member, rejecting when dependent active loans exist
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if id.is_empty() {
            return Err(AppError::Validation("ID es requerido.".to_string()));
        }

        let active = self
            .store
            .find(
                PRESTAMOS,
                &[
                    Filter::Eq("usuarioId", json!(id)),
                    Filter::IsNull("fechaDevolucion"),
                ],
            )
            .await
            .map_err(store_failure("Error al eliminar usuario"))?;
        if !active.is_empty() {
            return Err(AppError::Conflict(
                "No se puede eliminar un usuario que tiene préstamos activos.".to_string(),
            ));
        }

        self.store
            .delete(USUARIOS, id)
            .await
            .map_err(store_failure("Error al eliminar usuario"))
    }
}
