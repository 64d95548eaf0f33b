//! Member business-rule service

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{AppError, AppResult},
    models::member::{is_valid_email, Member, MemberUpdate, NewMember},
    repository::Repository,
};

use super::fold_violations;

/// Names take letters (including the Spanish accented forms) and spaces
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-ZáéíóúÁÉÍÓÚñÑüÜ\s]+$").unwrap());

/// Violation list for a member payload; empty means valid
pub fn validate_member(member: &NewMember) -> Vec<String> {
    let mut errors = Vec::new();
    let name = member.name.trim();
    let email = member.email.trim();

    if name.is_empty() {
        errors.push("El nombre es requerido".to_string());
    } else if name.chars().count() < 2 {
        errors.push("El nombre debe tener al menos 2 caracteres".to_string());
    } else if name.chars().count() > 100 {
        errors.push("El nombre no puede exceder 100 caracteres".to_string());
    }

    if email.is_empty() {
        errors.push("El email es requerido".to_string());
    } else if !is_valid_email(email) {
        errors.push("El formato del email no es válido".to_string());
    } else if email.chars().count() > 100 {
        errors.push("El email no puede exceder 100 caracteres".to_string());
    }

    if !name.is_empty() && !NAME_RE.is_match(name) {
        errors.push("El nombre solo puede contener letras y espacios".to_string());
    }

    errors
}

#[derive(Clone)]
pub struct MemberService {
    repository: Repository,
}

impl MemberService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All members, ordered by name
    pub async fn list(&self) -> AppResult<Vec<Member>> {
        self.repository
            .members
            .list()
            .await
            .map_err(|e| e.context("Error al obtener usuarios"))
    }

    /// Validate and register a new member
    pub async fn add(&self, member: &NewMember) -> AppResult<String> {
        let op = "Error al agregar usuario";
        fold_violations(validate_member(member)).map_err(|e| e.context(op))?;
        self.repository
            .members
            .add(member)
            .await
            .map_err(|e| e.context(op))
    }

    /// Validate and apply an edit; both fields are required, as on create
    pub async fn edit(&self, id: &str, member: &NewMember) -> AppResult<()> {
        let op = "Error al editar usuario";
        if id.is_empty() {
            return Err(
                AppError::Validation("ID del usuario es requerido".to_string()).context(op)
            );
        }
        fold_violations(validate_member(member)).map_err(|e| e.context(op))?;

        let changes = MemberUpdate {
            name: Some(member.name.clone()),
            email: Some(member.email.clone()),
        };
        self.repository
            .members
            .update(id, &changes)
            .await
            .map_err(|e| e.context(op))
    }

    /// Delete a member after checking they exist
    pub async fn remove(&self, id: &str) -> AppResult<()> {
        let op = "Error al eliminar usuario";
        if id.is_empty() {
            return Err(
                AppError::Validation("ID del usuario es requerido".to_string()).context(op)
            );
        }

        let members = self
            .repository
            .members
            .list()
            .await
            .map_err(|e| e.context(op))?;
        if !members.iter().any(|m| m.id == id) {
            return Err(AppError::NotFound("El usuario no existe".to_string()).context(op));
        }

        self.repository
            .members
            .delete(id)
            .await
            .map_err(|e| e.context(op))
    }

    /// Members currently flagged active
    pub async fn active(&self) -> AppResult<Vec<Member>> {
        self.repository
            .members
            .list_active()
            .await
            .map_err(|e| e.context("Error al obtener usuarios activos"))
    }

    /// Whether the member holds no active loans and may be deleted
    pub async fn can_delete(&self, id: &str) -> AppResult<bool> {
        let loans = self
            .repository
            .loans
            .active_for_member(id)
            .await
            .map_err(|e| e.context("Error al validar eliminación de usuario"))?;
        Ok(loans.is_empty())
    }

    /// Case-insensitive substring search over name and email
    pub async fn search(&self, term: &str) -> AppResult<Vec<Member>> {
        let members = self
            .repository
            .members
            .list()
            .await
            .map_err(|e| e.context("Error al buscar usuarios"))?;
        let term = term.to_lowercase();
        Ok(members
            .into_iter()
            .filter(|m| {
                m.name.to_lowercase().contains(&term) || m.email.to_lowercase().contains(&term)
            })
            .collect())
    }
}
