use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use models::categoria;

use crate::errors::ServiceError;
use crate::repository::CategoriaRepository;

/// Shared category labels.
#[derive(Clone)]
pub struct CategoriaService {
    repo: Arc<dyn CategoriaRepository>,
}

impl CategoriaService {
    pub fn new(repo: Arc<dyn CategoriaRepository>) -> Self { Self { repo } }

    pub async fn list(&self) -> Result<Vec<categoria::Model>, ServiceError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: i32) -> Result<categoria::Model, ServiceError> {
        self.repo.find_by_id(id).await?.ok_or_else(|| ServiceError::not_found("categoria"))
    }

    pub async fn find_by_name(&self, nome: &str) -> Result<Option<categoria::Model>, ServiceError> {
        if nome.trim().is_empty() {
            return Ok(None);
        }
        self.repo.find_by_nome_ci(nome).await
    }

    /// Existing category matching `nome` (trimmed, case-insensitive) or a new one.
    ///
    /// # Examples
    /// ```
    /// use service::categoria::CategoriaService;
    /// use service::repo::memory::InMemoryRepository;
    /// use std::sync::Arc;
    /// let svc = CategoriaService::new(Arc::new(InMemoryRepository::default()));
    /// let a = tokio_test::block_on(svc.resolve_or_create("Lazer")).unwrap();
    /// let b = tokio_test::block_on(svc.resolve_or_create("  lazer ")).unwrap();
    /// assert_eq!(a.id, b.id);
    /// ```
    pub async fn resolve_or_create(&self, nome: &str) -> Result<categoria::Model, ServiceError> {
        if let Some(found) = self.find_by_name(nome).await? {
            return Ok(found);
        }
        categoria::validate(nome)?;
        match self.repo.insert(nome).await {
            Ok(created) => {
                info!(categoria_id = created.id, nome = %created.nome, "categoria_created");
                Ok(created)
            }
            // lost a race with a concurrent insert of the same name
            Err(ServiceError::Conflict(_)) => self
                .repo
                .find_by_nome_ci(nome)
                .await?
                .ok_or_else(|| ServiceError::Conflict(format!("categoria '{}' could not be created", nome.trim()))),
            Err(e) => Err(e),
        }
    }

    /// The fallback "Outros" category, created on first use.
    pub async fn outros(&self) -> Result<categoria::Model, ServiceError> {
        self.resolve_or_create(categoria::OUTROS).await
    }

    /// Resolve every distinct name once; keys are [`categoria::name_key`] values.
    /// Empty names map to "Outros".
    pub async fn resolve_names<S: AsRef<str> + Sync>(&self, names: &[S]) -> Result<HashMap<String, i32>, ServiceError> {
        let mut resolved = HashMap::new();
        for nome in names {
            let nome = nome.as_ref();
            let key = categoria::name_key(nome);
            if resolved.contains_key(&key) {
                continue;
            }
            let cat = if key.is_empty() { self.outros().await? } else { self.resolve_or_create(nome).await? };
            debug!(key = %key, categoria_id = cat.id, "categoria resolved");
            resolved.insert(key, cat.id);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::memory::InMemoryRepository;

    #[tokio::test]
    async fn outros_is_created_once() {
        let svc = CategoriaService::new(Arc::new(InMemoryRepository::default()));
        let a = svc.outros().await.unwrap();
        let b = svc.outros().await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.nome, "Outros");
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resolve_names_dedups_and_defaults() {
        let svc = CategoriaService::new(Arc::new(InMemoryRepository::default()));
        let map = svc.resolve_names(&["Mercado", "mercado ", "", "Lazer"]).await.unwrap();
        assert_eq!(map.len(), 3);
        let outros = svc.find_by_name("OUTROS").await.unwrap().unwrap();
        assert_eq!(map[""], outros.id);
        assert_eq!(svc.list().await.unwrap().iter().map(|c| c.nome.as_str()).collect::<Vec<_>>(), ["Lazer", "Mercado", "Outros"]);
    }

    #[tokio::test]
    async fn accented_case_variants_share_one_row() {
        let repo = Arc::new(InMemoryRepository::default());
        let svc = CategoriaService::new(repo.clone());
        let a = svc.resolve_or_create("ALIMENTAÇÃO").await.unwrap();
        let b = svc.resolve_or_create("alimentação").await.unwrap();
        assert_eq!(a.id, b.id);
        assert!(matches!(repo.insert("Alimentação").await, Err(ServiceError::Conflict(_))));
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_lookup_is_none() {
        let svc = CategoriaService::new(Arc::new(InMemoryRepository::default()));
        assert!(svc.find_by_name("   ").await.unwrap().is_none());
        assert!(matches!(svc.get(42).await, Err(ServiceError::NotFound(_))));
    }
}
