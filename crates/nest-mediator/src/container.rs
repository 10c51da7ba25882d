use std::{any::Any, collections::HashMap, fmt, future::Future, sync::Arc};

use futures::future::BoxFuture;
use tracing::trace;
use uuid::Uuid;

use crate::message::TypeToken;

type Factory =
    Arc<dyn Fn(Scope) -> BoxFuture<'static, anyhow::Result<Box<dyn Any + Send>>> + Send + Sync>;

type CloneFn = fn(&(dyn Any + Send + Sync)) -> Option<Box<dyn Any + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no binding registered for {token}")]
    NotBound { token: &'static str },

    #[error("failed to construct {token}")]
    Factory {
        token: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("binding for {token} produced a value of another type")]
    TypeMismatch { token: &'static str },
}

enum Binding {
    Singleton {
        value: Box<dyn Any + Send + Sync>,
        clone: CloneFn,
    },
    Transient(Factory),
}

fn clone_value<T: Clone + Send + Sync + 'static>(
    value: &(dyn Any + Send + Sync),
) -> Option<Box<dyn Any + Send>> {
    value
        .downcast_ref::<T>()
        .map(|value| Box::new(value.clone()) as Box<dyn Any + Send>)
}

/// Dependency bindings, keyed by type.
///
/// Singletons are shared by the whole process and handed out by clone, so
/// they are usually `Arc`s. Transient factories run on every resolve: no
/// instance they build is ever shared between two dispatches.
#[derive(Default)]
pub struct Container {
    bindings: HashMap<TypeToken, Binding>,
}

impl Container {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton<T>(&mut self, value: T) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.bindings.insert(
            TypeToken::of::<T>(),
            Binding::Singleton {
                value: Box::new(value),
                clone: clone_value::<T>,
            },
        );
        self
    }

    pub fn transient<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: Send + 'static,
        F: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let erased: Factory = Arc::new(
            move |scope| -> BoxFuture<'static, anyhow::Result<Box<dyn Any + Send>>> {
                let built = factory(scope);
                Box::pin(async move {
                    let value = built.await?;
                    Ok(Box::new(value) as Box<dyn Any + Send>)
                })
            },
        );
        self.bindings
            .insert(TypeToken::of::<T>(), Binding::Transient(erased));
        self
    }

    #[must_use]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.bindings.contains_key(&TypeToken::of::<T>())
    }

    /// Opens a resolution scope. The dispatcher opens one per request.
    #[must_use]
    pub fn scope(self: &Arc<Self>) -> Scope {
        Scope {
            id: Uuid::new_v4(),
            container: Arc::clone(self),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Resolution scope of one dispatch.
#[derive(Clone)]
pub struct Scope {
    id: Uuid,
    container: Arc<Container>,
}

impl Scope {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn resolve<T: Send + 'static>(&self) -> Result<T, ResolveError> {
        let token = TypeToken::of::<T>();
        self.resolve_token(&token)
            .await?
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| ResolveError::TypeMismatch {
                token: token.name(),
            })
    }

    pub async fn resolve_token(&self, token: &TypeToken) -> Result<Box<dyn Any + Send>, ResolveError> {
        let factory = match self.container.bindings.get(token) {
            None => {
                return Err(ResolveError::NotBound {
                    token: token.name(),
                });
            }
            Some(Binding::Singleton { value, clone }) => {
                return clone(&**value).ok_or(ResolveError::TypeMismatch {
                    token: token.name(),
                });
            }
            Some(Binding::Transient(factory)) => Arc::clone(factory),
        };

        trace!(scope_id = %self.id, %token, "constructing transient");
        factory(self.clone())
            .await
            .map_err(|source| ResolveError::Factory {
                token: token.name(),
                source,
            })
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug)]
    struct Session {
        serial: usize,
    }

    #[derive(Debug)]
    struct Repository {
        session: Session,
    }

    fn container_with_counter() -> (Arc<Container>, Arc<AtomicUsize>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut container = Container::new();
        container.singleton(Arc::clone(&counter));
        container.transient(|scope: Scope| async move {
            let counter = scope.resolve::<Arc<AtomicUsize>>().await?;
            anyhow::Ok(Session {
                serial: counter.fetch_add(1, Ordering::SeqCst),
            })
        });
        container.transient(|scope: Scope| async move {
            anyhow::Ok(Repository {
                session: scope.resolve::<Session>().await?,
            })
        });
        (Arc::new(container), counter)
    }

    #[tokio::test]
    async fn test_transient_is_built_on_every_resolve() {
        let (container, counter) = container_with_counter();
        let first = container.scope().resolve::<Session>().await.unwrap();
        let second = container.scope().resolve::<Session>().await.unwrap();

        assert_eq!(first.serial, 0);
        assert_eq!(second.serial, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transient_resolves_nested_dependencies() {
        let (container, _) = container_with_counter();
        let repository = container.scope().resolve::<Repository>().await.unwrap();
        assert_eq!(repository.session.serial, 0);
    }

    #[tokio::test]
    async fn test_singleton_is_shared() {
        let (container, counter) = container_with_counter();
        let resolved = container
            .scope()
            .resolve::<Arc<AtomicUsize>>()
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&resolved, &counter));
    }

    #[tokio::test]
    async fn test_unbound_type_fails() {
        let container = Arc::new(Container::new());
        let err = container.scope().resolve::<Session>().await.unwrap_err();
        assert!(matches!(err, ResolveError::NotBound { token: "Session" }));
    }

    #[tokio::test]
    async fn test_factory_error_names_the_type() {
        let mut container = Container::new();
        container.transient(|_scope: Scope| async move {
            Err::<Session, _>(anyhow::anyhow!("database unreachable"))
        });
        let container = Arc::new(container);

        let err = container.scope().resolve::<Session>().await.unwrap_err();
        assert_eq!(err.to_string(), "failed to construct Session");
    }

    #[test]
    fn test_scopes_have_distinct_ids() {
        let container = Arc::new(Container::new());
        assert_ne!(container.scope().id(), container.scope().id());
    }
}
