//! Schema Context Resolver
//!
//! Batch resolution of the remote schema catalog. Each entity independently
//! validates its connection, fetches or stitches its introspection, and
//! attaches role-scoped permission views — all under the build cache, so an
//! entity whose invalidation token and role set are unchanged skips
//! everything, including the network round-trip.
//!
//! Entity failures never abort the batch; they are recorded as
//! inconsistencies and the entity is left out of the success map. The one
//! exception is a role ordering violation, which is a caller bug and fails
//! the whole batch.

use crate::cache::{Fingerprint, MemoCache};
use crate::config::Settings;
use crate::definition::{ConnectionDef, InvalidationKeys, RemoteSchemaDef, StoredIntrospection};
use crate::endpoint::{validate, RemoteSchemaInfo, ValidatedEndpoint};
use crate::error::MetadataError;
use crate::fetch::{stitch, RemoteFetcher};
use crate::introspection::{IntrospectionResult, RawIntrospectionPayload};
use crate::permissions::resolve_role_permissions;
use crate::resolve::context::{PartiallyResolvedRelationship, RemoteSchemaContext};
use crate::resolve::recorder::{DependencyEdge, DependencyKey, Inconsistency, MetadataObjectId, ResolveLog};
use crate::roles::OrderedRoles;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Result of resolving the whole catalog
#[derive(Debug, Default)]
pub struct ResolvedCatalog {
    /// Successfully resolved contexts, keyed by schema name
    pub schemas: HashMap<String, RemoteSchemaContext>,
    /// Entities that failed to resolve, and why
    pub inconsistencies: Vec<Inconsistency>,
    /// Edges for the cache substrate's future invalidation decisions
    pub dependencies: Vec<DependencyEdge>,
}

/// Outcome of one entity's resolution, cached as a unit so a cache hit
/// re-emits the same inconsistencies and dependency edges
#[derive(Debug, Clone)]
struct EntityOutcome {
    context: Option<RemoteSchemaContext>,
    log: ResolveLog,
}

/// Resolves remote schema catalogs against a fetcher boundary
pub struct SchemaResolver<F: RemoteFetcher> {
    fetcher: Arc<F>,
    cache: Arc<MemoCache<EntityOutcome>>,
    settings: Settings,
}

impl<F: RemoteFetcher + 'static> SchemaResolver<F> {
    pub fn new(fetcher: F, settings: Settings) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            cache: Arc::new(MemoCache::new()),
            settings,
        }
    }

    /// Resolve the whole catalog
    ///
    /// Returns the success map plus the merged side logs. The only hard
    /// failure is a role ordering violation; everything else degrades to a
    /// recorded inconsistency.
    pub async fn resolve_remote_schemas(
        &self,
        invalidation_keys: &InvalidationKeys,
        ordered_roles: &OrderedRoles,
        stored_introspection: &StoredIntrospection,
        definitions: &[RemoteSchemaDef],
    ) -> Result<ResolvedCatalog, MetadataError> {
        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            entities = definitions.len(),
            roles = ordered_roles.len(),
            "resolving remote schema catalog"
        );

        let roles = Arc::new(ordered_roles.clone());
        let stored = Arc::new(stored_introspection.clone());
        let semaphore = Arc::new(Semaphore::new(
            self.settings.resolver.max_concurrent_resolutions,
        ));

        let mut tasks: JoinSet<Result<(String, EntityOutcome), MetadataError>> = JoinSet::new();
        for def in definitions.iter().cloned() {
            let fetcher = Arc::clone(&self.fetcher);
            let cache = Arc::clone(&self.cache);
            let roles = Arc::clone(&roles);
            let stored = Arc::clone(&stored);
            let semaphore = Arc::clone(&semaphore);
            let settings = self.settings.clone();
            let fingerprint = entity_fingerprint(&def.name, invalidation_keys, ordered_roles);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| MetadataError::Config("resolver semaphore closed".to_string()))?;
                let name = def.name.clone();
                let outcome = cache
                    .get_or_compute(&name, fingerprint, || {
                        resolve_entity(fetcher, settings, roles, stored, def)
                    })
                    .await?;
                Ok((name, outcome))
            });
        }

        let mut catalog = ResolvedCatalog::default();
        let mut log = ResolveLog::new();
        while let Some(joined) = tasks.join_next().await {
            let (name, outcome) = joined
                .map_err(|e| MetadataError::Config(format!("resolution task failed: {}", e)))??;
            log.merge(outcome.log);
            if let Some(context) = outcome.context {
                catalog.schemas.insert(name, context);
            }
        }

        let (inconsistencies, dependencies) = log.into_parts();
        info!(
            %run_id,
            resolved = catalog.schemas.len(),
            inconsistent = inconsistencies.len(),
            "remote schema catalog resolved"
        );
        catalog.inconsistencies = inconsistencies;
        catalog.dependencies = dependencies;
        Ok(catalog)
    }

    /// Non-cached, non-batched single-entity setup path
    ///
    /// Used outside the incremental pipeline, e.g. when an operator
    /// registers a new remote schema interactively and wants immediate
    /// validation.
    pub async fn add_remote_schema(
        &self,
        definition: &ConnectionDef,
    ) -> Result<(IntrospectionResult, RawIntrospectionPayload, RemoteSchemaInfo), MetadataError>
    {
        let endpoint = validate(definition, &self.settings.fetch)?;
        let (introspection, raw) = self.fetcher.introspect(&endpoint).await?;
        Ok((introspection, raw, RemoteSchemaInfo::from(&endpoint)))
    }

    /// Drop the cached outcome for one entity
    pub async fn evict(&self, name: &str) {
        self.cache.invalidate(name).await;
    }
}

/// Cache fingerprint for one entity: its invalidation token plus the role
/// set. An entity with no token gets a fresh one each run and is always
/// recomputed.
fn entity_fingerprint(
    name: &str,
    invalidation_keys: &InvalidationKeys,
    ordered_roles: &OrderedRoles,
) -> Fingerprint {
    let token = match invalidation_keys.get(name) {
        Some(token) => token.to_string(),
        None => Uuid::new_v4().to_string(),
    };
    let role_bytes = ordered_roles.fingerprint_bytes();
    Fingerprint::digest([name.as_bytes(), token.as_bytes(), role_bytes.as_slice()])
}

/// Resolve one entity into its cached outcome
async fn resolve_entity<F: RemoteFetcher>(
    fetcher: Arc<F>,
    settings: Settings,
    roles: Arc<OrderedRoles>,
    stored: Arc<StoredIntrospection>,
    def: RemoteSchemaDef,
) -> Result<EntityOutcome, MetadataError> {
    let mut log = ResolveLog::new();
    let object = MetadataObjectId::RemoteSchema {
        name: def.name.clone(),
    };

    // future invalidation-key changes must recompute this entity
    log.register_dependency(
        object.clone(),
        DependencyKey::InvalidationKey {
            schema: def.name.clone(),
        },
    );

    let built =
        build_schema_parts(fetcher.as_ref(), &settings, stored.get(&def.name), &def).await;
    let Some((introspection, raw, info)) = log.try_record(object, built) else {
        return Ok(EntityOutcome { context: None, log });
    };

    // a role ordering violation here is fatal and propagates
    let permissions =
        resolve_role_permissions(&def.name, &introspection, &roles, &def.permissions, &mut log)?;

    let relationships = def
        .relationships
        .iter()
        .map(PartiallyResolvedRelationship::from)
        .collect();

    debug!(schema = %def.name, "assembled remote schema context");
    Ok(EntityOutcome {
        context: Some(RemoteSchemaContext {
            name: def.name,
            introspection,
            info,
            raw,
            permissions,
            relationships,
        }),
        log,
    })
}

/// Validate, then fetch fresh introspection or stitch the stored payload
async fn build_schema_parts<F: RemoteFetcher + ?Sized>(
    fetcher: &F,
    settings: &Settings,
    stored: Option<&RawIntrospectionPayload>,
    def: &RemoteSchemaDef,
) -> Result<(IntrospectionResult, RawIntrospectionPayload, RemoteSchemaInfo), MetadataError> {
    let endpoint: ValidatedEndpoint = validate(&def.definition, &settings.fetch)?;

    match stored {
        Some(raw) => {
            debug!(schema = %def.name, "stitching stored introspection");
            let (introspection, info) = stitch(raw, &endpoint)?;
            Ok((introspection, raw.clone(), info))
        }
        None => {
            debug!(schema = %def.name, url = %endpoint.url, "fetching fresh introspection");
            let (introspection, raw) = fetcher.introspect(&endpoint).await?;
            let info = RemoteSchemaInfo::from(&endpoint);
            Ok((introspection, raw, info))
        }
    }
}
