// crates/backendify-core/src/core/cache.rs
// ============================================================================
// Module: Backendify Cache Dependencies
// Description: Cache keys, cache tags, and the mutation invalidation table.
// Purpose: Make "which cached views does this mutation stale" an explicit table.
// Dependencies: crate::core::identifiers
// ============================================================================

//! ## Overview
//! Cached query results are keyed by [`CacheKey`]: the project scope, a
//! [`CacheTag`] naming the entity kind and its parent scope, and a variant
//! string distinguishing queries under the same tag (for example two record
//! pages). Invalidation works on whole tags. [`MutationKind::invalidations`] is
//! the single source of truth for which tags a successful mutation stales.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use crate::core::identifiers::CollectionId;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::WebhookId;

// ============================================================================
// SECTION: Cache Tags
// ============================================================================

/// Entity kind plus parent scope of a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheTag {
    /// Collection list.
    Collections,
    /// Field list of a collection, keyed by collection name.
    Fields(String),
    /// Record pages of a collection, keyed by collection name.
    Records(String),
    /// Outgoing relation fields of a collection.
    Relations(CollectionId),
    /// Incoming relation edges of a collection.
    ReverseRelations(CollectionId),
    /// Advertised relation options.
    RelationOptions,
    /// Webhook list.
    Webhooks,
    /// Delivery log of a webhook.
    WebhookDeliveries(WebhookId),
    /// Validation rules of a collection's fields, keyed by collection name.
    Rules(String),
    /// Advertised validation rule types.
    RuleTypes,
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collections => f.write_str("collections"),
            Self::Fields(name) => write!(f, "fields:{name}"),
            Self::Records(name) => write!(f, "records:{name}"),
            Self::Relations(id) => write!(f, "relations:{id}"),
            Self::ReverseRelations(id) => write!(f, "reverse_relations:{id}"),
            Self::RelationOptions => f.write_str("relation_options"),
            Self::Webhooks => f.write_str("webhooks"),
            Self::WebhookDeliveries(id) => write!(f, "webhook_deliveries:{id}"),
            Self::Rules(name) => write!(f, "rules:{name}"),
            Self::RuleTypes => f.write_str("rule_types"),
        }
    }
}

/// Full cache key for one query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// Project scope.
    pub project: ProjectId,
    /// Entity kind and parent scope.
    pub tag: CacheTag,
    /// Query variant under the tag (empty for unparameterized lists).
    pub variant: String,
}

impl CacheKey {
    /// Builds a key for an unparameterized query.
    #[must_use]
    pub fn new(project: ProjectId, tag: CacheTag) -> Self {
        Self {
            project,
            tag,
            variant: String::new(),
        }
    }

    /// Builds a key for a parameterized query.
    #[must_use]
    pub fn with_variant(project: ProjectId, tag: CacheTag, variant: impl Into<String>) -> Self {
        Self {
            project,
            tag,
            variant: variant.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variant.is_empty() {
            write!(f, "{}/{}", self.project, self.tag)
        } else {
            write!(f, "{}/{}?{}", self.project, self.tag, self.variant)
        }
    }
}

// ============================================================================
// SECTION: Mutations
// ============================================================================

/// Successful mutation kinds and the scope they touched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Record created in a collection.
    CreateRecord {
        /// Collection name.
        collection: String,
    },
    /// Record updated in a collection.
    UpdateRecord {
        /// Collection name.
        collection: String,
    },
    /// Record deleted from a collection.
    DeleteRecord {
        /// Collection name.
        collection: String,
        /// Collections whose rows the service rewrites or removes with it
        /// (SET NULL and CASCADE sources, transitively).
        dependents: Vec<String>,
    },
    /// Collection created.
    CreateCollection,
    /// Scalar field added to a collection.
    CreateField {
        /// Collection name.
        collection: String,
    },
    /// Relation field added to a collection.
    CreateRelationField {
        /// Owning collection id.
        owner: CollectionId,
        /// Owning collection name.
        collection: String,
        /// Target collection id.
        target: CollectionId,
    },
    /// Webhook created.
    CreateWebhook,
    /// Webhook deleted.
    DeleteWebhook {
        /// Webhook id.
        webhook: WebhookId,
    },
    /// Validation rule attached to a field.
    CreateRule {
        /// Collection name.
        collection: String,
    },
    /// Validation rule changed.
    UpdateRule {
        /// Collection name.
        collection: String,
    },
    /// Validation rule removed.
    DeleteRule {
        /// Collection name.
        collection: String,
    },
}

impl MutationKind {
    /// Returns the cache tags a successful mutation of this kind invalidates.
    ///
    /// # Invariants
    /// - Record mutations touch only the record tag of their collection.
    /// - Deletes also stale the record tags of their dependent collections.
    /// - Rule mutations touch only the rule tag; stored records are unchanged.
    /// - Schema mutations also stale records, since the record shape changed.
    #[must_use]
    pub fn invalidations(&self) -> Vec<CacheTag> {
        match self {
            Self::CreateRecord {
                collection,
            }
            | Self::UpdateRecord {
                collection,
            } => vec![CacheTag::Records(collection.clone())],
            Self::DeleteRecord {
                collection,
                dependents,
            } => {
                let mut tags = vec![CacheTag::Records(collection.clone())];
                for dependent in dependents {
                    let tag = CacheTag::Records(dependent.clone());
                    if !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
                tags
            }
            Self::CreateCollection => vec![CacheTag::Collections],
            Self::CreateField {
                collection,
            } => vec![CacheTag::Fields(collection.clone()), CacheTag::Records(collection.clone())],
            Self::CreateRelationField {
                owner,
                collection,
                target,
            } => vec![
                CacheTag::Fields(collection.clone()),
                CacheTag::Relations(owner.clone()),
                CacheTag::ReverseRelations(target.clone()),
                CacheTag::Records(collection.clone()),
            ],
            Self::CreateWebhook => vec![CacheTag::Webhooks],
            Self::DeleteWebhook {
                webhook,
            } => vec![CacheTag::Webhooks, CacheTag::WebhookDeliveries(webhook.clone())],
            Self::CreateRule {
                collection,
            }
            | Self::UpdateRule {
                collection,
            }
            | Self::DeleteRule {
                collection,
            } => vec![CacheTag::Rules(collection.clone())],
        }
    }

    /// Returns a stable label for telemetry.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CreateRecord {
                ..
            } => "create_record",
            Self::UpdateRecord {
                ..
            } => "update_record",
            Self::DeleteRecord {
                ..
            } => "delete_record",
            Self::CreateCollection => "create_collection",
            Self::CreateField {
                ..
            } => "create_field",
            Self::CreateRelationField {
                ..
            } => "create_relation_field",
            Self::CreateWebhook => "create_webhook",
            Self::DeleteWebhook {
                ..
            } => "delete_webhook",
            Self::CreateRule {
                ..
            } => "create_rule",
            Self::UpdateRule {
                ..
            } => "update_rule",
            Self::DeleteRule {
                ..
            } => "delete_rule",
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::CacheKey;
    use super::CacheTag;
    use super::MutationKind;
    use crate::core::identifiers::CollectionId;
    use crate::core::identifiers::ProjectId;
    use crate::core::identifiers::WebhookId;

    #[test]
    fn record_mutations_touch_only_their_collection() {
        for kind in [
            MutationKind::CreateRecord {
                collection: "posts".to_string(),
            },
            MutationKind::UpdateRecord {
                collection: "posts".to_string(),
            },
            MutationKind::DeleteRecord {
                collection: "posts".to_string(),
                dependents: Vec::new(),
            },
        ] {
            assert_eq!(kind.invalidations(), vec![CacheTag::Records("posts".to_string())]);
        }
    }

    #[test]
    fn delete_stales_dependent_collections_once() {
        let kind = MutationKind::DeleteRecord {
            collection: "categories".to_string(),
            dependents: vec!["posts".to_string(), "comments".to_string(), "posts".to_string()],
        };
        assert_eq!(
            kind.invalidations(),
            vec![
                CacheTag::Records("categories".to_string()),
                CacheTag::Records("posts".to_string()),
                CacheTag::Records("comments".to_string()),
            ]
        );
        assert_eq!(kind.label(), "delete_record");
    }

    #[test]
    fn relation_field_creation_stales_both_ends() {
        let kind = MutationKind::CreateRelationField {
            owner: CollectionId::new("c_posts"),
            collection: "posts".to_string(),
            target: CollectionId::new("c_categories"),
        };
        let tags = kind.invalidations();
        assert!(tags.contains(&CacheTag::Fields("posts".to_string())));
        assert!(tags.contains(&CacheTag::Relations(CollectionId::new("c_posts"))));
        assert!(tags.contains(&CacheTag::ReverseRelations(CollectionId::new("c_categories"))));
        assert!(tags.contains(&CacheTag::Records("posts".to_string())));
        assert!(!tags.contains(&CacheTag::Collections));
    }

    #[test]
    fn webhook_deletion_stales_its_delivery_log() {
        let kind = MutationKind::DeleteWebhook {
            webhook: WebhookId::new("wh_1"),
        };
        assert_eq!(
            kind.invalidations(),
            vec![CacheTag::Webhooks, CacheTag::WebhookDeliveries(WebhookId::new("wh_1"))]
        );
        assert_eq!(MutationKind::CreateCollection.invalidations(), vec![CacheTag::Collections]);
    }

    #[test]
    fn rule_changes_stale_only_rules_of_their_collection() {
        let kind = MutationKind::UpdateRule {
            collection: "posts".to_string(),
        };
        assert_eq!(kind.invalidations(), vec![CacheTag::Rules("posts".to_string())]);
        assert_eq!(kind.label(), "update_rule");
        assert_eq!(CacheTag::Rules("posts".to_string()).to_string(), "rules:posts");
    }

    #[test]
    fn cache_keys_render_scope_and_variant() {
        let plain = CacheKey::new(ProjectId::new("p1"), CacheTag::Collections);
        assert_eq!(plain.to_string(), "p1/collections");
        let paged = CacheKey::with_variant(
            ProjectId::new("p1"),
            CacheTag::Records("posts".to_string()),
            "limit=50&offset=0",
        );
        assert_eq!(paged.to_string(), "p1/records:posts?limit=50&offset=0");
    }
}
