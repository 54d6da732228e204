//! Pre-populated usage event templates.
//!
//! Each non-custom kind produces a representative event for its domain so
//! the operator only has to adjust the handful of fields that differ. The
//! custom kind is a neutral skeleton meant to be filled in via the editor.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Duration, Utc};

use crate::event::{Meter, UsageData, UsageEvent};
use crate::ids::IdGenerator;
use crate::node::{EditError, EditOp, FieldPath};

/// The recognized usage event templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// VM / compute runtime usage.
    BasicCompute,
    /// AI chat completion usage.
    AiChat,
    /// Blob storage usage.
    Storage,
    /// Metered SaaS API calls.
    SaasApi,
    /// SaaS batch processing credits.
    SaasBatch,
    /// Neutral skeleton for arbitrary usage.
    Custom,
}

impl TemplateKind {
    /// All template kinds, in menu order.
    pub const ALL: [Self; 6] = [
        Self::BasicCompute,
        Self::AiChat,
        Self::Storage,
        Self::SaasApi,
        Self::SaasBatch,
        Self::Custom,
    ];

    /// Stable identifier used on the command line and in config.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BasicCompute => "basic-compute",
            Self::AiChat => "ai-chat",
            Self::Storage => "storage",
            Self::SaasApi => "saas-api",
            Self::SaasBatch => "saas-batch",
            Self::Custom => "custom",
        }
    }

    /// Human-readable menu label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::BasicCompute => "Basic Compute Usage",
            Self::AiChat => "AI Chat Completion Usage",
            Self::Storage => "Storage Usage",
            Self::SaasApi => "SaaS API Usage",
            Self::SaasBatch => "SaaS Batch Processing",
            Self::Custom => "Custom Usage Event",
        }
    }
}

impl FromStr for TemplateKind {
    type Err = UnknownTemplate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownTemplate {
                name: s.to_string(),
            })
    }
}

/// A template name did not match any known kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown template: {name:?}")]
pub struct UnknownTemplate {
    /// The rejected name.
    pub name: String,
}

/// Build a template event and apply field overrides.
///
/// `overrides` are `(path, raw value)` pairs applied through the same
/// mutation primitive the editor uses, after template population.
///
/// # Errors
///
/// Returns an [`EditError`] when an override path does not resolve or its
/// value does not coerce.
pub fn new_template(
    kind: TemplateKind,
    provider: &str,
    ids: &dyn IdGenerator,
    overrides: &[(FieldPath, String)],
) -> Result<UsageEvent, EditError> {
    let mut event = build(kind, provider, ids);
    for (path, raw) in overrides {
        event.apply(&EditOp::Set {
            path: path.clone(),
            raw: raw.clone(),
        })?;
    }
    Ok(event)
}

fn build(kind: TemplateKind, provider: &str, ids: &dyn IdGenerator) -> UsageEvent {
    let source = format!("{provider}/usage");
    let data = match kind {
        TemplateKind::BasicCompute => UsageData {
            id: format!("usage-{}", ids.next_id()),
            service: "compute".into(),
            operation: "vm.runtime".into(),
            resource_id:
                "/subscriptions/abc123/resourceGroups/rg1/providers/Microsoft.Compute/virtualMachines/vm1"
                    .into(),
            meters: vec![Meter::new("compute.hours", 1.0, "hours")],
            dimensions: pairs(&[
                ("region", "eastus"),
                ("vmSize", "Standard_D2s_v3"),
                ("environment", "production"),
            ]),
            tags: pairs(&[("team", "engineering"), ("cost-center", "product")]),
            tenant_id: None,
            user_id: None,
            project_id: None,
            ..window(Duration::hours(1))
        },
        TemplateKind::AiChat => UsageData {
            id: format!("usage-ai-{}", ids.next_id()),
            service: "ai.chat".into(),
            operation: "chat.completion".into(),
            resource_id: "/ai/models/gpt-4".into(),
            meters: vec![
                Meter::new("chat.input_tokens", 1500.0, "tokens"),
                Meter::new("chat.output_tokens", 750.0, "tokens"),
                Meter::new("chat.requests", 1.0, "requests"),
            ],
            dimensions: pairs(&[
                ("model", "gpt-4"),
                ("temperature", "0.7"),
                ("max_tokens", "2000"),
            ]),
            tags: pairs(&[
                ("project", "customer-support-bot"),
                ("environment", "production"),
            ]),
            tenant_id: Some("org/acme".into()),
            user_id: Some("user:42".into()),
            project_id: Some("project/alpha".into()),
            ..window(Duration::seconds(10))
        },
        TemplateKind::Storage => UsageData {
            id: format!("usage-storage-{}", ids.next_id()),
            service: "storage".into(),
            operation: "storage.blob.write".into(),
            resource_id:
                "/subscriptions/abc123/resourceGroups/rg1/providers/Microsoft.Storage/storageAccounts/sa1"
                    .into(),
            meters: vec![
                Meter::new("storage.capacity", 100.5, "GB"),
                Meter::new("storage.operations", 1000.0, "operations"),
            ],
            dimensions: pairs(&[
                ("region", "westus"),
                ("tier", "standard"),
                ("redundancy", "LRS"),
            ]),
            tags: pairs(&[
                ("department", "data-analytics"),
                ("cost-center", "engineering"),
            ]),
            tenant_id: Some("org/contoso".into()),
            user_id: None,
            project_id: Some("project/data-pipeline".into()),
            ..window(Duration::hours(1))
        },
        TemplateKind::SaasApi => UsageData {
            id: format!("usage-api-{}", ids.next_id()),
            service: "api".into(),
            operation: "api.request".into(),
            resource_id: "/api/v1/analytics/report".into(),
            meters: vec![
                Meter::new("api.requests", 1.0, "requests"),
                Meter::new("api.data_transfer", 2.5, "MB"),
            ],
            dimensions: pairs(&[
                ("endpoint", "/api/v1/analytics/report"),
                ("method", "POST"),
                ("status_code", "200"),
                ("client_id", "client-xyz"),
            ]),
            tags: pairs(&[("api_version", "v1"), ("environment", "production")]),
            tenant_id: Some("org/saascompany".into()),
            user_id: Some("user:123".into()),
            project_id: None,
            ..window(Duration::seconds(1))
        },
        TemplateKind::SaasBatch => UsageData {
            id: ids.next_id(),
            service: "saas.ai".into(),
            operation: "batch.process".into(),
            resource_id: "saas.ai:user-001".into(),
            meters: vec![
                Meter::new("saas.ai.primary", 3.0, "credits"),
                Meter::new("saas.ai.requests", 2.0, "count"),
            ],
            dimensions: pairs(&[("region", "westus2"), ("tier", "pro")]),
            tags: pairs(&[("env", "prod"), ("team", "research")]),
            tenant_id: Some("tenant-001".into()),
            user_id: Some("user-001".into()),
            project_id: None,
            ..window(Duration::minutes(1))
        },
        TemplateKind::Custom => UsageData {
            id: format!("usage-{}", ids.next_id()),
            service: "custom".into(),
            operation: "custom.operation".into(),
            resource_id: "custom:resource".into(),
            meters: vec![Meter::new("custom.meter", 1.0, "units")],
            dimensions: None,
            tags: None,
            tenant_id: None,
            user_id: None,
            project_id: None,
            ..window(Duration::hours(1))
        },
    };
    UsageEvent::new(ids.next_id(), source, data)
}

/// Empty payload with just the usage window set, used as struct-update base.
fn window(length: Duration) -> UsageData {
    let end = Utc::now();
    UsageData {
        id: String::new(),
        service: String::new(),
        operation: String::new(),
        resource_id: String::new(),
        usage_start: end - length,
        usage_end: end,
        meters: Vec::new(),
        dimensions: None,
        tags: None,
        tenant_id: None,
        user_id: None,
        project_id: None,
    }
}

fn pairs(entries: &[(&str, &str)]) -> Option<BTreeMap<String, String>> {
    Some(
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequenceIds;
    use crate::validate::validate;

    #[test]
    fn every_template_kind_validates_cleanly() {
        let ids = SequenceIds::new("id");
        for kind in TemplateKind::ALL {
            let event = new_template(kind, "AgenticBilling.AI", &ids, &[]).unwrap();
            let errors = validate(&event);
            assert!(errors.is_empty(), "{kind:?}: {errors:?}");
        }
    }

    #[test]
    fn template_windows_are_ordered() {
        let ids = SequenceIds::new("id");
        for kind in TemplateKind::ALL {
            let event = new_template(kind, "AgenticBilling.AI", &ids, &[]).unwrap();
            assert!(event.data.usage_start <= event.data.usage_end, "{kind:?}");
        }
    }

    #[test]
    fn ai_chat_template_matches_domain() {
        let ids = SequenceIds::new("id");
        let event = new_template(TemplateKind::AiChat, "AgenticBilling.AI", &ids, &[]).unwrap();
        assert_eq!(event.data.service, "ai.chat");
        assert_eq!(event.data.meters[0].meter_id, "chat.input_tokens");
        assert_eq!(event.data.meters[0].unit, "tokens");
        assert_eq!(event.data.tenant_id.as_deref(), Some("org/acme"));
        assert_eq!(event.source, "AgenticBilling.AI/usage");
    }

    #[test]
    fn ids_come_from_the_injected_generator() {
        let ids = SequenceIds::new("seq");
        let event = new_template(TemplateKind::BasicCompute, "p", &ids, &[]).unwrap();
        assert_eq!(event.data.id, "usage-seq-0");
        assert_eq!(event.id, "seq-1");
    }

    #[test]
    fn overrides_apply_after_population() {
        let ids = SequenceIds::new("id");
        let overrides = vec![
            ("data.tenantId".parse().unwrap(), "org/other".to_string()),
            ("data.meters[0].quantity".parse().unwrap(), "9000".to_string()),
        ];
        let event = new_template(TemplateKind::AiChat, "p", &ids, &overrides).unwrap();
        assert_eq!(event.data.tenant_id.as_deref(), Some("org/other"));
        assert_eq!(event.data.meters[0].quantity, 9000.0);
    }

    #[test]
    fn bad_override_is_an_error() {
        let ids = SequenceIds::new("id");
        let overrides = vec![("data.meters[0].quantity".parse().unwrap(), "lots".to_string())];
        assert!(new_template(TemplateKind::AiChat, "p", &ids, &overrides).is_err());
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in TemplateKind::ALL {
            assert_eq!(kind.as_str().parse::<TemplateKind>().unwrap(), kind);
        }
        assert!("no-such-template".parse::<TemplateKind>().is_err());
    }
}
