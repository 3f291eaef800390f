//! Scenario tests across entities, codecs and migrations

#[cfg(test)]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("models=debug")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
fn ts(iso: &str) -> kernel::primitives::Timestamp {
    use kernel::primitives::PrimitiveAdapter;
    kernel::primitives::Timestamp::from_wire(iso).unwrap()
}

#[cfg(test)]
mod configuration_tests {
    use super::init_tracing;
    use crate::application::{Contracts, ContractsConfig};
    use crate::compat::MigrationRegistry;
    use crate::domain::WriteContext;
    use crate::domain::entity::ConfigurationEntity;
    use bson::doc;
    use bson::oid::ObjectId;
    use kernel::error::contract_error::ContractError;
    use kernel::error::validation::Constraint;

    #[test]
    fn test_unauthenticated_yaml_config() {
        init_tracing();
        let registry = MigrationRegistry::standard().unwrap();
        let contracts = Contracts::new(ContractsConfig::default(), &registry);
        let yaml = contracts.yaml();

        let config: ConfigurationEntity = yaml
            .decode("api_base_url: \"http://localhost:8058\"\n")
            .unwrap();
        assert!(config.identity_reference().is_none());
        assert_eq!(config.api_base_url().to_string(), "http://localhost:8058");

        // anonymous writes are fine
        assert!(yaml.encode_for(&config, WriteContext::Anonymous).is_ok());

        let err = yaml
            .encode_for(&config, WriteContext::Authenticated)
            .unwrap_err();
        let violations = err.validation().unwrap();
        assert!(violations.at("identity_reference").is_some());
    }

    #[test]
    fn test_authenticated_config_round_trip() {
        let registry = MigrationRegistry::standard().unwrap();
        let contracts = Contracts::new(ContractsConfig::default(), &registry);
        let yaml = r#"
api_base_url: "http://localhost:8058"
user:
  id: "65a1b2c3d4e5f60718293a4b"
  email: "ada@example.org"
  token:
    access_token: "secret-token"
    expire_datetime: "2030-01-01T00:00:00Z"
storage:
  bucket: "runs"
  minio_root_user: "minio"
  minio_root_password: "minio123"
feature_flags:
  dark_mode: true
"#;
        let config: ConfigurationEntity = contracts.yaml().decode(yaml).unwrap();
        assert!(config.is_authenticated());
        assert!(config.is_enabled("dark_mode"));
        let storage = config.storage().unwrap();
        assert_eq!(storage.port(), 9000);
        assert_eq!(storage.endpoint().to_string(), "http://localhost");

        let written = contracts
            .yaml()
            .encode_for(&config, WriteContext::Authenticated)
            .unwrap();
        let again: ConfigurationEntity = contracts.yaml().decode(&written).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn test_nested_shapes_are_closed() {
        let registry = MigrationRegistry::standard().unwrap();
        let contracts = Contracts::new(ContractsConfig::default(), &registry);
        let err = contracts
            .json()
            .decode::<ConfigurationEntity>(
                r#"{"api_base_url": "http://localhost:8058",
                    "storage": {"bucket": "b", "minio_root_user": "u",
                                "minio_root_password": "p", "region": "eu"}}"#,
            )
            .unwrap_err();
        assert_eq!(
            err.validation().unwrap().at("storage.region").unwrap().constraint,
            Constraint::UnknownField
        );
    }

    #[test]
    fn test_stored_v1_config_upgrades() {
        init_tracing();
        let registry = MigrationRegistry::standard().unwrap();
        let contracts = Contracts::new(ContractsConfig::default(), &registry);
        let store_id = ObjectId::new();
        let stored = doc! {
            "_id": store_id,
            "entity_type": "configuration",
            "schema_version": 1,
            "base_url": "http://localhost:8058",
        };

        let versioned = contracts
            .storage()
            .decode_envelope::<ConfigurationEntity>(&stored)
            .unwrap();
        assert_eq!(
            versioned.entity.api_base_url().to_string(),
            "http://localhost:8058"
        );
        // the driver key has no entity field and is carried along
        assert_eq!(versioned.extras, doc! { "_id": store_id });

        let rewritten = contracts.storage().encode_envelope(&versioned).unwrap();
        assert_eq!(rewritten.get_i64("schema_version").unwrap(), 2);
        assert_eq!(rewritten.get_str("api_base_url").unwrap(), "http://localhost:8058");
        assert!(!rewritten.contains_key("base_url"));
        assert_eq!(rewritten.get_object_id("_id").unwrap(), store_id);
    }

    #[test]
    fn test_v1_conflict_is_unmigratable() {
        let registry = MigrationRegistry::standard().unwrap();
        let contracts = Contracts::new(ContractsConfig::default(), &registry);
        let err = contracts
            .json()
            .decode::<ConfigurationEntity>(
                r#"{"schema_version": 1, "base_url": "http://a:1", "api_base_url": "http://b:2"}"#,
            )
            .unwrap_err();
        assert!(matches!(err, ContractError::Migration(_)));
        assert_eq!(err.status_code(), 409);
    }
}

#[cfg(test)]
mod identity_tests {
    use super::{init_tracing, ts};
    use crate::codec::{Codec, JsonFormat, StorageFormat, fingerprint};
    use crate::compat::MigrationRegistry;
    use crate::domain::entity::{IdentityEntity, IdentityFields};
    use bson::Bson;
    use kernel::error::contract_error::ContractError;
    use kernel::error::decode::DecodeError;
    use kernel::error::validation::Constraint;
    use kernel::id::IdentityId;

    fn ada() -> IdentityFields {
        IdentityFields {
            email: Some("ada@example.org".into()),
            display_name: Some("Ada Lovelace".into()),
            roles: vec!["user".into()],
            created_at: Some(ts("2024-01-01T00:00:00Z")),
            ..Default::default()
        }
    }

    #[test]
    fn test_identifier_length_boundary() {
        let registry = MigrationRegistry::standard().unwrap();
        let codec = Codec::new(JsonFormat::default(), &registry);
        let body = |id: &str| {
            format!(
                r#"{{"id": "{id}", "email": "ada@example.org", "display_name": "Ada", "roles": ["user"]}}"#
            )
        };

        let err = codec
            .decode::<IdentityEntity>(&body("65a1b2c3d4e5f60718293a4"))
            .unwrap_err();
        assert_eq!(
            err.validation().unwrap().at("id").unwrap().constraint,
            Constraint::MalformedIdentifier
        );
        assert!(matches!(
            IdentityId::parse_hex("65a1b2c3d4e5f60718293a4"),
            Err(DecodeError::MalformedIdentifier { .. })
        ));

        let identity: IdentityEntity = codec.decode(&body("65a1b2c3d4e5f60718293a4b")).unwrap();
        assert_eq!(identity.id().to_string(), "65a1b2c3d4e5f60718293a4b");
        let written = codec.encode(&identity).unwrap();
        assert!(written.contains(r#""id":"65a1b2c3d4e5f60718293a4b""#));
    }

    #[test]
    fn test_untrusted_text_is_sanitized() {
        let registry = MigrationRegistry::standard().unwrap();
        let codec = Codec::new(JsonFormat::default(), &registry);
        let identity: IdentityEntity = codec
            .decode(
                r#"{"email": "ada@example.org",
                    "display_name": "<script>alert(1)</script><b>Ada</b>",
                    "roles": ["user"]}"#,
            )
            .unwrap();
        assert_eq!(identity.display_name().as_str(), "Ada");
    }

    #[test]
    fn test_all_violations_reported_together() {
        let registry = MigrationRegistry::standard().unwrap();
        let codec = Codec::new(JsonFormat::default(), &registry);
        let err = codec
            .decode::<IdentityEntity>(
                r#"{"email": "not-an-email", "display_name": "  ", "roles": ["root"], "is_active": "yes"}"#,
            )
            .unwrap_err();
        let violations = err.validation().unwrap();
        for path in ["email", "display_name", "roles[0]", "is_active"] {
            assert!(violations.at(path).is_some(), "missing violation at {path}");
        }
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_v1_identity_upgrades() {
        init_tracing();
        let registry = MigrationRegistry::standard().unwrap();
        let codec = Codec::new(JsonFormat::default(), &registry);
        let identity: IdentityEntity = codec
            .decode(
                r#"{"schema_version": 1, "email": "grace@example.org", "is_admin": true,
                    "registration_date": "2023-06-01T12:00:00Z"}"#,
            )
            .unwrap();
        assert!(identity.is_admin());
        assert_eq!(identity.display_name().as_str(), "grace");
        assert_eq!(identity.created_at(), ts("2023-06-01T12:00:00Z"));
    }

    #[test]
    fn test_v1_identity_without_email_fails_whole() {
        let registry = MigrationRegistry::standard().unwrap();
        let codec = Codec::new(JsonFormat::default(), &registry);
        let err = codec
            .decode::<IdentityEntity>(r#"{"schema_version": 1, "is_admin": false}"#)
            .unwrap_err();
        assert!(matches!(err, ContractError::Migration(_)));
    }

    #[test]
    fn test_extras_pass_through() {
        let registry = MigrationRegistry::standard().unwrap();
        let codec = Codec::new(JsonFormat::default(), &registry);
        let input = r#"{"email": "ada@example.org", "display_name": "Ada", "roles": ["user"],
                        "legacy_flag": true, "notes": {"a": 1}}"#;

        let versioned = codec.decode_envelope::<IdentityEntity>(input).unwrap();
        assert_eq!(versioned.extras.len(), 2);
        let written = codec.encode_envelope(&versioned).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.first(), Some(&"entity_type"));
        assert_eq!(&keys[keys.len() - 2..], &["legacy_flag", "notes"]);

        // plain decode drops them
        let entity: IdentityEntity = codec.decode(&written).unwrap();
        let plain = codec.encode(&entity).unwrap();
        assert!(!plain.contains("legacy_flag"));
    }

    #[test]
    fn test_storage_keeps_native_primitives() {
        let registry = MigrationRegistry::standard().unwrap();
        let codec = Codec::new(StorageFormat::default(), &registry);
        let mut fields = ada();
        fields.avatar = Some(b"\x89PNG".to_vec().into());
        let identity = IdentityEntity::validate_and_construct(fields).unwrap();

        let stored = codec.encode(&identity).unwrap();
        let keys: Vec<&str> = stored.keys().map(String::as_str).collect();
        assert_eq!(&keys[..3], &["_id", "entity_type", "schema_version"]);
        assert_eq!(
            stored.get("_id"),
            Some(&Bson::ObjectId(*identity.id().as_object_id()))
        );
        assert!(matches!(stored.get("created_at"), Some(Bson::DateTime(_))));
        assert!(matches!(stored.get("avatar"), Some(Bson::Binary(_))));

        let back: IdentityEntity = codec.decode(&stored).unwrap();
        assert_eq!(back, identity);
    }

    #[test]
    fn test_fingerprint_ignores_volatile_fields() {
        let a = IdentityEntity::validate_and_construct(ada()).unwrap();
        let b = IdentityEntity::validate_and_construct(IdentityFields {
            created_at: Some(ts("2025-05-05T05:05:05Z")),
            ..ada()
        })
        .unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());

        let c = IdentityEntity::validate_and_construct(IdentityFields {
            display_name: Some("Ada King".into()),
            ..ada()
        })
        .unwrap();
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&c).unwrap());
    }
}

#[cfg(test)]
mod run_tests {
    use super::ts;
    use crate::application::{Contracts, ContractsConfig};
    use crate::compat::MigrationRegistry;
    use crate::domain::entity::{RunEntity, RunFields, WorkflowEntity};
    use crate::domain::value_object::RunStatus;
    use bson::doc;
    use bson::oid::ObjectId;
    use kernel::error::contract_error::ContractError;
    use kernel::error::decode::DecodeError;
    use kernel::error::validation::Constraint;
    use kernel::id::{IdentityId, WorkflowId};

    fn contracts(registry: &MigrationRegistry) -> Contracts<'_> {
        Contracts::new(ContractsConfig::default(), registry)
    }

    #[test]
    fn test_completion_before_start_rejected() {
        let registry = MigrationRegistry::standard().unwrap();
        let json = format!(
            r#"{{"workflow_id": "{}", "owner_id": "{}", "run_tag": "run_001",
                "run_location": "/data/runs/run_001", "status": "succeeded",
                "created_at": "2024-01-01T09:00:00Z",
                "started_at": "2024-01-01T10:05:00Z",
                "completed_at": "2024-01-01T10:00:00Z"}}"#,
            WorkflowId::new(),
            IdentityId::new()
        );
        let err = contracts(&registry)
            .json()
            .decode::<RunEntity>(&json)
            .unwrap_err();
        let violation = err.validation().unwrap().at("completed_at").unwrap();
        assert_eq!(violation.constraint, Constraint::Ordering);
    }

    #[test]
    fn test_naive_timestamp_is_ambiguous() {
        let registry = MigrationRegistry::standard().unwrap();
        let json = format!(
            r#"{{"workflow_id": "{}", "owner_id": "{}", "run_tag": "r",
                "run_location": "/r", "created_at": "2024-01-01 09:00:00"}}"#,
            WorkflowId::new(),
            IdentityId::new()
        );
        let err = contracts(&registry)
            .json()
            .decode::<RunEntity>(&json)
            .unwrap_err();
        assert_eq!(
            err.validation().unwrap().at("created_at").unwrap().constraint,
            Constraint::AmbiguousTimestamp
        );
    }

    #[test]
    fn test_wrong_entity_is_schema_mismatch() {
        let registry = MigrationRegistry::standard().unwrap();
        let json = contracts(&registry).json();
        let err = json
            .decode::<RunEntity>(r#"{"entity_type": "workflow", "name": "rnaseq"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ContractError::Decode(DecodeError::SchemaMismatch { .. })
        ));
        let err = json.decode::<WorkflowEntity>("[]").unwrap_err();
        assert!(matches!(
            err,
            ContractError::Decode(DecodeError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_stored_v1_run_upgrades() {
        let registry = MigrationRegistry::standard().unwrap();
        let run_id = ObjectId::new();
        let stored = doc! {
            "_id": run_id,
            "schema_version": 1,
            "workflow_id": ObjectId::new(),
            "owner_id": ObjectId::new(),
            "run_tag": "run_001",
            "run_location": "/data/runs/run_001",
            "registration_time": bson::DateTime::from_millis(1_704_099_600_000),
            "execution_time": bson::DateTime::from_millis(1_704_103_200_000),
            "status": "running",
        };
        let run: RunEntity = contracts(&registry).storage().decode(&stored).unwrap();
        assert_eq!(run.id().to_string(), run_id.to_hex());
        assert_eq!(run.status(), RunStatus::Running);
        assert_eq!(
            run.lifecycle().started_at(),
            Some(ts("2024-01-01T10:00:00Z"))
        );
    }

    #[test]
    fn test_stored_instant_past_year_9999_rejected() {
        let registry = MigrationRegistry::standard().unwrap();
        let stored = doc! {
            "_id": ObjectId::new(),
            "workflow_id": ObjectId::new(),
            "owner_id": ObjectId::new(),
            "run_tag": "run_001",
            "run_location": "/data/runs/run_001",
            "created_at": bson::DateTime::from_millis(253_402_300_800_000),
        };
        let err = contracts(&registry)
            .storage()
            .decode::<RunEntity>(&stored)
            .unwrap_err();
        assert_eq!(
            err.validation().unwrap().at("created_at").unwrap().constraint,
            Constraint::InvalidFormat
        );
    }

    #[test]
    fn test_lifecycle_survives_every_format() {
        let registry = MigrationRegistry::standard().unwrap();
        let contracts = contracts(&registry);
        let run = RunEntity::validate_and_construct(RunFields {
            workflow_id: Some(WorkflowId::new()),
            owner_id: Some(IdentityId::new()),
            run_tag: Some("run_001".into()),
            run_location: Some("/data/runs/run_001".into()),
            ..Default::default()
        })
        .unwrap()
        .start(ts("2099-01-01T10:00:00Z"))
        .unwrap()
        .finish(RunStatus::Failed, ts("2099-01-01T11:00:00.250Z"))
        .unwrap();

        let json = contracts.json().encode(&run).unwrap();
        assert_eq!(contracts.json().decode::<RunEntity>(&json).unwrap(), run);
        let yaml = contracts.yaml().encode(&run).unwrap();
        assert_eq!(contracts.yaml().decode::<RunEntity>(&yaml).unwrap(), run);
        let stored = contracts.storage().encode(&run).unwrap();
        assert_eq!(contracts.storage().decode::<RunEntity>(&stored).unwrap(), run);
    }
}

#[cfg(test)]
mod workflow_tests {
    use crate::application::{Contracts, ContractsConfig};
    use crate::codec::{Codec, JsonFormat, YamlFormat};
    use crate::compat::MigrationRegistry;
    use crate::domain::entity::WorkflowEntity;
    use kernel::error::validation::Constraint;

    const WORKFLOW: &str = r#"
name: rnaseq
engine:
  name: nextflow
  version: "24.04"
catalog:
  name: nf-core
  url: https://github.com/nf-core/rnaseq
config:
  parent_runs_location:
    - ${DATA_ROOT}/rnaseq
  runs_regex: "run_\\d+"
owner_id: "65a1b2c3d4e5f60718293a4b"
"#;

    fn data_root(name: &str) -> Option<String> {
        (name == "DATA_ROOT").then(|| "/data".to_string())
    }

    #[test]
    fn test_workflow_from_yaml_with_env() {
        let registry = MigrationRegistry::standard().unwrap();
        let codec = Codec::new(YamlFormat::with_env(data_root), &registry);
        let workflow: WorkflowEntity = codec.decode(WORKFLOW).unwrap();
        assert_eq!(workflow.workflow_tag(), "nf-core/rnaseq");
        assert_eq!(
            workflow.config().parent_runs_location()[0].as_str(),
            "/data/rnaseq"
        );
        assert!(workflow.config().runs_pattern().unwrap().is_match("run_42"));
        assert!(workflow.permissions().is_owner(workflow.owner_id()));

        let json = Codec::new(JsonFormat::default(), &registry);
        let text = json.encode(&workflow).unwrap();
        assert!(text.contains(r#""workflow_tag":"nf-core/rnaseq""#));
        assert_eq!(json.decode::<WorkflowEntity>(&text).unwrap(), workflow);
    }

    /// Same workflow with placeholders kept literal and `$` in free text
    fn literal_dollars(registry: &MigrationRegistry) -> WorkflowEntity {
        let input = format!(
            "{WORKFLOW}description: costs $DATA_ROOT dollars, or $$5 in ${{HOME}}\n"
        )
        .replace(r#""run_\\d+""#, r#""^run_\\d+$""#);
        let workflow: WorkflowEntity = Codec::new(YamlFormat::default(), registry)
            .decode(&input)
            .unwrap();
        assert_eq!(
            workflow.config().parent_runs_location()[0].as_str(),
            "${DATA_ROOT}/rnaseq"
        );
        workflow
    }

    #[test]
    fn test_yaml_round_trip_with_expansion_keeps_dollar_text() {
        let registry = MigrationRegistry::standard().unwrap();
        let workflow = literal_dollars(&registry);

        let codec = Codec::new(YamlFormat::with_env(data_root), &registry);
        let text = codec.encode(&workflow).unwrap();
        let decoded: WorkflowEntity = codec.decode(&text).unwrap();
        assert_eq!(
            decoded.config().parent_runs_location()[0].as_str(),
            "${DATA_ROOT}/rnaseq"
        );
        assert_eq!(
            decoded.description().unwrap().as_str(),
            "costs $DATA_ROOT dollars, or $$5 in ${HOME}"
        );
        assert_eq!(decoded, workflow);
    }

    #[test]
    fn test_cli_preset_yaml_round_trip() {
        let registry = MigrationRegistry::standard().unwrap();
        let workflow = literal_dollars(&registry);
        let contracts = Contracts::new(ContractsConfig::cli(), &registry);
        assert!(contracts.yaml().format().expands_env());

        let text = contracts.yaml().encode(&workflow).unwrap();
        assert_eq!(contracts.yaml().decode::<WorkflowEntity>(&text).unwrap(), workflow);

        let json = contracts.json().encode(&workflow).unwrap();
        assert!(json.contains('\n'));
        assert_eq!(contracts.json().decode::<WorkflowEntity>(&json).unwrap(), workflow);
    }

    #[test]
    fn test_stale_workflow_tag_is_conflict() {
        let registry = MigrationRegistry::standard().unwrap();
        let codec = Codec::new(YamlFormat::with_env(data_root), &registry);
        let input = format!("{WORKFLOW}workflow_tag: nextflow/other\n");
        let err = codec.decode::<WorkflowEntity>(&input).unwrap_err();
        assert_eq!(
            err.validation().unwrap().at("workflow_tag").unwrap().constraint,
            Constraint::Conflict
        );
    }
}

#[cfg(test)]
mod property_tests {
    use crate::codec::{Codec, JsonFormat, StorageFormat, YamlFormat};
    use crate::compat::{MigrationRegistry, VersionedEnvelope};
    use crate::domain::EntityType;
    use crate::domain::entity::{IdentityEntity, IdentityFields, RunEntity, RunFields};
    use crate::domain::value_object::RunStatus;
    use bson::doc;
    use kernel::id::{GroupId, IdentityId, WorkflowId};
    use kernel::primitives::{MAX_MILLIS, MIN_MILLIS, Timestamp};
    use proptest::prelude::*;

    const DAY: i64 = 86_400_000;

    // whole wire range, leaving room for a run to start and finish
    fn millis() -> impl Strategy<Value = i64> {
        prop_oneof![
            1 => Just(MIN_MILLIS),
            1 => Just(MAX_MILLIS - 2 * DAY),
            8 => MIN_MILLIS..=MAX_MILLIS - 2 * DAY,
        ]
    }

    fn identity() -> impl Strategy<Value = IdentityEntity> {
        (
            "[a-z]{1,12}@example\\.org",
            "[A-Za-z][A-Za-z ]{0,30}[A-Za-z]",
            prop::sample::subsequence(vec!["user", "admin", "service"], 1..=3),
            prop::collection::vec(any::<[u8; 12]>(), 0..4),
            any::<bool>(),
            prop::option::of(prop::collection::vec(any::<u8>(), 0..64)),
            millis(),
        )
            .prop_map(|(email, name, roles, groups, active, avatar, at)| {
                let mut group_ids: Vec<GroupId> = groups.into_iter().map(GroupId::from_bytes).collect();
                group_ids.dedup();
                IdentityEntity::validate_and_construct(IdentityFields {
                    id: Some(IdentityId::new()),
                    email: Some(email),
                    display_name: Some(name),
                    roles: roles.into_iter().map(String::from).collect(),
                    group_ids,
                    is_active: active,
                    avatar: avatar.map(Into::into),
                    created_at: Timestamp::from_millis(at),
                })
                .unwrap()
            })
    }

    fn run() -> impl Strategy<Value = RunEntity> {
        (
            "[a-z][a-z0-9_]{0,20}",
            "/[a-z]{1,10}(/[a-z0-9_]{1,10}){0,3}",
            millis(),
            0_i64..DAY,
            0_i64..DAY,
            0_usize..4,
        )
            .prop_map(|(tag, location, created, start_after, run_for, stage)| {
                let created_at = Timestamp::from_millis(created).unwrap();
                let started = Timestamp::from_millis(created + start_after).unwrap();
                let done = Timestamp::from_millis(created + start_after + run_for).unwrap();
                let run = RunEntity::validate_and_construct(RunFields {
                    workflow_id: Some(WorkflowId::new()),
                    owner_id: Some(IdentityId::new()),
                    run_tag: Some(tag),
                    run_location: Some(location),
                    lifecycle: crate::domain::entity::LifecycleFields {
                        created_at: Some(created_at),
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .unwrap();
                match stage {
                    0 => run,
                    1 => run.start(started).unwrap(),
                    2 => run.start(started).unwrap().finish(RunStatus::Succeeded, done).unwrap(),
                    _ => run.finish(RunStatus::Cancelled, done).unwrap(),
                }
            })
    }

    proptest! {
        #[test]
        fn prop_identity_round_trips_every_format(identity in identity()) {
            let registry = MigrationRegistry::standard().unwrap();

            let json = Codec::new(JsonFormat::default(), &registry);
            let text = json.encode(&identity).unwrap();
            prop_assert_eq!(json.decode::<IdentityEntity>(&text).unwrap(), identity.clone());

            let yaml = Codec::new(YamlFormat::default(), &registry);
            let text = yaml.encode(&identity).unwrap();
            prop_assert_eq!(yaml.decode::<IdentityEntity>(&text).unwrap(), identity.clone());

            let storage = Codec::new(StorageFormat::default(), &registry);
            let doc = storage.encode(&identity).unwrap();
            let bytes = StorageFormat::to_bytes(&doc).unwrap();
            let doc = StorageFormat::from_bytes(&bytes).unwrap();
            prop_assert_eq!(storage.decode::<IdentityEntity>(&doc).unwrap(), identity);
        }

        #[test]
        fn prop_run_round_trips_every_format(run in run()) {
            let registry = MigrationRegistry::standard().unwrap();

            let json = Codec::new(JsonFormat::pretty(), &registry);
            let text = json.encode(&run).unwrap();
            prop_assert_eq!(json.decode::<RunEntity>(&text).unwrap(), run.clone());

            let yaml = Codec::new(YamlFormat::default(), &registry);
            let text = yaml.encode(&run).unwrap();
            prop_assert_eq!(yaml.decode::<RunEntity>(&text).unwrap(), run.clone());

            let storage = Codec::new(StorageFormat::default(), &registry);
            let doc = storage.encode(&run).unwrap();
            prop_assert_eq!(storage.decode::<RunEntity>(&doc).unwrap(), run);
        }

        #[test]
        fn prop_upgrade_is_idempotent(version in 0_u32..4, tag in "[a-z]{1,8}") {
            let registry = MigrationRegistry::standard().unwrap();
            let env = VersionedEnvelope::new(EntityType::Run, version, doc! { "run_tag": tag, "status": "queued" });
            if let Ok(once) = registry.upgrade(env) {
                prop_assert_eq!(once.schema_version, 2);
                let twice = registry.upgrade(once.clone()).unwrap();
                prop_assert_eq!(twice, once);
            }
        }
    }
}
