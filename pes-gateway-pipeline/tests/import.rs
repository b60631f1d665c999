//! Integration tests for the import path, run against the in-memory store and
//! the mock PES client.

use std::sync::{Arc, Mutex};

use pes_gateway_pipeline::client::{MockPesClient, RemoteApi};
use pes_gateway_pipeline::errors::RecordError;
use pes_gateway_pipeline::importer::{ClassificationPolicy, ImportRunner, RecordOutcome, Subject};
use pes_gateway_repository::{
    find_model, ChangeObserver, Fault, InMemoryStore, LocalStore, StoreSession,
};
use pes_gateway_shared::types::{
    Calendar, ChangeEvent, Contact, EntityKind, Event, Notify, Organization, OwnerRef, Person,
    Record, Role,
};
use serde_json::{json, Value};

const ORGANIZATIONS: Subject = Subject::Entity(EntityKind::Organization);
const PERSONS: Subject = Subject::Entity(EntityKind::Person);

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<ChangeEvent>>,
}

#[async_trait::async_trait]
impl ChangeObserver for RecordingObserver {
    async fn on_change(&self, event: &ChangeEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

struct Harness {
    remote: Arc<MockPesClient>,
    store: Arc<InMemoryStore>,
}

impl Harness {
    fn new() -> Self {
        Self {
            remote: Arc::new(MockPesClient::new()),
            store: Arc::new(InMemoryStore::new()),
        }
    }

    fn runner(&self, policy: ClassificationPolicy) -> ImportRunner {
        let api: Arc<dyn RemoteApi> = self.remote.clone();
        let store: Arc<dyn LocalStore> = self.store.clone();
        ImportRunner::new(api, store, policy).with_default_handlers()
    }

    async fn session(&self) -> Box<dyn StoreSession> {
        self.store.begin().await.unwrap()
    }

    async fn organization(&self, key: &str) -> Option<Organization> {
        find_model::<Organization>(self.session().await.as_mut(), key)
            .await
            .unwrap()
    }

    async fn seed(&self, records: Vec<Record>) {
        let mut session = self.session().await;
        for record in records {
            session.save(&record, Notify::Suppressed).await.unwrap();
        }
        session.commit().await.unwrap();
    }
}

fn organization_document(uuid: &str, title: &str) -> Value {
    json!({
        "uuid": uuid,
        "title": title,
        "description": "A cooperative",
        "testimony": "",
        "contacts": [],
        "members": [],
        "transverse_themes": [],
    })
}

fn person_document(uuid: &str, contacts: Value) -> Value {
    json!({
        "uuid": uuid,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "contacts": contacts,
    })
}

fn full_remote(remote: &MockPesClient) {
    remote.set_resource(
        "legal_statuses",
        vec![json!({"slug": "asso", "label": "Association"})],
    );
    remote.set_resource(
        "transverse_themes",
        vec![json!({"id": 7, "name": "Food"}), json!({"id": 8, "name": "Mobility"})],
    );
    remote.set_resource(
        "roles",
        vec![json!({"uuid": "remote-president", "slug": "president", "label": "Président"})],
    );
    remote.set_resource(
        "persons",
        vec![person_document(
            "p-1",
            json!([{"uuid": "c-p1", "content": "ada@example.org", "contact_medium": 1}]),
        )],
    );
    remote.set_resource(
        "organizations",
        vec![json!({
            "uuid": "o-1",
            "title": "Coop",
            "legal_status": "asso",
            "transverse_themes": [8, 7],
            "workforce": 12,
            "birth": "2001-09-01T00:00:00Z",
            "pref_email": "c-o1",
            "contacts": [{"uuid": "c-o1", "content": "coop@example.org", "contact_medium": 1}],
            "members": [{"person": "p-1", "role": "remote-president", "role_detail": "founder"}],
        })],
    );
    remote.set_resource(
        "calendars",
        vec![json!({"uuid": "cal-1", "title": "Agenda"})],
    );
    remote.set_resource(
        "events",
        vec![json!({
            "uuid": "e-1",
            "title": "Market",
            "calendar": "cal-1",
            "organization": "o-1",
            "organizations": ["o-1", "o-unknown"],
            "occurrences": [{"start_time": "2024-05-01T09:00:00Z", "end_time": "2024-05-01T12:00:00Z"}],
        })],
    );
    remote.set_resource(
        "products",
        vec![json!({"uuid": "pr-1", "title": "Bread", "organization": "o-1"})],
    );
    remote.set_resource(
        "exchanges",
        vec![json!({
            "uuid": "x-1",
            "title": "Bread for bikes",
            "eway": "OFFER",
            "etype": "PROD",
            "person": "p-1",
            "products": ["pr-1"],
            "methods": [1],
        })],
    );
    remote.set_resource(
        "locations",
        vec![json!({"uuid": "l-1", "label": "Hall", "city": "Lyon"})],
    );
}

// ============================================================================
// Full runs
// ============================================================================

#[tokio::test]
async fn test_first_run_creates_and_marks_every_record() {
    let harness = Harness::new();
    full_remote(&harness.remote);

    let report = harness.runner(ClassificationPolicy::Marker).run().await.unwrap();

    assert!(report.is_clean(), "{report:?}");
    let mut session = harness.session().await;
    for (kind, key) in [
        (EntityKind::Role, "president"),
        (EntityKind::Person, "p-1"),
        (EntityKind::Organization, "o-1"),
        (EntityKind::Calendar, "cal-1"),
        (EntityKind::Event, "e-1"),
        (EntityKind::Product, "pr-1"),
        (EntityKind::Exchange, "x-1"),
        (EntityKind::Location, "l-1"),
    ] {
        assert!(
            matches!(
                report.outcome_of(Subject::Entity(kind), key),
                Some(Ok(RecordOutcome::Created))
            ),
            "{kind} {key}"
        );
        assert!(session.marker_exists(kind, key).await.unwrap(), "{kind} {key}");
    }

    let organization = find_model::<Organization>(session.as_mut(), "o-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(organization.pref_email.as_deref(), Some("c-o1"));
    assert_eq!(organization.legal_status.as_deref(), Some("asso"));
    assert_eq!(organization.workforce.as_deref(), Some("12"));
    assert_eq!(organization.transverse_themes, vec![2, 1]);

    let event = find_model::<Event>(session.as_mut(), "e-1").await.unwrap().unwrap();
    assert_eq!(event.organizations, vec!["o-1"]);
    assert_eq!(event.occurrences.len(), 1);
}

#[tokio::test]
async fn test_second_identical_run_writes_nothing() {
    let harness = Harness::new();
    full_remote(&harness.remote);
    let runner = harness.runner(ClassificationPolicy::Marker);
    runner.run().await.unwrap();
    let writes = harness.store.write_count();

    let report = runner.run().await.unwrap();

    assert_eq!(harness.store.write_count(), writes);
    assert_eq!(report.changes(), 0);
    assert_eq!(report.count(ORGANIZATIONS, RecordOutcome::Unchanged), 1);
    assert_eq!(report.count(Subject::LegalStatus, RecordOutcome::Found), 1);
    assert_eq!(report.count(Subject::TransverseTheme, RecordOutcome::Found), 2);
}

#[tokio::test]
async fn test_import_emits_no_change_events() {
    let harness = Harness::new();
    full_remote(&harness.remote);
    let observer = Arc::new(RecordingObserver::default());
    harness.store.observers().register(observer.clone());

    harness
        .runner(ClassificationPolicy::Marker)
        .run()
        .await
        .unwrap();

    assert!(observer.events.lock().unwrap().is_empty());
    assert!(harness.remote.pushed().is_empty());
    assert!(harness.remote.removed().is_empty());
}

#[tokio::test]
async fn test_remote_changes_converge_locally() {
    let harness = Harness::new();
    full_remote(&harness.remote);
    let runner = harness.runner(ClassificationPolicy::Marker);
    runner.run().await.unwrap();

    let mut changed = organization_document("o-1", "Coop renamed");
    changed["acronym"] = json!("CR");
    harness.remote.set_resource("organizations", vec![changed]);
    let report = runner.run().await.unwrap();

    assert!(matches!(
        report.outcome_of(ORGANIZATIONS, "o-1"),
        Some(Ok(RecordOutcome::Updated))
    ));
    let organization = harness.organization("o-1").await.unwrap();
    assert_eq!(organization.title, "Coop renamed");
    assert_eq!(organization.acronym.as_deref(), Some("CR"));
    assert_eq!(organization.legal_status, None);
    assert_eq!(organization.pref_email, None);

    let mut session = harness.session().await;
    assert!(session
        .contacts_of(&OwnerRef::organization("o-1"))
        .await
        .unwrap()
        .is_empty());
    assert!(session.engagements_of("o-1").await.unwrap().is_empty());
}

// ============================================================================
// Deletion sweep
// ============================================================================

#[tokio::test]
async fn test_sweep_deletes_only_vanished_mirrors() {
    let harness = Harness::new();
    harness.seed(vec![Organization::new("o-native", "Ours").into()]).await;
    harness.remote.set_resource(
        "organizations",
        vec![
            organization_document("o-1", "First"),
            organization_document("o-2", "Second"),
        ],
    );
    let runner = harness.runner(ClassificationPolicy::Marker);
    runner.run_kinds(&[EntityKind::Organization]).await.unwrap();

    harness
        .remote
        .set_resource("organizations", vec![organization_document("o-1", "First")]);
    let report = runner.run_kinds(&[EntityKind::Organization]).await.unwrap();

    assert!(matches!(
        report.outcome_of(ORGANIZATIONS, "o-2"),
        Some(Ok(RecordOutcome::Deleted))
    ));
    assert!(harness.organization("o-2").await.is_none());
    assert!(harness.organization("o-1").await.is_some());
    assert!(harness.organization("o-native").await.is_some());
    let mut session = harness.session().await;
    assert_eq!(
        session.marked_keys(EntityKind::Organization).await.unwrap(),
        vec!["o-1".to_string()]
    );
}

#[tokio::test]
async fn test_sweep_also_removes_vanished_roles() {
    let harness = Harness::new();
    harness.remote.set_resource(
        "roles",
        vec![json!({"uuid": "r-1", "slug": "treasurer", "label": "Treasurer"})],
    );
    let runner = harness.runner(ClassificationPolicy::Marker);
    runner.run_kinds(&[EntityKind::Role]).await.unwrap();

    harness.remote.set_resource("roles", vec![]);
    runner.run_kinds(&[EntityKind::Role]).await.unwrap();

    let mut session = harness.session().await;
    assert!(find_model::<Role>(session.as_mut(), "treasurer")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_sweep_keeps_mirror_calendar_holding_native_events() {
    let harness = Harness::new();
    harness
        .remote
        .set_resource("calendars", vec![json!({"uuid": "cal-1", "title": "Agenda"})]);
    let runner = harness.runner(ClassificationPolicy::Marker);
    runner.run_kinds(&[EntityKind::Calendar]).await.unwrap();
    harness
        .seed(vec![Event {
            uuid: "e-native".into(),
            title: "Our market".into(),
            calendar: "cal-1".into(),
            ..Default::default()
        }
        .into()])
        .await;

    harness.remote.set_resource("calendars", vec![]);
    let report = runner.run_kinds(&[EntityKind::Calendar]).await.unwrap();

    assert!(matches!(
        report.outcome_of(Subject::Entity(EntityKind::Calendar), "cal-1"),
        Some(Err(RecordError::IntegrityViolation(_)))
    ));
    let mut session = harness.session().await;
    assert!(session
        .find(EntityKind::Event, "e-native")
        .await
        .unwrap()
        .is_some());
    assert!(session.marker_exists(EntityKind::Calendar, "cal-1").await.unwrap());
}

#[tokio::test]
async fn test_sweep_deletes_calendar_with_only_mirrored_events() {
    let harness = Harness::new();
    full_remote(&harness.remote);
    let runner = harness.runner(ClassificationPolicy::Marker);
    runner.run().await.unwrap();

    harness.remote.set_resource("calendars", vec![]);
    harness.remote.set_resource("events", vec![]);
    let report = runner.run().await.unwrap();

    assert!(matches!(
        report.outcome_of(Subject::Entity(EntityKind::Calendar), "cal-1"),
        Some(Ok(RecordOutcome::Deleted))
    ));
    let mut session = harness.session().await;
    assert!(session.find(EntityKind::Event, "e-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unreachable_collection_is_neither_reconciled_nor_swept() {
    let harness = Harness::new();
    full_remote(&harness.remote);
    let runner = harness.runner(ClassificationPolicy::Marker);
    runner.run().await.unwrap();

    harness.remote.fail_resource("calendars");
    harness.remote.set_resource("locations", vec![]);
    let report = runner.run().await.unwrap();

    assert!(report.is_aborted(Subject::Entity(EntityKind::Calendar)));
    assert!(!report.is_aborted(Subject::Entity(EntityKind::Location)));
    let mut session = harness.session().await;
    assert!(find_model::<Calendar>(session.as_mut(), "cal-1")
        .await
        .unwrap()
        .is_some());
    assert!(session
        .find(EntityKind::Location, "l-1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_unreachable_lookups_leave_organizations_untouched() {
    for lookup in ["legal_statuses", "transverse_themes", "roles"] {
        let harness = Harness::new();
        full_remote(&harness.remote);
        let runner = harness.runner(ClassificationPolicy::Marker);
        runner.run().await.unwrap();
        let writes = harness.store.write_count();

        harness.remote.fail_resource(lookup);
        let mut removed = organization_document("o-1", "Coop");
        removed["uuid"] = json!("o-2");
        harness.remote.set_resource("organizations", vec![removed]);
        let report = runner.run().await.unwrap();

        assert!(report.is_aborted(ORGANIZATIONS), "{lookup}");
        assert!(report.outcome_of(ORGANIZATIONS, "o-1").is_none(), "{lookup}");
        assert_eq!(harness.store.write_count(), writes, "{lookup}");
        let organization = harness.organization("o-1").await.unwrap();
        assert_eq!(organization.legal_status.as_deref(), Some("asso"));
        assert_eq!(organization.transverse_themes, vec![2, 1]);
        assert!(harness.organization("o-2").await.is_none());
        let mut session = harness.session().await;
        let engagements = session.engagements_of("o-1").await.unwrap();
        assert!(engagements[0].role.is_some(), "{lookup}");
    }
}

#[tokio::test]
async fn test_unreachable_roles_skip_organizations_when_not_imported() {
    let harness = Harness::new();
    full_remote(&harness.remote);
    let runner = harness.runner(ClassificationPolicy::Marker);
    runner.run().await.unwrap();

    harness.remote.fail_resource("roles");
    let report = runner
        .run_kinds(&[EntityKind::Organization])
        .await
        .unwrap();

    assert!(report.is_aborted(ORGANIZATIONS));
    assert!(report.outcome_of(ORGANIZATIONS, "o-1").is_none());
    let mut session = harness.session().await;
    assert!(session.marker_exists(EntityKind::Organization, "o-1").await.unwrap());
}

// ============================================================================
// Nested collections
// ============================================================================

#[tokio::test]
async fn test_contacts_are_replaced_by_the_incoming_list() {
    let harness = Harness::new();
    harness.remote.set_resource(
        "persons",
        vec![person_document(
            "p-1",
            json!([
                {"uuid": "c-1", "content": "old@example.org"},
                {"uuid": "c-2", "content": "kept@example.org"},
            ]),
        )],
    );
    let runner = harness.runner(ClassificationPolicy::Marker);
    runner.run_kinds(&[EntityKind::Person]).await.unwrap();

    harness.remote.set_resource(
        "persons",
        vec![person_document(
            "p-1",
            json!([
                {"uuid": "c-2", "content": "kept@example.org"},
                {"uuid": "c-3", "content": "new@example.org", "contact_medium": 2},
            ]),
        )],
    );
    let report = runner.run_kinds(&[EntityKind::Person]).await.unwrap();

    assert!(matches!(
        report.outcome_of(PERSONS, "p-1"),
        Some(Ok(RecordOutcome::Updated))
    ));
    let mut session = harness.session().await;
    let mut uuids: Vec<String> = session
        .contacts_of(&OwnerRef::person("p-1"))
        .await
        .unwrap()
        .into_iter()
        .map(|contact| contact.uuid)
        .collect();
    uuids.sort();
    assert_eq!(uuids, vec!["c-2", "c-3"]);
    assert!(session.find_contact("c-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_absent_contact_list_removes_every_contact() {
    let harness = Harness::new();
    harness.remote.set_resource(
        "persons",
        vec![person_document("p-1", json!([{"uuid": "c-1", "content": "a@b.c"}]))],
    );
    let runner = harness.runner(ClassificationPolicy::Marker);
    runner.run_kinds(&[EntityKind::Person]).await.unwrap();

    harness.remote.set_resource(
        "persons",
        vec![json!({"uuid": "p-1", "first_name": "Ada", "last_name": "Lovelace"})],
    );
    runner.run_kinds(&[EntityKind::Person]).await.unwrap();

    let mut session = harness.session().await;
    assert!(session
        .contacts_of(&OwnerRef::person("p-1"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_preferred_contact_owned_elsewhere_is_left_empty() {
    let harness = Harness::new();
    full_remote(&harness.remote);
    let mut document = organization_document("o-1", "Coop");
    document["contacts"] = json!([{"uuid": "c-o1", "content": "coop@example.org"}]);
    document["pref_email"] = json!("c-p1");
    document["pref_phone"] = json!("c-o1");
    harness.remote.set_resource("organizations", vec![document]);

    let report = harness
        .runner(ClassificationPolicy::Marker)
        .run_kinds(&[EntityKind::Person, EntityKind::Organization])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_of(ORGANIZATIONS, "o-1"),
        Some(Ok(RecordOutcome::Created))
    ));
    let organization = harness.organization("o-1").await.unwrap();
    assert_eq!(organization.pref_email, None);
    assert_eq!(organization.pref_phone.as_deref(), Some("c-o1"));
    let mut session = harness.session().await;
    let contact = session.find_contact("c-p1").await.unwrap().unwrap();
    assert_eq!(contact.owner, OwnerRef::person("p-1"));
}

#[tokio::test]
async fn test_contact_owned_elsewhere_abandons_only_that_record() {
    let harness = Harness::new();
    harness.seed(vec![Organization::new("o-native", "Ours").into()]).await;
    let mut session = harness.session().await;
    session
        .save_contact(&Contact {
            uuid: "c-shared".into(),
            content: "ours@example.org".into(),
            contact_medium: None,
            owner: OwnerRef::organization("o-native"),
        })
        .await
        .unwrap();
    session.commit().await.unwrap();
    harness.remote.set_resource(
        "persons",
        vec![
            person_document("p-1", json!([{"uuid": "c-shared", "content": "theirs@example.org"}])),
            person_document("p-2", json!([])),
        ],
    );

    let report = harness
        .runner(ClassificationPolicy::Marker)
        .run_kinds(&[EntityKind::Person])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_of(PERSONS, "p-1"),
        Some(Err(RecordError::OwnershipConflict { owner, .. }))
            if *owner == OwnerRef::organization("o-native")
    ));
    assert!(matches!(
        report.outcome_of(PERSONS, "p-2"),
        Some(Ok(RecordOutcome::Created))
    ));
    let mut session = harness.session().await;
    assert!(find_model::<Person>(session.as_mut(), "p-1").await.unwrap().is_none());
    assert!(!session.marker_exists(EntityKind::Person, "p-1").await.unwrap());
    let contact = session.find_contact("c-shared").await.unwrap().unwrap();
    assert_eq!(contact.content, "ours@example.org");
}

#[tokio::test]
async fn test_member_with_unknown_person_fails_the_organization() {
    let harness = Harness::new();
    let mut document = organization_document("o-1", "Coop");
    document["members"] = json!([{"person": "p-missing", "role": null}]);
    harness.remote.set_resource("organizations", vec![document]);

    let report = harness
        .runner(ClassificationPolicy::Marker)
        .run_kinds(&[EntityKind::Organization])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_of(ORGANIZATIONS, "o-1"),
        Some(Err(RecordError::ReferenceNotFound { kind: EntityKind::Person, .. }))
    ));
    assert!(harness.organization("o-1").await.is_none());
}

// ============================================================================
// Translations
// ============================================================================

#[tokio::test]
async fn test_member_roles_are_translated_to_local_roles() {
    let harness = Harness::new();
    harness
        .seed(vec![
            Role {
                uuid: "local-president".into(),
                slug: "president".into(),
                label: "President".into(),
            }
            .into(),
            Person::new("p-1", "Ada", "Lovelace").into(),
            Person::new("p-2", "Alan", "Turing").into(),
        ])
        .await;
    full_remote(&harness.remote);
    let mut document = organization_document("o-1", "Coop");
    document["members"] = json!([
        {"person": "p-1", "role": "remote-president"},
        {"person": "p-2", "role": "remote-unknown", "role_detail": "helper"},
    ]);
    harness.remote.set_resource("organizations", vec![document]);

    let report = harness
        .runner(ClassificationPolicy::Marker)
        .run_kinds(&[EntityKind::Role, EntityKind::Organization])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_of(Subject::Entity(EntityKind::Role), "president"),
        Some(Ok(RecordOutcome::Found))
    ));
    let mut session = harness.session().await;
    let mut engagements = session.engagements_of("o-1").await.unwrap();
    engagements.sort_by(|a, b| a.person.cmp(&b.person));
    assert_eq!(engagements[0].role.as_deref(), Some("local-president"));
    assert_eq!(engagements[1].role, None);
    assert_eq!(engagements[1].role_detail.as_deref(), Some("helper"));
    let role = find_model::<Role>(session.as_mut(), "president")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(role.label, "President");
}

#[tokio::test]
async fn test_roles_are_translated_even_when_not_imported() {
    let harness = Harness::new();
    harness
        .seed(vec![
            Role {
                uuid: "local-president".into(),
                slug: "president".into(),
                label: "President".into(),
            }
            .into(),
            Person::new("p-1", "Ada", "Lovelace").into(),
        ])
        .await;
    full_remote(&harness.remote);
    let mut document = organization_document("o-1", "Coop");
    document["members"] = json!([{"person": "p-1", "role": "president"}]);
    harness.remote.set_resource("organizations", vec![document]);

    harness
        .runner(ClassificationPolicy::Marker)
        .run_kinds(&[EntityKind::Organization])
        .await
        .unwrap();

    let mut session = harness.session().await;
    let engagements = session.engagements_of("o-1").await.unwrap();
    assert_eq!(engagements[0].role.as_deref(), Some("local-president"));
}

// ============================================================================
// Classification and failures
// ============================================================================

#[tokio::test]
async fn test_native_record_is_skipped_under_marker_policy() {
    let harness = Harness::new();
    harness.seed(vec![Organization::new("o-1", "Ours").into()]).await;
    harness
        .remote
        .set_resource("organizations", vec![organization_document("o-1", "Theirs")]);

    let report = harness
        .runner(ClassificationPolicy::Marker)
        .run_kinds(&[EntityKind::Organization])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_of(ORGANIZATIONS, "o-1"),
        Some(Ok(RecordOutcome::Skipped))
    ));
    assert_eq!(harness.organization("o-1").await.unwrap().title, "Ours");
}

#[tokio::test]
async fn test_native_record_is_updated_but_not_marked_under_identifier_policy() {
    let harness = Harness::new();
    harness.seed(vec![Organization::new("o-1", "Ours").into()]).await;
    harness
        .remote
        .set_resource("organizations", vec![organization_document("o-1", "Theirs")]);

    let report = harness
        .runner(ClassificationPolicy::Identifier)
        .run_kinds(&[EntityKind::Organization])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_of(ORGANIZATIONS, "o-1"),
        Some(Ok(RecordOutcome::Updated))
    ));
    assert_eq!(harness.organization("o-1").await.unwrap().title, "Theirs");
    let mut session = harness.session().await;
    assert!(!session
        .marker_exists(EntityKind::Organization, "o-1")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_failing_record_does_not_stop_the_run() {
    let harness = Harness::new();
    harness.store.fail_writes_to(EntityKind::Organization, "o-2", Fault::Conflict);
    harness.remote.set_resource(
        "organizations",
        vec![
            organization_document("o-1", "First"),
            organization_document("o-2", "Second"),
            organization_document("o-3", "Third"),
        ],
    );

    let report = harness
        .runner(ClassificationPolicy::Marker)
        .run_kinds(&[EntityKind::Organization])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_of(ORGANIZATIONS, "o-2"),
        Some(Err(RecordError::Conflict(_)))
    ));
    assert_eq!(report.count(ORGANIZATIONS, RecordOutcome::Created), 2);
    assert!(harness.organization("o-1").await.is_some());
    assert!(harness.organization("o-2").await.is_none());
    assert!(harness.organization("o-3").await.is_some());
}

#[tokio::test]
async fn test_null_and_missing_required_fields_are_told_apart() {
    let harness = Harness::new();
    harness.remote.set_resource(
        "organizations",
        vec![
            json!({"uuid": "o-null", "title": null}),
            json!({"uuid": "o-missing"}),
        ],
    );

    let report = harness
        .runner(ClassificationPolicy::Marker)
        .run_kinds(&[EntityKind::Organization])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_of(ORGANIZATIONS, "o-null"),
        Some(Err(RecordError::IntegrityViolation(_)))
    ));
    assert!(matches!(
        report.outcome_of(ORGANIZATIONS, "o-missing"),
        Some(Err(RecordError::InvalidDocument(_)))
    ));
}

#[tokio::test]
async fn test_event_without_local_calendar_is_rejected() {
    let harness = Harness::new();
    harness.remote.set_resource(
        "events",
        vec![json!({"uuid": "e-1", "title": "Market", "calendar": "cal-missing"})],
    );

    let report = harness
        .runner(ClassificationPolicy::Marker)
        .run_kinds(&[EntityKind::Event])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_of(Subject::Entity(EntityKind::Event), "e-1"),
        Some(Err(RecordError::ReferenceNotFound { kind: EntityKind::Calendar, .. }))
    ));
}

#[tokio::test]
async fn test_existing_lookups_are_reused() {
    let harness = Harness::new();
    let mut session = harness.session().await;
    session
        .save_legal_status(&pes_gateway_shared::types::LegalStatus {
            slug: "association-1901".into(),
            label: "Association".into(),
        })
        .await
        .unwrap();
    session.create_transverse_theme("Food").await.unwrap();
    session.commit().await.unwrap();
    full_remote(&harness.remote);
    harness.remote.set_resource(
        "organizations",
        vec![json!({
            "uuid": "o-1",
            "title": "Coop",
            "legal_status": "asso",
            "transverse_themes": [7, 99],
        })],
    );

    let report = harness
        .runner(ClassificationPolicy::Marker)
        .run_kinds(&[EntityKind::Organization])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_of(Subject::LegalStatus, "asso"),
        Some(Ok(RecordOutcome::Found))
    ));
    assert!(matches!(
        report.outcome_of(Subject::TransverseTheme, "8"),
        Some(Ok(RecordOutcome::Created))
    ));
    let organization = harness.organization("o-1").await.unwrap();
    assert_eq!(organization.legal_status.as_deref(), Some("association-1901"));
    assert_eq!(organization.transverse_themes, vec![1]);
}
