//! Integration tests for the template aggregate store.
//!
//! Covers field ordering, wholesale field replacement, the derived `is_used`
//! flag and the restrict-on-delete rule for templates referenced by notes.

use inkwell_core::{
    ConstraintKind, NewField, NewNote, NewTemplate, NoteRepository, Storage, TemplateFilters,
    TemplateRepository, TemplateUpdate, TransactionManager,
};
use inkwell_db::test_fixtures::TestDatabase;
use uuid::Uuid;

fn field(label: &str, order: i32, is_required: bool) -> NewField {
    NewField {
        label: label.to_string(),
        order,
        is_required,
    }
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_get_returns_fields_in_order_with_owner() {
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;
    let owner = test_db.create_account("Template", "Owner").await;

    let mut tx = db.begin().await.unwrap();
    let template = db
        .templates()
        .create(
            &mut tx,
            NewTemplate {
                name: "Design Doc".to_string(),
                owner_id: owner.id,
            },
        )
        .await
        .unwrap();
    // inserted out of order on purpose
    db.templates()
        .replace_fields(
            &mut tx,
            template.id,
            vec![
                field("Notes", 3, false),
                field("Background", 1, true),
                field("Solution", 2, true),
            ],
        )
        .await
        .unwrap();
    db.commit(tx).await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let view = db.templates().get(&mut tx, template.id).await.unwrap();
    db.commit(tx).await.unwrap();

    let labels: Vec<_> = view
        .template
        .fields
        .iter()
        .map(|f| (f.label.as_str(), f.order))
        .collect();
    assert_eq!(labels, vec![("Background", 1), ("Solution", 2), ("Notes", 3)]);
    assert!(view.template.fields[0].is_required);
    assert_eq!(view.owner.id, owner.id);
    assert_eq!(view.owner.first_name, "Template");
    assert!(!view.is_used);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_get_unknown_template_is_not_found() {
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;

    let mut tx = db.begin().await.unwrap();
    let err = db.templates().get(&mut tx, Uuid::now_v7()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_create_with_unknown_owner_is_foreign_key_violation() {
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;

    let mut tx = db.begin().await.unwrap();
    let err = db
        .templates()
        .create(
            &mut tx,
            NewTemplate {
                name: "Orphan".to_string(),
                owner_id: Uuid::now_v7(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::ForeignKey));
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_replace_fields_twice_leaves_exactly_that_set() {
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;
    let owner = test_db.create_account("Template", "Owner").await;
    let template = test_db
        .create_template(owner.id, "Retro", &[("Old A", false), ("Old B", false)])
        .await;

    let replacement = vec![field("Went well", 1, true), field("To improve", 2, false)];
    for _ in 0..2 {
        let mut tx = db.begin().await.unwrap();
        db.templates()
            .replace_fields(&mut tx, template.template.id, replacement.clone())
            .await
            .unwrap();
        db.commit(tx).await.unwrap();
    }

    let mut tx = db.begin().await.unwrap();
    let view = db.templates().get(&mut tx, template.template.id).await.unwrap();
    db.commit(tx).await.unwrap();

    let labels: Vec<_> = view.template.fields.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, vec!["Went well", "To improve"]);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_replace_fields_duplicate_order_is_unique_violation() {
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;
    let owner = test_db.create_account("Template", "Owner").await;
    let template = test_db.create_template(owner.id, "Dupes", &[]).await;

    let mut tx = db.begin().await.unwrap();
    let err = db
        .templates()
        .replace_fields(
            &mut tx,
            template.template.id,
            vec![field("A", 1, false), field("B", 1, false)],
        )
        .await
        .unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::Unique));
    db.rollback(tx).await.unwrap();

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_update_changes_name_only() {
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;
    let owner = test_db.create_account("Template", "Owner").await;
    let template = test_db
        .create_template(owner.id, "Before", &[("Only", false)])
        .await;

    let mut tx = db.begin().await.unwrap();
    let updated = db
        .templates()
        .update(
            &mut tx,
            TemplateUpdate {
                id: template.template.id,
                name: Some("After".to_string()),
            },
        )
        .await
        .unwrap();
    db.commit(tx).await.unwrap();

    assert_eq!(updated.name, "After");
    assert_eq!(updated.owner_id, owner.id);
    assert_eq!(updated.fields.len(), 1);
    assert!(updated.updated_at >= template.template.updated_at);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_delete_in_use_iff_notes_reference_template() {
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;
    let owner = test_db.create_account("Template", "Owner").await;
    let used = test_db.create_template(owner.id, "Used", &[("A", false)]).await;
    let unused = test_db
        .create_template(owner.id, "Unused", &[("A", false)])
        .await;

    let mut tx = db.begin().await.unwrap();
    db.notes()
        .create(
            &mut tx,
            NewNote {
                title: "Pins the template".to_string(),
                template_id: used.template.id,
                owner_id: owner.id,
                status: None,
            },
        )
        .await
        .unwrap();
    db.commit(tx).await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let view = db.templates().get(&mut tx, used.template.id).await.unwrap();
    assert!(view.is_used);
    let err = db
        .templates()
        .delete(&mut tx, used.template.id)
        .await
        .unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::InUse));
    db.rollback(tx).await.unwrap();

    let mut tx = db.begin().await.unwrap();
    db.templates()
        .delete(&mut tx, unused.template.id)
        .await
        .unwrap();
    let err = db
        .templates()
        .get(&mut tx, unused.template.id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    db.commit(tx).await.unwrap();

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_list_filters_by_owner_and_query() {
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;
    let alice = test_db.create_account("Alice", "A").await;
    let bob = test_db.create_account("Bob", "B").await;
    let first = test_db
        .create_template(alice.id, "Weekly Review", &[("A", false)])
        .await;
    let second = test_db
        .create_template(alice.id, "Incident 100%", &[("A", false), ("B", false)])
        .await;
    test_db
        .create_template(bob.id, "Weekly Plan", &[("A", false)])
        .await;

    let mut tx = db.begin().await.unwrap();

    let mine = db
        .templates()
        .list(
            &mut tx,
            TemplateFilters {
                owner_id: Some(alice.id),
                query: None,
            },
        )
        .await
        .unwrap();
    let ids: Vec<_> = mine.iter().map(|t| t.template.id).collect();
    // newest first
    assert_eq!(ids, vec![second.template.id, first.template.id]);
    assert_eq!(mine[0].template.fields.len(), 2);

    let weekly = db
        .templates()
        .list(
            &mut tx,
            TemplateFilters {
                owner_id: Some(alice.id),
                query: Some("weekly".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(weekly.len(), 1);
    assert_eq!(weekly[0].template.id, first.template.id);

    // a literal percent sign must not act as a wildcard
    let percent = db
        .templates()
        .list(
            &mut tx,
            TemplateFilters {
                owner_id: Some(alice.id),
                query: Some("100%".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].template.id, second.template.id);

    db.commit(tx).await.unwrap();
    test_db.cleanup().await;
}
