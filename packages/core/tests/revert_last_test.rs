//! Revert-last flow: round trips, single shot, authorization

mod common;

use common::{child_titles, fixture, snapshot, SPACE};
use pagetree_core::db::PageStore;
use pagetree_core::models::{PageRef, TemplateId};
use pagetree_core::operations::{
    AddPage, Command, CommandError, InsertTemplate, MovePage, RemovePage, RenamePage,
};
use pagetree_core::services::{PageTreeServiceError, KNOWLEDGE_BASE_BLUEPRINT};

#[tokio::test]
async fn test_spec_and_impl_scenario() {
    let fx = fixture().await;

    let outcome = fx
        .service
        .manage(
            SPACE,
            "alice",
            vec![
                Command::AddPage(AddPage::new("Spec", "p1", PageRef::from(fx.home))),
                Command::AddPage(AddPage::new("Impl", "p2", PageRef::placeholder("p1"))),
            ],
        )
        .await
        .unwrap();

    let spec = match &outcome.executed[0] {
        Command::AddPage(cmd) => cmd.created_page_id.unwrap(),
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(child_titles(fx.store.as_ref(), fx.home).await, vec!["Spec"]);
    assert_eq!(child_titles(fx.store.as_ref(), spec).await, vec!["Impl"]);

    fx.service.revert_last(SPACE, "alice").await.unwrap();
    assert!(child_titles(fx.store.as_ref(), fx.home).await.is_empty());
    assert_eq!(fx.store.live_page_count().await, 1);
}

#[tokio::test]
async fn test_revert_last_restores_exact_shape() {
    let fx = fixture().await;
    let a = fx.store.create_page(fx.home, "A").await.unwrap();
    let b = fx.store.create_page(a, "B").await.unwrap();
    fx.store.create_page(b, "B1").await.unwrap();
    fx.store.create_page(b, "B2").await.unwrap();
    let c = fx.store.create_page(fx.home, "C").await.unwrap();
    let d = fx.store.create_page(fx.home, "D").await.unwrap();
    let before = snapshot(fx.store.as_ref(), fx.home).await;

    fx.service
        .manage(
            SPACE,
            "alice",
            vec![
                Command::RenamePage(RenamePage::new(PageRef::from(b), "B renamed")),
                Command::AddPage(AddPage::new("E", "j1", PageRef::from(c))),
                Command::MovePage(MovePage::new(PageRef::from(d), Some(PageRef::placeholder("j1")), None)),
                Command::RemovePage(RemovePage::new(PageRef::from(a))),
                Command::InsertTemplate(
                    InsertTemplate::new(
                        PageRef::from(fx.home),
                        TemplateId::FromBlueprint {
                            blueprint_key: KNOWLEDGE_BASE_BLUEPRINT.to_string(),
                        },
                    )
                    .with_placeholder("1", "j2"),
                ),
                Command::MovePage(MovePage::new(PageRef::from(c), Some(PageRef::placeholder("j2")), Some(0))),
            ],
        )
        .await
        .unwrap();
    assert_ne!(snapshot(fx.store.as_ref(), fx.home).await, before);

    fx.service.revert_last(SPACE, "alice").await.unwrap();
    assert_eq!(snapshot(fx.store.as_ref(), fx.home).await, before);
}

#[tokio::test]
async fn test_revert_last_is_single_shot() {
    let fx = fixture().await;
    fx.service
        .manage(
            SPACE,
            "alice",
            vec![Command::AddPage(AddPage::new("A", "j1", PageRef::from(fx.home)))],
        )
        .await
        .unwrap();

    fx.service.revert_last(SPACE, "alice").await.unwrap();
    assert_eq!(
        fx.service.revert_last(SPACE, "alice").await,
        Err(PageTreeServiceError::NoLastChanges)
    );
}

#[tokio::test]
async fn test_revert_without_history_reports_no_last_changes() {
    let fx = fixture().await;
    assert_eq!(
        fx.service.revert_last(SPACE, "alice").await,
        Err(PageTreeServiceError::NoLastChanges)
    );
}

#[tokio::test]
async fn test_other_user_cannot_revert() {
    let fx = fixture().await;
    fx.service
        .manage(
            SPACE,
            "alice",
            vec![Command::AddPage(AddPage::new("A", "j1", PageRef::from(fx.home)))],
        )
        .await
        .unwrap();
    let after_batch = snapshot(fx.store.as_ref(), fx.home).await;
    let entry_before = fx.service.change_log().load(SPACE).await.unwrap();

    assert!(matches!(
        fx.service.revert_last(SPACE, "bob").await,
        Err(PageTreeServiceError::Unauthorized(_))
    ));
    assert_eq!(snapshot(fx.store.as_ref(), fx.home).await, after_batch);
    assert_eq!(fx.service.change_log().load(SPACE).await.unwrap(), entry_before);

    fx.service.revert_last(SPACE, "alice").await.unwrap();
}

#[tokio::test]
async fn test_no_op_rename_and_move_round_trip() {
    let fx = fixture().await;
    let a = fx.store.create_page(fx.home, "A").await.unwrap();
    fx.store.create_page(fx.home, "B").await.unwrap();
    let before = snapshot(fx.store.as_ref(), fx.home).await;

    let outcome = fx
        .service
        .manage(
            SPACE,
            "alice",
            vec![
                Command::RenamePage(RenamePage::new(PageRef::from(a), "A")),
                Command::MovePage(MovePage::new(PageRef::from(a), Some(PageRef::from(fx.home)), Some(0))),
            ],
        )
        .await
        .unwrap();
    assert_eq!(snapshot(fx.store.as_ref(), fx.home).await, before);

    match &outcome.executed[0] {
        Command::RenamePage(cmd) => {
            assert_eq!(cmd.renamed_page_id, Some(a));
            assert_eq!(cmd.old_title.as_deref(), Some("A"));
        }
        other => panic!("unexpected {:?}", other),
    }
    match &outcome.executed[1] {
        Command::MovePage(cmd) => assert!(cmd.moved_page.is_some()),
        other => panic!("unexpected {:?}", other),
    }

    fx.service.revert_last(SPACE, "alice").await.unwrap();
    assert_eq!(snapshot(fx.store.as_ref(), fx.home).await, before);
}

#[tokio::test]
async fn test_add_then_no_op_moves() {
    let fx = fixture().await;
    fx.service
        .manage(
            SPACE,
            "alice",
            vec![
                Command::AddPage(AddPage::new("A", "j1", PageRef::from(fx.home))),
                Command::MovePage(MovePage::new(PageRef::placeholder("j1"), None, Some(0))),
                Command::MovePage(MovePage::new(
                    PageRef::placeholder("j1"),
                    Some(PageRef::from(fx.home)),
                    None,
                )),
            ],
        )
        .await
        .unwrap();
    assert_eq!(child_titles(fx.store.as_ref(), fx.home).await, vec!["A"]);

    fx.service.revert_last(SPACE, "alice").await.unwrap();
    assert!(child_titles(fx.store.as_ref(), fx.home).await.is_empty());
}

#[tokio::test]
async fn test_failed_revert_keeps_log_for_retry() {
    let fx = fixture().await;
    let a = fx.store.create_page(fx.home, "A").await.unwrap();
    fx.service
        .manage(
            SPACE,
            "alice",
            vec![Command::RemovePage(RemovePage::new(PageRef::from(a)))],
        )
        .await
        .unwrap();

    fx.store.fail_restores(true);
    let err = fx.service.revert_last(SPACE, "alice").await.unwrap_err();
    assert!(matches!(
        err,
        PageTreeServiceError::RevertFailed {
            index: 0,
            source: CommandError::Store(_)
        }
    ));
    assert!(fx.service.change_log().load(SPACE).await.unwrap().is_some());

    fx.store.fail_restores(false);
    fx.service.revert_last(SPACE, "alice").await.unwrap();
    assert_eq!(child_titles(fx.store.as_ref(), fx.home).await, vec!["A"]);
    assert!(fx.service.change_log().load(SPACE).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_revert_resumes_at_failed_command() {
    let fx = fixture().await;
    let a = fx.store.create_page(fx.home, "A").await.unwrap();
    let before = snapshot(fx.store.as_ref(), fx.home).await;
    fx.service
        .manage(
            SPACE,
            "alice",
            vec![
                Command::RemovePage(RemovePage::new(PageRef::from(a))),
                Command::AddPage(AddPage::new("X", "j1", PageRef::from(fx.home))),
            ],
        )
        .await
        .unwrap();

    fx.store.fail_restores(true);
    let err = fx.service.revert_last(SPACE, "alice").await.unwrap_err();
    assert!(matches!(
        err,
        PageTreeServiceError::RevertFailed { index: 0, .. }
    ));
    // X is already gone; only the removal is left to undo
    assert!(child_titles(fx.store.as_ref(), fx.home).await.is_empty());
    let entry = fx.service.change_log().load(SPACE).await.unwrap().unwrap();
    assert_eq!(entry.executed_commands.len(), 1);
    assert!(matches!(entry.executed_commands[0], Command::RemovePage(_)));
    assert_eq!(entry.user_key, "alice");

    fx.store.fail_restores(false);
    fx.service.revert_last(SPACE, "alice").await.unwrap();
    assert_eq!(snapshot(fx.store.as_ref(), fx.home).await, before);
    assert!(fx.service.change_log().load(SPACE).await.unwrap().is_none());
}

#[tokio::test]
async fn test_interrupted_subtree_restore_can_be_retried() {
    let fx = fixture().await;
    let a = fx.store.create_page(fx.home, "A").await.unwrap();
    let b = fx.store.create_page(a, "B").await.unwrap();
    fx.store.create_page(b, "B1").await.unwrap();
    fx.store.create_page(a, "C").await.unwrap();
    let before = snapshot(fx.store.as_ref(), fx.home).await;

    fx.service
        .manage(
            SPACE,
            "alice",
            vec![Command::RemovePage(RemovePage::new(PageRef::from(a)))],
        )
        .await
        .unwrap();

    // A and B come back, B1 does not
    fx.store.fail_restores_after(2);
    let err = fx.service.revert_last(SPACE, "alice").await.unwrap_err();
    assert!(matches!(
        err,
        PageTreeServiceError::RevertFailed { index: 0, .. }
    ));
    assert_eq!(child_titles(fx.store.as_ref(), a).await, vec!["B"]);
    assert!(child_titles(fx.store.as_ref(), b).await.is_empty());

    fx.store.fail_restores(false);
    fx.service.revert_last(SPACE, "alice").await.unwrap();
    assert_eq!(snapshot(fx.store.as_ref(), fx.home).await, before);
    assert_eq!(fx.store.live_page_count().await, 5);
}

#[tokio::test]
async fn test_spaces_have_independent_logs() {
    let fx = fixture().await;
    let other_home = fx.service.ensure_space("OTHER", "Other").await.unwrap();

    fx.service
        .manage(
            SPACE,
            "alice",
            vec![Command::AddPage(AddPage::new("A", "j1", PageRef::from(fx.home)))],
        )
        .await
        .unwrap();
    fx.service
        .manage(
            "OTHER",
            "bob",
            vec![Command::AddPage(AddPage::new("X", "j1", PageRef::from(other_home)))],
        )
        .await
        .unwrap();

    fx.service.revert_last("OTHER", "bob").await.unwrap();
    assert_eq!(child_titles(fx.store.as_ref(), fx.home).await, vec!["A"]);
    assert!(child_titles(fx.store.as_ref(), other_home).await.is_empty());
}
