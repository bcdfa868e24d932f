#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::error::{MalformedReason, MergeError, RenderError};

fn logic(imports: &[&str], entries: &[(&str, &str)]) -> ResolvedArtifact {
    let mut content = String::from("// Code generated by svcgen from order.proto.\n\n");
    content.push_str("// svcgen:imports:begin\n");
    for import in imports {
        content.push_str(import);
        content.push('\n');
    }
    content.push_str("// svcgen:imports:end\n\n// svcgen:entries:begin\n");
    for (key, body) in entries {
        content.push_str(&format!("// svcgen:entry {key}\n{body}\n\n"));
    }
    content.push_str("// svcgen:entries:end\n");
    ResolvedArtifact {
        kind: ArtifactKind::LogicStub,
        content,
    }
}

fn codes(keys: &[(&str, &str)]) -> ResolvedArtifact {
    let mut content = String::from(
        "// Code generated by svcgen from order.proto.\n\n// svcgen:imports:begin\n// svcgen:imports:end\n\n// svcgen:entries:begin\n",
    );
    for (key, name) in keys {
        content.push_str(&format!(
            "// svcgen:entry {key}\npub const {name}: u32 = @@svcgen:code@@;\n"
        ));
    }
    content.push_str("// svcgen:entries:end\n");
    ResolvedArtifact {
        kind: ArtifactKind::ErrorCodeTable,
        content,
    }
}

fn merge(existing: Option<&str>, fresh: &ResolvedArtifact) -> MergeOutcome {
    Merger::default().merge(existing, fresh).unwrap()
}

fn malformed(existing: &str, fresh: &ResolvedArtifact) -> MalformedReason {
    match Merger::default().merge(Some(existing), fresh) {
        Err(MergeError::MalformedTarget(m)) => m.reason,
        other => panic!("expected malformed target, got {other:?}"),
    }
}

const CREATE: (&str, &str) = ("Order.Create", "fn order_create() {}");
const GET: (&str, &str) = ("Order.Get", "fn order_get() {}");
const CANCEL: (&str, &str) = ("Order.Cancel", "fn order_cancel() {}");

#[test]
fn test_first_generation_writes_fresh_verbatim() {
    let fresh = logic(&["use tonic::Status;"], &[CREATE, GET]);
    let outcome = merge(None, &fresh);
    assert_eq!(outcome.content, fresh.content);
    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.preserved, 0);
    assert!(outcome.changed);
    assert!(outcome.stale.is_empty());
}

#[test]
fn test_merge_is_idempotent() {
    let fresh = logic(&["use a::A;", "use b::B;"], &[CREATE, GET]);
    let first = merge(None, &fresh);
    let second = merge(Some(&first.content), &fresh);
    assert_eq!(second.content, first.content);
    assert!(!second.changed);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.preserved, 2);
}

#[test]
fn test_user_edits_survive_and_new_entries_append() {
    let existing = "\
// my header
// svcgen:imports:begin
use tonic::Status;
// svcgen:imports:end
use crate::db::Pool;

// svcgen:entries:begin
// svcgen:entry Order.Create
pub async fn order_create() {
    // real implementation
    Pool::insert();
}

// svcgen:entries:end

fn helper() {}
";
    let fresh = logic(&["use tonic::Status;", "use crate::pb::GetRequest;"], &[GET, CREATE, CANCEL]);
    let outcome = merge(Some(existing), &fresh);

    let expected = "\
// my header
// svcgen:imports:begin
use crate::pb::GetRequest;
use tonic::Status;
// svcgen:imports:end
use crate::db::Pool;

// svcgen:entries:begin
// svcgen:entry Order.Create
pub async fn order_create() {
    // real implementation
    Pool::insert();
}

// svcgen:entry Order.Get
fn order_get() {}

// svcgen:entry Order.Cancel
fn order_cancel() {}

// svcgen:entries:end

fn helper() {}
";
    assert_eq!(outcome.content, expected);
    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.preserved, 1);
    assert!(outcome.changed);
}

#[test]
fn test_import_union_keeps_user_imports() {
    let existing = logic(&["use std::sync::Arc;", "use tonic::Status;"], &[CREATE]).content;
    let fresh = logic(&["use tonic::Status;", "use crate::pb::A;"], &[CREATE]);
    let outcome = merge(Some(&existing), &fresh);
    assert!(outcome
        .content
        .contains("// svcgen:imports:begin\nuse crate::pb::A;\nuse std::sync::Arc;\nuse tonic::Status;\n// svcgen:imports:end\n"));
}

#[test]
fn test_grouped_import_moves_as_one_statement() {
    let existing = logic(&["use tonic::Status;", "use std::{", "    fmt,", "    io,", "};"], &[CREATE]).content;
    let fresh = logic(&["use tonic::Status;", "use crate::pb::A;"], &[CREATE]);
    let outcome = merge(Some(&existing), &fresh);
    assert!(outcome.content.contains(
        "// svcgen:imports:begin\nuse crate::pb::A;\nuse std::{\n    fmt,\n    io,\n};\nuse tonic::Status;\n// svcgen:imports:end\n"
    ));

    let again = merge(Some(&outcome.content), &fresh);
    assert!(!again.changed);
}

#[test]
fn test_unterminated_import_is_malformed() {
    let existing = logic(&["use std::{", "    fmt,"], &[CREATE]).content;
    let fresh = logic(&["use tonic::Status;"], &[CREATE]);
    assert_eq!(
        malformed(&existing, &fresh),
        MalformedReason::UnterminatedImport { line: 4 }
    );
}

#[test]
fn test_blank_existing_file_is_generated_fresh() {
    let fresh = logic(&["use tonic::Status;"], &[CREATE, GET]);
    for blank in ["", "\n", "  \r\n\t\n"] {
        let outcome = merge(Some(blank), &fresh);
        assert_eq!(outcome.content, fresh.content);
        assert_eq!(outcome.inserted, 2);
        assert!(outcome.changed);
    }

    let table = codes(&[("Order.Create", "ORDER_CREATE")]);
    let outcome = merge(Some(""), &table);
    assert!(outcome.content.contains("pub const ORDER_CREATE: u32 = 1000;\n"));
}

#[test]
fn test_empty_fresh_leaves_existing_alone() {
    let existing = logic(&[], &[CREATE]).content;
    let empty = ResolvedArtifact {
        kind: ArtifactKind::LogicStub,
        content: String::new(),
    };
    let outcome = merge(Some(&existing), &empty);
    assert_eq!(outcome.content, existing);
    assert!(!outcome.changed);

    let outcome = merge(None, &empty);
    assert!(outcome.content.is_empty());
    assert!(!outcome.changed);
}

#[test]
fn test_stale_entries_reported_and_kept() {
    let existing = logic(&[], &[CREATE, CANCEL]).content;
    let fresh = logic(&[], &[CREATE]);
    let outcome = merge(Some(&existing), &fresh);
    assert_eq!(outcome.stale, ["Order.Cancel"]);
    assert_eq!(outcome.pruned, 0);
    assert_eq!(outcome.preserved, 2);
    assert_eq!(outcome.content, existing);
    assert!(!outcome.changed);
}

#[test]
fn test_prune_removes_stale_entries() {
    let existing = logic(&[], &[CANCEL, CREATE]).content;
    let fresh = logic(&[], &[CREATE]);
    let outcome = Merger::default()
        .prune_stale(true)
        .merge(Some(&existing), &fresh)
        .unwrap();
    assert_eq!(outcome.content, fresh.content);
    assert_eq!(outcome.pruned, 1);
    assert_eq!(outcome.preserved, 1);
    assert_eq!(outcome.stale, ["Order.Cancel"]);
    assert!(outcome.changed);
}

#[test]
fn test_crlf_file_keeps_crlf() {
    let existing = logic(&["use tonic::Status;"], &[CREATE])
        .content
        .replace('\n', "\r\n");
    let fresh = logic(&["use tonic::Status;", "use a::A;"], &[CREATE, GET]);
    let outcome = merge(Some(&existing), &fresh);
    assert!(!outcome.content.replace("\r\n", "").contains('\n'));
    assert!(outcome.content.contains("use a::A;\r\nuse tonic::Status;\r\n"));
    assert!(outcome
        .content
        .contains("// svcgen:entry Order.Get\r\nfn order_get() {}\r\n\r\n// svcgen:entries:end\r\n"));
}

#[test]
fn test_malformed_existing_files() {
    let fresh = logic(&[], &[CREATE]);
    let good = logic(&[], &[CREATE]).content;

    let missing = good.replace("// svcgen:imports:end\n", "");
    assert_eq!(
        malformed(&missing, &fresh),
        MalformedReason::MissingMarker {
            marker: "// svcgen:imports:end".into()
        }
    );

    let doubled = format!("{good}// svcgen:entries:begin\n");
    assert!(matches!(
        malformed(&doubled, &fresh),
        MalformedReason::DuplicateMarker { .. }
    ));

    let stray = format!("// svcgen:entry Order.Get\n{good}");
    assert_eq!(
        malformed(&stray, &fresh),
        MalformedReason::StrayEntryMarker { line: 1 }
    );

    let duplicate = logic(&[], &[CREATE, CREATE]).content;
    assert!(matches!(
        malformed(&duplicate, &fresh),
        MalformedReason::DuplicateEntry { ref key, .. } if key == "Order.Create"
    ));
}

#[test]
fn test_broken_fresh_artifact_is_a_render_error() {
    let mut fresh = logic(&[], &[CREATE]);
    fresh.content = fresh.content.replace("// svcgen:entries:end\n", "");
    let err = Merger::default().merge(None, &fresh).unwrap_err();
    assert!(matches!(
        err,
        MergeError::Render(RenderError::FreshArtifact { .. })
    ));
}

#[test]
fn test_first_error_table_assigns_codes_in_order() {
    let fresh = codes(&[("Order.Create", "ORDER_CREATE"), ("Order.Get", "ORDER_GET")]);
    let outcome = merge(None, &fresh);
    assert!(!outcome.content.contains("@@svcgen:code@@"));
    assert_eq!(
        outcome.content,
        fresh
            .content
            .replacen("@@svcgen:code@@", "1000", 1)
            .replacen("@@svcgen:code@@", "1001", 1)
    );
    assert_eq!(outcome.inserted, 2);
}

#[test]
fn test_error_codes_are_stable_and_never_reused() {
    let merger = Merger::default().first_error_code(1000).prune_stale(true);
    let v1 = codes(&[("Order.Create", "ORDER_CREATE"), ("Order.Get", "ORDER_GET")]);
    let first = merger.merge(None, &v1).unwrap();

    // Get removed, Cancel added
    let v2 = codes(&[("Order.Create", "ORDER_CREATE"), ("Order.Cancel", "ORDER_CANCEL")]);
    let second = merger.merge(Some(&first.content), &v2).unwrap();
    assert!(second.content.contains("pub const ORDER_CREATE: u32 = 1000;"));
    assert!(second.content.contains("pub const ORDER_GET: u32 = 1001;"));
    assert!(second.content.contains("pub const ORDER_CANCEL: u32 = 1002;"));
    assert_eq!(second.stale, ["Order.Get"]);
    assert_eq!(second.pruned, 0);

    let third = merger.merge(Some(&second.content), &v2).unwrap();
    assert!(!third.changed);
}

#[test]
fn test_error_codes_continue_above_hand_edited_max() {
    let existing = codes(&[("Order.Create", "ORDER_CREATE")])
        .content
        .replace("@@svcgen:code@@", "4_200");
    let fresh = codes(&[("Order.Create", "ORDER_CREATE"), ("Order.Get", "ORDER_GET")]);
    let outcome = merge(Some(&existing), &fresh);
    assert!(outcome.content.contains("pub const ORDER_CREATE: u32 = 4_200;"));
    assert!(outcome.content.contains("pub const ORDER_GET: u32 = 4201;"));
}

#[test]
fn test_unreadable_error_code_is_malformed() {
    let existing = codes(&[("Order.Create", "ORDER_CREATE")]).content;
    let fresh = codes(&[("Order.Create", "ORDER_CREATE")]);
    assert_eq!(
        malformed(&existing, &fresh),
        MalformedReason::InvalidErrorCode {
            key: "Order.Create".into(),
            line: 7
        }
    );
}

#[test]
fn test_error_code_space_exhausted() {
    let existing = codes(&[("Order.Create", "ORDER_CREATE")])
        .content
        .replace("@@svcgen:code@@", &u32::MAX.to_string());
    let fresh = codes(&[("Order.Create", "ORDER_CREATE"), ("Order.Get", "ORDER_GET")]);
    assert_eq!(
        malformed(&existing, &fresh),
        MalformedReason::CodesExhausted {
            key: "Order.Get".into()
        }
    );
}
