//! End-to-end gate scenarios over a temporary vault
//!
//! Run with: cargo test --package notegate-core --test gate_scenarios

use notegate_core::{Decision, GateId, GateVerdict, MutationRequest, RecordOutcome};
use notegate_test_utils::{assistant_read, read_event, session_id, user_message, TempVault};
use pretty_assertions::assert_eq;

fn edit(path: &str, session: &str) -> MutationRequest {
    MutationRequest::edit_in_place(path).with_session(session)
}

fn write(path: &str, session: &str) -> MutationRequest {
    MutationRequest::create_or_replace(path)
        .with_session(session)
        .with_content("# new\n")
}

#[test]
fn read_then_edit_scenario() {
    let vault = TempVault::new();
    let gate = vault.gate();
    let s1 = session_id();

    assert_eq!(gate.record_read(&s1, "notes/a.md"), RecordOutcome::Locked);

    let verdict = gate.evaluate(&edit("notes/a.md", &s1));
    assert_eq!(verdict.decision, Decision::Ask);
    assert_eq!(verdict.gate_id, GateId::Confirmation);
    assert_eq!(verdict.reason.as_deref(), Some("Confirm Edit to a.md?"));

    let verdict = gate.evaluate(&edit("notes/b.md", &s1));
    assert_eq!(verdict.decision, Decision::Deny);
    assert_eq!(verdict.gate_id, GateId::ReadBeforeWrite);

    let verdict = gate.evaluate(&edit("notes/missing.md", &s1));
    assert_eq!(verdict.decision, Decision::Deny);
    assert_eq!(verdict.gate_id, GateId::Existence);
    assert_eq!(
        verdict.reason.as_deref(),
        Some("File does not exist: notes/missing.md. Use Write to create new files.")
    );
}

#[test]
fn existence_wins_over_recorded_read() {
    let vault = TempVault::new();
    let gate = vault.gate();
    let s1 = session_id();

    gate.record_read(&s1, "notes/gone.md");
    let verdict = gate.evaluate(&edit("notes/gone.md", &s1));
    assert_eq!(verdict.gate_id, GateId::Existence);
    assert!(verdict.is_deny());
}

#[test]
fn create_new_file_asks_directly() {
    let vault = TempVault::new();
    let gate = vault.gate();

    let verdict = gate.evaluate(&write("notes/fresh.md", &session_id()));
    assert_eq!(verdict.decision, Decision::Ask);
    assert_eq!(verdict.gate_id, GateId::Confirmation);
    assert_eq!(verdict.reason.as_deref(), Some("Confirm Write to fresh.md?"));
}

#[test]
fn overwrite_behaves_like_edit_for_provenance() {
    let vault = TempVault::new();
    let gate = vault.gate();
    let s1 = session_id();

    let verdict = gate.evaluate(&write("existing.md", &s1));
    assert_eq!(verdict.gate_id, GateId::ReadBeforeWrite);
    assert!(verdict.reason.unwrap().contains("before overwriting"));

    gate.record_read(&s1, "existing.md");
    assert_eq!(gate.evaluate(&write("existing.md", &s1)).decision, Decision::Ask);
}

#[test]
fn ungoverned_extension_skips_read_requirement() {
    let vault = TempVault::new();
    let gate = vault.gate();

    let verdict = gate.evaluate(&edit("scripts/tool.py", &session_id()));
    assert_eq!(verdict.decision, Decision::Ask);
    assert_eq!(verdict.gate_id, GateId::Confirmation);
}

#[test]
fn reserved_directory_bypasses_every_gate() {
    let vault = TempVault::new();
    let gate = vault.gate();

    for request in [
        edit(".claude/hooks/notes.md", ""),
        edit(".claude/hooks/missing.md", ""),
        write(".claude/hooks/new.md", &session_id()),
    ] {
        assert_eq!(gate.evaluate(&request), GateVerdict::allow(GateId::Scope));
    }

    let absolute = vault.path(".claude/hooks/notes.md");
    let verdict = gate.evaluate(&edit(&absolute.to_string_lossy(), ""));
    assert_eq!(verdict, GateVerdict::allow(GateId::Scope));
}

#[test]
fn empty_path_is_noop_allow() {
    let vault = TempVault::new();
    let verdict = vault.gate().evaluate(&edit("", &session_id()));
    assert_eq!(verdict, GateVerdict::allow(GateId::Scope));
}

#[test]
fn missing_session_fails_closed() {
    let vault = TempVault::new();
    let gate = vault.gate();
    let history = vault.history("anon", &[read_event(vault.path("notes/a.md"))]);

    let verdict = gate.evaluate(&edit("notes/a.md", "").with_history(history));
    assert_eq!(verdict.gate_id, GateId::ReadBeforeWrite);
    assert!(verdict.is_deny());
}

#[test]
fn history_alone_is_evidence() {
    let vault = TempVault::new();
    let gate = vault.gate();
    let s1 = session_id();
    let history = vault.history(
        &s1,
        &[
            user_message("please tidy the notes"),
            read_event("notes/a.md"),
            assistant_read(vault.path("notes/b.md")),
        ],
    );

    for target in ["notes/a.md", "./notes/b.md"] {
        let verdict = gate.evaluate(&edit(target, &s1).with_history(&history));
        assert_eq!(verdict.decision, Decision::Ask, "{target}");
    }
    let verdict = gate.evaluate(&edit("existing.md", &s1).with_history(&history));
    assert_eq!(verdict.gate_id, GateId::ReadBeforeWrite);
}

#[test]
fn store_covers_truncated_history() {
    let vault = TempVault::new();
    let gate = vault.gate();
    let s1 = session_id();

    gate.record_read(&s1, "notes/a.md");
    let summarized = vault.history(&s1, &[user_message("[conversation summarized]")]);
    let verdict = gate.evaluate(&edit("notes/a.md", &s1).with_history(&summarized));
    assert_eq!(verdict.decision, Decision::Ask);

    let missing = vault.state_dir().join("does-not-exist.jsonl");
    let verdict = gate.evaluate(&edit("notes/a.md", &s1).with_history(missing));
    assert_eq!(verdict.decision, Decision::Ask);
}

#[test]
fn malformed_history_lines_are_skipped() {
    let vault = TempVault::new();
    let gate = vault.gate();
    let s1 = session_id();
    let history = vault.state_dir().join("mixed.jsonl");
    std::fs::write(
        &history,
        format!("{{broken\n\n{}\nnot json either\n", read_event("notes/a.md")),
    )
    .unwrap();

    assert_eq!(
        gate.evaluate(&edit("notes/a.md", &s1).with_history(&history)).decision,
        Decision::Ask
    );
}

#[test]
fn reads_are_per_session() {
    let vault = TempVault::new();
    let gate = vault.gate();
    let (s1, s2) = (session_id(), session_id());

    gate.record_read(&s1, "notes/a.md");
    assert!(gate.has_read(&s1, "notes/a.md"));
    assert!(!gate.has_read(&s2, "notes/a.md"));
    assert_eq!(gate.evaluate(&edit("notes/a.md", &s2)).gate_id, GateId::ReadBeforeWrite);
}

#[test]
fn reads_persist_across_gate_instances() {
    let vault = TempVault::new();
    let s1 = session_id();

    vault.gate().record_read(&s1, "notes/a.md");
    assert_eq!(vault.gate().evaluate(&edit("notes/a.md", &s1)).decision, Decision::Ask);
}

#[test]
fn alternate_spellings_share_one_record() {
    let vault = TempVault::new();
    let gate = vault.gate();
    let s1 = session_id();

    gate.record_read(&s1, "./notes/a.md");
    gate.record_read(&s1, "notes/../notes/a.md");
    gate.record_read(&s1, &vault.path("notes/a.md").to_string_lossy());

    let stored = std::fs::read(vault.state_dir().join(format!("reads/{s1}.json"))).unwrap();
    let stored: Vec<String> = serde_json::from_slice(&stored).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(gate.evaluate(&edit("notes/a.md", &s1)).decision, Decision::Ask);
}

#[cfg(unix)]
#[test]
fn symlinked_spelling_shares_provenance() {
    let vault = TempVault::new();
    let gate = vault.gate();
    let s1 = session_id();
    std::os::unix::fs::symlink(vault.path("notes"), vault.path("linked")).unwrap();

    gate.record_read(&s1, "linked/a.md");
    assert_eq!(gate.evaluate(&edit("notes/a.md", &s1)).decision, Decision::Ask);
}

#[test]
fn opaque_session_tokens_get_provenance() {
    let vault = TempVault::new();
    let gate = vault.gate();

    for token in ["c2Vzc2lvbg==", "a:b", "../outside"] {
        let history = vault.history("opaque", &[read_event("notes/a.md")]);
        let verdict = gate.evaluate(&edit("notes/a.md", token).with_history(history));
        assert_eq!(verdict.decision, Decision::Ask, "{token}");

        assert_eq!(gate.evaluate(&edit("notes/b.md", token)).gate_id, GateId::ReadBeforeWrite, "{token}");
        assert_eq!(gate.record_read(token, "notes/b.md"), RecordOutcome::Locked, "{token}");
        assert_eq!(gate.evaluate(&edit("notes/b.md", token)).decision, Decision::Ask, "{token}");
    }
    assert!(!vault.state_dir().join("outside.json").exists());
    assert!(!gate.has_read("a;b", "notes/b.md"));
}

#[cfg(unix)]
#[test]
fn link_with_governed_name_needs_a_read() {
    let vault = TempVault::new();
    let gate = vault.gate();
    let s1 = session_id();
    std::os::unix::fs::symlink(vault.path("scripts/tool.py"), vault.path("notes/link.md")).unwrap();

    let verdict = gate.evaluate(&edit("notes/link.md", &s1));
    assert_eq!(verdict.decision, Decision::Deny);
    assert_eq!(verdict.gate_id, GateId::ReadBeforeWrite);
    assert!(verdict
        .reason
        .unwrap()
        .starts_with("Must read 'link.md (resolves to tool.py)' before editing."));

    assert_eq!(gate.record_read(&s1, "notes/link.md"), RecordOutcome::Locked);
    let verdict = gate.evaluate(&edit("notes/link.md", &s1));
    assert_eq!(verdict.decision, Decision::Ask);
    assert_eq!(verdict.reason.as_deref(), Some("Confirm Edit to link.md (resolves to tool.py)?"));

    let direct = gate.evaluate(&edit("scripts/tool.py", &session_id()));
    assert_eq!(direct.reason.as_deref(), Some("Confirm Edit to tool.py?"));
}
