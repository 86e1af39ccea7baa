//! Integration tests for success and error message resolution.

use actuate_action::prelude::*;
use actuate_action::{DEFAULT_ERROR, DEFAULT_SUCCESS, RuntimeConfig};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
#[error("the disk is full")]
struct DiskFull;

#[derive(Debug, thiserror::Error)]
#[error("timed out after {0}s")]
struct Timeout(u32);

fn raising(builder: ActionBuilder) -> Action {
    builder
        .expects("kind", Field::new().default("disk"))
        .body(|ctx| match ctx.input_as::<String>("kind")?.as_str() {
            "disk" => Err(DiskFull.into()),
            "timeout" => Err(Timeout(30).into()),
            "fail" => Err(fail("")),
            _ => Ok(()),
        })
        .build()
        .unwrap()
}

fn error_of(action: &Action, kind: &str) -> String {
    action
        .call(json!({ "kind": kind }))
        .error()
        .unwrap()
        .to_string()
}

#[test]
fn later_rules_take_precedence() {
    let action = raising(
        ActionBuilder::new("Layered")
            .error("first")
            .error("second"),
    );

    assert_eq!(error_of(&action, "disk"), "second");
}

#[test]
fn guarded_rules_apply_only_when_matched() {
    let action = raising(
        ActionBuilder::new("Guarded")
            .error("Generic problem")
            .error(MessageRule::new("Out of space").when(Condition::is::<DiskFull>()))
            .error(MessageRule::new("Too slow").when(Condition::named("Timeout"))),
    );

    assert_eq!(error_of(&action, "disk"), "Out of space");
    assert_eq!(error_of(&action, "timeout"), "Too slow");
    assert_eq!(error_of(&action, "fail"), "Generic problem");
}

#[test]
fn unless_inverts_the_guard() {
    let action = raising(
        ActionBuilder::new("Inverted")
            .error(MessageRule::new("Not a disk problem").unless(Condition::is::<DiskFull>())),
    );

    assert_eq!(error_of(&action, "disk"), DEFAULT_ERROR);
    assert_eq!(error_of(&action, "timeout"), "Not a disk problem");
}

#[test]
fn child_rules_shadow_inherited_ones_without_touching_the_parent() {
    let parent = raising(ActionBuilder::new("Parent").error("parent says no"));
    let child = ActionBuilder::extend(&parent, "Child")
        .error(MessageRule::new("child says no").when(Condition::is::<DiskFull>()))
        .build()
        .unwrap();

    assert_eq!(error_of(&child, "disk"), "child says no");
    assert_eq!(error_of(&child, "timeout"), "parent says no");
    assert_eq!(error_of(&parent, "disk"), "parent says no");
}

#[test]
fn prefix_and_content_come_from_different_rules() {
    let action = raising(
        ActionBuilder::new("Prefixed")
            .error(MessageRule::exception(|_, e| Ok(format!("Failed: {e}"))))
            .error(MessageRule::prefix_only("Backup: ").when(Condition::is::<DiskFull>())),
    );

    assert_eq!(error_of(&action, "disk"), "Backup: Failed: the disk is full");
    assert_eq!(error_of(&action, "timeout"), "Failed: timed out after 30s");
}

#[test]
fn prefix_only_falls_back_to_exception_text() {
    let action = raising(ActionBuilder::new("Bare").error(MessageRule::prefix_only("Oops: ")));

    assert_eq!(error_of(&action, "disk"), "Oops: the disk is full");
}

#[test]
fn prefix_only_with_bare_failure_falls_back_to_default() {
    let action = raising(
        ActionBuilder::new("Bare")
            .default_error("Try again later")
            .error(MessageRule::prefix_only("Oops: ")),
    );

    assert_eq!(error_of(&action, "fail"), "Oops: Try again later");
}

#[test]
fn broken_rules_fall_through() {
    let action = raising(
        ActionBuilder::new("Resilient")
            .error("Last resort")
            .error(MessageRule::callable(|_| Ok("   ".to_string())))
            .error(MessageRule::callable(|_| anyhow::bail!("source blew up")))
            .error(MessageRule::callable(|_| panic!("source panicked")))
            .error(
                MessageRule::new("Never chosen")
                    .when(Condition::callable(|_| anyhow::bail!("guard blew up"))),
            ),
    );

    assert_eq!(error_of(&action, "disk"), "Last resort");
}

#[rstest]
#[case::action_default(Some("Action default"), Some("Runtime default"), "Action default")]
#[case::runtime_default(None, Some("Runtime default"), "Runtime default")]
#[case::builtin(None, None, DEFAULT_ERROR)]
fn error_defaults_chain(
    #[case] action_default: Option<&str>,
    #[case] runtime_default: Option<&str>,
    #[case] expected: &str,
) {
    let runtime = Runtime::new(RuntimeConfig {
        default_error: runtime_default.map(str::to_string),
        ..RuntimeConfig::default()
    });
    let mut builder = ActionBuilder::new("Defaults");
    if let Some(message) = action_default {
        builder = builder.default_error(message);
    }
    let action = raising(builder);

    let result = action.call_in(&runtime, json!({ "kind": "disk" }));
    assert_eq!(result.error(), Some(expected));
}

#[rstest]
#[case::action_default(Some("All set"), Some("Done and dusted"), "All set")]
#[case::runtime_default(None, Some("Done and dusted"), "Done and dusted")]
#[case::builtin(None, None, DEFAULT_SUCCESS)]
fn success_defaults_chain(
    #[case] action_default: Option<&str>,
    #[case] runtime_default: Option<&str>,
    #[case] expected: &str,
) {
    let runtime = Runtime::new(RuntimeConfig {
        default_success: runtime_default.map(str::to_string),
        ..RuntimeConfig::default()
    });
    let mut builder = ActionBuilder::new("Defaults");
    if let Some(message) = action_default {
        builder = builder.default_success(message);
    }
    let action = raising(builder);

    let result = action.call_in(&runtime, json!({ "kind": "none" }));
    assert_eq!(result.success(), Some(expected));
}

#[test]
fn exception_message_beats_defaults() {
    let action = ActionBuilder::new("Explained")
        .default_error("generic")
        .body(|_| Err(Interrupt::Raise(Exception::new(DiskFull).with_message("Free some space"))))
        .build()
        .unwrap();

    assert_eq!(action.call(json!({})).error(), Some("Free some space"));
}

#[test]
fn explicit_messages_beat_rules() {
    let action = ActionBuilder::new("Explicit")
        .expects("finish", Field::of(FieldType::Boolean).default(false))
        .error("from a rule")
        .success("from a rule")
        .body(|ctx| {
            if ctx.input_as::<bool>("finish")? {
                Err(done("finished early"))
            } else {
                Err(fail("stopped on purpose"))
            }
        })
        .build()
        .unwrap();

    assert_eq!(action.call(json!({})).error(), Some("stopped on purpose"));
    assert_eq!(
        action.call(json!({ "finish": true })).success(),
        Some("finished early")
    );
}

#[test]
fn keyword_rules_see_the_optional_exception() {
    let describe = |_: &ActionContext, args: &CallArgs<'_>| -> anyhow::Result<String> {
        Ok(match args.exception {
            Some(e) => format!("failed with `{e}`"),
            None => "finished".to_string(),
        })
    };
    let action = raising(
        ActionBuilder::new("Keyword")
            .success(MessageRule::keyword(describe))
            .error(MessageRule::keyword(describe)),
    );

    assert_eq!(error_of(&action, "disk"), "failed with `the disk is full`");
    assert_eq!(
        action.call(json!({ "kind": "none" })).success(),
        Some("finished")
    );
}

#[test]
fn messages_can_read_inputs() {
    let action = ActionBuilder::new("Greet")
        .expects("name", Field::of(FieldType::String))
        .success(MessageRule::callable(|ctx| {
            Ok(format!("Hello, {}!", ctx.input_as::<String>("name")?))
        }))
        .body(|_| Ok(()))
        .build()
        .unwrap();

    assert_eq!(
        action.call(json!({ "name": "Ada" })).success(),
        Some("Hello, Ada!")
    );
}

#[test]
fn method_rules_call_registered_methods_or_use_the_name() {
    let with_method = ActionBuilder::new("Methodical")
        .method(
            "summary",
            Callback::plain(|ctx| Ok(json!(format!("{} finished", ctx.name())))),
        )
        .success(MessageRule::method("summary"))
        .body(|_| Ok(()))
        .build()
        .unwrap();
    let without_method = ActionBuilder::new("Literal")
        .success(MessageRule::method("Thanks for waiting"))
        .body(|_| Ok(()))
        .build()
        .unwrap();

    assert_eq!(
        with_method.call(json!({})).success(),
        Some("Methodical finished")
    );
    assert_eq!(
        without_method.call(json!({})).success(),
        Some("Thanks for waiting")
    );
}

#[test]
fn method_conditions_read_truthiness() {
    let action = raising(
        ActionBuilder::new("Truthy")
            .method("retryable", Callback::exception(|_, e| Ok(json!(e.is::<Timeout>()))))
            .error(MessageRule::new("Please retry").when(Condition::method("retryable"))),
    );

    assert_eq!(error_of(&action, "timeout"), "Please retry");
    assert_eq!(error_of(&action, "disk"), DEFAULT_ERROR);
}
