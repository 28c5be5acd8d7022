//! End-to-end assembly of entry lists into conversation requests

mod integration;

use ai_lib_preset::{
    Entry, ErrorKind, MacroEvaluator, MessageAssembler, MessageRole, SystemBlock,
};
use integration::fixture::StoreFixture;

#[test]
fn test_tutorial_then_user_turn() {
    let fx = StoreFixture::new();
    fx.preset(
        "tutorial",
        "- system: S\n- user: Q1\n- assistant: A1\n",
    );
    let store = fx.store();

    let request = MessageAssembler::new(&store)
        .assemble(&[Entry::preset("tutorial"), Entry::user("Q2")])
        .unwrap();

    let history: Vec<(MessageRole, &str)> = request
        .history
        .iter()
        .map(|t| (t.role, t.content.as_str()))
        .collect();
    assert_eq!(
        history,
        vec![(MessageRole::User, "Q1"), (MessageRole::Assistant, "A1")]
    );
    assert_eq!(request.current_message.role, MessageRole::User);
    assert_eq!(request.current_message.content, "Q2");
    assert_eq!(request.system_instructions.to_json_string(), r#"{"tutorial":"S"}"#);
}

#[test]
fn test_merge_by_origin() {
    let fx = StoreFixture::new();
    fx.preset("A", "- system: x\n- system: y\n");
    let store = fx.store();

    let request = MessageAssembler::new(&store)
        .assemble(&[Entry::preset("A"), Entry::system("z"), Entry::user("go")])
        .unwrap();

    let system = &request.system_instructions;
    assert_eq!(system.origins(), vec!["A", "custom"]);
    assert_eq!(system.get("A"), Some(SystemBlock::Joined("x\n\ny".into())));
    assert_eq!(system.to_json_string(), r#"{"A":"x\n\ny","custom":["z"]}"#);
}

#[test]
fn test_origin_order_is_first_appearance() {
    let fx = StoreFixture::new();
    fx.preset("b", "- system: from b\n");
    fx.preset("a", "- system: from a\n");
    fx.group("both", "- preset: b\n- preset: a\n- preset: b\n");
    let store = fx.store();

    let request = MessageAssembler::new(&store)
        .assemble(&[Entry::system("first"), Entry::group("both"), Entry::user("q")])
        .unwrap();

    let system = &request.system_instructions;
    assert_eq!(system.origins(), vec!["b", "a", "custom"]);
    assert_eq!(system.get("b"), Some(SystemBlock::Joined("from b\n\nfrom b".into())));
}

#[test]
fn test_fragments_splice_at_declared_position() {
    let fx = StoreFixture::new();
    fx.preset("exchange", "- user: U\n- assistant: A\n");
    let store = fx.store();

    let request = MessageAssembler::new(&store)
        .assemble(&[
            Entry::user("before"),
            Entry::assistant("ok"),
            Entry::preset("exchange"),
            Entry::user("after"),
        ])
        .unwrap();

    let contents: Vec<&str> = request.history.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, vec!["before", "ok", "U", "A"]);
    assert_eq!(request.history[2].origin, "exchange");
}

#[test]
fn test_current_message_may_come_from_preset() {
    let fx = StoreFixture::new();
    fx.preset("ask", "- system: S\n- user: final question\n");
    let store = fx.store();

    let request = MessageAssembler::new(&store)
        .assemble(&[Entry::preset("ask")])
        .unwrap();
    assert!(request.history.is_empty());
    assert_eq!(request.current_message.content, "final question");
}

#[test]
fn test_system_only_request_has_no_current_turn() {
    let fx = StoreFixture::new();
    fx.preset("rules", "- system: only rules\n");
    let store = fx.store();

    let err = MessageAssembler::new(&store)
        .assemble(&[Entry::preset("rules"), Entry::system("more")])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyOrMissingCurrentTurn);
}

#[test]
fn test_failure_yields_no_partial_output() {
    let fx = StoreFixture::new();
    fx.preset("good", "- system: fine\n");
    let store = fx.store();

    let result = MessageAssembler::new(&store).assemble(&[
        Entry::preset("good"),
        Entry::preset("missing"),
        Entry::user("q"),
    ]);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_seeded_macros_are_reproducible() {
    let fx = StoreFixture::new();
    fx.preset(
        "dice",
        "- system: 'Mood: {{random::calm::tense::cheerful}}'\n- user: 'Roll {{roll:3d6}}'\n",
    );
    let store = fx.store();
    let entries = [Entry::preset("dice"), Entry::user("{{random:a,b,c,d}}")];

    let run = |seed| {
        MessageAssembler::with_macros(&store, MacroEvaluator::seeded(seed))
            .assemble(&entries)
            .unwrap()
    };
    let first = run(99);
    let second = run(99);
    assert_eq!(first, second);

    let roll: u32 = first.history[0]
        .content
        .trim_start_matches("Roll ")
        .parse()
        .unwrap();
    assert!((3..=18).contains(&roll));
    assert!(["a", "b", "c", "d"].contains(&first.current_message.content.as_str()));
}

#[test]
fn test_unknown_directive_kept_and_warned() {
    let fx = StoreFixture::new();
    fx.preset("card", "- system: 'You are {{char}}.'\n");
    let store = fx.store();
    let mut assembler = MessageAssembler::with_macros(&store, MacroEvaluator::seeded(3));

    let request = assembler
        .assemble(&[Entry::preset("card"), Entry::user("hi {{user}}")])
        .unwrap();
    assert_eq!(
        request.system_instructions.get("card"),
        Some(SystemBlock::Joined("You are {{char}}.".into()))
    );
    assert_eq!(request.current_message.content, "hi {{user}}");
    assert_eq!(assembler.warnings().len(), 2);
}

#[test]
fn test_attachments_travel_with_current_message() {
    let fx = StoreFixture::new();
    let store = fx.store();

    let request = MessageAssembler::new(&store)
        .assemble(&[
            Entry::user("earlier"),
            Entry::assistant("noted"),
            Entry::user_with_images("what is this?", ["shots/cat.png"]),
        ])
        .unwrap();
    assert!(request.current_message.has_attachments());
    assert_eq!(request.current_message.attachments[0].media_type.as_deref(), Some("image/png"));
    assert!(request.history.iter().all(|t| !t.has_attachments()));
}

#[test]
fn test_attachments_stay_bound_inside_history() {
    let fx = StoreFixture::new();
    fx.preset("exchange", "- user: U\n- assistant: A\n");
    let store = fx.store();

    let request = MessageAssembler::new(&store)
        .assemble(&[
            Entry::user_with_images("first look", ["shots/a.png", "shots/b.jpg"]),
            Entry::assistant("two animals"),
            Entry::preset("exchange"),
            Entry::user("which one is older?"),
        ])
        .unwrap();

    let shape: Vec<(&str, usize)> = request
        .history
        .iter()
        .map(|t| (t.content.as_str(), t.attachments.len()))
        .collect();
    assert_eq!(
        shape,
        vec![("first look", 2), ("two animals", 0), ("U", 0), ("A", 0)]
    );
    let paths: Vec<&std::path::Path> = request.history[0]
        .attachments
        .iter()
        .map(|a| a.path.as_path())
        .collect();
    assert_eq!(
        paths,
        vec![std::path::Path::new("shots/a.png"), std::path::Path::new("shots/b.jpg")]
    );
    assert!(!request.current_message.has_attachments());
}
