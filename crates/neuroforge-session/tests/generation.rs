mod support;

use std::sync::Arc;

use neuroforge_core::{Task, TaskState, catalog, engine::GenerationConfig, log::LogSource};
use neuroforge_session::{GenerateOutcome, SkipReason};
use support::{Call, ScriptedEngine, session, settle};

#[tokio::test(start_paused = true)]
async fn completion_is_appended_to_the_buffer() {
    let engine = ScriptedEngine::new();
    engine.set_completion(" there lived a dragon");
    let session = session(engine);
    session.initialize().await;

    session.edit("Once upon a time");
    let version = session.version();

    let outcome = session.generate().await;

    assert_eq!(outcome, GenerateOutcome::Completed(" there lived a dragon".into()));
    assert_eq!(session.text(), "Once upon a time there lived a dragon");
    assert_eq!(session.version(), version + 1);
    assert_eq!(session.status(Task::Generator).state(), TaskState::Ready);

    let logs = session.logs();
    let tail: Vec<_> = logs.iter().rev().take(2).rev().collect();
    assert_eq!(tail[0].source, LogSource::Ai);
    assert_eq!(tail[0].message, "Synthesizing (Temp: 0.8)...");
    assert_eq!(tail[1].message, "Sequence completed");
}

#[tokio::test(start_paused = true)]
async fn the_engine_receives_the_current_settings() {
    let session = session(ScriptedEngine::new());
    session.initialize().await;

    let mut settings = session.settings();
    settings.generation.temperature = 1.2;
    settings.generation.max_tokens = 120;
    session.apply_settings(settings).await.unwrap();
    assert!(session.logs().iter().any(|e| {
        e.source == LogSource::User && e.message == "Generator set to temp 1.2, 120 tokens"
    }));

    session.edit("The weather today");
    session.generate().await;

    let call = session
        .engine()
        .calls()
        .into_iter()
        .find(|c| matches!(c, Call::Generate { .. }))
        .unwrap();
    assert_eq!(
        call,
        Call::Generate {
            prompt: "The weather today".into(),
            config: GenerationConfig {
                temperature: 1.2,
                max_tokens: 120,
            },
        }
    );
}

#[tokio::test(start_paused = true)]
async fn a_second_request_while_working_is_dropped() {
    let session = Arc::new(session(ScriptedEngine::new()));
    session.initialize().await;
    session.edit("Once upon a time");

    let (first, second) = tokio::join!(session.generate(), session.generate());

    assert!(matches!(first, GenerateOutcome::Completed(_)));
    assert_eq!(
        second,
        GenerateOutcome::Skipped(SkipReason::ModelNotReady {
            task: Task::Generator,
            state: TaskState::Working,
        })
    );
    assert_eq!(session.engine().generate_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn failure_leaves_the_buffer_untouched() {
    let engine = ScriptedEngine::new();
    engine.fail_generation(true);
    let session = session(engine);
    session.initialize().await;
    session.edit("Once upon a time");
    let version = session.version();

    let outcome = session.generate().await;

    assert!(matches!(outcome, GenerateOutcome::Failed(_)));
    assert_eq!(session.text(), "Once upon a time");
    assert_eq!(session.version(), version);
    assert_eq!(session.status(Task::Generator).state(), TaskState::Error);
    assert!(session.logs().iter().any(|e| {
        e.source == LogSource::System && e.message == "Generation failed"
    }));

    assert_eq!(
        session.generate().await,
        GenerateOutcome::Skipped(SkipReason::ModelNotReady {
            task: Task::Generator,
            state: TaskState::Error,
        })
    );
    assert_eq!(session.engine().generate_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_prompts_are_skipped() {
    let session = session(ScriptedEngine::new());
    session.initialize().await;

    assert_eq!(
        session.generate().await,
        GenerateOutcome::Skipped(SkipReason::EmptyPrompt)
    );
    session.edit("   \n\t");
    assert_eq!(
        session.generate().await,
        GenerateOutcome::Skipped(SkipReason::EmptyPrompt)
    );
    assert_eq!(session.engine().generate_calls(), 0);
    assert_eq!(session.status(Task::Generator).state(), TaskState::Ready);
}

#[tokio::test(start_paused = true)]
async fn generation_before_loading_is_skipped() {
    let session = session(ScriptedEngine::new());
    session.edit("Once upon a time");

    assert_eq!(
        session.generate().await,
        GenerateOutcome::Skipped(SkipReason::ModelNotReady {
            task: Task::Generator,
            state: TaskState::Idle,
        })
    );
    assert_eq!(session.engine().generate_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn a_failed_generator_does_not_block_analysis() {
    let engine = ScriptedEngine::new();
    engine.fail_model(catalog::default_model(Task::Generator));
    let session = session(engine);
    session.initialize().await;

    session.edit("still worth analysing");
    assert!(matches!(session.generate().await, GenerateOutcome::Skipped(_)));
    settle().await;

    assert!(session.snapshot().is_some());
}

#[tokio::test(start_paused = true)]
async fn appended_text_is_analysed() {
    let engine = ScriptedEngine::new();
    engine.set_completion(" and it was glorious");
    let session = session(engine);
    session.initialize().await;

    session.edit("The sun rose");
    session.generate().await;
    settle().await;

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.produced_at_version, session.version());
    assert_eq!(
        session.engine().analyzed_texts(Task::Classifier),
        vec!["The sun rose and it was glorious"]
    );
}
