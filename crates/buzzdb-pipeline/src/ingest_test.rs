use std::time::Duration;

use chrono::Utc;

use crate::stats::RunOutcome;
use crate::test_support::{
    make_page, make_post, make_thread, MemoryCheckpoints, MemoryStore, ScriptedSource,
};
use crate::PipelineError;

use super::{sweep_ingest, IngestConfig, IngestPipeline};

fn config(window_minutes: i64, max_runs: u32, epoch_minutes_ago: i64) -> IngestConfig {
    IngestConfig {
        search_query: "Razorpay".to_owned(),
        company: "razorpay".to_owned(),
        window_minutes,
        max_runs,
        interval: Duration::ZERO,
        item_delay: Duration::ZERO,
        page_limit: 10,
        epoch_start: Utc::now() - chrono::Duration::minutes(epoch_minutes_ago),
        full_refresh: false,
        fetch_conversations: true,
    }
}

fn completed(outcome: &Result<RunOutcome, PipelineError>) -> &crate::stats::IngestRunStats {
    match outcome {
        Ok(RunOutcome::Completed(stats)) => stats,
        other => panic!("expected completed run, got: {other:?}"),
    }
}

#[tokio::test]
async fn stores_new_posts_and_advances_checkpoint() {
    let mut source = ScriptedSource::with_pages(vec![make_page(
        vec![
            make_post("1", Some("c1")),
            make_post("2", Some("c1")),
            make_post("3", Some("c2")),
        ],
        None,
    )]);
    source.add_conversation(make_thread("c1", 1));
    source.add_conversation(make_thread("c2", 0));

    let checkpoints = MemoryCheckpoints::default();
    let store = MemoryStore::default();
    let mut pipeline = IngestPipeline::new(
        &mut source,
        &checkpoints,
        &store,
        &store,
        config(30, 1, 60),
    );

    let outcome = pipeline.run_once().await;
    let stats = completed(&outcome);

    assert_eq!(stats.found, 3);
    assert_eq!(stats.saved, 3);
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.conversations_saved, 2);
    assert_eq!(store.post_count(), 3);
    assert_eq!(store.conversation_count(), 2);

    // Checkpoint advanced exactly to the processed window.
    let advances = checkpoints.advances();
    assert_eq!(advances.len(), 1);
    assert_eq!(Some(advances[0].start), stats.window_start);
    assert_eq!(Some(advances[0].end), stats.window_end);
    assert_eq!(checkpoints.attempts(), 1);
}

#[tokio::test]
async fn reingesting_the_same_window_saves_nothing_new() {
    let posts = vec![
        make_post("1", None),
        make_post("2", None),
        make_post("3", None),
    ];
    let store = MemoryStore::default();

    let mut source = ScriptedSource::with_pages(vec![make_page(posts.clone(), None)]);
    let checkpoints = MemoryCheckpoints::default();
    let mut pipeline = IngestPipeline::new(
        &mut source,
        &checkpoints,
        &store,
        &store,
        config(30, 1, 60),
    );
    let first = pipeline.run_once().await;
    assert_eq!(completed(&first).saved, 3);

    // Same window again: fresh checkpoint state, same post store — as if a
    // crash lost the checkpoint advance and the window is retried.
    let mut source = ScriptedSource::with_pages(vec![make_page(posts, None)]);
    let checkpoints = MemoryCheckpoints::default();
    let mut pipeline = IngestPipeline::new(
        &mut source,
        &checkpoints,
        &store,
        &store,
        config(30, 1, 60),
    );
    let second = pipeline.run_once().await;

    let stats = completed(&second);
    assert_eq!(stats.saved, 0, "second pass over the window must be a no-op");
    assert_eq!(stats.skipped, 3);
    assert_eq!(store.post_count(), 3);
}

#[tokio::test]
async fn consecutive_runs_cover_contiguous_windows() {
    let mut source = ScriptedSource::with_pages(vec![
        make_page(vec![make_post("1", None)], None),
        make_page(vec![make_post("2", None)], None),
        make_page(vec![make_post("3", None)], None),
    ]);
    let checkpoints = MemoryCheckpoints::default();
    let store = MemoryStore::default();
    let mut pipeline = IngestPipeline::new(
        &mut source,
        &checkpoints,
        &store,
        &store,
        config(30, 3, 90),
    );

    let reports = pipeline.run().await;
    assert_eq!(reports.len(), 3);
    for report in &reports {
        assert!(matches!(report.result, Ok(RunOutcome::Completed(_))));
    }

    let advances = checkpoints.advances();
    assert_eq!(advances.len(), 3);
    for pair in advances.windows(2) {
        // No window is ever skipped: each run picks up exactly where the
        // previous one ended.
        assert_eq!(pair[1].start, pair[0].end);
        assert!(pair[1].end >= pair[0].end);
    }
}

#[tokio::test]
async fn empty_window_after_clamping_is_up_to_date() {
    // Epoch is "now": there is nothing to fetch yet.
    let mut source = ScriptedSource::default();
    let checkpoints = MemoryCheckpoints::default();
    let store = MemoryStore::default();
    let cfg = config(30, 1, 0);
    let epoch = cfg.epoch_start;
    let mut pipeline = IngestPipeline::new(&mut source, &checkpoints, &store, &store, cfg);

    let outcome = pipeline.run_once_at(epoch).await.unwrap();
    assert!(matches!(outcome, RunOutcome::UpToDate));
    // The checkpoint (and even the attempt counter) stays untouched.
    assert_eq!(checkpoints.attempts(), 0);
    assert!(checkpoints.advances().is_empty());
    assert_eq!(source.search_calls, 0);
}

#[tokio::test]
async fn existing_conversation_skips_the_expensive_fetch() {
    let mut source = ScriptedSource::with_pages(vec![make_page(
        vec![make_post("1", Some("c1"))],
        None,
    )]);
    source.add_conversation(make_thread("c1", 2));

    let checkpoints = MemoryCheckpoints::default();
    let store = MemoryStore::default();
    store.seed_conversation("c1");

    let mut pipeline = IngestPipeline::new(
        &mut source,
        &checkpoints,
        &store,
        &store,
        config(30, 1, 60),
    );
    let outcome = pipeline.run_once().await;

    let stats = completed(&outcome);
    assert_eq!(stats.conversations_skipped, 1);
    assert_eq!(stats.conversations_saved, 0);
    // The detail call must not have been issued at all.
    assert_eq!(source.conversation_calls, 0);
}

#[tokio::test]
async fn failed_conversation_fetch_still_advances_checkpoint() {
    let mut source = ScriptedSource::with_pages(vec![make_page(
        vec![make_post("1", Some("c1")), make_post("2", Some("c2"))],
        None,
    )]);
    source.add_conversation(make_thread("c1", 0));
    source.failing_conversations.insert("c2".to_owned());

    let checkpoints = MemoryCheckpoints::default();
    let store = MemoryStore::default();
    let mut pipeline = IngestPipeline::new(
        &mut source,
        &checkpoints,
        &store,
        &store,
        config(30, 1, 60),
    );
    let outcome = pipeline.run_once().await;

    let stats = completed(&outcome);
    assert_eq!(stats.conversations_saved, 1);
    assert_eq!(stats.errors, 1);
    // The window as a whole is considered processed.
    assert_eq!(checkpoints.advances().len(), 1);
}

#[tokio::test]
async fn search_failure_aborts_run_without_advancing() {
    let mut source = ScriptedSource {
        fail_search: true,
        ..ScriptedSource::default()
    };
    let checkpoints = MemoryCheckpoints::default();
    let store = MemoryStore::default();
    let mut pipeline = IngestPipeline::new(
        &mut source,
        &checkpoints,
        &store,
        &store,
        config(30, 1, 60),
    );

    let outcome = pipeline.run_once().await;
    assert!(matches!(outcome, Err(PipelineError::Source(_))));

    // The attempt is counted, but the window was not processed: the next
    // invocation retries it from scratch.
    assert_eq!(checkpoints.attempts(), 1);
    assert!(checkpoints.advances().is_empty());
    assert_eq!(store.post_count(), 0);
}

#[tokio::test]
async fn duplicate_ids_within_one_batch_persist_once() {
    let mut source = ScriptedSource::with_pages(vec![make_page(
        vec![make_post("1", None), make_post("1", None)],
        None,
    )]);
    let checkpoints = MemoryCheckpoints::default();
    let store = MemoryStore::default();
    let mut pipeline = IngestPipeline::new(
        &mut source,
        &checkpoints,
        &store,
        &store,
        config(30, 1, 60),
    );

    let outcome = pipeline.run_once().await;
    let stats = completed(&outcome);

    assert_eq!(stats.found, 2);
    assert_eq!(stats.saved, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(store.post_count(), 1);
}

#[tokio::test]
async fn pagination_follows_cursors_until_exhausted() {
    let mut source = ScriptedSource::with_pages(vec![
        make_page(vec![make_post("1", None)], Some("cursor-2")),
        make_page(vec![make_post("2", None)], Some("cursor-3")),
        make_page(vec![make_post("3", None)], None),
    ]);
    let checkpoints = MemoryCheckpoints::default();
    let store = MemoryStore::default();
    let mut pipeline = IngestPipeline::new(
        &mut source,
        &checkpoints,
        &store,
        &store,
        config(30, 1, 60),
    );

    let outcome = pipeline.run_once().await;
    let stats = completed(&outcome);

    assert_eq!(source.search_calls, 3);
    assert_eq!(stats.found, 3);
    assert_eq!(stats.saved, 3);
}

#[tokio::test]
async fn page_cap_bounds_runaway_pagination() {
    // Every page advertises another cursor; the cap must stop the loop.
    let pages: Vec<_> = (0..20)
        .map(|i| make_page(vec![make_post(&format!("p{i}"), None)], Some("more")))
        .collect();
    let mut source = ScriptedSource::with_pages(pages);
    let checkpoints = MemoryCheckpoints::default();
    let store = MemoryStore::default();
    let mut cfg = config(30, 1, 60);
    cfg.page_limit = 3;
    let mut pipeline = IngestPipeline::new(&mut source, &checkpoints, &store, &store, cfg);

    let outcome = pipeline.run_once().await;
    let stats = completed(&outcome);

    assert_eq!(source.search_calls, 3);
    assert_eq!(stats.found, 3);
    // The window still counts as processed.
    assert_eq!(checkpoints.advances().len(), 1);
}

#[tokio::test]
async fn full_refresh_bypasses_checkpoint_and_dedup_prechecks() {
    let store = MemoryStore::default();
    let checkpoints = MemoryCheckpoints::default();

    // Seed a prior run: posts stored, conversation stored, checkpoint ahead.
    let mut source = ScriptedSource::with_pages(vec![make_page(
        vec![make_post("1", Some("c1"))],
        None,
    )]);
    source.add_conversation(make_thread("c1", 0));
    let mut pipeline = IngestPipeline::new(
        &mut source,
        &checkpoints,
        &store,
        &store,
        config(30, 1, 60),
    );
    pipeline.run_once().await.unwrap();

    // Full refresh re-walks the epoch window: the conversation existence
    // precheck is bypassed (detail fetch happens again), and the storage
    // natural keys absorb everything as skips.
    let mut source = ScriptedSource::with_pages(vec![make_page(
        vec![make_post("1", Some("c1"))],
        None,
    )]);
    source.add_conversation(make_thread("c1", 0));
    let mut cfg = config(30, 1, 60);
    cfg.full_refresh = true;
    let mut pipeline = IngestPipeline::new(&mut source, &checkpoints, &store, &store, cfg);
    let outcome = pipeline.run_once().await;

    let stats = completed(&outcome);
    assert_eq!(source.conversation_calls, 1, "precheck must be bypassed");
    assert_eq!(stats.saved, 0);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.conversations_saved, 0);
    assert_eq!(stats.conversations_skipped, 1);
    assert_eq!(store.post_count(), 1);
}

#[tokio::test]
async fn sweep_ingest_counts_saved_and_skipped() {
    let store = MemoryStore::default();

    let batch = vec![
        make_post("a", None),
        make_post("b", None),
        make_post("a", None),
    ];
    let stats = sweep_ingest(&store, &batch, "Cashfree", "cashfree")
        .await
        .unwrap();

    assert_eq!(stats.found, 3);
    assert_eq!(stats.saved, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(store.post_count(), 2);
}
