mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use buylist_optimizer::adapter::outbound::fetch::FetcherRegistry;
use buylist_optimizer::application::{ListingAggregator, ScanOrchestrator};
use buylist_optimizer::domain::{ParseMethod, ScanStatus, SiteId, SubtaskStatus};
use buylist_optimizer::error::{Error, ScanError};
use buylist_optimizer::testkit::config::scan_config;
use buylist_optimizer::testkit::domain::site;
use buylist_optimizer::testkit::fetch::{Script, ScriptedFetcher};
use buylist_optimizer::domain::JobId;

use support::scenario::{cheap_listings, lightning_bolt_buylist, lightning_bolt_sites, pricey_listings};

fn orchestrator(fetcher: ScriptedFetcher) -> ScanOrchestrator {
    let fetchers = FetcherRegistry::builder().fetcher(Arc::new(fetcher)).build();
    ScanOrchestrator::new(fetchers, ListingAggregator::default(), scan_config())
}

#[tokio::test]
async fn healthy_scan_completes_with_candidates() {
    let fetcher = ScriptedFetcher::new(ParseMethod::Shopify)
        .site("cheap", Script::Listings(cheap_listings()))
        .site("pricey", Script::Listings(pricey_listings()));
    let scans = orchestrator(fetcher);

    let job_id = scans
        .start_scan(lightning_bolt_buylist(), lightning_bolt_sites())
        .unwrap();
    let job = scans.wait_for_completion(job_id).await.unwrap();

    assert_eq!(job.status(), ScanStatus::Completed);
    for subtask in &job.subtasks {
        assert_eq!(subtask.status, SubtaskStatus::Completed);
        assert_eq!(subtask.progress, 100);
        assert_eq!(subtask.cards_found, 1);
    }

    let pool = scans.candidates(job_id).unwrap().expect("candidates after completion");
    assert_eq!(pool.listings().len(), 2);
    assert_eq!(pool.cards()[0].listing_ids.len(), 2);
}

#[tokio::test]
async fn failing_site_does_not_block_siblings() {
    let fetcher = ScriptedFetcher::new(ParseMethod::Shopify)
        .site("cheap", Script::Listings(cheap_listings()))
        .site(
            "pricey",
            Script::Fail(ScanError::SiteUnreachable("connection refused".into())),
        );
    let scans = orchestrator(fetcher);

    let job_id = scans
        .start_scan(lightning_bolt_buylist(), lightning_bolt_sites())
        .unwrap();
    let job = scans.wait_for_completion(job_id).await.unwrap();

    let cheap = job.subtask(&SiteId::from("cheap")).unwrap();
    let pricey = job.subtask(&SiteId::from("pricey")).unwrap();
    assert_eq!(cheap.status, SubtaskStatus::Completed);
    assert_eq!(pricey.status, SubtaskStatus::Failed);
    assert!(pricey.error.as_deref().unwrap().contains("connection refused"));
    assert!(pricey.progress < 100);

    let pool = scans.candidates(job_id).unwrap().unwrap();
    assert_eq!(pool.listings().len(), 1);
    assert_eq!(pool.listings()[0].site_id, SiteId::from("cheap"));
}

#[tokio::test]
async fn hung_site_times_out_independently() {
    let fetcher = ScriptedFetcher::new(ParseMethod::Shopify)
        .site("cheap", Script::Listings(cheap_listings()))
        .site("pricey", Script::Hang);
    let scans = orchestrator(fetcher);

    let job_id = scans
        .start_scan(lightning_bolt_buylist(), lightning_bolt_sites())
        .unwrap();
    let job = tokio::time::timeout(Duration::from_secs(10), scans.wait_for_completion(job_id))
        .await
        .expect("job finishes after the fetch timeout")
        .unwrap();

    let pricey = job.subtask(&SiteId::from("pricey")).unwrap();
    assert_eq!(pricey.status, SubtaskStatus::Failed);
    assert!(pricey.error.as_deref().unwrap().contains("timed out"));
    assert_eq!(
        job.subtask(&SiteId::from("cheap")).unwrap().status,
        SubtaskStatus::Completed
    );
}

#[tokio::test]
async fn panicking_fetcher_fails_only_its_site() {
    let fetcher = ScriptedFetcher::new(ParseMethod::Shopify)
        .site("cheap", Script::Listings(cheap_listings()))
        .site("pricey", Script::Panic);
    let scans = orchestrator(fetcher);

    let job_id = scans
        .start_scan(lightning_bolt_buylist(), lightning_bolt_sites())
        .unwrap();
    let job = scans.wait_for_completion(job_id).await.unwrap();

    assert_eq!(job.status(), ScanStatus::Completed);
    assert_eq!(
        job.subtask(&SiteId::from("pricey")).unwrap().status,
        SubtaskStatus::Failed
    );
    assert_eq!(
        job.subtask(&SiteId::from("cheap")).unwrap().status,
        SubtaskStatus::Completed
    );
}

#[tokio::test]
async fn site_without_fetcher_fails_with_no_fetcher() {
    let fetcher = ScriptedFetcher::new(ParseMethod::Shopify);
    let scans = orchestrator(fetcher);
    let sites = vec![site("crystal-shop", ParseMethod::Crystal)];

    let job_id = scans.start_scan(lightning_bolt_buylist(), sites).unwrap();
    let job = scans.wait_for_completion(job_id).await.unwrap();

    let subtask = &job.subtasks[0];
    assert_eq!(subtask.status, SubtaskStatus::Failed);
    assert!(subtask.error.as_deref().unwrap().contains("crystal"));
}

#[tokio::test]
async fn inactive_and_not_working_sites_are_skipped() {
    use buylist_optimizer::domain::SiteType;

    let fetcher = ScriptedFetcher::new(ParseMethod::Shopify);
    let calls = fetcher.calls();
    let scans = orchestrator(fetcher);
    let sites = vec![
        site("live", ParseMethod::Shopify),
        site("closed", ParseMethod::Shopify).with_active(false),
        site("broken", ParseMethod::Shopify).with_site_type(SiteType::NotWorking),
        site("live", ParseMethod::Shopify),
    ];

    let job_id = scans.start_scan(lightning_bolt_buylist(), sites).unwrap();
    let job = scans.wait_for_completion(job_id).await.unwrap();

    assert_eq!(job.subtasks.len(), 1);
    assert_eq!(job.subtasks[0].site_id, SiteId::from("live"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancel_fails_unstarted_sites() {
    let fetcher = ScriptedFetcher::new(ParseMethod::Shopify)
        .site("a", Script::Slow(Duration::from_millis(200), Vec::new()))
        .site("b", Script::Listings(Vec::new()))
        .site("c", Script::Listings(Vec::new()));
    let calls = fetcher.calls();
    let fetchers = FetcherRegistry::builder().fetcher(Arc::new(fetcher)).build();
    let mut config = scan_config();
    config.max_concurrent_fetches = 1;
    let scans = ScanOrchestrator::new(fetchers, ListingAggregator::default(), config);
    let sites = vec![
        site("a", ParseMethod::Shopify),
        site("b", ParseMethod::Shopify),
        site("c", ParseMethod::Shopify),
    ];

    let job_id = scans.start_scan(lightning_bolt_buylist(), sites).unwrap();
    scans.cancel(job_id).await.unwrap();
    let job = scans.wait_for_completion(job_id).await.unwrap();

    assert!(job.cancelled);
    assert_eq!(job.status(), ScanStatus::Completed);
    // At most the site holding the only slot runs; it may finish normally.
    let cancelled = ScanError::Cancelled.to_string();
    let failed = job
        .subtasks
        .iter()
        .filter(|s| s.error.as_deref() == Some(cancelled.as_str()))
        .count();
    assert!(failed >= 2, "{:?}", job.subtasks);
    assert_eq!(
        job.count(SubtaskStatus::Completed) + failed,
        job.subtasks.len()
    );
    assert!(calls.load(Ordering::SeqCst) <= 1);
}

#[tokio::test]
async fn excess_sites_wait_pending_while_progress_rises() {
    let step = Duration::from_millis(60);
    let fetcher = ScriptedFetcher::new(ParseMethod::Shopify)
        .site("a", Script::Slow(step, cheap_listings()))
        .site("b", Script::Slow(step, pricey_listings()));
    let fetchers = FetcherRegistry::builder().fetcher(Arc::new(fetcher)).build();
    let mut config = scan_config();
    config.max_concurrent_fetches = 1;
    let scans = ScanOrchestrator::new(fetchers, ListingAggregator::default(), config);
    let buylist = buylist_optimizer::testkit::domain::buylist(&[
        ("Lightning Bolt", 4),
        ("Opt", 1),
        ("Ponder", 1),
        ("Brainstorm", 1),
    ]);
    let sites = vec![site("a", ParseMethod::Shopify), site("b", ParseMethod::Shopify)];

    let job_id = scans.start_scan(buylist, sites).unwrap();

    let mut saw_one_running_one_queued = false;
    let mut partial_progress = Vec::new();
    let mut last_progress = [0u8; 2];
    loop {
        let job = scans.get_status(job_id).unwrap();
        if job.is_complete() {
            break;
        }
        let processing = job.count(SubtaskStatus::Processing);
        assert!(processing <= 1, "{:?}", job.subtasks);
        if processing == 1 && job.count(SubtaskStatus::Pending) == 1 {
            saw_one_running_one_queued = true;
        }
        for (i, subtask) in job.subtasks.iter().enumerate() {
            assert!(subtask.progress >= last_progress[i]);
            last_progress[i] = subtask.progress;
            if subtask.status == SubtaskStatus::Processing {
                assert!(subtask.progress < 100);
                if subtask.progress > 0 {
                    partial_progress.push(subtask.progress);
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(saw_one_running_one_queued);
    assert!(!partial_progress.is_empty());
    let job = scans.wait_for_completion(job_id).await.unwrap();
    assert_eq!(job.count(SubtaskStatus::Completed), 2);
    assert!(job.subtasks.iter().all(|s| s.progress == 100));
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let scans = orchestrator(ScriptedFetcher::new(ParseMethod::Shopify));
    let err = scans.get_status(JobId::generate()).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn malformed_buylist_is_rejected() {
    let scans = orchestrator(ScriptedFetcher::new(ParseMethod::Shopify));
    let buylist = buylist_optimizer::testkit::domain::buylist(&[("Lightning Bolt", 0)]);
    let err = scans.start_scan(buylist, lightning_bolt_sites()).unwrap_err();
    assert!(matches!(err, Error::Domain(_)));
    assert_eq!(scans.job_count(), 0);
}
