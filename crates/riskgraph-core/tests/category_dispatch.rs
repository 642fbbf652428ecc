mod support;

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use riskgraph_core::{
    CapabilityError, CapabilityResult, CategoryDispatcher, CategoryTask, DispatchConfig,
    DispatchError, RetryPolicy,
};
use support::RecordingPause;

/// Multiplies the category by ten. Scripted categories fail or are throttled.
#[derive(Default)]
struct Scaled {
    rejected: BTreeSet<u32>,
    panics: BTreeSet<u32>,
    throttled: Mutex<HashMap<u32, u32>>,
    throttle_message: String,
    slow: HashMap<u32, Duration>,
    calls: Mutex<Vec<u32>>,
}

impl Scaled {
    fn calls_for(&self, category: u32) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == category)
            .count()
    }
}

impl CategoryTask<u32> for Scaled {
    type Output = u32;

    fn execute(&self, category: &u32, _entity: &str) -> CapabilityResult<u32> {
        self.calls.lock().unwrap().push(*category);
        if let Some(delay) = self.slow.get(category) {
            std::thread::sleep(*delay);
        }
        if self.panics.contains(category) {
            panic!("category {category} crashed");
        }
        if self.rejected.contains(category) {
            return Err(CapabilityError::Rejected {
                status: 400,
                message: format!("category {category} refused"),
            });
        }
        if let Some(remaining) = self.throttled.lock().unwrap().get_mut(category) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CapabilityError::rate_limited(self.throttle_message.clone()));
            }
        }
        Ok(category * 10)
    }
}

fn dispatcher(workers: usize, pause: Arc<RecordingPause>) -> CategoryDispatcher {
    CategoryDispatcher::new(
        DispatchConfig::default().with_workers(workers),
        RetryPolicy::category(),
    )
    .with_pause(pause)
}

#[tokio::test]
async fn crashed_category_is_reported_as_a_failure() {
    let task = Arc::new(Scaled {
        panics: BTreeSet::from([3]),
        ..Scaled::default()
    });

    let report = dispatcher(1, Arc::new(RecordingPause::default()))
        .dispatch(&[1u32, 2, 3], "Acme", task)
        .await
        .unwrap();

    let payloads: BTreeSet<u32> = report.payloads().copied().collect();
    assert_eq!(payloads, BTreeSet::from([10, 20]));
    assert_eq!(report.failed_categories(), vec!["3"]);
    assert_eq!(report.completed.len() + report.failures.len(), 3);
}

#[tokio::test]
async fn one_failing_category_out_of_four_yields_three_payloads_and_one_failure() {
    let task = Arc::new(Scaled {
        rejected: BTreeSet::from([2]),
        ..Scaled::default()
    });
    let pause = Arc::new(RecordingPause::default());

    let report = dispatcher(2, pause.clone())
        .dispatch(&[1u32, 2, 3, 4], "Acme", task.clone())
        .await
        .unwrap();

    let payloads: BTreeSet<u32> = report.payloads().copied().collect();
    assert_eq!(payloads, BTreeSet::from([10, 30, 40]));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failed_categories(), vec!["2"]);
    assert!(report.failures[0].error.contains("refused"));
    // Non-retryable: called once, no back-off.
    assert_eq!(task.calls_for(2), 1);
    assert!(pause.waits().is_empty());
}

#[tokio::test]
async fn repeated_dispatch_yields_equal_result_sets() {
    let categories = [1u32, 2, 3, 4, 5, 6];
    let mut runs = Vec::new();
    for _ in 0..2 {
        let task = Arc::new(Scaled {
            rejected: BTreeSet::from([5]),
            ..Scaled::default()
        });
        let report = dispatcher(4, Arc::new(RecordingPause::default()))
            .dispatch(&categories, "Acme", task)
            .await
            .unwrap();
        let payloads: BTreeSet<u32> = report.payloads().copied().collect();
        let failed: BTreeSet<String> =
            report.failures.iter().map(|f| f.category.clone()).collect();
        runs.push((payloads, failed));
    }
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn all_categories_failing_is_an_empty_report_not_an_error() {
    let task = Arc::new(Scaled {
        rejected: BTreeSet::from([1, 2, 3]),
        ..Scaled::default()
    });

    let report = dispatcher(1, Arc::new(RecordingPause::default()))
        .dispatch(&[1u32, 2, 3], "Acme", task)
        .await
        .unwrap();

    assert!(report.all_failed());
    assert_eq!(report.failures.len(), 3);
    assert!(report.into_payloads().is_empty());
}

#[tokio::test]
async fn results_are_collected_in_completion_order() {
    let task = Arc::new(Scaled {
        slow: HashMap::from([(1, Duration::from_millis(300))]),
        ..Scaled::default()
    });

    let report = dispatcher(2, Arc::new(RecordingPause::default()))
        .dispatch(&[1u32, 2], "Acme", task)
        .await
        .unwrap();

    let order: Vec<u32> = report.payloads().copied().collect();
    assert_eq!(order, vec![20, 10]);
}

#[tokio::test]
async fn throttled_category_honours_server_hint_then_succeeds() {
    let task = Arc::new(Scaled {
        throttled: Mutex::new(HashMap::from([(3, 2)])),
        throttle_message: "429 RESOURCE_EXHAUSTED retry_delay { seconds: 7 }".to_string(),
        ..Scaled::default()
    });
    let pause = Arc::new(RecordingPause::default());

    let report = dispatcher(1, pause.clone())
        .dispatch(&[3u32], "Acme", task.clone())
        .await
        .unwrap();

    assert_eq!(report.into_payloads(), vec![30]);
    assert_eq!(task.calls_for(3), 3);

    let waits = pause.waits();
    assert_eq!(waits.len(), 2);
    // Hint plus full jitter drawn from [0, 2^attempt].
    assert!(waits[0] >= Duration::from_secs(7) && waits[0] <= Duration::from_secs(8));
    assert!(waits[1] >= Duration::from_secs(7) && waits[1] <= Duration::from_secs(9));
}

#[tokio::test]
async fn exhausted_retries_become_a_category_failure() {
    let task = Arc::new(Scaled {
        throttled: Mutex::new(HashMap::from([(1, u32::MAX)])),
        throttle_message: "quota exceeded".to_string(),
        ..Scaled::default()
    });
    let pause = Arc::new(RecordingPause::default());

    let report = CategoryDispatcher::new(
        DispatchConfig::default(),
        RetryPolicy::category().with_max_attempts(3),
    )
    .with_pause(pause.clone())
    .dispatch(&[1u32, 2], "Acme", task.clone())
    .await
    .unwrap();

    assert_eq!(report.into_payloads(), vec![20]);
    assert_eq!(task.calls_for(1), 3);
    let waits = pause.waits();
    assert_eq!(waits.len(), 2);
    // No hint: 15 s cool-down before jitter.
    assert!(waits.iter().all(|w| *w >= Duration::from_secs(15)));
}

#[tokio::test]
async fn pacing_precedes_every_external_call() {
    let task = Arc::new(Scaled {
        throttled: Mutex::new(HashMap::from([(2, 1)])),
        throttle_message: "retry_delay { seconds: 1 }".to_string(),
        ..Scaled::default()
    });
    let pause = Arc::new(RecordingPause::default());

    CategoryDispatcher::new(DispatchConfig::risk(), RetryPolicy::category())
        .with_pause(pause.clone())
        .dispatch(&[1u32, 2], "Acme", task)
        .await
        .unwrap();

    let pacing = pause
        .waits()
        .into_iter()
        .filter(|w| *w == DispatchConfig::RISK_PACING)
        .count();
    // Category 1 once, category 2 twice.
    assert_eq!(pacing, 3);
}

#[tokio::test]
async fn empty_or_duplicate_category_lists_are_rejected() {
    let d = dispatcher(1, Arc::new(RecordingPause::default()));
    let task = Arc::new(Scaled::default());

    let empty: [u32; 0] = [];
    assert_eq!(
        d.dispatch(&empty, "Acme", task.clone()).await.unwrap_err(),
        DispatchError::NoCategories
    );
    assert_eq!(
        d.dispatch(&[1u32, 2, 1], "Acme", task.clone()).await.unwrap_err(),
        DispatchError::DuplicateCategory {
            category: "1".to_string()
        }
    );
    assert!(task.calls.lock().unwrap().is_empty());
}
