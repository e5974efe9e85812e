#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::{sleep, Instant};

    use crate::config::settings::GenerationSettings;
    use crate::generation::GenerateError;
    use crate::tests::common::{coordinator, gen_settings, Script, ScriptedFactory, StubFetcher, SESSION_ID};

    #[tokio::test(start_paused = true)]
    async fn parallel_cycle_produces_credentials_for_the_fetched_session() {
        let fetcher = Arc::new(StubFetcher::ok());
        let factory = Arc::new(ScriptedFactory::new(vec![
            Script::succeed_after(20),
            Script::Hang,
        ]));
        let coordinator = coordinator(fetcher.clone(), factory.clone(), gen_settings(true, 2));

        let credentials = coordinator.generate().await.expect("cycle should succeed");

        assert_eq!(credentials.session_id, SESSION_ID);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(factory.session_ids(), vec![SESSION_ID, SESSION_ID]);
    }

    #[tokio::test(start_paused = true)]
    async fn prerequisite_failure_aborts_before_any_producer_is_created() {
        let fetcher = Arc::new(StubFetcher::failing());
        let factory = Arc::new(ScriptedFactory::always(Script::succeed_after(0)));
        let coordinator = coordinator(fetcher, factory.clone(), gen_settings(true, 4));

        let result = coordinator.generate().await;

        assert!(matches!(result, Err(GenerateError::Prerequisite(_))));
        assert_eq!(factory.created(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_direct_use_is_rejected_immediately() {
        let fetcher = Arc::new(StubFetcher::ok());
        let factory = Arc::new(ScriptedFactory::always(Script::succeed_after(100)));
        let coordinator = coordinator(fetcher, factory, gen_settings(false, 1));

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.generate().await })
        };
        sleep(Duration::from_millis(10)).await;

        let second = coordinator.generate().await;
        assert_eq!(second, Err(GenerateError::AlreadyInProgress));

        let first = first.await.expect("task should not panic");
        assert!(first.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn busy_flag_is_released_after_a_failed_cycle() {
        let fetcher = Arc::new(StubFetcher::failing());
        let factory = Arc::new(ScriptedFactory::always(Script::Hang));
        let coordinator = coordinator(fetcher, factory, gen_settings(true, 1));

        assert!(coordinator.generate().await.is_err());
        // A second cycle may start; it fails for the same reason, not the guard.
        assert!(matches!(
            coordinator.generate().await,
            Err(GenerateError::Prerequisite(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn overall_deadline_bounds_the_sequential_strategy() {
        let fetcher = Arc::new(StubFetcher::ok());
        let factory = Arc::new(ScriptedFactory::always(Script::Hang));
        let deadline = Duration::from_secs(10);
        let settings = GenerationSettings {
            parallel: false,
            worker_count: 1,
            overall_deadline: deadline,
            max_attempts: 5,
            attempt_timeout: Duration::from_secs(50),
            backoff: Duration::from_secs(2),
        };
        let coordinator = coordinator(fetcher, factory, settings);

        let started = Instant::now();
        let result = coordinator.generate().await;
        let elapsed = started.elapsed();

        assert_eq!(result, Err(GenerateError::DeadlineElapsed(deadline)));
        assert!(elapsed >= deadline && elapsed < deadline + Duration::from_secs(1));
    }
}
