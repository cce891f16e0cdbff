use super::*;

fn addr() -> IpAddr {
    "127.0.0.1".parse().unwrap()
}

#[test]
fn allows_up_to_capacity_then_rejects() {
    let limiter = RateLimiter {
        buckets: Mutex::new(HashMap::new()),
    };
    for _ in 0..100 {
        assert!(limiter.allow(addr()));
    }
    assert!(!limiter.allow(addr()));
}

#[test]
fn separate_addresses_have_independent_buckets() {
    let limiter = RateLimiter {
        buckets: Mutex::new(HashMap::new()),
    };
    for _ in 0..100 {
        assert!(limiter.allow(addr()));
    }
    let other: IpAddr = "127.0.0.2".parse().unwrap();
    assert!(limiter.allow(other));
}

#[tokio::test(start_paused = true)]
async fn tokens_refill_over_time() {
    let limiter = RateLimiter {
        buckets: Mutex::new(HashMap::new()),
    };
    for _ in 0..100 {
        assert!(limiter.allow(addr()));
    }
    assert!(!limiter.allow(addr()));

    tokio::time::advance(Duration::from_millis(20)).await;
    assert!(limiter.allow(addr()));
}

#[tokio::test(start_paused = true)]
async fn sweep_evicts_idle_buckets() {
    let limiter = RateLimiter {
        buckets: Mutex::new(HashMap::new()),
    };
    limiter.allow(addr());
    assert_eq!(lock(&limiter.buckets).len(), 1);

    tokio::time::advance(IDLE_EVICT_AFTER + Duration::from_secs(1)).await;
    limiter.sweep();
    assert_eq!(lock(&limiter.buckets).len(), 0);
}
