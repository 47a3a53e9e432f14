//! Prometheus counters for the proxy.

use advisory_common::Category;
use metrics::counter;

pub fn record_request(category: Category) {
    counter!("advisory_requests_total", "category" => category.as_str()).increment(1);
}

pub fn record_cache_hit(category: Category) {
    counter!("advisory_cache_hits_total", "category" => category.as_str()).increment(1);
}

pub fn record_cache_miss(category: Category) {
    counter!("advisory_cache_misses_total", "category" => category.as_str()).increment(1);
}

pub fn record_upstream_failure(category: Category) {
    counter!("advisory_upstream_failures_total", "category" => category.as_str()).increment(1);
}
