//! Latency checks on synthetic desktops

mod test_search_performance;
