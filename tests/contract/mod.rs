//! Contract tests validating facade behavior against the enumerator boundary

mod test_focus_coordinator;
mod test_window_manager;
