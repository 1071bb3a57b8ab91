//! Contract tests for memory_manager
