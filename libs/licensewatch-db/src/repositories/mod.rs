pub mod usage_repo;
