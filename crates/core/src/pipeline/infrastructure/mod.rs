pub mod bounded_worker_pool;
